use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::bean::{BeanFactoryFn, BeanInstance};

/// Bean 的生命周期
///
/// 决定 `get` 返回已存储的实例还是通过工厂新建的实例。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifecycle {
    /// 单例 - 容器中只有一个实例
    #[default]
    Singleton,

    /// 原型 - 每次获取都通过工厂创建新实例；没有工厂时退化为单例
    Prototype,

    /// 会话级（保留标签，解析方式与单例相同）
    Session,

    /// 请求级（保留标签，解析方式与单例相同）
    Request,
}

impl Lifecycle {
    /// 根据生命周期选择要返回的实例
    pub(crate) fn resolve(
        self,
        stored: &BeanInstance,
        factory: Option<&BeanFactoryFn>,
    ) -> BeanInstance {
        match (self, factory) {
            (Lifecycle::Prototype, Some(factory)) => factory(),
            _ => Arc::clone(stored),
        }
    }
}

impl FromStr for Lifecycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "singleton" => Ok(Lifecycle::Singleton),
            "prototype" => Ok(Lifecycle::Prototype),
            "session" => Ok(Lifecycle::Session),
            "request" => Ok(Lifecycle::Request),
            _ => Err(format!("Invalid lifecycle: {}", s)),
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifecycle::Singleton => write!(f, "singleton"),
            Lifecycle::Prototype => write!(f, "prototype"),
            Lifecycle::Session => write!(f, "session"),
            Lifecycle::Request => write!(f, "request"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_factory(counter: Arc<AtomicUsize>) -> BeanFactoryFn {
        Arc::new(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            Arc::new(n) as BeanInstance
        })
    }

    #[test]
    fn test_default_is_singleton() {
        assert_eq!(Lifecycle::default(), Lifecycle::Singleton);
    }

    #[test]
    fn test_lifecycle_from_str() {
        assert_eq!("singleton".parse::<Lifecycle>().unwrap(), Lifecycle::Singleton);
        assert_eq!("Prototype".parse::<Lifecycle>().unwrap(), Lifecycle::Prototype);
        assert_eq!("session".parse::<Lifecycle>().unwrap(), Lifecycle::Session);
        assert_eq!(" request ".parse::<Lifecycle>().unwrap(), Lifecycle::Request);
        assert!("transient".parse::<Lifecycle>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for lifecycle in [
            Lifecycle::Singleton,
            Lifecycle::Prototype,
            Lifecycle::Session,
            Lifecycle::Request,
        ] {
            assert_eq!(lifecycle.to_string().parse::<Lifecycle>().unwrap(), lifecycle);
        }
    }

    #[test]
    fn test_singleton_ignores_factory() {
        let counter = Arc::new(AtomicUsize::new(0));
        let factory = counting_factory(Arc::clone(&counter));
        let stored: BeanInstance = Arc::new(42usize);

        let resolved = Lifecycle::Singleton.resolve(&stored, Some(&factory));
        assert!(Arc::ptr_eq(&resolved, &stored));
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_prototype_calls_factory_each_time() {
        let counter = Arc::new(AtomicUsize::new(0));
        let factory = counting_factory(Arc::clone(&counter));
        let stored: BeanInstance = Arc::new(99usize);

        let first = Lifecycle::Prototype.resolve(&stored, Some(&factory));
        let second = Lifecycle::Prototype.resolve(&stored, Some(&factory));
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_prototype_without_factory_falls_back_to_stored() {
        let stored: BeanInstance = Arc::new(7usize);
        let resolved = Lifecycle::Prototype.resolve(&stored, None);
        assert!(Arc::ptr_eq(&resolved, &stored));
    }

    #[test]
    fn test_reserved_tags_resolve_like_singleton() {
        let counter = Arc::new(AtomicUsize::new(0));
        let factory = counting_factory(Arc::clone(&counter));
        let stored: BeanInstance = Arc::new(1usize);

        for lifecycle in [Lifecycle::Session, Lifecycle::Request] {
            let resolved = lifecycle.resolve(&stored, Some(&factory));
            assert!(Arc::ptr_eq(&resolved, &stored));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
