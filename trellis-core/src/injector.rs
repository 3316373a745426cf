//! 装配阶段
//!
//! `populate` 对注册表中每个声明了注入点的 Bean 逐字段解析依赖并赋值。
//! 字段级问题（找不到依赖、类型不符、字段被固定、候选不唯一）只记录为 `WiringIssue`，
//! 不会中断整个过程；严格模式下在全部处理完之后汇总为一个错误返回。

use std::any::{type_name, Any};
use std::fmt;
use std::time::Instant;

use crate::bean::{Bean, BeanInstance, TypeKey};
use crate::component::InjectionPoint;
use crate::error::{ContainerError, ContainerResult};
use crate::registry::BeanRegistry;

/// 类型擦除后的注入点集合
pub(crate) trait Wiring: Send + Sync {
    /// 注入点所属的组件类型
    fn owner(&self) -> TypeKey;

    fn wire(
        &self,
        bean: &Bean,
        injector: &Injector<'_>,
        report: &mut WiringReport,
    ) -> ContainerResult<()>;

    /// 清空装配得到的字段，拆开 Bean 之间的 `Arc` 环
    fn unwire(&self, bean: &Bean);
}

/// 某个组件类型的全部注入点
pub(crate) struct ComponentWiring<T> {
    points: Vec<InjectionPoint<T>>,
}

impl<T> ComponentWiring<T> {
    pub fn new(points: Vec<InjectionPoint<T>>) -> Self {
        Self { points }
    }
}

impl<T: Any + Send + Sync> Wiring for ComponentWiring<T> {
    fn owner(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn wire(
        &self,
        bean: &Bean,
        injector: &Injector<'_>,
        report: &mut WiringReport,
    ) -> ContainerResult<()> {
        let owner = bean
            .instance()
            .downcast_ref::<T>()
            .ok_or_else(|| ContainerError::InjectionFailed {
                bean: bean.name().to_string(),
                reason: format!(
                    "stored instance is '{}' but its injection points belong to '{}'",
                    bean.type_name(),
                    type_name::<T>()
                ),
            })?;

        for point in &self.points {
            injector.inject(bean, owner, point, report);
        }
        Ok(())
    }

    fn unwire(&self, bean: &Bean) {
        if let Some(owner) = bean.instance().downcast_ref::<T>() {
            for point in &self.points {
                point.reset(owner);
            }
        }
    }
}

/// 字段级装配问题
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WiringIssue {
    /// 按名称、类型、类型名都找不到依赖
    Unresolved {
        bean: String,
        field: &'static str,
        qualifier: Option<&'static str>,
    },

    /// 找到了候选，但无法看作字段声明的类型
    TypeMismatch {
        bean: String,
        field: &'static str,
        candidate: String,
        expected: &'static str,
        found: &'static str,
    },

    /// 字段已被所有者固定
    Unsettable { bean: String, field: &'static str },

    /// 按类型查找时有多个候选，已注入其中之一
    Ambiguous {
        bean: String,
        field: &'static str,
        chosen: String,
        candidates: Vec<String>,
    },
}

impl WiringIssue {
    pub fn bean(&self) -> &str {
        match self {
            WiringIssue::Unresolved { bean, .. }
            | WiringIssue::TypeMismatch { bean, .. }
            | WiringIssue::Unsettable { bean, .. }
            | WiringIssue::Ambiguous { bean, .. } => bean,
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            WiringIssue::Unresolved { field, .. }
            | WiringIssue::TypeMismatch { field, .. }
            | WiringIssue::Unsettable { field, .. }
            | WiringIssue::Ambiguous { field, .. } => field,
        }
    }
}

impl fmt::Display for WiringIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WiringIssue::Unresolved {
                bean,
                field,
                qualifier: Some(qualifier),
            } => write!(f, "{bean}.{field}: no bean named '{qualifier}'"),
            WiringIssue::Unresolved {
                bean,
                field,
                qualifier: None,
            } => write!(f, "{bean}.{field}: no bean matches the field type"),
            WiringIssue::TypeMismatch {
                bean,
                field,
                candidate,
                expected,
                found,
            } => write!(
                f,
                "{bean}.{field}: bean '{candidate}' of type '{found}' cannot be used as '{expected}'"
            ),
            WiringIssue::Unsettable { bean, field } => {
                write!(f, "{bean}.{field}: field is pinned and cannot be injected")
            }
            WiringIssue::Ambiguous {
                bean,
                field,
                chosen,
                candidates,
            } => write!(
                f,
                "{bean}.{field}: {} candidates ({}), injected '{chosen}'",
                candidates.len(),
                candidates.join(", ")
            ),
        }
    }
}

impl std::error::Error for WiringIssue {}

/// 一次装配的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WiringReport {
    /// 处理过的带注入点的 Bean 数量
    pub beans_visited: usize,
    /// 成功注入的字段数量
    pub fields_wired: usize,
    pub issues: Vec<WiringIssue>,
}

impl WiringReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// 解析到的候选依赖
struct Candidate<'r> {
    bean: &'r Bean,
    instance: BeanInstance,
}

/// 装配器，持有注册表的只读视图
pub(crate) struct Injector<'r> {
    registry: &'r BeanRegistry,
    strict: bool,
}

impl<'r> Injector<'r> {
    pub fn new(registry: &'r BeanRegistry, strict: bool) -> Self {
        Self { registry, strict }
    }

    /// 执行装配
    pub fn run(&self) -> ContainerResult<WiringReport> {
        let start = Instant::now();
        let mut report = WiringReport::default();

        for bean in self.registry.iter() {
            let Some(wiring) = bean.wiring() else {
                continue;
            };

            tracing::debug!(
                "Wiring bean '{}' ({})",
                bean.name(),
                wiring.owner().name()
            );
            report.beans_visited += 1;
            wiring.wire(bean, self, &mut report)?;
        }

        tracing::info!(
            "Populated {} bean(s): {} field(s) wired, {} issue(s) in {:?}",
            report.beans_visited,
            report.fields_wired,
            report.issues.len(),
            start.elapsed()
        );

        if self.strict && !report.is_clean() {
            return Err(ContainerError::wiring_failed(report.issues));
        }
        Ok(report)
    }

    /// 处理单个注入点，问题写入报告，不返回错误
    fn inject<T>(
        &self,
        bean: &Bean,
        owner: &T,
        point: &InjectionPoint<T>,
        report: &mut WiringReport,
    ) where
        T: 'static,
    {
        if !point.is_settable(owner) {
            tracing::warn!(
                "Field '{}' of bean '{}' is pinned, skipping injection",
                point.field(),
                bean.name()
            );
            report.issues.push(WiringIssue::Unsettable {
                bean: bean.name().to_string(),
                field: point.field(),
            });
            return;
        }

        let Some(candidate) = self.resolve(bean, point, report) else {
            tracing::warn!(
                "No bean found for field '{}' of bean '{}' (qualifier: {:?}, type: {})",
                point.field(),
                bean.name(),
                point.qualifier(),
                point.target().name()
            );
            report.issues.push(WiringIssue::Unresolved {
                bean: bean.name().to_string(),
                field: point.field(),
                qualifier: point.qualifier(),
            });
            return;
        };

        if point.assign(owner, candidate.bean, &candidate.instance) {
            tracing::debug!(
                "Injected bean '{}' into field '{}' of bean '{}'",
                candidate.bean.name(),
                point.field(),
                bean.name()
            );
            report.fields_wired += 1;
        } else {
            tracing::warn!(
                "Bean '{}' of type '{}' is not assignable to field '{}' of bean '{}' (expected {})",
                candidate.bean.name(),
                candidate.bean.type_name(),
                point.field(),
                bean.name(),
                point.target().name()
            );
            report.issues.push(WiringIssue::TypeMismatch {
                bean: bean.name().to_string(),
                field: point.field(),
                candidate: candidate.bean.name().to_string(),
                expected: point.target().name(),
                found: candidate.bean.type_name(),
            });
        }
    }

    /// 解析顺序：
    /// 1. 有限定名时按名称查找
    /// 2. 没有限定名时按类型查找（排除自身）
    /// 3. 按字段类型名作为 Bean 名称查找
    fn resolve<T>(
        &self,
        bean: &Bean,
        point: &InjectionPoint<T>,
        report: &mut WiringReport,
    ) -> Option<Candidate<'r>>
    where
        T: 'static,
    {
        let found = match point.qualifier() {
            Some(qualifier) => self.registry.get(qualifier),
            None => self.resolve_by_type(bean, point, report),
        };

        found
            .or_else(|| {
                self.registry
                    .get(point.target().name())
                    .filter(|candidate| candidate.name() != bean.name())
            })
            .map(|candidate| Candidate {
                bean: candidate,
                instance: candidate.resolve(),
            })
    }

    fn resolve_by_type<T>(
        &self,
        bean: &Bean,
        point: &InjectionPoint<T>,
        report: &mut WiringReport,
    ) -> Option<&'r Bean>
    where
        T: 'static,
    {
        let candidates: Vec<&Bean> = self
            .registry
            .beans_by_type(point.target().id())
            .into_iter()
            .filter(|candidate| candidate.name() != bean.name())
            .collect();

        let chosen = *candidates.first()?;
        if candidates.len() > 1 {
            let mut names: Vec<String> = candidates
                .iter()
                .map(|candidate| candidate.name().to_string())
                .collect();
            names.sort();

            tracing::warn!(
                "{} beans satisfy type '{}' for field '{}' of bean '{}', injecting '{}'",
                names.len(),
                point.target().name(),
                point.field(),
                bean.name(),
                chosen.name()
            );
            report.issues.push(WiringIssue::Ambiguous {
                bean: bean.name().to_string(),
                field: point.field(),
                chosen: chosen.name().to_string(),
                candidates: names,
            });
        }
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autowired::Autowired;
    use crate::bean::BeanDefinition;
    use crate::component::Component;
    use std::sync::Arc;

    struct Config {
        port: u16,
    }

    trait Store: Send + Sync {
        fn id(&self) -> &'static str;
    }

    struct MemoryStore;

    impl Store for MemoryStore {
        fn id(&self) -> &'static str {
            "memory"
        }
    }

    struct FileStore;

    impl Store for FileStore {
        fn id(&self) -> &'static str {
            "file"
        }
    }

    #[derive(Default)]
    struct Service {
        config: Autowired<Config>,
        store: Autowired<dyn Store>,
    }

    impl Component for Service {
        fn injection_points() -> Vec<InjectionPoint<Self>> {
            vec![
                InjectionPoint::<Self>::new("config", Some("config"), |service| &service.config),
                InjectionPoint::<Self>::new("store", None, |service| &service.store),
            ]
        }
    }

    fn register(registry: &mut BeanRegistry, definition: BeanDefinition) {
        registry.provide(definition.into_bean().unwrap()).unwrap();
    }

    fn memory_store() -> BeanDefinition {
        BeanDefinition::new("memoryStore", MemoryStore)
            .exposes(|store: Arc<MemoryStore>| store as Arc<dyn Store>)
    }

    fn service_of(registry: &BeanRegistry) -> &Service {
        registry
            .get("service")
            .unwrap()
            .instance()
            .downcast_ref::<Service>()
            .unwrap()
    }

    #[test]
    fn test_wires_by_name_and_capability() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::new("config", Config { port: 8080 }));
        register(&mut registry, memory_store());
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        let report = Injector::new(&registry, false).run().unwrap();
        assert!(report.is_clean());
        assert_eq!(report.beans_visited, 1);
        assert_eq!(report.fields_wired, 2);

        let service = service_of(&registry);
        assert_eq!(service.config.require().unwrap().port, 8080);
        assert_eq!(service.store.require().unwrap().id(), "memory");
    }

    #[test]
    fn test_missing_dependency_leaves_field_empty() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, memory_store());
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        let report = Injector::new(&registry, false).run().unwrap();
        assert_eq!(report.fields_wired, 1);
        assert_eq!(
            report.issues,
            vec![WiringIssue::Unresolved {
                bean: "service".to_string(),
                field: "config",
                qualifier: Some("config"),
            }]
        );
        assert!(!service_of(&registry).config.is_wired());
    }

    #[test]
    fn test_type_mismatch_is_reported() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::new("config", "not a config".to_string()));
        register(&mut registry, memory_store());
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        let report = Injector::new(&registry, false).run().unwrap();
        assert!(matches!(
            report.issues.as_slice(),
            [WiringIssue::TypeMismatch { field: "config", .. }]
        ));
        assert!(!service_of(&registry).config.is_wired());
    }

    #[test]
    fn test_qualifier_falls_back_to_type_name() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::new(type_name::<Config>(), Config { port: 9090 }));
        register(&mut registry, memory_store());
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        let report = Injector::new(&registry, false).run().unwrap();
        assert!(report.is_clean());
        assert_eq!(service_of(&registry).config.require().unwrap().port, 9090);
    }

    #[test]
    fn test_type_name_match_without_capability_is_a_mismatch() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::new("config", Config { port: 1 }));
        register(&mut registry, BeanDefinition::new(type_name::<dyn Store>(), MemoryStore));
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        let report = Injector::new(&registry, false).run().unwrap();
        assert!(matches!(
            report.issues.as_slice(),
            [WiringIssue::TypeMismatch { field: "store", .. }]
        ));
        assert!(!service_of(&registry).store.is_wired());
    }

    #[test]
    fn test_ambiguous_capability_injects_one_and_reports() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::new("config", Config { port: 1 }));
        register(&mut registry, memory_store());
        register(
            &mut registry,
            BeanDefinition::new("fileStore", FileStore)
                .exposes(|store: Arc<FileStore>| store as Arc<dyn Store>),
        );
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        let report = Injector::new(&registry, false).run().unwrap();
        assert_eq!(report.fields_wired, 2);
        match report.issues.as_slice() {
            [WiringIssue::Ambiguous { candidates, .. }] => {
                assert_eq!(candidates, &vec!["fileStore".to_string(), "memoryStore".to_string()]);
            }
            other => panic!("unexpected issues: {other:?}"),
        }
        assert!(service_of(&registry).store.is_wired());
    }

    #[test]
    fn test_pinned_field_is_skipped() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::new("config", Config { port: 1 }));
        register(&mut registry, memory_store());
        let service = Service {
            config: Autowired::new(),
            store: Autowired::pinned(Arc::new(FileStore) as Arc<dyn Store>),
        };
        register(&mut registry, BeanDefinition::component("service", service));

        let report = Injector::new(&registry, false).run().unwrap();
        assert_eq!(report.fields_wired, 1);
        assert!(matches!(
            report.issues.as_slice(),
            [WiringIssue::Unsettable { field: "store", .. }]
        ));
        assert_eq!(service_of(&registry).store.require().unwrap().id(), "file");
    }

    #[test]
    fn test_strict_mode_aggregates_issues() {
        let mut registry = BeanRegistry::new();
        register(&mut registry, BeanDefinition::component("service", Service::default()));

        match Injector::new(&registry, true).run() {
            Err(ContainerError::WiringFailed { count, issues, .. }) => {
                assert_eq!(count, 2);
                assert_eq!(issues.len(), 2);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    struct Node {
        next: Autowired<Node>,
    }

    impl Component for Node {
        fn injection_points() -> Vec<InjectionPoint<Self>> {
            vec![InjectionPoint::<Self>::new("next", Some("node"), |node| &node.next)]
        }
    }

    #[test]
    fn test_dropping_registry_breaks_self_reference() {
        let mut registry = BeanRegistry::new();
        let node = Node {
            next: Autowired::new(),
        };
        register(&mut registry, BeanDefinition::component("node", node));

        let report = Injector::new(&registry, true).run().unwrap();
        assert_eq!(report.fields_wired, 1);

        let weak = Arc::downgrade(registry.get("node").unwrap().instance());
        drop(registry);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn test_wiring_rejects_instance_of_another_type() {
        let registry = BeanRegistry::new();
        let bean = BeanDefinition::new("service", Config { port: 1 })
            .into_bean()
            .unwrap();
        let wiring = ComponentWiring::new(Service::injection_points());
        let mut report = WiringReport::default();

        let result = wiring.wire(&bean, &Injector::new(&registry, false), &mut report);
        match result {
            Err(ContainerError::InjectionFailed { bean, reason }) => {
                assert_eq!(bean, "service");
                assert!(reason.contains("injection points belong to"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(report.is_clean());
    }

    #[test]
    fn test_issue_display() {
        let issue = WiringIssue::Unresolved {
            bean: "service".to_string(),
            field: "config",
            qualifier: Some("config"),
        };
        assert_eq!(issue.to_string(), "service.config: no bean named 'config'");
        assert_eq!(issue.bean(), "service");
        assert_eq!(issue.field(), "config");
    }
}
