use std::any::{type_name, Any};
use std::fmt;

use crate::autowired::Autowired;
use crate::bean::{Bean, BeanInstance, TypeKey};
use crate::lifecycle::Lifecycle;

/// Component trait - 可以声明注入点的组件
///
/// 通常通过 `#[derive(Component)]` 自动实现，也可以手写实现。
///
/// # 示例
///
/// ```ignore
/// use trellis_core::prelude::*;
/// use trellis_core_macros::Component;
///
/// #[derive(Component)]
/// #[component("userService")]
/// #[lifecycle("singleton")]
/// struct UserService {
///     #[inject("config")]
///     config: Autowired<AppConfig>,
/// }
/// ```
pub trait Component: Any + Send + Sync + Sized {
    /// 获取 Bean 名称，默认使用完整类型名
    fn bean_name() -> &'static str {
        type_name::<Self>()
    }

    /// 获取生命周期
    fn lifecycle() -> Lifecycle {
        Lifecycle::Singleton
    }

    /// 获取注入点
    fn injection_points() -> Vec<InjectionPoint<Self>> {
        Vec::new()
    }
}

type SettableFn<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;
type AssignFn<T> = Box<dyn Fn(&T, &Bean, &BeanInstance) -> bool + Send + Sync>;
type ResetFn<T> = Box<dyn Fn(&T) + Send + Sync>;

/// 注入点 - 组件中一个被标记的字段
///
/// 记录字段名、可选的限定名、目标类型，以及读取该字段的访问器。
pub struct InjectionPoint<T> {
    field: &'static str,
    qualifier: Option<&'static str>,
    target: TypeKey,
    settable: SettableFn<T>,
    assign: AssignFn<T>,
    reset: ResetFn<T>,
}

impl<T: 'static> InjectionPoint<T> {
    /// 创建注入点，空的限定名等同于没有限定名
    pub fn new<D>(
        field: &'static str,
        qualifier: Option<&'static str>,
        accessor: fn(&T) -> &Autowired<D>,
    ) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        Self {
            field,
            qualifier: qualifier.filter(|name| !name.is_empty()),
            target: TypeKey::of::<D>(),
            settable: Box::new(move |owner: &T| accessor(owner).is_settable()),
            assign: Box::new(move |owner: &T, bean: &Bean, instance: &BeanInstance| {
                match bean.cast::<D>(instance) {
                    Some(dependency) => {
                        accessor(owner).set(dependency);
                        true
                    }
                    None => false,
                }
            }),
            reset: Box::new(move |owner: &T| accessor(owner).reset()),
        }
    }

    pub fn field(&self) -> &'static str {
        self.field
    }

    pub fn qualifier(&self) -> Option<&'static str> {
        self.qualifier
    }

    pub fn target(&self) -> TypeKey {
        self.target
    }

    pub(crate) fn is_settable(&self, owner: &T) -> bool {
        (self.settable)(owner)
    }

    /// 把候选 Bean 的实例写入字段，候选无法看作目标类型时返回 false
    pub(crate) fn assign(&self, owner: &T, bean: &Bean, instance: &BeanInstance) -> bool {
        (self.assign)(owner, bean, instance)
    }

    /// 清空字段中装配得到的依赖
    pub(crate) fn reset(&self, owner: &T) {
        (self.reset)(owner)
    }
}

impl<T> fmt::Debug for InjectionPoint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionPoint")
            .field("field", &self.field)
            .field("qualifier", &self.qualifier)
            .field("target", &self.target.name())
            .finish()
    }
}
