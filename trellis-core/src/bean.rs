use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::component::{Component, InjectionPoint};
use crate::error::{ContainerError, ContainerResult};
use crate::injector::{ComponentWiring, Wiring};
use crate::lifecycle::Lifecycle;

/// 容器中存储的类型擦除实例
pub type BeanInstance = Arc<dyn Any + Send + Sync>;

/// 原型 Bean 的工厂函数
pub type BeanFactoryFn = Arc<dyn Fn() -> BeanInstance + Send + Sync>;

/// 把实例转换为某个视图类型的 `Arc<V>`，结果装箱后擦除类型
type Caster = Arc<dyn Fn(&BeanInstance) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;

/// 类型标识：`TypeId` 加上可读的类型名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Bean 可以被看作的一种类型（自身类型或声明的能力）
#[derive(Clone)]
struct View {
    key: TypeKey,
    cast: Caster,
}

impl View {
    /// 自身类型视图
    fn own<T: Any + Send + Sync>() -> Self {
        Self {
            key: TypeKey::of::<T>(),
            cast: Arc::new(|instance: &BeanInstance| {
                Arc::clone(instance)
                    .downcast::<T>()
                    .ok()
                    .map(|bean| Box::new(bean) as Box<dyn Any + Send + Sync>)
            }),
        }
    }

    /// 能力视图，`upcast` 负责 `Arc<T>` 到 `Arc<I>` 的转换
    fn capability<T, I, F>(upcast: F) -> Self
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        Self {
            key: TypeKey::of::<I>(),
            cast: Arc::new(move |instance: &BeanInstance| {
                Arc::clone(instance)
                    .downcast::<T>()
                    .ok()
                    .map(|bean| Box::new(upcast(bean)) as Box<dyn Any + Send + Sync>)
            }),
        }
    }
}

/// 已注册的 Bean
///
/// 注册表是实例的长期持有者，被注入到字段中的只是共享的 `Arc`。
#[derive(Clone)]
pub struct Bean {
    name: String,
    type_key: TypeKey,
    lifecycle: Lifecycle,
    instance: BeanInstance,
    factory: Option<BeanFactoryFn>,
    views: HashMap<TypeId, View>,
    wiring: Option<Arc<dyn Wiring>>,
}

impl Bean {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_key(&self) -> TypeKey {
        self.type_key
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// 注册时存储的实例
    pub fn instance(&self) -> &BeanInstance {
        &self.instance
    }

    pub fn factory(&self) -> Option<&BeanFactoryFn> {
        self.factory.as_ref()
    }

    /// 按生命周期取得实例：原型返回新实例，其余返回存储的实例
    pub fn resolve(&self) -> BeanInstance {
        self.lifecycle.resolve(&self.instance, self.factory.as_ref())
    }

    /// Bean 是否可以被看作给定类型
    pub fn satisfies(&self, type_id: TypeId) -> bool {
        self.views.contains_key(&type_id)
    }

    /// 把属于这个 Bean 的实例转换为 `Arc<T>`，`T` 可以是自身类型或已声明的能力
    pub fn cast<T>(&self, instance: &BeanInstance) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let view = self.views.get(&TypeId::of::<T>())?;
        let boxed = (view.cast)(instance)?;
        boxed.downcast::<Arc<T>>().ok().map(|arc| *arc)
    }

    /// 所有可用视图的类型名（包括自身类型），已排序
    pub fn capabilities(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.views.values().map(|view| view.key.name()).collect();
        names.sort_unstable();
        names
    }

    pub fn has_wiring(&self) -> bool {
        self.wiring.is_some()
    }

    pub(crate) fn wiring(&self) -> Option<&Arc<dyn Wiring>> {
        self.wiring.as_ref()
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("name", &self.name)
            .field("type_name", &self.type_key.name())
            .field("lifecycle", &self.lifecycle)
            .field("has_factory", &self.factory.is_some())
            .field("capabilities", &self.capabilities())
            .field("has_wiring", &self.wiring.is_some())
            .finish()
    }
}

/// Bean 定义 - 描述一次注册
///
/// 名称为空时由容器补全为类型名。能力视图与注入点在这里声明，
/// 如果它们针对的类型不是 Bean 自身的类型，注册时返回 `CapabilityMismatch`。
///
/// # 示例
///
/// ```ignore
/// let definition = BeanDefinition::new("store", MemoryStore::default())
///     .exposes(|store: Arc<MemoryStore>| store as Arc<dyn Store>);
/// container.register(definition)?;
/// ```
pub struct BeanDefinition {
    name: String,
    type_key: TypeKey,
    lifecycle: Lifecycle,
    instance: BeanInstance,
    factory: Option<BeanFactoryFn>,
    views: HashMap<TypeId, View>,
    wiring: Option<Arc<dyn Wiring>>,
    mismatch: Option<TypeKey>,
}

impl BeanDefinition {
    /// 以给定实例创建单例定义
    pub fn new<T: Any + Send + Sync>(name: impl Into<String>, bean: T) -> Self {
        Self::from_arc(name, Arc::new(bean))
    }

    /// 以已共享的实例创建单例定义
    pub fn from_arc<T: Any + Send + Sync>(name: impl Into<String>, bean: Arc<T>) -> Self {
        let own = View::own::<T>();
        let mut views = HashMap::new();
        views.insert(own.key.id(), own);

        Self {
            name: name.into(),
            type_key: TypeKey::of::<T>(),
            lifecycle: Lifecycle::Singleton,
            instance: bean,
            factory: None,
            views,
            wiring: None,
            mismatch: None,
        }
    }

    /// 以工厂创建定义，默认生命周期为原型
    ///
    /// 工厂会立即调用一次，得到的实例作为存储实例。
    pub fn from_factory<T, F>(name: impl Into<String>, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let factory: BeanFactoryFn = Arc::new(move || Arc::new(factory()) as BeanInstance);
        let instance = factory();

        let own = View::own::<T>();
        let mut views = HashMap::new();
        views.insert(own.key.id(), own);

        Self {
            name: name.into(),
            type_key: TypeKey::of::<T>(),
            lifecycle: Lifecycle::Prototype,
            instance,
            factory: Some(factory),
            views,
            wiring: None,
            mismatch: None,
        }
    }

    /// 以组件创建定义：使用组件声明的生命周期与注入点，名称为空时使用 `T::bean_name()`
    pub fn component<T: Component>(name: impl Into<String>, bean: T) -> Self {
        let name = name.into();
        let name = if name.is_empty() {
            T::bean_name().to_string()
        } else {
            name
        };

        Self::new(name, bean)
            .with_lifecycle(T::lifecycle())
            .with_injection_points(T::injection_points())
    }

    pub fn with_lifecycle(mut self, lifecycle: Lifecycle) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    /// 声明一种能力视图
    pub fn exposes<T, I, F>(mut self, upcast: F) -> Self
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        if TypeId::of::<T>() != self.type_key.id() {
            self.mismatch.get_or_insert(TypeKey::of::<I>());
            return self;
        }

        let view = View::capability::<T, I, F>(upcast);
        self.views.insert(view.key.id(), view);
        self
    }

    /// 设置注入点，`populate` 时按这些注入点装配字段
    pub fn with_injection_points<T: Any + Send + Sync>(
        mut self,
        points: Vec<InjectionPoint<T>>,
    ) -> Self {
        if TypeId::of::<T>() != self.type_key.id() {
            self.mismatch.get_or_insert(TypeKey::of::<T>());
            return self;
        }

        if !points.is_empty() {
            self.wiring = Some(Arc::new(ComponentWiring::new(points)));
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key.name()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// 转换为已注册的 Bean，名称为空时使用类型名
    pub(crate) fn into_bean(self) -> ContainerResult<Bean> {
        let name = if self.name.is_empty() {
            self.type_key.name().to_string()
        } else {
            self.name
        };

        if let Some(declared) = self.mismatch {
            return Err(ContainerError::CapabilityMismatch {
                bean: name,
                declared: declared.name(),
                actual: self.type_key.name(),
            });
        }

        Ok(Bean {
            name,
            type_key: self.type_key,
            lifecycle: self.lifecycle,
            instance: self.instance,
            factory: self.factory,
            views: self.views,
            wiring: self.wiring,
        })
    }
}

impl fmt::Debug for BeanDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanDefinition")
            .field("name", &self.name)
            .field("type_name", &self.type_key.name())
            .field("lifecycle", &self.lifecycle)
            .field("has_factory", &self.factory.is_some())
            .field("has_wiring", &self.wiring.is_some())
            .finish()
    }
}
