use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Deserialize;

use crate::bean::{BeanDefinition, BeanInstance};
use crate::component::Component;
use crate::config::Environment;
use crate::constants;
use crate::error::{ApplicationResult, ContainerError, ContainerResult};
use crate::injector::{Injector, WiringReport};
use crate::lifecycle::Lifecycle;
use crate::registry::BeanRegistry;

/// 容器设置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// 严格模式：`populate` 发现任何字段级问题时返回汇总错误
    pub strict: bool,
}

impl ContainerSettings {
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// 绑定 `[container]` 配置段，缺少的字段取默认值
    pub fn from_environment(env: &Environment) -> ApplicationResult<Self> {
        env.bind(constants::CONTAINER_SECTION)
    }
}

/// 依赖注入容器
///
/// 两阶段使用：先注册所有 Bean，然后调用一次 `populate` 装配被标记的字段，
/// 之后通过 `get*` 读取。没有全局实例，宿主程序自行创建并通过 `Arc` 传递。
///
/// 注册、清空和装配持有写锁（装配期间全程持有），查找持有读锁。
/// 原型 Bean 的工厂在锁内执行，工厂中不能回调容器。
pub struct Container {
    registry: RwLock<BeanRegistry>,
    settings: ContainerSettings,
}

impl Container {
    pub fn new() -> Self {
        Self::with_settings(ContainerSettings::default())
    }

    pub fn with_settings(settings: ContainerSettings) -> Self {
        Self {
            registry: RwLock::new(BeanRegistry::new()),
            settings,
        }
    }

    pub fn settings(&self) -> ContainerSettings {
        self.settings
    }

    /// 注册 Bean 定义
    pub fn register(&self, definition: BeanDefinition) -> ContainerResult<()> {
        let bean = definition.into_bean()?;
        let name = bean.name().to_string();
        let lifecycle = bean.lifecycle();
        let type_name = bean.type_name();

        self.registry.write().provide(bean)?;
        tracing::debug!(
            "Registered bean '{}' ({}, {})",
            name,
            type_name,
            lifecycle
        );
        Ok(())
    }

    /// 批量注册，遇到第一个错误时停止，之前的注册保留
    pub fn provides<I>(&self, definitions: I) -> ContainerResult<()>
    where
        I: IntoIterator<Item = BeanDefinition>,
    {
        for definition in definitions {
            self.register(definition)?;
        }
        Ok(())
    }

    /// 注册单例，名称为空时使用类型名
    pub fn provide<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        bean: T,
    ) -> ContainerResult<()> {
        self.register(BeanDefinition::new(name, bean))
    }

    /// 注册已共享的实例
    pub fn provide_shared<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        bean: Arc<T>,
    ) -> ContainerResult<()> {
        self.register(BeanDefinition::from_arc(name, bean))
    }

    pub fn provide_with_lifecycle<T: Any + Send + Sync>(
        &self,
        name: impl Into<String>,
        bean: T,
        lifecycle: Lifecycle,
    ) -> ContainerResult<()> {
        self.register(BeanDefinition::new(name, bean).with_lifecycle(lifecycle))
    }

    /// 通过工厂注册：工厂立即调用一次得到存储实例，原型 Bean 之后每次 `get` 再调用
    pub fn provide_factory<T, F>(
        &self,
        name: impl Into<String>,
        factory: F,
        lifecycle: Lifecycle,
    ) -> ContainerResult<()>
    where
        T: Any + Send + Sync,
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.register(BeanDefinition::from_factory(name, factory).with_lifecycle(lifecycle))
    }

    /// 注册组件，使用组件声明的生命周期与注入点
    pub fn provide_component<T: Component>(
        &self,
        name: impl Into<String>,
        bean: T,
    ) -> ContainerResult<()> {
        self.register(BeanDefinition::component(name, bean))
    }

    /// 按名称获取实例，按生命周期决定返回存储实例还是新实例
    pub fn get(&self, name: &str) -> Option<BeanInstance> {
        self.registry.read().get(name).map(|bean| bean.resolve())
    }

    /// 按名称获取并转换为 `T`，`T` 可以是具体类型或已声明的能力
    pub fn get_as<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let registry = self.registry.read();
        let bean = registry.get(name)?;
        bean.cast::<T>(&bean.resolve())
    }

    /// 按类型获取，多个 Bean 满足时返回其中任意一个
    pub fn get_by_type<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let registry = self.registry.read();
        let bean = registry.get_by_type(TypeId::of::<T>())?;
        bean.cast::<T>(&bean.resolve())
    }

    /// 按类型获取唯一的 Bean，没有或多于一个时返回错误
    pub fn get_unique_by_type<T>(&self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let registry = self.registry.read();
        let mut candidates = registry.beans_by_type(TypeId::of::<T>());

        match candidates.len() {
            0 => Err(ContainerError::NoBeanOfType(type_name::<T>().to_string())),
            1 => {
                let bean = candidates.remove(0);
                bean.cast::<T>(&bean.resolve())
                    .ok_or_else(|| ContainerError::NoBeanOfType(type_name::<T>().to_string()))
            }
            _ => {
                let mut names: Vec<String> = candidates
                    .iter()
                    .map(|bean| bean.name().to_string())
                    .collect();
                names.sort();
                Err(ContainerError::AmbiguousBean {
                    type_name: type_name::<T>().to_string(),
                    candidates: names,
                })
            }
        }
    }

    /// 获取所有满足类型的 Bean，顺序不确定
    pub fn get_beans_by_type<T>(&self) -> Vec<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.registry
            .read()
            .beans_by_type(TypeId::of::<T>())
            .into_iter()
            .filter_map(|bean| bean.cast::<T>(&bean.resolve()))
            .collect()
    }

    /// 装配所有声明了注入点的 Bean
    ///
    /// 字段级问题默认只记录在报告中；严格模式下汇总为 `WiringFailed`。
    pub fn populate(&self) -> ContainerResult<WiringReport> {
        let registry = self.registry.write();
        tracing::info!("Populating container with {} bean(s)", registry.count());
        Injector::new(&registry, self.settings.strict).run()
    }

    /// 关闭容器，丢弃所有 Bean
    pub fn close(&self) -> ContainerResult<()> {
        let mut registry = self.registry.write();
        let count = registry.count();
        registry.clear();
        tracing::info!("Container closed, released {} bean(s)", count);
        Ok(())
    }

    /// 丢弃所有 Bean，与 `close` 相同但不记录关闭日志
    pub fn clear(&self) -> ContainerResult<()> {
        self.registry.write().clear();
        tracing::debug!("Container cleared");
        Ok(())
    }

    pub fn has(&self, name: &str) -> bool {
        self.registry.read().contains(name)
    }

    pub fn count(&self) -> usize {
        self.registry.read().count()
    }

    pub fn bean_names(&self) -> Vec<String> {
        self.registry.read().names()
    }

    pub fn lifecycle_of(&self, name: &str) -> Option<Lifecycle> {
        self.registry.read().get(name).map(|bean| bean.lifecycle())
    }

    // ========== 兼容旧接口 ==========

    /// 以类型名为名称注册服务
    pub fn register_service<T: Any + Send + Sync>(&self, service: T) -> ContainerResult<()> {
        self.provide(type_name::<T>(), service)
    }

    /// 以接口类型名为名称注册服务，同时声明该接口能力
    pub fn register_service_as<T, I, F>(&self, service: T, upcast: F) -> ContainerResult<()>
    where
        T: Any + Send + Sync,
        I: ?Sized + Send + Sync + 'static,
        F: Fn(Arc<T>) -> Arc<I> + Send + Sync + 'static,
    {
        self.register(BeanDefinition::new(type_name::<I>(), service).exposes(upcast))
    }

    /// 按类型名解析服务
    pub fn resolve<T>(&self) -> ContainerResult<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.get_as::<T>(type_name::<T>())
            .ok_or_else(|| ContainerError::BeanNotFound(type_name::<T>().to_string()))
    }

    pub fn has_service<T: ?Sized + 'static>(&self) -> bool {
        self.has(type_name::<T>())
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("settings", &self.settings)
            .field("bean_count", &self.count())
            .finish()
    }
}
