// trellis-core: 两阶段依赖注入容器
//
// 先注册 Bean，再通过一次 populate 装配被标记的字段：
// - 按名称或按类型/能力查找
// - 单例、原型、会话、请求四种生命周期标签
// - 通过 #[derive(Component)] 生成注入点，不依赖运行时反射
// - 严格模式汇总所有装配问题
// - 没有全局容器，宿主程序自行创建并传递

pub mod app;
pub mod autowired;
pub mod bean;
pub mod component;
pub mod config;
pub mod constants;
pub mod container;
pub mod error;
pub mod injector;
pub mod lifecycle;
pub mod logging;
mod registry;

// 重新导出常用类型
pub use app::{Application, RunningApplication};
pub use autowired::Autowired;
pub use bean::{Bean, BeanDefinition, BeanFactoryFn, BeanInstance, TypeKey};
pub use component::{Component, InjectionPoint};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use container::{Container, ContainerSettings};
pub use error::{ApplicationError, ApplicationResult, ContainerError, ContainerResult};
pub use injector::{WiringIssue, WiringReport};
pub use lifecycle::Lifecycle;
pub use logging::{LogFormat, LogLevel, LoggingConfig};

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::app::{Application, RunningApplication};
    pub use crate::autowired::Autowired;
    pub use crate::bean::{BeanDefinition, BeanInstance};
    pub use crate::component::{Component, InjectionPoint};
    pub use crate::config::{self, ConfigValue, Environment, PropertySource};
    pub use crate::container::{Container, ContainerSettings};
    pub use crate::error::{ApplicationError, ApplicationResult, ContainerError, ContainerResult};
    pub use crate::injector::{WiringIssue, WiringReport};
    pub use crate::lifecycle::Lifecycle;
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    // Re-export anyhow for convenience
    pub use anyhow::{anyhow, Context};
}
