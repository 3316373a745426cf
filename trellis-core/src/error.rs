//! 错误类型
//!
//! 容器层使用 `ContainerError`，启动层（配置、日志、初始化器）使用 `ApplicationError`。
//! 初始化器内部可以直接使用 `anyhow`，错误会被包装为 `ApplicationError::Other`。

use thiserror::Error;

use crate::injector::WiringIssue;

/// 容器错误
#[derive(Debug, Error)]
pub enum ContainerError {
    /// 同名 Bean 已存在（注册是“只创建一次”，不会覆盖）
    #[error("bean with name '{0}' already exists")]
    BeanAlreadyExists(String),

    #[error("bean '{0}' not found")]
    BeanNotFound(String),

    #[error("no bean found for type '{0}'")]
    NoBeanOfType(String),

    /// 按类型查找时命中多个 Bean
    #[error("{} beans satisfy type '{type_name}': {}", .candidates.len(), .candidates.join(", "))]
    AmbiguousBean {
        type_name: String,
        candidates: Vec<String>,
    },

    /// 声明的能力视图或注入点与 Bean 的实际类型不符
    #[error("bean '{bean}' declares '{declared}' for a value of type '{actual}'")]
    CapabilityMismatch {
        bean: String,
        declared: &'static str,
        actual: &'static str,
    },

    /// 使用时发现依赖未被注入
    #[error("dependency of type '{0}' has not been wired")]
    DependencyNotWired(&'static str),

    #[error("failed to inject dependencies for bean '{bean}': {reason}")]
    InjectionFailed { bean: String, reason: String },

    /// 严格模式下汇总的字段级问题
    #[error("wiring failed with {count} issue(s): {summary}")]
    WiringFailed {
        count: usize,
        summary: String,
        issues: Vec<WiringIssue>,
    },
}

impl ContainerError {
    pub(crate) fn wiring_failed(issues: Vec<WiringIssue>) -> Self {
        let summary = issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        Self::WiringFailed {
            count: issues.len(),
            summary,
            issues,
        }
    }
}

pub type ContainerResult<T> = Result<T, ContainerError>;

/// 应用启动错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("failed to load configuration: {0}")]
    Config(String),

    #[error("failed to bind configuration section '{prefix}': {source}")]
    Bind {
        prefix: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;
