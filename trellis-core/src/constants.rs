//! 框架使用的名称与配置键常量
//!
//! 容器、启动流程和示例程序共用这些标识符，避免各处硬编码。

/// Environment 在容器中的 Bean 名称
pub const ENVIRONMENT_BEAN_NAME: &str = "environment";

/// 默认配置文件
pub const DEFAULT_CONFIG_FILE: &str = "application.toml";

/// 默认环境变量前缀，例如 APP_SERVER_PORT -> server.port
pub const DEFAULT_ENV_PREFIX: &str = "APP_";

/// 激活的 profile 列表（逗号分隔或数组）
pub const PROFILES_ACTIVE_KEY: &str = "profiles.active";

/// 容器设置所在的配置段，例如 `[container] strict = true`
pub const CONTAINER_SECTION: &str = "container";

/// 日志级别与格式
pub const LOGGING_LEVEL_KEY: &str = "logging.level";
pub const LOGGING_FORMAT_KEY: &str = "logging.format";

/// 应用名称
pub const APP_NAME_KEY: &str = "app.name";
