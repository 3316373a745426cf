use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use crate::config::{Environment, EnvironmentPropertySource, TomlPropertySource};
use crate::constants;
use crate::container::{Container, ContainerSettings};
use crate::error::ApplicationResult;
use crate::injector::WiringReport;
use crate::logging::LoggingConfig;

type Initializer = Box<dyn Fn(&Container, &Environment) -> ApplicationResult<()> + Send + Sync>;

/// 日志初始化方式
enum LoggingMode {
    /// 从环境变量与配置文件推导
    Auto,
    Explicit(LoggingConfig),
    Disabled,
}

/// 应用启动器
///
/// 加载配置、创建容器、按顺序执行初始化器注册 Bean，最后装配一次。
///
/// # 示例
///
/// ```ignore
/// let app = Application::new("demo")
///     .config_file("application.toml")
///     .initializer(|container, env| {
///         container.provide("config", env.bind::<AppConfig>("app")?)?;
///         Ok(())
///     })
///     .run()?;
/// ```
pub struct Application {
    /// 应用名称
    name: String,

    /// 配置文件路径
    config_files: Vec<String>,

    /// 环境变量前缀
    env_prefix: String,

    /// 激活的 profiles
    profiles: Vec<String>,

    show_banner: bool,

    logging: LoggingMode,

    /// 容器设置，未设置时从配置读取
    settings: Option<ContainerSettings>,

    /// 初始化器，按添加顺序执行
    initializers: Vec<Initializer>,
}

impl Application {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config_files: vec![constants::DEFAULT_CONFIG_FILE.to_string()],
            env_prefix: constants::DEFAULT_ENV_PREFIX.to_string(),
            profiles: Vec::new(),
            show_banner: false,
            logging: LoggingMode::Auto,
            settings: None,
            initializers: Vec::new(),
        }
    }

    /// 设置配置文件路径
    pub fn config_file(mut self, path: impl Into<String>) -> Self {
        self.config_files = vec![path.into()];
        self
    }

    /// 设置多个配置文件，后面的优先级更高
    pub fn config_files(mut self, paths: Vec<String>) -> Self {
        self.config_files = paths;
        self
    }

    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn profiles(mut self, profiles: Vec<String>) -> Self {
        self.profiles = profiles;
        self
    }

    pub fn banner(mut self, show: bool) -> Self {
        self.show_banner = show;
        self
    }

    /// 设置日志配置
    ///
    /// 不设置时依次参考环境变量（RUST_LOG / LOG_LEVEL / LOG_FORMAT）和配置文件
    pub fn logging(mut self, config: LoggingConfig) -> Self {
        self.logging = LoggingMode::Explicit(config);
        self
    }

    /// 不初始化日志系统（由宿主程序或测试自行处理）
    pub fn without_logging(mut self) -> Self {
        self.logging = LoggingMode::Disabled;
        self
    }

    pub fn settings(mut self, settings: ContainerSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// 添加初始化器
    pub fn initializer<F>(mut self, f: F) -> Self
    where
        F: Fn(&Container, &Environment) -> ApplicationResult<()> + Send + Sync + 'static,
    {
        self.initializers.push(Box::new(f));
        self
    }

    /// 运行应用
    pub fn run(self) -> ApplicationResult<RunningApplication> {
        let start_time = Instant::now();

        if self.show_banner {
            self.print_banner();
        }

        // 配置先于日志加载，日志配置可以来自配置文件
        let environment = Arc::new(Environment::new());
        let active_profiles = self.resolve_profiles();
        self.load_configurations(&environment, &active_profiles)?;
        environment.add_property_source(Box::new(EnvironmentPropertySource::new(
            &self.env_prefix,
        )));
        environment.set_active_profiles(active_profiles.clone());

        self.init_logging(&environment)?;

        tracing::info!("Starting {} application", self.name);
        if active_profiles.is_empty() {
            tracing::info!("No active profiles set, using default configuration");
        } else {
            tracing::info!("Active profiles: {:?}", active_profiles);
        }
        tracing::debug!("Environment variable prefix: {}", self.env_prefix);

        let settings = match self.settings {
            Some(settings) => settings,
            None => ContainerSettings::from_environment(&environment)?,
        };
        let container = Arc::new(Container::with_settings(settings));
        container.provide_shared(constants::ENVIRONMENT_BEAN_NAME, Arc::clone(&environment))?;
        tracing::info!("Container created (strict: {})", settings.strict);

        for (index, initializer) in self.initializers.iter().enumerate() {
            tracing::debug!("Running initializer #{}", index + 1);
            initializer(&container, &environment)?;
        }

        let report = container.populate()?;

        tracing::info!(
            "Started {} in {}ms ({} bean(s))",
            self.name,
            start_time.elapsed().as_millis(),
            container.count()
        );

        // 配置中的 app.name 优先于代码中的名称
        let name = environment
            .get_string(constants::APP_NAME_KEY)
            .unwrap_or(self.name);

        Ok(RunningApplication {
            name,
            container,
            environment,
            report,
        })
    }

    /// 代码设置优先，其次是环境变量 APP_PROFILES_ACTIVE
    fn resolve_profiles(&self) -> Vec<String> {
        if !self.profiles.is_empty() {
            return self.profiles.clone();
        }

        let variable = format!(
            "{}{}",
            self.env_prefix,
            constants::PROFILES_ACTIVE_KEY.replace('.', "_").to_uppercase()
        );
        std::env::var(variable)
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn init_logging(&self, environment: &Environment) -> ApplicationResult<()> {
        let config = match &self.logging {
            LoggingMode::Disabled => return Ok(()),
            LoggingMode::Explicit(config) => config.clone(),
            LoggingMode::Auto => {
                if environment.contains_key(constants::LOGGING_LEVEL_KEY)
                    || environment.contains_key(constants::LOGGING_FORMAT_KEY)
                {
                    LoggingConfig::from_environment(environment)
                } else {
                    LoggingConfig::from_env()
                }
            }
        };
        config.init()
    }

    /// 加载配置文件
    ///
    /// 加载顺序（优先级从低到高）：
    /// 1. application.toml
    /// 2. application-{profile}.toml
    fn load_configurations(
        &self,
        environment: &Environment,
        active_profiles: &[String],
    ) -> ApplicationResult<()> {
        for (index, base_config) in self.config_files.iter().enumerate() {
            self.try_load_config_file(environment, base_config, index as i32)?;
        }

        for (index, profile) in active_profiles.iter().enumerate() {
            for base_config in &self.config_files {
                let profile_config = profile_config_path(base_config, profile);
                self.try_load_config_file(environment, &profile_config, 10 + index as i32)?;
            }
        }

        Ok(())
    }

    /// 文件不存在时跳过，存在但无法解析时报错
    fn try_load_config_file(
        &self,
        environment: &Environment,
        config_file: &str,
        priority: i32,
    ) -> ApplicationResult<()> {
        if !Path::new(config_file).exists() {
            tracing::debug!("Configuration file not found: {}", config_file);
            return Ok(());
        }

        let source = TomlPropertySource::from_file(config_file)?;
        environment.add_property_source(Box::new(source.with_priority(priority)));
        tracing::debug!(
            "Loaded configuration from: {} (priority: {})",
            config_file,
            priority
        );
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(r"  _            _ _ _     ");
        println!(r" | |_ _ _ ___ | | (_)___ ");
        println!(r" |  _| '_/ -_)| | | (_-< ");
        println!(r"  \__|_| \___||_|_|_/__/ ");
        println!();
        println!("  :: {} ::  (trellis v{})", self.name, env!("CARGO_PKG_VERSION"));
        println!();
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new("application")
    }
}

/// 例如：application.toml -> application-dev.toml
fn profile_config_path(base_path: &str, profile: &str) -> String {
    match base_path.rfind('.') {
        Some(dot_pos) => {
            let (name, ext) = base_path.split_at(dot_pos);
            format!("{}-{}{}", name, profile, ext)
        }
        None => format!("{}-{}", base_path, profile),
    }
}

/// 已启动的应用
pub struct RunningApplication {
    name: String,
    container: Arc<Container>,
    environment: Arc<Environment>,
    report: WiringReport,
}

impl RunningApplication {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn container(&self) -> &Arc<Container> {
        &self.container
    }

    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    /// 启动时 `populate` 的结果
    pub fn wiring_report(&self) -> &WiringReport {
        &self.report
    }

    /// 关闭应用，释放容器中的所有 Bean
    pub fn shutdown(self) -> ApplicationResult<()> {
        tracing::info!("Shutting down {}", self.name);
        self.container.close()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApplicationError, ContainerError};
    use std::io::Write;

    fn temp_config(name: &str, content: &str) -> String {
        let path = std::env::temp_dir().join(format!("trellis-{}-{}.toml", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path.to_string_lossy().to_string()
    }

    #[test]
    fn test_profile_config_path() {
        assert_eq!(profile_config_path("application.toml", "dev"), "application-dev.toml");
        assert_eq!(profile_config_path("config/app.toml", "prod"), "config/app-prod.toml");
        assert_eq!(profile_config_path("settings", "test"), "settings-test");
    }

    #[test]
    fn test_run_registers_environment_and_runs_initializers() {
        let app = Application::new("test")
            .config_file("does-not-exist.toml")
            .env_prefix("TRELLIS_APP_TEST_NONE_")
            .without_logging()
            .initializer(|container, _env| {
                container.provide("greeting", "hello".to_string())?;
                Ok(())
            })
            .run()
            .unwrap();

        let container = app.container();
        assert!(container.has(constants::ENVIRONMENT_BEAN_NAME));
        assert_eq!(*container.get_as::<String>("greeting").unwrap(), "hello");
        assert!(app.wiring_report().is_clean());
        assert_eq!(app.name(), "test");

        let container = Arc::clone(container);
        app.shutdown().unwrap();
        assert_eq!(container.count(), 0);
    }

    #[test]
    fn test_config_file_and_profile_overlay() {
        let base = temp_config(
            "base",
            "[app]\nname = \"configured\"\n\n[server]\nport = 8080\nhost = \"localhost\"\n",
        );
        let overlay_path = profile_config_path(&base, "dev");
        std::fs::write(&overlay_path, "[server]\nport = 9090\n").unwrap();

        let app = Application::new("test")
            .config_file(base.clone())
            .profiles(vec!["dev".to_string()])
            .env_prefix("TRELLIS_APP_TEST_NONE_")
            .without_logging()
            .run()
            .unwrap();

        let env = app.environment();
        assert_eq!(env.get_i64("server.port"), Some(9090));
        assert_eq!(env.get_string("server.host"), Some("localhost".to_string()));
        assert!(env.accepts_profiles("dev"));
        assert_eq!(app.name(), "configured");

        std::fs::remove_file(base).unwrap();
        std::fs::remove_file(overlay_path).unwrap();
    }

    #[test]
    fn test_strict_settings_from_config_fail_startup() {
        let path = temp_config("strict", "[container]\nstrict = true\n");

        struct Needy {
            missing: crate::Autowired<u64>,
        }

        impl crate::Component for Needy {
            fn injection_points() -> Vec<crate::InjectionPoint<Self>> {
                vec![crate::InjectionPoint::<Self>::new("missing", Some("nothing"), |n| &n.missing)]
            }
        }

        let result = Application::new("test")
            .config_file(path.clone())
            .env_prefix("TRELLIS_APP_TEST_NONE_")
            .without_logging()
            .initializer(|container, _env| {
                container.provide_component("needy", Needy { missing: crate::Autowired::new() })?;
                Ok(())
            })
            .run();

        assert!(matches!(
            result,
            Err(ApplicationError::Container(ContainerError::WiringFailed { .. }))
        ));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn test_initializer_error_stops_startup() {
        let result = Application::new("test")
            .config_file("does-not-exist.toml")
            .env_prefix("TRELLIS_APP_TEST_NONE_")
            .without_logging()
            .initializer(|_container, _env| Err(anyhow::anyhow!("boom").into()))
            .run();

        match result {
            Err(ApplicationError::Other(e)) => assert_eq!(e.to_string(), "boom"),
            _ => panic!("expected initializer error"),
        }
    }
}
