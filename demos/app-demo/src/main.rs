mod api;
mod config;
mod datastore;
mod service;

use std::sync::Arc;

use trellis_core::prelude::*;

use crate::api::{ApplicationApi, CreateApplication};
use crate::config::AppConfig;
use crate::datastore::{Datastore, DatastoreConfig, MemoryDatastore};
use crate::service::{ApplicationService, ApplicationServices};

// ==================== 容器初始化 ====================

/// 基础工具：配置
fn register_utilities(container: &Container, env: &Environment) -> ApplicationResult<()> {
    let config: AppConfig = env.bind("app")?;
    tracing::info!("Loaded configuration for {} v{}", config.name, config.version);
    container.provide("config", config)?;
    Ok(())
}

/// 基础设施：数据存储
fn register_infrastructure(container: &Container, env: &Environment) -> ApplicationResult<()> {
    let config: DatastoreConfig = env.bind("datastore")?;
    let store = MemoryDatastore::from_config(&config).map_err(anyhow::Error::from)?;
    tracing::info!("Using {} datastore", store.kind());

    container.register(
        BeanDefinition::new("datastore", store)
            .exposes(|s: Arc<MemoryDatastore>| s as Arc<dyn Datastore>),
    )?;
    Ok(())
}

/// 领域服务
fn register_domain_services(container: &Container, _env: &Environment) -> ApplicationResult<()> {
    container.register(
        BeanDefinition::component("", ApplicationService::default())
            .exposes(|s: Arc<ApplicationService>| s as Arc<dyn ApplicationServices>),
    )?;
    Ok(())
}

/// 接口组件
fn register_api_components(container: &Container, _env: &Environment) -> ApplicationResult<()> {
    container.provide_component("", ApplicationApi::default())?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let app = Application::new("app-demo")
        .config_file(concat!(env!("CARGO_MANIFEST_DIR"), "/application.toml"))
        .env_prefix("APP_DEMO_")
        .banner(true)
        .initializer(register_utilities)
        .initializer(register_infrastructure)
        .initializer(register_domain_services)
        .initializer(register_api_components)
        .run()?;

    let container = app.container();
    tracing::info!("Container holds {} beans: {:?}", container.count(), container.bean_names());

    let api = container
        .get_as::<ApplicationApi>("applicationApi")
        .context("applicationApi bean missing")?;

    for (name, description) in [
        ("billing", "Invoices and payments"),
        ("search", "Full text search"),
        ("", "rejected: empty name"),
    ] {
        let request = CreateApplication {
            name: name.to_string(),
            description: description.to_string(),
        };
        match api.create(request) {
            Ok(record) => tracing::info!("Created #{} {}", record.id, record.name),
            Err(e) => tracing::warn!("Create failed: {:#}", e),
        }
    }

    let billing = api.get("billing")?;
    tracing::info!("Found '{}': {}", billing.name, billing.description);

    for record in api.list()? {
        tracing::info!("  - #{} {} ({})", record.id, record.name, record.description);
    }

    app.shutdown()?;
    Ok(())
}
