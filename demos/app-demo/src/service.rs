use anyhow::{ensure, Context};
use trellis_core::prelude::*;
use trellis_core_macros::Component;

use crate::config::AppConfig;
use crate::datastore::{ApplicationRecord, Datastore};

const MAX_NAME_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 500;

/// 应用领域服务接口
pub trait ApplicationServices: Send + Sync {
    fn create(&self, name: &str, description: &str) -> anyhow::Result<ApplicationRecord>;

    fn find(&self, name: &str) -> anyhow::Result<Option<ApplicationRecord>>;

    fn list(&self) -> anyhow::Result<Vec<ApplicationRecord>>;
}

#[derive(Component, Default)]
#[component("applicationService")]
pub struct ApplicationService {
    #[inject("datastore")]
    store: Autowired<dyn Datastore>,

    #[inject("config")]
    config: Autowired<AppConfig>,
}

impl ApplicationService {
    fn store(&self) -> anyhow::Result<std::sync::Arc<dyn Datastore>> {
        self.store
            .require()
            .context("application service used before the container was populated")
    }
}

impl ApplicationServices for ApplicationService {
    fn create(&self, name: &str, description: &str) -> anyhow::Result<ApplicationRecord> {
        ensure!(!name.trim().is_empty(), "application name is required");
        ensure!(name.len() <= MAX_NAME_LEN, "application name too long");
        ensure!(
            description.len() <= MAX_DESCRIPTION_LEN,
            "application description too long"
        );

        let record = self.store()?.add(name, description)?;
        tracing::info!(
            "[{}] created application '{}' (id {})",
            self.config.require()?.name,
            record.name,
            record.id
        );
        Ok(record)
    }

    fn find(&self, name: &str) -> anyhow::Result<Option<ApplicationRecord>> {
        Ok(self.store()?.get(name))
    }

    fn list(&self) -> anyhow::Result<Vec<ApplicationRecord>> {
        Ok(self.store()?.list())
    }
}
