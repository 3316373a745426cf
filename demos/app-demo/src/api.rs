use std::sync::Arc;

use trellis_core::prelude::*;
use trellis_core_macros::Component;

use crate::datastore::ApplicationRecord;
use crate::service::ApplicationServices;

/// 创建请求
#[derive(Debug, Clone)]
pub struct CreateApplication {
    pub name: String,
    pub description: String,
}

/// 对外接口层，只依赖服务接口
#[derive(Component, Default)]
#[component("applicationApi")]
pub struct ApplicationApi {
    #[inject]
    service: Autowired<dyn ApplicationServices>,
}

impl ApplicationApi {
    fn service(&self) -> anyhow::Result<Arc<dyn ApplicationServices>> {
        Ok(self.service.require()?)
    }

    pub fn create(&self, request: CreateApplication) -> anyhow::Result<ApplicationRecord> {
        self.service()?
            .create(&request.name, &request.description)
            .with_context(|| format!("failed to create application '{}'", request.name))
    }

    pub fn get(&self, name: &str) -> anyhow::Result<ApplicationRecord> {
        self.service()?
            .find(name)?
            .ok_or_else(|| anyhow!("application '{}' not found", name))
    }

    pub fn list(&self) -> anyhow::Result<Vec<ApplicationRecord>> {
        self.service()?.list()
    }
}
