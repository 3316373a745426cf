use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::Deserialize;
use thiserror::Error;

/// 数据存储配置（`[datastore]`）
#[derive(Debug, Clone, Deserialize)]
pub struct DatastoreConfig {
    pub kind: String,
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    1000
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationRecord {
    pub id: u64,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatastoreError {
    #[error("record '{0}' already exists")]
    DuplicateKey(String),

    #[error("datastore is full ({0} records)")]
    Full(usize),

    #[error("unsupported datastore kind '{0}'")]
    UnsupportedKind(String),
}

/// 数据存储接口
pub trait Datastore: Send + Sync {
    fn kind(&self) -> &'static str;

    fn add(&self, name: &str, description: &str) -> Result<ApplicationRecord, DatastoreError>;

    fn get(&self, name: &str) -> Option<ApplicationRecord>;

    fn list(&self) -> Vec<ApplicationRecord>;
}

/// 内存存储
#[derive(Debug)]
pub struct MemoryDatastore {
    records: RwLock<Vec<ApplicationRecord>>,
    next_id: AtomicU64,
    max_records: usize,
}

impl MemoryDatastore {
    pub fn new(max_records: usize) -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            max_records,
        }
    }

    /// 按配置创建存储，目前只支持 memory
    pub fn from_config(config: &DatastoreConfig) -> Result<Self, DatastoreError> {
        match config.kind.as_str() {
            "memory" => Ok(Self::new(config.max_records)),
            other => Err(DatastoreError::UnsupportedKind(other.to_string())),
        }
    }
}

impl Datastore for MemoryDatastore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    fn add(&self, name: &str, description: &str) -> Result<ApplicationRecord, DatastoreError> {
        let mut records = self.records.write();
        if records.iter().any(|r| r.name == name) {
            return Err(DatastoreError::DuplicateKey(name.to_string()));
        }
        if records.len() >= self.max_records {
            return Err(DatastoreError::Full(self.max_records));
        }

        let record = ApplicationRecord {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: name.to_string(),
            description: description.to_string(),
        };
        records.push(record.clone());
        Ok(record)
    }

    fn get(&self, name: &str) -> Option<ApplicationRecord> {
        self.records.read().iter().find(|r| r.name == name).cloned()
    }

    fn list(&self) -> Vec<ApplicationRecord> {
        self.records.read().clone()
    }
}
