use serde::Deserialize;

/// 应用配置（`[app]`）
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "0.0.0".to_string()
}
