//! Gateway configuration from environment variables

use std::path::PathBuf;

pub const DEFAULT_PORT: &str = "18610";
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_STORAGE_DIR: &str = "saved_calculations";
pub const DEFAULT_UI_DIR: &str = "ui/dist";

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub bind: String,
    pub port: String,
    pub storage_dir: PathBuf,
    pub ui_dir: PathBuf,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (the process environment in production)
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = lookup("LINK_GATEWAY_PORT")
            .or_else(|| lookup("PORT"))
            .unwrap_or_else(|| DEFAULT_PORT.to_string());

        Self {
            bind: lookup("LINK_GATEWAY_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string()),
            port,
            storage_dir: lookup("LINK_STORAGE_DIR")
                .unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string())
                .into(),
            ui_dir: lookup("LINK_UI_DIR")
                .unwrap_or_else(|| DEFAULT_UI_DIR.to_string())
                .into(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
