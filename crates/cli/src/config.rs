use std::path::PathBuf;

use symbolart_client::config::{ConfigError, ServiceConfig};

/// Default directory exports are written into.
pub const DEFAULT_EXPORT_DIR: &str = ".";

/// Runtime configuration for the `symbolart` binary.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub service: ServiceConfig,
    /// Where `symbol_art.png` is saved (default: current directory).
    pub export_dir: PathBuf,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                | Default |
    /// |------------------------|---------|
    /// | `SYMBOLART_EXPORT_DIR` | `.`     |
    ///
    /// Service settings are documented on [`ServiceConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let service = ServiceConfig::from_lookup(&lookup)?;
        let export_dir = lookup("SYMBOLART_EXPORT_DIR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_EXPORT_DIR.to_string())
            .into();

        Ok(Self {
            service,
            export_dir,
        })
    }
}
