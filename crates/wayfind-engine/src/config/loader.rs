use super::schema::WayfindConfig;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from, in order:
    /// 1. the explicit path, if given (must exist)
    /// 2. ./wayfind.yaml
    /// 3. ~/.wayfind/config.yaml
    /// 4. Default configuration
    pub async fn load(explicit: Option<&Path>) -> Result<WayfindConfig, ConfigError> {
        match explicit {
            Some(path) => Self::load_from(path).await,
            None => Self::load_default().await,
        }
    }

    pub async fn load_default() -> Result<WayfindConfig, ConfigError> {
        let local_config = PathBuf::from("./wayfind.yaml");
        if local_config.exists() {
            return Self::load_from(&local_config).await;
        }

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".wayfind").join("config.yaml");
            if home_config.exists() {
                return Self::load_from(&home_config).await;
            }
        }

        Ok(WayfindConfig::default())
    }

    pub async fn load_from(path: &Path) -> Result<WayfindConfig, ConfigError> {
        debug!("Loading config from {}", path.display());
        let content = tokio::fs::read_to_string(path).await?;
        if content.trim().is_empty() {
            return Ok(WayfindConfig::default());
        }
        let config: WayfindConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
