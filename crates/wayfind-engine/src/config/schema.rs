use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WayfindConfig {
    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,
    #[serde(default = "default_memory_path")]
    pub memory_path: PathBuf,
    #[serde(default = "default_stats_path")]
    pub stats_path: PathBuf,
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub interstitials: InterstitialConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
}

impl Default for WayfindConfig {
    fn default() -> Self {
        Self {
            catalog_path: default_catalog_path(),
            memory_path: default_memory_path(),
            stats_path: default_stats_path(),
            log_dir: default_log_dir(),
            engine: EngineConfig::default(),
            interstitials: InterstitialConfig::default(),
            browser: BrowserConfig::default(),
        }
    }
}

fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".wayfind"))
        .unwrap_or_else(|| PathBuf::from("./.wayfind"))
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("./intents.json")
}

fn default_memory_path() -> PathBuf {
    data_dir().join("memory.json")
}

fn default_stats_path() -> PathBuf {
    data_dir().join("strategy_stats.json")
}

fn default_log_dir() -> PathBuf {
    data_dir().join("logs")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Wait budget for intents whose catalog entry sets no `timeout`.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long a click waits for navigation or DOM churn to settle.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_ms: default_settle_ms(),
        }
    }
}

impl EngineConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_settle_ms() -> u64 {
    500
}

/// Cookie banners and popups dismissed before the requested intent runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterstitialConfig {
    #[serde(default = "default_interstitials_enabled")]
    pub enabled: bool,
    #[serde(default = "default_interstitial_intents")]
    pub intents: Vec<String>,
    #[serde(default = "default_interstitial_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for InterstitialConfig {
    fn default() -> Self {
        Self {
            enabled: default_interstitials_enabled(),
            intents: default_interstitial_intents(),
            timeout_ms: default_interstitial_timeout_ms(),
        }
    }
}

impl InterstitialConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_interstitials_enabled() -> bool {
    true
}

fn default_interstitial_intents() -> Vec<String> {
    vec!["accept_cookies".to_string(), "close_popup".to_string()]
}

fn default_interstitial_timeout_ms() -> u64 {
    1500
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrowserConfig {
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub user_data_dir: Option<PathBuf>,
}
