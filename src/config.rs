use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub poll: PollConfig,
    pub proxy: ProxyConfig,
    pub data: DataConfig,
}

/// Reconciliation polling configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Interval in seconds between silent pipeline refreshes.
    pub interval_secs: u64,
}

/// Edge proxy configuration (primary path for voice resolution).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Base URL of the serverless proxy in front of the voice providers.
    pub base_url: String,
    /// Per-request timeout in seconds for proxy and provider calls.
    pub request_timeout_secs: u64,
}

/// Data directory configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Override the default data directory.
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            proxy: ProxyConfig::default(),
            data: DataConfig::default(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 10 }
    }
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            base_url: "https://edge.reelsmith.app/functions/v1".to_string(),
            request_timeout_secs: 20,
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self { data_dir: None }
    }
}

impl AppConfig {
    /// Load configuration from `~/.config/reelsmith/config.toml`.
    /// Returns `Default` if the file is missing or unparseable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse {}: {e}", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Path to the config file, if a config directory can be determined.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("reelsmith").join("config.toml"))
    }

    /// Resolved data directory (config override, else `~/.local/share/reelsmith`).
    pub fn data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reelsmith")
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.proxy.request_timeout_secs.max(1))
    }
}
