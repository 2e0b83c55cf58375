//! Client configuration.

use scout_core::{DEFAULT_RECONNECT_DELAY, Result, ScoutError, SessionConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Show malformed backend frames as error entries.
    #[serde(default)]
    pub surface_malformed_frames: bool,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_endpoint() -> String {
    "ws://localhost:8000/ws".to_string()
}

fn default_reconnect_delay_ms() -> u64 {
    DEFAULT_RECONNECT_DELAY.as_millis() as u64
}

fn default_event_capacity() -> usize {
    256
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            reconnect_delay_ms: default_reconnect_delay_ms(),
            surface_malformed_frames: false,
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    /// Load config from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ScoutError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| ScoutError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Load config from `config/default.toml`, then the user config
    /// directory, falling back to defaults.
    pub fn load() -> Result<Self> {
        for path in Self::search_paths() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        Ok(Config::default())
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config/default.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("scout").join("config.toml"));
        }
        paths
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            endpoint: self.endpoint.clone(),
            reconnect_delay: Duration::from_millis(self.reconnect_delay_ms),
            surface_malformed_frames: self.surface_malformed_frames,
            event_capacity: self.event_capacity,
        }
    }
}
