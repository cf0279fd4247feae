//! Application configuration management.
//!
//! This module handles loading and saving the application configuration:
//! the API base URL and timeout, the query cache policy, which storage
//! backend holds credentials, and the last phone number used to sign in.
//!
//! Configuration is stored at `~/.config/fastays/config.json`. The
//! `FASTAYS_API_URL` and `FASTAYS_STORAGE` environment variables override
//! the file.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::query::QueryConfig;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "fastays";

/// Config file name
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_API_BASE_URL: &str = "https://api.fastays.com";

/// HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

pub const API_URL_ENV: &str = "FASTAYS_API_URL";
pub const STORAGE_ENV: &str = "FASTAYS_STORAGE";

/// Where the credential record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keyring,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(StorageBackend::File),
            "keyring" => Ok(StorageBackend::Keyring),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(anyhow::anyhow!("Unknown storage backend: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub query: QueryConfig,
    pub storage: StorageBackend,
    pub last_phone_number: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            query: QueryConfig::default(),
            storage: StorageBackend::default(),
            last_phone_number: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply `FASTAYS_API_URL` / `FASTAYS_STORAGE` on top of the file values
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                self.api_base_url = url.trim().to_string();
            }
        }
        if let Ok(storage) = std::env::var(STORAGE_ENV) {
            match storage.parse() {
                Ok(backend) => self.storage = backend,
                Err(e) => warn!(error = %e, "Ignoring {}", STORAGE_ENV),
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
