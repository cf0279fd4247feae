use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

/// Storage file name in cache directory
const STORAGE_FILE: &str = "storage.json";

/// Persistent string key-value storage.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove every key in `keys`. Missing keys are not an error.
    async fn remove_many(&self, keys: &[&str]) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()> {
        self.remove_many(&[key]).await
    }
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

/// JSON file in the cache directory, rewritten on every change.
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(cache_dir: impl AsRef<Path>) -> Result<Self> {
        let path = cache_dir.as_ref().join(STORAGE_FILE);
        let entries = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read storage file")?;
            serde_json::from_str(&contents).context("Failed to parse storage file")?
        } else {
            HashMap::new()
        };
        debug!(?path, keys = entries.len(), "Storage opened");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents).context("Failed to write storage file")?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<()> {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() != before {
            self.persist(&entries)?;
        }
        Ok(())
    }
}
