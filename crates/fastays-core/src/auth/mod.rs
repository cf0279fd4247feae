//! Authentication module for managing credentials and sessions.
//!
//! This module provides:
//! - `KeyValueStore`: Async key-value persistence with memory, file and keyring backends
//! - `SessionStore`: The credential record (bearer token, refresh token, user) on top of a store
//! - `sign_in` / `sign_out` / `check_auth`: Session lifecycle around the auth service

pub mod credentials;
pub mod flows;
pub mod session;
pub mod storage;

use std::sync::Arc;

use anyhow::Result;

use crate::config::{Config, StorageBackend};

pub use credentials::KeyringStore;
pub use flows::{check_auth, sign_in, sign_out};
pub use session::{
    SessionStore, AUTH_TOKEN_KEY, CREDENTIAL_KEYS, PHONE_NUMBER_KEY, REFRESH_TOKEN_KEY, USER_DATA_KEY,
};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// Open the key-value store selected by `config.storage`.
pub fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.storage {
        StorageBackend::Memory => Arc::new(MemoryStore::new()),
        StorageBackend::File => Arc::new(FileStore::open(config.cache_dir()?)?),
        StorageBackend::Keyring => Arc::new(KeyringStore::new()),
    };
    Ok(store)
}
