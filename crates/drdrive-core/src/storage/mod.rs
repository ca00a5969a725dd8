//! Durable key-value storage for session data.
//!
//! The session manager persists two string values (the bearer token and the
//! serialized user) through the `KeyValueStore` trait. Implementations:
//!
//! - `FileStore`: one file per key in the data directory
//! - `KeyringStore`: OS credential store via `keyring`
//! - `MemoryStore`: in-process map for embedding and tests

pub mod file;
pub mod keychain;
pub mod memory;

use std::sync::Arc;

use anyhow::Result;

pub use self::file::FileStore;
pub use self::keychain::KeyringStore;
pub use self::memory::MemoryStore;

use crate::config::{Config, StorageBackend, APP_NAME};

/// String key-value store that survives process restarts.
///
/// Removing a key that is not present succeeds.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Build the store selected in the configuration
pub fn open(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    let store: Arc<dyn KeyValueStore> = match config.storage {
        StorageBackend::File => Arc::new(FileStore::new(config.data_dir()?.join("session"))),
        StorageBackend::Keyring => Arc::new(KeyringStore::new(APP_NAME)),
    };
    Ok(store)
}
