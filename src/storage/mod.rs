//! Flat string-keyed local storage.
//!
//! Activities treat the store as opaque: values are strings, usually JSON.
//! Readers must survive missing or malformed entries, so [`read_json`]
//! substitutes the type's default instead of failing.

mod local_store;

pub use local_store::LocalStore;

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::Result;
use serde::{de::DeserializeOwned, Serialize};

const ENABLE_LOGS: bool = true;

use crate::log_warn;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Non-persistent store for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.entries.read().unwrap_or_else(|p| p.into_inner());
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(|p| p.into_inner());
        guard.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.entries.write().unwrap_or_else(|p| p.into_inner());
        guard.remove(key);
        Ok(())
    }
}

/// Decode a JSON value stored under `key`, falling back to `T::default()`
/// when the entry is absent or does not parse.
pub fn read_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = store.get(key) else {
        return T::default();
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(err) => {
            log_warn!("ignoring malformed entry under '{}': {}", key, err);
            T::default()
        }
    }
}

pub fn write_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let serialized = serde_json::to_string(value)?;
    store.set(key, serialized)
}
