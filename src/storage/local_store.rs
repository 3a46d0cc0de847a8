use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs, path::PathBuf, sync::RwLock};

use super::KeyValueStore;

const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// File-backed key-value store. The whole map is rewritten as pretty JSON
/// on every mutation.
pub struct LocalStore {
    path: PathBuf,
    data: RwLock<BTreeMap<String, String>>,
}

impl LocalStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create storage directory {}", parent.display())
            })?;
        }

        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read local storage from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "local storage at {} is malformed ({}); starting empty",
                    path.display(),
                    err
                );
                BTreeMap::new()
            })
        } else {
            BTreeMap::new()
        };

        log_info!("Local storage opened at {} ({} keys)", path.display(), data.len());

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    fn persist(&self, data: &BTreeMap<String, String>) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write local storage to {}", self.path.display()))
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        let guard = self.data.read().unwrap_or_else(|p| p.into_inner());
        guard.get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(|p| p.into_inner());
        let mut next = guard.clone();
        next.insert(key.to_string(), value);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(|p| p.into_inner());
        if !guard.contains_key(key) {
            return Ok(());
        }
        let mut next = guard.clone();
        next.remove(key);
        self.persist(&next)?;
        *guard = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("playful-pause-test-{}", uuid::Uuid::new_v4()))
            .join("local_storage.json")
    }

    #[test]
    fn values_survive_reopen() {
        let path = scratch_path();
        {
            let store = LocalStore::open(path.clone()).unwrap();
            store.set("personalContext", "exam week".into()).unwrap();
        }

        let reopened = LocalStore::open(path.clone()).unwrap();
        assert_eq!(reopened.get("personalContext").as_deref(), Some("exam week"));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failed_write_keeps_previous_values() {
        let path = scratch_path();
        let store = LocalStore::open(path.clone()).unwrap();
        store.set("personalContext", "exam week".into()).unwrap();

        // Writes now have nowhere to go.
        fs::remove_dir_all(path.parent().unwrap()).unwrap();
        assert!(store.set("lastCreativeResponse", "a kite".into()).is_err());
        assert!(store.remove("personalContext").is_err());

        assert!(store.get("lastCreativeResponse").is_none());
        assert_eq!(store.get("personalContext").as_deref(), Some("exam week"));
    }

    #[test]
    fn malformed_file_opens_empty() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[[[").unwrap();

        let store = LocalStore::open(path.clone()).unwrap();
        assert!(store.get("anything").is_none());

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
