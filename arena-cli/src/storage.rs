//! Persistent key/value storage for session state.
//!
//! Writes never fail from the caller's point of view: the in-memory map is
//! the source of truth and [`FileStorage`] persists it on a best-effort
//! basis, logging when it can't.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::BTreeMap,
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

/// The storage keys. Only [`crate::session::Session`] reads or writes these.
pub mod keys {
    /// Bearer token sent with authenticated requests
    pub const ACCESS_TOKEN: &str = "access_token";
    /// Token exchanged for new access tokens
    pub const REFRESH_TOKEN: &str = "refresh_token";
    /// Cached profile of the signed-in user (JSON)
    pub const USER_DATA: &str = "user_data";
    /// Purpose of the pending one-time code
    pub const OTP_PURPOSE: &str = "otp_purpose";
    /// Where the pending one-time code was sent
    pub const OTP_IDENTIFIER: &str = "otp_identifier";
    /// Access token under its old name. Never written, cleared on logout.
    pub const LEGACY_TOKEN: &str = "token";
}

/// String key/value storage
pub trait Storage: Send + Sync + Debug {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;
    /// Write a value
    fn set(&self, key: &str, value: &str);
    /// Delete a value
    fn remove(&self, key: &str);
}

/// JSON helpers on top of [`Storage`]
pub trait StorageExt: Storage {
    /// Read and parse a JSON value. Unparseable values read as `None`.
    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key, %e, "Ignoring unparseable stored value");
                None
            }
        }
    }

    /// Serialize and write a JSON value
    fn set_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(raw) => self.set(key, &raw),
            Err(e) => tracing::warn!(key, %e, "Couldn't serialize value for storage"),
        }
    }
}

impl<S: Storage + ?Sized> StorageExt for S {}

/// Storage that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// All stored keys, sorted
    pub fn keys(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values.lock().remove(key);
    }
}

/// Storage backed by a JSON file, rewritten on every change
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file, starting empty if it doesn't exist yet
    /// or can't be parsed.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Creating storage directory {}", dir.display()))?;
        }

        let values = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(?path, %e, "Storage file is corrupt, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(?path, "No storage file yet, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Reading storage {}", path.display()))
            }
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Where the values are persisted
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) {
        let result = serde_json::to_string_pretty(values)
            .map_err(anyhow::Error::from)
            .and_then(|raw| Ok(fs::write(&self.path, raw)?));

        if let Err(e) = result {
            tracing::warn!(path = ?self.path, %e, "Couldn't persist storage");
        }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.persist(&values);
    }

    fn remove(&self, key: &str) {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.persist(&values);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use testresult::TestResult;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("arena-cli-storage-{}", std::process::id()))
            .join(name)
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();
        storage.set("a", "1");
        storage.set("b", "2");
        storage.remove("a");
        assert_eq!(storage.get("a"), None);
        assert_eq!(storage.get("b").as_deref(), Some("2"));
        assert_eq!(storage.keys(), vec!["b"]);
    }

    #[test]
    fn test_json_helpers() {
        let storage = MemoryStorage::new();
        storage.set_json("user", &json!({ "username": "player1" }));
        assert_eq!(
            storage.get_json::<serde_json::Value>("user"),
            Some(json!({ "username": "player1" }))
        );

        storage.set("broken", "{not json");
        assert_eq!(storage.get_json::<serde_json::Value>("broken"), None);
    }

    #[test]
    fn test_file_storage_persists() -> TestResult {
        let path = temp_file("persists.json");
        let _ = fs::remove_file(&path);

        let storage = FileStorage::open(&path)?;
        storage.set(keys::ACCESS_TOKEN, "a.b.c");
        storage.set(keys::REFRESH_TOKEN, "d.e.f");
        storage.remove(keys::REFRESH_TOKEN);
        drop(storage);

        let reopened = FileStorage::open(&path)?;
        assert_eq!(reopened.get(keys::ACCESS_TOKEN).as_deref(), Some("a.b.c"));
        assert_eq!(reopened.get(keys::REFRESH_TOKEN), None);

        fs::remove_file(&path)?;
        Ok(())
    }

    #[test]
    fn test_corrupt_file_starts_empty() -> TestResult {
        let path = temp_file("corrupt.json");
        fs::create_dir_all(path.parent().unwrap())?;
        fs::write(&path, "this isn't json")?;

        let storage = FileStorage::open(&path)?;
        assert_eq!(storage.get(keys::ACCESS_TOKEN), None);

        fs::remove_file(&path)?;
        Ok(())
    }
}
