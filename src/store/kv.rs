use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::StoreError;

/// String values stored under string keys.
pub trait KeyValueStore {
    /// Returns `None` when the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    /// Replaces the value; may fail with [`StoreError::QuotaExceeded`].
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;
    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Reads and decodes a JSON value. Missing keys, read errors and malformed
/// JSON all give `None`; the latter two are logged.
pub fn get_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match try_get_json(store, key) {
        Ok(value) => value,
        Err(e) => {
            crate::log(&format!("Failed to read '{}': {}", key, e));
            None
        }
    }
}

/// Like [`get_json`], but a failed read is returned instead of being treated
/// as a missing key. Malformed JSON still gives `None`.
pub fn try_get_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            crate::log(&format!("Ignoring malformed '{}': {}", key, e));
            Ok(None)
        }
    }
}

pub fn set_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// One `<key>.json` file per key inside a directory, with an optional limit
/// on the total size of all values.
pub struct JsonFileStore {
    dir: PathBuf,
    quota_bytes: Option<u64>,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: None,
        }
    }

    pub fn with_quota(dir: impl Into<PathBuf>, quota_bytes: u64) -> Self {
        Self {
            dir: dir.into(),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Bytes used by every value except `key`'s.
    fn used_bytes_excluding(&self, key: &str) -> Result<u64, StoreError> {
        let skip = self.path_for(key);
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut total = 0;
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path == skip || path.extension().is_none_or(|ext| ext != "json") {
                continue;
            }
            total += entry.metadata()?.len();
        }
        Ok(total)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(limit) = self.quota_bytes {
            let needed = self.used_bytes_excluding(key)? + value.len() as u64;
            if needed > limit {
                return Err(StoreError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        fs::create_dir_all(&self.dir)?;
        // Write then rename so a failed write never leaves a truncated value
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(value.as_bytes())?;
        tmp.persist(self.path_for(key)).map_err(|e| e.error)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_set_get_remove() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "[1,2]").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("[1,2]"));
        store.set("a", "[3]").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("[3]"));

        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        store.remove("a").unwrap();
    }

    #[test]
    fn test_json_helpers() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());

        set_json(&store, "numbers", &vec![1, 2, 3]).unwrap();
        let back: Option<Vec<i32>> = get_json(&store, "numbers");
        assert_eq!(back, Some(vec![1, 2, 3]));

        let missing: Option<Vec<i32>> = get_json(&store, "nothing");
        assert_eq!(missing, None);
    }

    #[test]
    fn test_malformed_json_falls_back() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::new(dir.path());
        store.set("numbers", "{ broken").unwrap();

        let back: Vec<i32> = get_json(&store, "numbers").unwrap_or_default();
        assert!(back.is_empty());
    }

    #[test]
    fn test_quota_exceeded() {
        let dir = tempdir().unwrap();
        let store = JsonFileStore::with_quota(dir.path(), 10);

        store.set("a", "12345").unwrap();
        let err = store.set("b", "123456").unwrap_err();
        assert!(matches!(
            err,
            StoreError::QuotaExceeded { needed: 11, limit: 10, .. }
        ));
        assert_eq!(store.get("b").unwrap(), None);

        // Replacing a value only counts the new size
        store.set("a", "1234567890").unwrap();
    }
}
