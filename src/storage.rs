//! Local key/value storage backends.
//!
//! [`MemoryStorage`] stands in for browser local storage; [`FileStorage`]
//! keeps one JSON file per key in a directory. Both can enforce a byte
//! quota over the sum of stored values.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::StorageError;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

fn check_quota(quota: Option<usize>, used_elsewhere: usize, needed: usize) -> Result<(), StorageError> {
    match quota {
        Some(limit) if used_elsewhere + needed > limit => Err(StorageError::QuotaExceeded {
            needed,
            available: limit.saturating_sub(used_elsewhere),
        }),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let used: usize = self
            .entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum();
        check_quota(self.quota, used, value.len())?;
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    quota: Option<usize>,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    pub fn open(dir: impl Into<PathBuf>, quota: Option<usize>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, quota })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    fn used_bytes_except(&self, skip: &Path) -> Result<usize, StorageError> {
        let mut total = 0usize;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == skip || path.extension().map_or(true, |e| e != "json") {
                continue;
            }
            total += fs::metadata(&path)?.len() as usize;
        }
        Ok(total)
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        if self.quota.is_some() {
            let used = self.used_bytes_except(&path)?;
            check_quota(self.quota, used, value.len())?;
        }
        fs::write(&path, value)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("cvforge-storage-{}-{name}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn memory_quota_counts_other_keys() {
        let mut store = MemoryStorage::with_quota(10);
        store.set("a", "12345").unwrap();
        store.set("a", "1234567890").unwrap();
        let err = store.set("b", "x").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { needed: 1, available: 0 }));
    }

    #[test]
    fn file_storage_round_trip() {
        let dir = scratch_dir("round-trip");
        let mut store = FileStorage::open(&dir, None).unwrap();
        assert_eq!(store.get("cv-builder-draft-cv").unwrap(), None);
        store.set("cv-builder-draft-cv", "{}").unwrap();
        assert_eq!(store.get("cv-builder-draft-cv").unwrap().as_deref(), Some("{}"));
        store.remove("cv-builder-draft-cv").unwrap();
        store.remove("cv-builder-draft-cv").unwrap();
        assert_eq!(store.get("cv-builder-draft-cv").unwrap(), None);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_storage_rejects_path_keys() {
        let dir = scratch_dir("keys");
        let mut store = FileStorage::open(&dir, None).unwrap();
        assert!(matches!(store.set("../escape", "x"), Err(StorageError::InvalidKey(_))));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_storage_quota() {
        let dir = scratch_dir("quota");
        let mut store = FileStorage::open(&dir, Some(8)).unwrap();
        store.set("one", "12345").unwrap();
        assert!(matches!(store.set("two", "12345"), Err(StorageError::QuotaExceeded { .. })));
        let _ = fs::remove_dir_all(&dir);
    }
}
