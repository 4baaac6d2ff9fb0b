//! # emblem-store
//!
//! Durable key-value cache: one JSON document per key under a root
//! directory. There are no ordering or transaction guarantees beyond
//! per-key overwrite, which is all the bot needs for its two keys (the
//! joined-server marker and the rank registry snapshot).
//!
//! Writes go through a temp file plus rename so a crash never leaves a
//! half-written value behind.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("stored value could not be (de)serialized: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// File-backed key-value store rooted at one directory.
#[derive(Debug)]
pub struct Store {
    root: PathBuf,
}

impl Store {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn document(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    /// Persist `value` under `key`, overwriting any previous value.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let path = self.document(key);
        let staging = path.with_extension("json.part");
        fs::write(&staging, serde_json::to_vec_pretty(value)?)?;
        fs::rename(&staging, &path)?;
        tracing::debug!(key, path = %path.display(), "value saved");
        Ok(())
    }

    /// Load the value stored under `key`, or `None` if it was never saved.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let bytes = match fs::read(self.document(key)) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(error) => return Err(error.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    /// Forget the value stored under `key`. Purging an absent key is fine.
    pub fn purge(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.document(key)) {
            Ok(()) => {
                tracing::debug!(key, "value purged");
                Ok(())
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join("cache")).unwrap();
        (dir, store)
    }

    #[test]
    fn saved_values_round_trip() {
        let (_dir, store) = open_temp();
        store.save("server", &"srv-1".to_owned()).unwrap();
        assert_eq!(store.load::<String>("server").unwrap(), Some("srv-1".into()));
    }

    #[test]
    fn missing_keys_load_as_none() {
        let (_dir, store) = open_temp();
        assert_eq!(store.load::<String>("server").unwrap(), None);
    }

    #[test]
    fn save_overwrites_per_key() {
        let (_dir, store) = open_temp();
        store.save("server", &"old".to_owned()).unwrap();
        store.save("server", &"new".to_owned()).unwrap();
        assert_eq!(store.load::<String>("server").unwrap(), Some("new".into()));
    }

    #[test]
    fn purge_removes_the_value_and_is_idempotent() {
        let (_dir, store) = open_temp();
        store.save("server", &"srv-1".to_owned()).unwrap();
        store.purge("server").unwrap();
        assert_eq!(store.load::<String>("server").unwrap(), None);
        store.purge("server").unwrap();
    }

    #[test]
    fn structured_values_are_supported() {
        let (_dir, store) = open_temp();
        let snapshot = vec![
            serde_json::json!({"type": "realized", "name": "Red", "role_id": "role-1"}),
        ];
        store.save("registry", &snapshot).unwrap();
        let loaded: Option<Vec<serde_json::Value>> = store.load("registry").unwrap();
        assert_eq!(loaded, Some(snapshot));
    }
}
