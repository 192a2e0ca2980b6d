//! Flat JSON-file key-value store.
//!
//! Each store is one JSON object on disk. The whole object is kept in memory
//! and rewritten on every `put`. Used for message counters, custom-role
//! mappings, persistent button definitions and the alt-account log.
//!
//! Writes go to a temporary file in the same directory that is then renamed
//! over the store, so the file on disk is always a complete document. When a
//! write fails the in-memory change is rolled back.

use crate::errors::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A JSON object persisted at `path`.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: Mutex<Map<String, Value>>,
}

impl JsonStore {
    /// Opens the store, creating the file with `{}` if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            if contents.trim().is_empty() {
                Map::new()
            } else {
                match serde_json::from_str::<Value>(&contents)? {
                    Value::Object(map) => map,
                    _ => {
                        return Err(Error::Config {
                            message: format!("{} does not contain a JSON object", path.display()),
                        });
                    }
                }
            }
        } else {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "{}")?;
            info!("Created empty store at {}", path.display());
            Map::new()
        };

        debug!("Opened store {} with {} keys", path.display(), data.len());
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    /// Where the store lives on disk.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the raw value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.lock().get(key).cloned()
    }

    /// Returns the value under `key` deserialized as `T`; `None` if missing or malformed.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    /// Stores `value` under `key` and writes the file.
    pub fn put(&self, key: &str, value: impl Serialize) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut data = self.lock();
        let previous = data.insert(key.to_string(), value);
        self.flush(&data).inspect_err(|_| restore(&mut data, key, previous))
    }

    /// Applies `f` to the value under `key` (`Value::Null` if missing) and writes the file.
    pub fn update<F>(&self, key: &str, f: F) -> Result<Value>
    where
        F: FnOnce(&mut Value),
    {
        let mut data = self.lock();
        let previous = data.get(key).cloned();
        let entry = data.entry(key.to_string()).or_insert(Value::Null);
        f(entry);
        let updated = entry.clone();
        self.flush(&data)
            .inspect_err(|_| restore(&mut data, key, previous))?;
        Ok(updated)
    }

    /// Removes `key`, returning its old value.
    pub fn remove(&self, key: &str) -> Result<Option<Value>> {
        let mut data = self.lock();
        let old = data.remove(key);
        if old.is_some() {
            self.flush(&data)
                .inspect_err(|_| restore(&mut data, key, old.clone()))?;
        }
        Ok(old)
    }

    /// All keys currently stored.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Map<String, Value>> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn flush(&self, data: &Map<String, Value>) -> Result<()> {
        let contents = serde_json::to_string_pretty(data)?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut file = NamedTempFile::new_in(dir)?;
        file.write_all(contents.as_bytes())?;
        file.as_file().sync_all()?;
        file.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Puts `key` back to what it held before a failed write.
fn restore(data: &mut Map<String, Value>, key: &str, previous: Option<Value>) {
    warn!("Store write failed, rolling back `{key}`");
    match previous {
        Some(value) => data.insert(key.to_string(), value),
        None => data.remove(key),
    };
}
