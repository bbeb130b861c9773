#![forbid(unsafe_code)]

//! Key-value storage for persisted sample settings.
//!
//! [`SettingsStorage`] is the seam the editor saves through. In a browser it
//! is session storage; [`MemoryStorage`] plays that role headless and
//! [`FileStorage`] keeps one JSON object file on disk.
//!
//! Values are JSON documents. [`load_object`] treats an unreadable or
//! corrupt entry as missing (logged), so a bad stored blob never blocks a
//! page from starting with defaults.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::PanelError;

/// String key-value storage.
pub trait SettingsStorage {
    /// The stored string for `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, PanelError>;
    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), PanelError>;
    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), PanelError>;
}

impl<T: SettingsStorage + ?Sized> SettingsStorage for Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, PanelError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PanelError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), PanelError> {
        (**self).remove(key)
    }
}

/// Load and decode the JSON object stored under `key`.
///
/// Returns `None` when the key is missing, unreadable or not valid JSON for
/// `T`; the latter two are logged.
pub fn load_object<T, S>(storage: &S, key: &str) -> Option<T>
where
    T: DeserializeOwned,
    S: SettingsStorage + ?Sized,
{
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(err) => {
            warn!(key, error = %err, "failed to read stored settings");
            return None;
        }
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, value = %raw, error = %err, "failed to parse stored settings");
            None
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Serialization or storage failure.
pub fn store_object<T, S>(storage: &S, key: &str, value: &T) -> Result<(), PanelError>
where
    T: Serialize + ?Sized,
    S: SettingsStorage + ?Sized,
{
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

/// Remove the object stored under `key`.
///
/// # Errors
///
/// Storage failure.
pub fn remove_object<S>(storage: &S, key: &str) -> Result<(), PanelError>
where
    S: SettingsStorage + ?Sized,
{
    storage.remove(key)
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-memory storage, scoped to its owner's lifetime.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStorage {
    /// Empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Whether `key` is stored.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl SettingsStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PanelError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PanelError> {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PanelError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// Storage backed by a single JSON object file (`{"key": "value", ...}`).
///
/// Every operation reads the file; writes replace it. A missing file is an
/// empty store.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, PanelError> {
        match fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), PanelError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl SettingsStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, PanelError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PanelError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_owned(), value.to_owned());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), PanelError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}
