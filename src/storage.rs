//! Process-wide keyed state.
//!
//! Views that remember things between openings (applied filters, the last
//! discover URL) store them here. Reads and writes happen only at explicit
//! lifecycle points, e.g. [`FilterSet::restore`](crate::fetcher::FilterSet::restore)
//! when a view opens and [`FilterSet::persist`](crate::fetcher::FilterSet::persist)
//! when it closes.

use crate::error::StorageError;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

static GLOBAL: Lazy<KeyedStore> = Lazy::new(KeyedStore::new);

/// A string-to-string store shared by the views of one process.
#[derive(Debug, Default)]
pub struct KeyedStore {
    entries: RwLock<HashMap<String, String>>,
}

impl KeyedStore {
    /// An empty, private store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The store shared by the whole process.
    pub fn global() -> &'static KeyedStore {
        &GLOBAL
    }

    /// Raw value for `key`.
    pub fn load(&self, key: &str) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn save(&self, key: &str, value: impl Into<String>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    /// Removes `key`, returning its value.
    pub fn remove(&self, key: &str) -> Option<String> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }

    /// Stores `value` as JSON.
    pub fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let text = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;
        self.save(key, text);
        Ok(())
    }

    /// Reads a JSON value. `Ok(None)` when nothing is stored; a stored value
    /// that does not parse is an error, not an absence.
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(text) = self.load(key) else {
            return Ok(None);
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })
    }
}
