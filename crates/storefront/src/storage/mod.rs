//! Device-local persistent storage.
//!
//! The storefront keeps two pieces of state outside the backend: the bearer
//! token and the anonymous cart. Both go through [`KeyValueStore`], a tiny
//! synchronous string store modelled on browser local storage.
//!
//! - [`FileStore`] - one JSON document per key under a data directory
//! - [`MemoryStore`] - process-local map, for tests and ephemeral sessions
//!
//! Stores are single-writer-assumed: two processes sharing a data directory
//! race, and the last writer wins.

mod file;

pub use file::FileStore;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

/// Errors raised by device storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("storage I/O error for key '{key}': {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized before writing.
    #[error("could not serialize value for key '{key}': {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// A stored value exists but does not decode.
    #[error("stored value for key '{key}' is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A synchronous string key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written or was removed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing medium cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value, replacing any previous one. Durable on return.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing medium cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Erase a key. Removing an absent key succeeds.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Io` if the backing medium cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shared handle to a store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Read and decode a JSON value.
///
/// # Errors
///
/// Returns `StorageError::Corrupt` if the stored text is not valid JSON for
/// `T`, or any error from the underlying store.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StorageError> {
    store
        .get(key)?
        .map(|raw| {
            serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
}

/// Encode and write a JSON value.
///
/// # Errors
///
/// Returns `StorageError::Serialize` if `value` cannot be encoded, or any
/// error from the underlying store.
pub fn save_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|source| StorageError::Serialize {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience constructor returning a [`SharedStore`].
    #[must_use]
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}
