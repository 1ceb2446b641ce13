//! Durable key-value storage for small client-side state.
//!
//! The cart and wishlist each persist one JSON blob under a fixed key. The
//! [`KeyValueStore`] trait is the seam: [`FileStore`] keeps blobs on disk for
//! CLI sessions, [`MemoryStore`] keeps them in memory for tests and
//! throwaway sessions. Writes are whole-value overwrites; last writer wins.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors that can occur when reading or writing stored values.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// Key contains characters that cannot be stored.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    /// In-memory store lock was poisoned by a panicking writer.
    #[error("Storage lock poisoned")]
    Poisoned,
}

/// A string-keyed store of string values.
pub trait KeyValueStore: Send + Sync {
    /// Read a value, `None` when the key was never written or was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Overwrite the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing store cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Read and decode a JSON value, falling back to `T::default()`.
///
/// Absent keys, read failures, and undecodable blobs all yield the default;
/// persisted client state is never worth failing a session over.
pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> T
where
    T: serde::de::DeserializeOwned + Default,
{
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to read stored value, starting empty");
            return T::default();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "discarding malformed stored value");
        T::default()
    })
}

/// Encode and overwrite a JSON value. Failures are logged, not returned.
pub fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T)
where
    T: serde::Serialize + ?Sized,
{
    let result = serde_json::to_string(value)
        .map_err(|e| e.to_string())
        .and_then(|json| store.set(key, &json).map_err(|e| e.to_string()));

    if let Err(e) = result {
        tracing::warn!(key, error = %e, "failed to persist value");
    }
}

/// Remove a stored value. Failures are logged, not returned.
pub fn remove_value(store: &dyn KeyValueStore, key: &str) {
    if let Err(e) = store.remove(key) {
        tracing::warn!(key, error = %e, "failed to remove stored value");
    }
}
