//! Key/value storage port
//!
//! The token store persists its fields through this port. Backends must
//! make single-key reads and writes atomic; the batch operations must be
//! atomic as a whole so a token pair is never observed half-written.

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The backend cannot be reached or is not initialised.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Reading or writing the backing medium failed.
    #[error("I/O error: {0}")]
    Io(String),

    /// The backing data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// String key/value storage (browser-style local storage).
pub trait KeyValueStorage: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes a value. Deleting a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Reads several values as one snapshot.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Writes several values as one unit.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        entries
            .iter()
            .try_for_each(|(key, value)| self.set(key, value))
    }

    /// Deletes several values as one unit.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        keys.iter().try_for_each(|key| self.remove(key))
    }
}
