//! Durable key-value storage backends.
//!
//! The cart store persists its whole state as one string value under one
//! key. Any backend implementing [`KeyValueStore`] can hold it:
//!
//! - [`MemoryStore`] - in-process map for tests and throwaway sessions
//! - [`FileStore`] - one JSON file per key under a base directory

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use async_trait::async_trait;

/// Errors raised by storage backends.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Underlying I/O failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The key cannot be used by this backend.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Failure reported by a backend outside this crate (e.g. a platform
    /// keychain or remote store) that has no I/O error to wrap.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Asynchronous string key-value store.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}
