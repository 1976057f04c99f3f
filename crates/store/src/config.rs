//! Cart store configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `CART_STORAGE_KEY` - Storage slot holding the cart (default: `@MyCart`)
//! - `CART_STORAGE_DIR` - Directory used by the file backend (default: `.cartkeep`)
//! - `CART_QUEUE_CAPACITY` - Pending operations buffered ahead of the writer (default: 64)

use std::path::PathBuf;

use thiserror::Error;

/// Default storage slot for the cart.
pub const DEFAULT_STORAGE_KEY: &str = "@MyCart";

/// Default directory for the file-backed store.
pub const DEFAULT_STORAGE_DIR: &str = ".cartkeep";

/// Default capacity of the writer's operation queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Key of the slot the cart is persisted under
    pub storage_key: String,
    /// Base directory for [`FileStore`](crate::storage::FileStore)
    pub storage_dir: PathBuf,
    /// Bound on operations queued ahead of the writer task
    pub queue_capacity: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage_key = get_or_default(&lookup, "CART_STORAGE_KEY", DEFAULT_STORAGE_KEY);
        if storage_key.trim().is_empty() {
            return Err(ConfigError::InvalidEnvVar(
                "CART_STORAGE_KEY".to_string(),
                "must not be empty".to_string(),
            ));
        }

        let storage_dir =
            PathBuf::from(get_or_default(&lookup, "CART_STORAGE_DIR", DEFAULT_STORAGE_DIR));

        let queue_capacity = lookup("CART_QUEUE_CAPACITY")
            .map_or(Ok(DEFAULT_QUEUE_CAPACITY), |raw| raw.parse::<usize>())
            .map_err(|e| {
                ConfigError::InvalidEnvVar("CART_QUEUE_CAPACITY".to_string(), e.to_string())
            })?;
        if queue_capacity == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "CART_QUEUE_CAPACITY".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            storage_key,
            storage_dir,
            queue_capacity,
        })
    }

    /// Override the storage directory (e.g. from a CLI flag).
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }
}

/// Get a variable with a default value.
fn get_or_default<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).unwrap_or_else(|| default.to_string())
}
