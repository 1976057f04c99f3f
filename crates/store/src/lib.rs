//! cartkeep store - A shopping cart that survives restarts.
//!
//! [`CartStore`] holds the cart in memory and mirrors every change to a
//! durable key-value slot. It is created once per session and handed to
//! every consumer; there is no global instance.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use cartkeep_core::{LineItemInput, ProductId, UnitPrice};
//! use cartkeep_store::{CartStore, FileStore, StoreConfig};
//!
//! # async fn demo() -> cartkeep_store::Result<()> {
//! let config = StoreConfig::default();
//! let storage = Arc::new(FileStore::new(&config.storage_dir));
//! let cart = CartStore::open(storage, &config).await?;
//!
//! cart.add_to_cart(LineItemInput {
//!     id: ProductId::new("A"),
//!     title: "Widget".to_string(),
//!     image_url: "https://img.example/a.png".to_string(),
//!     unit_price: UnitPrice::new(9.99),
//! })
//! .await?;
//! cart.decrement("A").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`config`] - Environment-driven settings
//! - [`error`] - [`CartError`] and the crate `Result` alias
//! - [`storage`] - The [`KeyValueStore`] contract and its backends
//! - [`store`] - The single-writer [`CartStore`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod storage;
pub mod store;

pub use config::{ConfigError, StoreConfig};
pub use error::{CartError, Result};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use store::{CartStore, Readiness};
