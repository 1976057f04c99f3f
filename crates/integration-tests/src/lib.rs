//! Integration tests for cartkeep.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartkeep-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `cart_store` - Store behaviour against in-memory and faulty backends
//! - `file_persistence` - Carts surviving a restart on disk
//!
//! This crate also provides the shared fixtures those tests use.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use cartkeep_core::{LineItemInput, ProductId, UnitPrice};
use cartkeep_store::{KeyValueStore, MemoryStore, StorageError};
use tokio::sync::Notify;

/// Build a product input with predictable display fields.
#[must_use]
pub fn product(id: &str) -> LineItemInput {
    LineItemInput {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        image_url: format!("https://img.example/{id}.png"),
        unit_price: UnitPrice::new(9.99),
    }
}

/// In-memory store whose writes can be made to fail on demand.
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl FlakyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set` calls fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend("disk full".to_string()));
        }
        self.inner.set(key, value).await?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}

/// In-memory store whose writes can be held at the door.
///
/// While closed, each `set` signals [`GatedStore::write_started`] and then
/// waits for [`GatedStore::open_gate`] before writing.
#[derive(Default)]
pub struct GatedStore {
    inner: MemoryStore,
    closed: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl GatedStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold subsequent writes until [`GatedStore::open_gate`].
    pub fn close_gate(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Let held and future writes through.
    pub fn open_gate(&self) {
        self.closed.store(false, Ordering::SeqCst);
        self.release.notify_one();
    }

    /// Resolves once a write is waiting at the closed gate.
    pub async fn write_started(&self) {
        self.entered.notified().await;
    }
}

#[async_trait]
impl KeyValueStore for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.closed.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key).await
    }
}
