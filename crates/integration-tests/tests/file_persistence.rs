//! Integration tests for carts persisted to disk.
//!
//! Each test uses its own scratch directory, so they can run in parallel.

use std::sync::Arc;

use cartkeep_core::{CartState, ProductId};
use cartkeep_integration_tests::product;
use cartkeep_store::{CartError, CartStore, FileStore, KeyValueStore, Readiness, StoreConfig};
use serde_json::{Value, json};
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> StoreConfig {
    StoreConfig::default().with_storage_dir(dir.path())
}

async fn open(config: &StoreConfig) -> CartStore {
    let storage = Arc::new(FileStore::new(&config.storage_dir));
    CartStore::open(storage, config).await.expect("open store")
}

// =============================================================================
// Restart Tests
// =============================================================================

#[tokio::test]
async fn test_cart_survives_restart() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);

    let store = open(&config).await;
    store.add_to_cart(product("A")).await.expect("add A");
    store.add_to_cart(product("B")).await.expect("add B");
    store.add_to_cart(product("A")).await.expect("re-add A");
    let before = store.products();
    store.shutdown().await;

    let reopened = open(&config).await;
    assert_eq!(reopened.products(), before);
}

#[tokio::test]
async fn test_missing_directory_starts_empty() {
    let dir = TempDir::new().expect("temp dir");
    let store = open(&config_for(&dir)).await;

    assert!(store.products().is_empty());
    assert!(!dir.path().exists(), "nothing is written until a mutation");
}

#[tokio::test]
async fn test_persisted_file_uses_wire_field_names() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);

    let store = open(&config).await;
    store.add_to_cart(product("A")).await.expect("add");

    let raw = tokio::fs::read_to_string(dir.path().join("@MyCart.json"))
        .await
        .expect("cart file written");
    let value: Value = serde_json::from_str(&raw).expect("valid json");
    assert_eq!(
        value,
        json!([{
            "id": "A",
            "title": "Product A",
            "image_url": "https://img.example/A.png",
            "price": 9.99,
            "quantity": 1
        }])
    );
}

#[tokio::test]
async fn test_full_walkthrough_on_disk() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    let storage = FileStore::new(dir.path());
    let id = ProductId::new("A");

    let store = open(&config).await;
    store.add_to_cart(product("A")).await.expect("add");
    store.add_to_cart(product("A")).await.expect("re-add");
    store.decrement(id.clone()).await.expect("2 -> 1");
    store.decrement(id.clone()).await.expect("1 -> 0");

    let raw = storage.get("@MyCart").await.expect("get").expect("written");
    let on_disk = CartState::from_json(&raw).expect("valid");
    assert_eq!(on_disk.get(&id).map(|item| item.quantity), Some(0));

    store.decrement(id).await.expect("removed");
    let raw = storage.get("@MyCart").await.expect("get").expect("written");
    assert_eq!(raw, "[]");
}

// =============================================================================
// Corrupt Data Tests
// =============================================================================

#[tokio::test]
async fn test_corrupt_file_fails_open() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    let storage = FileStore::new(dir.path());
    storage
        .set("@MyCart", r#"{"not":"a cart"}"#)
        .await
        .expect("seed");

    let err = CartStore::open(Arc::new(storage), &config)
        .await
        .expect_err("corrupt");
    assert!(matches!(err, CartError::Deserialization(_)));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_corrupt_file_fails_background_hydration() {
    let dir = TempDir::new().expect("temp dir");
    let config = config_for(&dir);
    let storage = FileStore::new(dir.path());
    storage.set("@MyCart", "[1, 2, 3]").await.expect("seed");

    let store = CartStore::spawn(Arc::new(storage), &config).expect("spawn");
    assert!(store.products().is_empty());

    let err = store.ready().await.expect_err("corrupt");
    assert!(matches!(err, CartError::Hydration(_)));
    assert!(matches!(store.readiness(), Readiness::Failed(_)));
}

#[tokio::test]
async fn test_invalid_storage_key_is_persistence_error() {
    let dir = TempDir::new().expect("temp dir");
    let config = StoreConfig {
        storage_key: "../outside".to_string(),
        ..config_for(&dir)
    };

    let err = CartStore::open(Arc::new(FileStore::new(dir.path())), &config)
        .await
        .expect_err("bad key");
    assert!(matches!(err, CartError::Persistence(_)));
}
