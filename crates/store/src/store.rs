//! The persistent cart store.
//!
//! [`CartStore`] is a cheaply cloneable handle to a single writer task. All
//! mutations are queued to that task, which applies them one at a time:
//! compute the next [`CartState`], write it to storage, then publish it to
//! readers. Two operations issued back to back therefore both take effect,
//! in submission order, even if neither caller awaits the other.
//!
//! Readers see the last committed snapshot through [`CartStore::products`]
//! or a [`watch`] subscription. Until hydration finishes that snapshot is
//! the empty cart.

use std::sync::Arc;

use cartkeep_core::{CartState, LineItemInput, ProductId};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, instrument, warn};

use crate::config::StoreConfig;
use crate::error::{CartError, Result};
use crate::storage::KeyValueStore;

/// Hydration progress of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Persisted state is still being loaded.
    Hydrating,
    /// Persisted state has been loaded; operations are being applied.
    Ready,
    /// Loading failed; every operation reports this message.
    Failed(String),
}

/// A mutation applied by the writer task.
#[derive(Debug)]
enum Operation {
    Add(LineItemInput),
    Increment(ProductId),
    Decrement(ProductId),
}

enum Command {
    Apply {
        op: Operation,
        reply: oneshot::Sender<Result<CartState>>,
    },
    Shutdown {
        done: oneshot::Sender<()>,
    },
}

/// Handle to a persistent shopping cart.
///
/// This struct is cheaply cloneable via `Arc`; every clone talks to the same
/// writer task and observes the same state.
#[derive(Clone)]
pub struct CartStore {
    inner: Arc<CartStoreInner>,
}

struct CartStoreInner {
    commands: mpsc::Sender<Command>,
    state: watch::Receiver<CartState>,
    readiness: watch::Receiver<Readiness>,
    storage_key: String,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("storage_key", &self.inner.storage_key)
            .field("readiness", &*self.inner.readiness.borrow())
            .field("items", &self.inner.state.borrow().len())
            .finish()
    }
}

impl CartStore {
    /// Open a store, waiting for persisted state to load.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Setup`] outside a Tokio runtime,
    /// [`CartError::Persistence`] if the slot cannot be read, and
    /// [`CartError::Deserialization`] if it holds something other than a
    /// cart.
    #[instrument(skip(storage, config), fields(key = %config.storage_key))]
    pub async fn open(storage: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Result<Self> {
        ensure_runtime()?;

        let state = hydrate(storage.as_ref(), &config.storage_key).await?;
        info!(items = state.len(), "Cart hydrated");

        let (store, channels) = Self::handle(config, state.clone(), Readiness::Ready);
        let writer = Writer {
            storage,
            storage_key: config.storage_key.clone(),
            state,
            state_tx: channels.state_tx,
        };
        tokio::spawn(writer.run(channels.commands_rx));

        Ok(store)
    }

    /// Start a store without waiting for persisted state to load.
    ///
    /// The returned store reports an empty cart until hydration completes.
    /// Operations submitted meanwhile are queued and applied to the hydrated
    /// state. Use [`CartStore::ready`] to wait for, and check, hydration.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Setup`] when called outside a Tokio runtime.
    pub fn spawn(storage: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Result<Self> {
        ensure_runtime()?;

        let (store, channels) = Self::handle(config, CartState::empty(), Readiness::Hydrating);
        let storage_key = config.storage_key.clone();

        info!(key = %storage_key, "Spawning background cart hydration");
        tokio::spawn(async move {
            let Channels {
                commands_rx,
                state_tx,
                readiness_tx,
            } = channels;

            match hydrate(storage.as_ref(), &storage_key).await {
                Ok(state) => {
                    info!(items = state.len(), "Cart hydrated");
                    state_tx.send_replace(state.clone());
                    readiness_tx.send_replace(Readiness::Ready);
                    let writer = Writer {
                        storage,
                        storage_key,
                        state,
                        state_tx,
                    };
                    writer.run(commands_rx).await;
                }
                Err(e) => {
                    error!(error = %e, "Failed to hydrate cart");
                    let message = e.to_string();
                    readiness_tx.send_replace(Readiness::Failed(message.clone()));
                    reject_all(commands_rx, &message).await;
                }
            }
        });

        Ok(store)
    }

    fn handle(config: &StoreConfig, initial: CartState, readiness: Readiness) -> (Self, Channels) {
        let (commands_tx, commands_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(initial);
        let (readiness_tx, readiness_rx) = watch::channel(readiness);

        let store = Self {
            inner: Arc::new(CartStoreInner {
                commands: commands_tx,
                state: state_rx,
                readiness: readiness_rx,
                storage_key: config.storage_key.clone(),
            }),
        };
        let channels = Channels {
            commands_rx,
            state_tx,
            readiness_tx,
        };
        (store, channels)
    }

    /// Wait until hydration has finished.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Hydration`] if loading failed, or
    /// [`CartError::Setup`] if the writer stopped before finishing.
    pub async fn ready(&self) -> Result<()> {
        let mut readiness = self.inner.readiness.clone();
        let outcome = readiness
            .wait_for(|r| *r != Readiness::Hydrating)
            .await
            .map(|r| (*r).clone());

        match outcome {
            Ok(Readiness::Failed(message)) => Err(CartError::Hydration(message)),
            Ok(_) => Ok(()),
            Err(_) => Err(CartError::Setup(
                "writer stopped before hydration completed".to_string(),
            )),
        }
    }

    /// Current hydration progress.
    #[must_use]
    pub fn readiness(&self) -> Readiness {
        self.inner.readiness.borrow().clone()
    }

    /// Snapshot of the cart as last committed.
    #[must_use]
    pub fn products(&self) -> CartState {
        self.inner.state.borrow().clone()
    }

    /// Subscribe to committed snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.inner.state.clone()
    }

    /// Storage key this cart is persisted under.
    #[must_use]
    pub fn storage_key(&self) -> &str {
        &self.inner.storage_key
    }

    /// Add a product to the cart.
    ///
    /// New products are appended with a quantity of one; products already
    /// in the cart are incremented instead.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Persistence`] if the write fails, or
    /// [`CartError::Setup`] if the store has shut down.
    pub async fn add_to_cart(&self, input: LineItemInput) -> Result<CartState> {
        self.apply(Operation::Add(input)).await
    }

    /// Increase a product's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart.
    /// Otherwise as [`CartStore::add_to_cart`].
    pub async fn increment(&self, id: impl Into<ProductId>) -> Result<CartState> {
        self.apply(Operation::Increment(id.into())).await
    }

    /// Decrease a product's quantity by one.
    ///
    /// An item whose quantity drops to zero stays in the cart; it is removed
    /// by the next decrement.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotFound`] if the product is not in the cart.
    /// Otherwise as [`CartStore::add_to_cart`].
    pub async fn decrement(&self, id: impl Into<ProductId>) -> Result<CartState> {
        self.apply(Operation::Decrement(id.into())).await
    }

    /// Stop the writer after it finishes the operations queued so far.
    ///
    /// Later operations fail with [`CartError::Setup`]. Shutting down a
    /// store that is already stopped does nothing.
    pub async fn shutdown(&self) {
        let (done, finished) = oneshot::channel();
        if self
            .inner
            .commands
            .send(Command::Shutdown { done })
            .await
            .is_ok()
        {
            let _ = finished.await;
        }
    }

    /// Whether the writer task has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.commands.is_closed()
    }

    async fn apply(&self, op: Operation) -> Result<CartState> {
        let (reply, response) = oneshot::channel();
        self.inner
            .commands
            .send(Command::Apply { op, reply })
            .await
            .map_err(|_| closed())?;
        response.await.map_err(|_| closed())?
    }
}

struct Channels {
    commands_rx: mpsc::Receiver<Command>,
    state_tx: watch::Sender<CartState>,
    readiness_tx: watch::Sender<Readiness>,
}

/// Owns the cart state and is the only code that writes it.
struct Writer {
    storage: Arc<dyn KeyValueStore>,
    storage_key: String,
    state: CartState,
    state_tx: watch::Sender<CartState>,
}

impl Writer {
    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Apply { op, reply } => {
                    let result = self.handle(op).await;
                    // The caller may have stopped waiting; the change stands.
                    let _ = reply.send(result);
                }
                Command::Shutdown { done } => {
                    info!(items = self.state.len(), "Cart store shutting down");
                    let _ = done.send(());
                    break;
                }
            }
        }
    }

    #[instrument(skip(self), fields(key = %self.storage_key))]
    async fn handle(&mut self, op: Operation) -> Result<CartState> {
        let next = match op {
            Operation::Add(input) => {
                if self.state.contains(&input.id) {
                    debug!(id = %input.id, "Product already in cart, incrementing");
                }
                self.state.with_added(input)
            }
            Operation::Increment(id) => self
                .state
                .with_incremented(&id)
                .inspect_err(|e| warn!(error = %e, "Increment of missing product"))?,
            Operation::Decrement(id) => self
                .state
                .with_decremented(&id)
                .inspect_err(|e| warn!(error = %e, "Decrement of missing product"))?,
        };

        self.commit(next).await
    }

    /// Persist `next`, then make it the visible state.
    ///
    /// On a failed write the previous state stays in place.
    async fn commit(&mut self, next: CartState) -> Result<CartState> {
        let raw = next.to_json().map_err(CartError::Serialization)?;

        if let Err(e) = self.storage.set(&self.storage_key, &raw).await {
            error!(error = %e, "Failed to persist cart");
            return Err(e.into());
        }

        debug!(
            items = next.len(),
            units = next.item_count(),
            "Cart committed"
        );
        self.state = next.clone();
        self.state_tx.send_replace(next.clone());
        Ok(next)
    }
}

/// Answer every queued operation with the hydration failure.
async fn reject_all(mut commands: mpsc::Receiver<Command>, message: &str) {
    while let Some(command) = commands.recv().await {
        match command {
            Command::Apply { reply, .. } => {
                let _ = reply.send(Err(CartError::Hydration(message.to_string())));
            }
            Command::Shutdown { done } => {
                let _ = done.send(());
                break;
            }
        }
    }
}

/// Load the persisted cart, or an empty one if nothing is stored.
async fn hydrate(storage: &dyn KeyValueStore, key: &str) -> Result<CartState> {
    match storage.get(key).await? {
        Some(raw) if !raw.is_empty() => {
            CartState::from_json(&raw).map_err(CartError::Deserialization)
        }
        _ => Ok(CartState::empty()),
    }
}

fn ensure_runtime() -> Result<()> {
    tokio::runtime::Handle::try_current()
        .map(|_| ())
        .map_err(|_| CartError::Setup("must be created inside a Tokio runtime".to_string()))
}

fn closed() -> CartError {
    CartError::Setup("cart store has shut down".to_string())
}

#[cfg(test)]
mod tests {
    use cartkeep_core::UnitPrice;

    use super::*;
    use crate::storage::MemoryStore;

    const KEY: &str = "@MyCart";

    fn product(id: &str) -> LineItemInput {
        LineItemInput {
            id: ProductId::new(id),
            title: "Widget".to_string(),
            image_url: "u".to_string(),
            unit_price: UnitPrice::new(9.99),
        }
    }

    fn quantities(state: &CartState) -> Vec<(String, u32)> {
        state
            .iter()
            .map(|item| (item.id.to_string(), item.quantity))
            .collect()
    }

    async fn persisted(storage: &MemoryStore) -> CartState {
        let raw = storage.get(KEY).await.expect("get").expect("slot written");
        CartState::from_json(&raw).expect("valid cart")
    }

    #[tokio::test]
    async fn test_open_on_empty_slot_is_empty() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage, &StoreConfig::default())
            .await
            .expect("open");

        assert!(store.products().is_empty());
        assert_eq!(store.readiness(), Readiness::Ready);
        store.ready().await.expect("ready");
    }

    #[tokio::test]
    async fn test_scenario_add_add_decrement_three_times() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage.clone(), &StoreConfig::default())
            .await
            .expect("open");

        let state = store.add_to_cart(product("A")).await.expect("add");
        assert_eq!(quantities(&state), vec![("A".to_string(), 1)]);

        let state = store.add_to_cart(product("A")).await.expect("re-add");
        assert_eq!(quantities(&state), vec![("A".to_string(), 2)]);

        let state = store.decrement("A").await.expect("decrement");
        assert_eq!(quantities(&state), vec![("A".to_string(), 1)]);

        let state = store.decrement("A").await.expect("decrement");
        assert_eq!(quantities(&state), vec![("A".to_string(), 0)]);
        assert_eq!(persisted(&storage).await, state);

        let state = store.decrement("A").await.expect("decrement");
        assert!(state.is_empty());
        assert!(persisted(&storage).await.is_empty());
        assert_eq!(store.products(), state);
    }

    #[tokio::test]
    async fn test_every_mutation_is_persisted() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage.clone(), &StoreConfig::default())
            .await
            .expect("open");

        store.add_to_cart(product("A")).await.expect("add");
        assert_eq!(persisted(&storage).await, store.products());

        store.add_to_cart(product("B")).await.expect("add");
        store.increment("B").await.expect("increment");
        assert_eq!(persisted(&storage).await, store.products());
        assert_eq!(
            quantities(&store.products()),
            vec![("A".to_string(), 1), ("B".to_string(), 2)]
        );
    }

    #[tokio::test]
    async fn test_missing_id_is_not_found_and_writes_nothing() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage.clone(), &StoreConfig::default())
            .await
            .expect("open");

        let err = store.increment("ghost").await.expect_err("absent");
        assert!(matches!(err, CartError::NotFound(ref id) if id.as_str() == "ghost"));

        let err = store.decrement("ghost").await.expect_err("absent");
        assert!(matches!(err, CartError::NotFound(_)));

        assert_eq!(storage.get(KEY).await.expect("get"), None);
    }

    #[tokio::test]
    async fn test_unawaited_operations_do_not_lose_updates() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage.clone(), &StoreConfig::default())
            .await
            .expect("open");

        let (a, b, c) = tokio::join!(
            store.add_to_cart(product("A")),
            store.add_to_cart(product("B")),
            store.add_to_cart(product("A")),
        );
        a.expect("add A");
        b.expect("add B");
        c.expect("re-add A");

        let state = store.products();
        assert_eq!(state.len(), 2);
        assert_eq!(state.item_count(), 3);
        assert_eq!(persisted(&storage).await, state);
    }

    #[tokio::test]
    async fn test_subscribers_see_committed_snapshots() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage, &StoreConfig::default())
            .await
            .expect("open");
        let mut updates = store.subscribe();

        store.add_to_cart(product("A")).await.expect("add");
        updates.changed().await.expect("writer alive");
        assert_eq!(updates.borrow_and_update().len(), 1);
    }

    #[tokio::test]
    async fn test_spawn_hydrates_in_background() {
        let seeded = CartState::empty().with_added(product("A")).with_added(product("A"));
        let storage = Arc::new(MemoryStore::with_entry(
            KEY,
            seeded.to_json().expect("serialize"),
        ));

        let store = CartStore::spawn(storage, &StoreConfig::default()).expect("spawn");
        // Queued before hydration is observed; applied on top of it.
        let state = store.increment("A").await.expect("increment");
        assert_eq!(quantities(&state), vec![("A".to_string(), 3)]);

        store.ready().await.expect("ready");
        assert_eq!(store.products(), state);
    }

    #[tokio::test]
    async fn test_spawn_with_corrupt_slot_fails_every_operation() {
        let storage = Arc::new(MemoryStore::with_entry(KEY, "{not a cart"));
        let store = CartStore::spawn(storage, &StoreConfig::default()).expect("spawn");

        let err = store.ready().await.expect_err("corrupt slot");
        assert!(matches!(err, CartError::Hydration(_)));
        assert!(matches!(store.readiness(), Readiness::Failed(_)));

        let err = store.add_to_cart(product("A")).await.expect_err("unusable");
        assert!(err.is_fatal());
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_open_with_corrupt_slot_is_deserialization_error() {
        let storage = Arc::new(MemoryStore::with_entry(KEY, "[{\"id\":1}]"));
        let err = CartStore::open(storage, &StoreConfig::default())
            .await
            .expect_err("corrupt slot");
        assert!(matches!(err, CartError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_empty_string_slot_hydrates_empty() {
        let storage = Arc::new(MemoryStore::with_entry(KEY, ""));
        let store = CartStore::open(storage, &StoreConfig::default())
            .await
            .expect("open");
        assert!(store.products().is_empty());
    }

    #[tokio::test]
    async fn test_operations_after_shutdown_are_setup_errors() {
        let storage = Arc::new(MemoryStore::new());
        let store = CartStore::open(storage, &StoreConfig::default())
            .await
            .expect("open");

        store.add_to_cart(product("A")).await.expect("add");
        store.shutdown().await;
        store.shutdown().await;

        let err = store.increment("A").await.expect_err("closed");
        assert!(matches!(err, CartError::Setup(_)));
        assert!(store.is_closed());
        // Last committed snapshot remains readable.
        assert_eq!(store.products().len(), 1);
    }

    #[test]
    fn test_spawn_outside_runtime_is_setup_error() {
        let storage = Arc::new(MemoryStore::new());
        let err = CartStore::spawn(storage, &StoreConfig::default()).expect_err("no runtime");
        assert!(matches!(err, CartError::Setup(_)));
    }
}
