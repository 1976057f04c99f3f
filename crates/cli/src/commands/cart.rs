//! Cart commands.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! cartkeep list
//!
//! # Add a product (re-adding increments)
//! cartkeep add --id A --title Widget --image-url https://img.example/a.png --price 9.99
//!
//! # Change quantities
//! cartkeep increment A
//! cartkeep decrement A
//!
//! # Forget the stored cart
//! cartkeep clear
//! ```
//!
//! # Environment Variables
//!
//! - `CART_STORAGE_KEY` - Storage slot (default: `@MyCart`)
//! - `CART_STORAGE_DIR` - Directory holding the cart file (default: `.cartkeep`)

use std::io::Write;
use std::sync::Arc;

use cartkeep_core::{CartState, LineItemInput, ProductId, UnitPrice};
use cartkeep_store::{CartStore, FileStore, KeyValueStore, StoreConfig};
use tracing::info;

use super::CommandError;

/// How a cart is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Table,
    Json,
}

/// Mutation requested on the command line.
#[derive(Debug, Clone)]
pub enum Change {
    Add(LineItemInput),
    Increment(ProductId),
    Decrement(ProductId),
}

/// Build an add request from CLI arguments.
#[must_use]
pub fn add_request(id: String, title: String, image_url: String, price: f64) -> Change {
    Change::Add(LineItemInput {
        id: ProductId::new(id),
        title,
        image_url,
        unit_price: UnitPrice::new(price),
    })
}

/// Print the stored cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded or printed.
pub async fn list(config: &StoreConfig, output: Output) -> Result<(), CommandError> {
    let store = open(config).await?;
    let state = store.products();
    store.shutdown().await;

    print_cart(&state, output)
}

/// Apply one change to the stored cart and print the result.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded, the product is missing,
/// or the new cart cannot be saved.
pub async fn apply(
    config: &StoreConfig,
    change: Change,
    output: Output,
) -> Result<(), CommandError> {
    let store = open(config).await?;

    let result = match change {
        Change::Add(input) => store.add_to_cart(input).await,
        Change::Increment(id) => store.increment(id).await,
        Change::Decrement(id) => store.decrement(id).await,
    };
    store.shutdown().await;

    let state = result?;
    info!(items = state.len(), units = state.item_count(), "Cart updated");
    print_cart(&state, output)
}

/// Remove the stored cart.
///
/// # Errors
///
/// Returns an error if the storage slot cannot be removed.
pub async fn clear(config: &StoreConfig) -> Result<(), CommandError> {
    let storage = FileStore::new(&config.storage_dir);
    storage.remove(&config.storage_key).await?;
    info!(
        dir = %config.storage_dir.display(),
        key = %config.storage_key,
        "Cart cleared"
    );
    Ok(())
}

async fn open(config: &StoreConfig) -> Result<CartStore, CommandError> {
    let storage = Arc::new(FileStore::new(&config.storage_dir));
    Ok(CartStore::open(storage, config).await?)
}

fn print_cart(state: &CartState, output: Output) -> Result<(), CommandError> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render(state, output, &mut out)?;
    out.flush()?;
    Ok(())
}

/// Write a cart in the requested format.
///
/// # Errors
///
/// Returns an error if writing or JSON encoding fails.
pub fn render(
    state: &CartState,
    output: Output,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match output {
        Output::Json => {
            serde_json::to_writer_pretty(&mut *out, state)?;
            writeln!(out)?;
        }
        Output::Table => {
            if state.is_empty() {
                writeln!(out, "Cart is empty")?;
                return Ok(());
            }
            writeln!(out, "{:<16} {:>5} {:>10}  TITLE", "ID", "QTY", "PRICE")?;
            for item in state {
                writeln!(
                    out,
                    "{:<16} {:>5} {:>10}  {}",
                    item.id, item.quantity, item.unit_price, item.title
                )?;
            }
            writeln!(out, "{} item(s), {} unit(s)", state.len(), state.item_count())?;
        }
    }
    Ok(())
}
