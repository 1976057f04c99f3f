//! cartkeep CLI - Inspect and edit a locally persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! cartkeep list
//!
//! # Show the cart as stored (JSON)
//! cartkeep --json list
//!
//! # Add a product, then bump and drop its quantity
//! cartkeep add --id A --title Widget --image-url https://img.example/a.png --price 9.99
//! cartkeep increment A
//! cartkeep decrement A
//!
//! # Use a different cart directory
//! cartkeep --dir /tmp/cart list
//! ```
//!
//! # Commands
//!
//! - `list` - Print the cart
//! - `add` - Add a product (re-adding increments it)
//! - `increment` / `decrement` - Change a product's quantity
//! - `clear` - Delete the stored cart

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use cartkeep_store::StoreConfig;
use clap::{Parser, Subcommand};

mod commands;

use commands::CommandError;
use commands::cart::{self, Change, Output};

#[derive(Parser)]
#[command(name = "cartkeep")]
#[command(author, version, about = "Local shopping cart tools")]
struct Cli {
    /// Directory holding the cart file (overrides `CART_STORAGE_DIR`)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Print carts as JSON in the persisted format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    List,
    /// Add a product to the cart
    Add {
        /// Product ID
        #[arg(long)]
        id: String,

        /// Display title
        #[arg(long)]
        title: String,

        /// Image URL
        #[arg(long)]
        image_url: String,

        /// Unit price
        #[arg(long)]
        price: f64,
    },
    /// Increase a product's quantity by one
    Increment {
        /// Product ID
        id: String,
    },
    /// Decrease a product's quantity by one (removes it once already at zero)
    Decrement {
        /// Product ID
        id: String,
    },
    /// Delete the stored cart
    Clear,
}

#[tokio::main]
async fn main() {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartkeep_cli=info,cartkeep_store=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CommandError> {
    let mut config = StoreConfig::from_env()?;
    if let Some(dir) = cli.dir {
        config = config.with_storage_dir(dir);
    }
    let output = if cli.json { Output::Json } else { Output::Table };

    match cli.command {
        Commands::List => cart::list(&config, output).await?,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => {
            let change = cart::add_request(id, title, image_url, price);
            cart::apply(&config, change, output).await?;
        }
        Commands::Increment { id } => {
            cart::apply(&config, Change::Increment(id.into()), output).await?;
        }
        Commands::Decrement { id } => {
            cart::apply(&config, Change::Decrement(id.into()), output).await?;
        }
        Commands::Clear => cart::clear(&config).await?,
    }
    Ok(())
}
