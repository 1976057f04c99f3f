//! cartkeep core - Shared cart types.
//!
//! This crate provides the types used across all cartkeep components:
//! - `store` - The persistent cart store
//! - `cli` - Command-line access to a local cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure state transitions - no I/O,
//! no storage access, no async runtime. This keeps it lightweight and allows
//! it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for product IDs, prices, and line items
//! - [`cart`] - The immutable [`CartState`] and its add/increment/decrement
//!   transitions

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{CartState, CartStateError};
pub use types::*;
