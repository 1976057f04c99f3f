//! Core types for cartkeep.
//!
//! This module provides type-safe wrappers for the cart's domain concepts.

pub mod id;
pub mod line_item;
pub mod price;

pub use id::*;
pub use line_item::{LineItem, LineItemInput};
pub use price::UnitPrice;
