//! Unit price carried on cart line items.
//!
//! The cart never does arithmetic on prices: the value is stored and
//! persisted exactly as the catalog supplied it. It is kept as a plain JSON
//! number so carts persisted by older clients keep loading.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Price of a single unit of a product, in the catalog's currency.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct UnitPrice(f64);

impl UnitPrice {
    /// Create a new unit price.
    #[must_use]
    pub const fn new(amount: f64) -> Self {
        Self(amount)
    }

    /// Get the raw amount.
    #[must_use]
    pub const fn amount(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&format!("{:.2}", self.0))
    }
}

impl From<f64> for UnitPrice {
    fn from(amount: f64) -> Self {
        Self(amount)
    }
}
