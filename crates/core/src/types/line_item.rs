//! Cart line items.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::price::UnitPrice;

/// A product as offered to the cart, before it has a quantity.
///
/// Display fields are opaque to the cart and are not validated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Catalog identifier; the uniqueness key within a cart.
    pub id: ProductId,
    /// Display name.
    pub title: String,
    /// Display image reference.
    pub image_url: String,
    /// Price of one unit.
    #[serde(rename = "price")]
    pub unit_price: UnitPrice,
}

/// One distinct product in the cart together with its quantity.
///
/// The serialized field names (`id`, `title`, `image_url`, `price`,
/// `quantity`) are the persisted format and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub image_url: String,
    #[serde(rename = "price")]
    pub unit_price: UnitPrice,
    pub quantity: u32,
}

impl LineItem {
    /// Build a line item from an input with the given quantity.
    #[must_use]
    pub fn from_input(input: LineItemInput, quantity: u32) -> Self {
        Self {
            id: input.id,
            title: input.title,
            image_url: input.image_url,
            unit_price: input.unit_price,
            quantity,
        }
    }
}

impl From<LineItemInput> for LineItem {
    /// A freshly added product starts with a quantity of one.
    fn from(input: LineItemInput) -> Self {
        Self::from_input(input, 1)
    }
}
