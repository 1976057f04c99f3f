//! Cart state and its transitions.
//!
//! [`CartState`] is an immutable, insertion-ordered sequence of
//! [`LineItem`]s holding at most one entry per [`ProductId`]. Every
//! transition returns a new state and leaves `self` untouched, so a snapshot
//! handed to a reader never changes underneath it.

use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::types::{LineItem, LineItemInput, ProductId};

/// Errors from cart transitions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartStateError {
    /// The product is not in the cart.
    #[error("product {0} is not in the cart")]
    NotFound(ProductId),
}

/// Ordered, id-unique collection of line items.
///
/// Cloning is cheap: the items live behind an `Arc` and are never mutated
/// in place.
#[derive(Debug, Clone, PartialEq)]
pub struct CartState {
    items: Arc<[LineItem]>,
}

impl Default for CartState {
    fn default() -> Self {
        Self::empty()
    }
}

impl CartState {
    /// An empty cart.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            items: Arc::from(Vec::new()),
        }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// Iterate over line items in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.items.iter()
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up a line item by product id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.position(id).is_some()
    }

    /// Total number of units across all line items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    fn position(&self, id: &ProductId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }

    /// Add a product to the cart.
    ///
    /// A product not yet in the cart is appended with a quantity of one.
    /// Re-adding a product already present increments its quantity instead
    /// of creating a second entry.
    #[must_use]
    pub fn with_added(&self, input: LineItemInput) -> Self {
        let mut items = self.items.to_vec();
        match self.position(&input.id) {
            Some(index) => {
                if let Some(item) = items.get_mut(index) {
                    item.quantity = item.quantity.saturating_add(1);
                }
            }
            None => items.push(LineItem::from(input)),
        }
        Self::from(items)
    }

    /// Increase a product's quantity by one.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::NotFound`] if the product is not in the cart.
    pub fn with_incremented(&self, id: &ProductId) -> Result<Self, CartStateError> {
        let index = self
            .position(id)
            .ok_or_else(|| CartStateError::NotFound(id.clone()))?;

        let mut items = self.items.to_vec();
        if let Some(item) = items.get_mut(index) {
            item.quantity = item.quantity.saturating_add(1);
        }
        Ok(Self::from(items))
    }

    /// Decrease a product's quantity by one.
    ///
    /// A quantity of one drops to zero and the item stays in the cart; only
    /// decrementing an item already at zero removes it.
    ///
    /// # Errors
    ///
    /// Returns [`CartStateError::NotFound`] if the product is not in the cart.
    pub fn with_decremented(&self, id: &ProductId) -> Result<Self, CartStateError> {
        let index = self
            .position(id)
            .ok_or_else(|| CartStateError::NotFound(id.clone()))?;

        let mut items = self.items.to_vec();
        if let Some(item) = items.get_mut(index) {
            if item.quantity >= 1 {
                item.quantity -= 1;
            } else {
                items.remove(index);
            }
        }
        Ok(Self::from(items))
    }

    /// Encode as the persisted JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Decode from the persisted JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a JSON array of line items or
    /// lists the same product twice.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

impl From<Vec<LineItem>> for CartState {
    fn from(items: Vec<LineItem>) -> Self {
        Self {
            items: Arc::from(items),
        }
    }
}

impl<'a> IntoIterator for &'a CartState {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for CartState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CartState {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<LineItem>::deserialize(deserializer)?;

        let mut seen = std::collections::HashSet::with_capacity(items.len());
        for item in &items {
            if !seen.insert(&item.id) {
                return Err(D::Error::custom(format!(
                    "duplicate line item for product {}",
                    item.id
                )));
            }
        }

        Ok(Self::from(items))
    }
}
