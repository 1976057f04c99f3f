//! Cart store error type.
//!
//! Every failure is returned to the caller of the operation that hit it;
//! the store logs errors but never swallows them.

use cartkeep_core::{CartStateError, ProductId};
use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by [`CartStore`](crate::CartStore).
#[derive(Debug, Error)]
pub enum CartError {
    /// The store was used without being set up, or after it shut down.
    #[error("Cart store not available: {0}")]
    Setup(String),

    /// The product is not in the cart.
    #[error("Not found: {0}")]
    NotFound(ProductId),

    /// Reading or writing the storage slot failed.
    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),

    /// The persisted cart could not be decoded.
    #[error("Deserialization error: {0}")]
    Deserialization(#[source] serde_json::Error),

    /// The cart could not be encoded for storage.
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Background hydration failed; the store cannot be used.
    #[error("Hydration failed: {0}")]
    Hydration(String),
}

impl From<CartStateError> for CartError {
    fn from(err: CartStateError) -> Self {
        match err {
            CartStateError::NotFound(id) => Self::NotFound(id),
        }
    }
}

impl CartError {
    /// Whether the error means the store itself is unusable, as opposed to
    /// a single operation failing.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Setup(_) | Self::Deserialization(_) | Self::Hydration(_)
        )
    }
}

/// Result type alias for `CartError`.
pub type Result<T> = std::result::Result<T, CartError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_error_display() {
        let err = CartError::NotFound(ProductId::new("A"));
        assert_eq!(err.to_string(), "Not found: A");

        let err = CartError::Setup("store closed".to_string());
        assert_eq!(err.to_string(), "Cart store not available: store closed");
    }

    #[test]
    fn test_from_cart_state_error() {
        let err = CartError::from(CartStateError::NotFound(ProductId::new("B")));
        assert!(matches!(err, CartError::NotFound(id) if id.as_str() == "B"));
    }

    #[test]
    fn test_fatal_classification() {
        let bad_json = serde_json::from_str::<Vec<u8>>("{").expect_err("invalid json");
        assert!(CartError::Deserialization(bad_json).is_fatal());
        assert!(CartError::Hydration("boom".to_string()).is_fatal());
        assert!(!CartError::NotFound(ProductId::new("A")).is_fatal());
        assert!(
            !CartError::Persistence(StorageError::Backend("down".to_string())).is_fatal()
        );
    }
}
