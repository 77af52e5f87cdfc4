//! Error types for cart mutations.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from adding a product or correcting its quantity.
#[derive(Debug, Error)]
pub enum CartError {
    /// The cart-add page showed neither success marker.
    #[error("product {id} was not added to the cart (no confirmation on the cart-add page)")]
    AddFailed {
        /// Product ID.
        id: String,
    },

    /// The cart page did not carry the line's transaction parameters.
    #[error("cart line for product {id} unusable: {reason}")]
    CartAttributeMissing {
        /// Product ID.
        id: String,
        /// What was missing or malformed.
        reason: String,
    },

    /// The quantity change was acknowledged with a different count.
    #[error("cart quantity for product {id} is {actual}, expected {expected}")]
    QuantityMismatch {
        /// Product ID.
        id: String,
        /// Requested quantity.
        expected: u32,
        /// Quantity echoed by the storefront.
        actual: i64,
    },

    /// A cart response could not be decoded.
    #[error("unreadable cart response for product {id}: {reason}")]
    InvalidResponse {
        /// Product ID.
        id: String,
        /// Decoder message.
        reason: String,
    },

    /// The cart request failed at the transport layer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CartError {
    /// Creates an attribute-missing error.
    pub fn attribute_missing(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CartAttributeMissing {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates an invalid-response error.
    pub fn invalid_response(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidResponse {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_mismatch_message() {
        let err = CartError::QuantityMismatch {
            id: "42".into(),
            expected: 3,
            actual: 1,
        };
        assert_eq!(err.to_string(), "cart quantity for product 42 is 1, expected 3");
    }
}
