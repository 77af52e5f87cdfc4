//! Error types for catalog lookups.

use thiserror::Error;

use crate::transport::TransportError;

/// Errors from the product page, price, and stock lookups.
///
/// Each is fatal to the watcher that hit it and to no other.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The price lookup returned no usable price.
    #[error("no price for product {id}: {reason}")]
    PriceUnavailable {
        /// Product ID.
        id: String,
        /// Why the price could not be read.
        reason: String,
    },

    /// The stock lookup did not mention the product.
    #[error("no stock state for product {id}")]
    StockUnavailable {
        /// Product ID.
        id: String,
    },

    /// A response could not be decoded.
    #[error("cannot parse {what} for product {id}: {reason}")]
    ParseFailure {
        /// Product ID.
        id: String,
        /// Which response was being decoded.
        what: &'static str,
        /// Decoder message.
        reason: String,
    },

    /// The lookup failed at the transport layer.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl CatalogError {
    /// Creates a price-unavailable error.
    pub fn price_unavailable(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PriceUnavailable {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Creates a parse failure.
    pub fn parse(id: impl Into<String>, what: &'static str, reason: impl ToString) -> Self {
        Self::ParseFailure {
            id: id.into(),
            what,
            reason: reason.to_string(),
        }
    }
}
