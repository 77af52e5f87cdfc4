//! Per-watcher failure reporting.

use thiserror::Error;

use crate::cart::CartError;
use crate::catalog::{CatalogError, StockCode};

/// Why a watcher ended in `Failed`.
///
/// Every variant names the product and, through [`WatchError::phase`], the
/// phase it failed in.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The initial product read failed.
    #[error("product {id}: initial fetch failed: {source}")]
    Fetch {
        /// Product ID.
        id: String,
        /// The catalog failure.
        #[source]
        source: CatalogError,
    },

    /// A price re-check inside the price gate failed.
    #[error("product {id}: price poll failed: {source}")]
    PricePoll {
        /// Product ID.
        id: String,
        /// The catalog failure.
        #[source]
        source: CatalogError,
    },

    /// A stock re-check inside the stock gate failed.
    #[error("product {id}: stock poll failed: {source}")]
    StockPoll {
        /// Product ID.
        id: String,
        /// The catalog failure.
        #[source]
        source: CatalogError,
    },

    /// Price or stock still failed the pre-purchase check.
    #[error(
        "product {id}: purchase conditions not met (price {price:.2}, limit {expected_price:.2}, stock {stock})"
    )]
    ConditionsNotMet {
        /// Product ID.
        id: String,
        /// Last observed price.
        price: f64,
        /// Highest acceptable price.
        expected_price: f64,
        /// Last observed stock code.
        stock: StockCode,
    },

    /// The cart-add or quantity change failed.
    #[error("product {id}: purchase failed: {source}")]
    Purchase {
        /// Product ID.
        id: String,
        /// The cart failure.
        #[source]
        source: CartError,
    },

    /// The watcher task died before reporting.
    #[error("product {id}: watcher aborted: {reason}")]
    Aborted {
        /// Product ID.
        id: String,
        /// Join failure description.
        reason: String,
    },
}

impl WatchError {
    /// Product the failure belongs to.
    #[must_use]
    pub fn product_id(&self) -> &str {
        match self {
            Self::Fetch { id, .. }
            | Self::PricePoll { id, .. }
            | Self::StockPoll { id, .. }
            | Self::ConditionsNotMet { id, .. }
            | Self::Purchase { id, .. }
            | Self::Aborted { id, .. } => id,
        }
    }

    /// Watch phase the failure happened in.
    #[must_use]
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "fetch",
            Self::PricePoll { .. } => "price gate",
            Self::StockPoll { .. } => "stock gate",
            Self::ConditionsNotMet { .. } => "pre-purchase check",
            Self::Purchase { .. } => "purchase",
            Self::Aborted { .. } => "task",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditions_not_met_names_product_and_values() {
        let err = WatchError::ConditionsNotMet {
            id: "100".into(),
            price: 12.5,
            expected_price: 10.0,
            stock: StockCode::OutOfStock,
        };
        assert_eq!(err.product_id(), "100");
        assert_eq!(err.phase(), "pre-purchase check");
        assert_eq!(
            err.to_string(),
            "product 100: purchase conditions not met (price 12.50, limit 10.00, stock 34)"
        );
    }

    #[test]
    fn test_unbounded_limit_renders_as_inf() {
        let err = WatchError::ConditionsNotMet {
            id: "1".into(),
            price: 1.0,
            expected_price: f64::INFINITY,
            stock: StockCode::Other(40),
        };
        assert!(err.to_string().contains("limit inf"));
    }

    #[test]
    fn test_purchase_phase() {
        let err = WatchError::Purchase {
            id: "5".into(),
            source: CartError::AddFailed { id: "5".into() },
        };
        assert_eq!(err.phase(), "purchase");
        assert!(err.to_string().starts_with("product 5: purchase failed"));
    }
}
