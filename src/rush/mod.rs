//! Rush-buy: one watcher per requested product, joined before finalization.
//!
//! Each [`Watcher`] walks
//!
//! ```text
//! Fetching -> PriceGate -> StockGate -> Purchasing -> Committed | Failed
//! ```
//!
//! against a [`Storefront`]. With rush mode on, the gates sleep and re-poll
//! until their condition holds; with it off, each gate is looked at once and
//! the pre-purchase check decides. The [`RushBuyEngine`] spawns the watchers,
//! waits for all of them, and then runs the [`OrderFinalizer`] exactly once.
//!
//! [`OrderFinalizer`]: crate::order::OrderFinalizer

mod engine;
mod error;
#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;
mod watcher;

pub use crate::order::OrderDesk;
pub use engine::{RushBuyEngine, RushReport};
pub use error::WatchError;
pub use watcher::{WatchOutcome, WatchState, Watcher};

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::cart::CartError;
use crate::catalog::{CatalogError, ProductDetail, StockCode, StockStatus};
use crate::config::RushConfig;

/// Catalog and cart operations a watcher needs.
#[async_trait]
pub trait Storefront: Send + Sync {
    /// Display name and cart link from the product page.
    async fn product_detail(&self, id: &str) -> Result<ProductDetail, CatalogError>;

    /// Current price.
    async fn price(&self, id: &str) -> Result<f64, CatalogError>;

    /// Current stock state in the configured shipping area.
    async fn stock(&self, id: &str) -> Result<StockStatus, CatalogError>;

    /// Cart-add link for `quantity` units, preferring `catalog_link` for one unit.
    fn buy_link(
        &self,
        id: &str,
        quantity: u32,
        catalog_link: Option<&str>,
    ) -> Result<Url, CartError>;

    /// Requests the cart-add link and confirms the product was added.
    async fn add_to_cart(&self, id: &str, link: &Url) -> Result<(), CartError>;

    /// Pins the cart line to `quantity` and verifies the echo.
    async fn set_quantity(&self, id: &str, quantity: u32) -> Result<(), CartError>;
}

/// Gate behavior shared by every watcher of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchPolicy {
    /// Keep polling unmet gates instead of falling through once.
    pub rush: bool,
    /// Sleep between gate re-polls.
    pub period: Duration,
}

impl From<&RushConfig> for WatchPolicy {
    fn from(config: &RushConfig) -> Self {
        Self {
            rush: config.rush,
            period: config.period,
        }
    }
}

/// A watcher's view of its product, refreshed while gating.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    /// Product ID.
    pub id: String,
    /// Truncated display name.
    pub name: String,
    /// Cart link from the product page, if any.
    pub buy_link: Option<String>,
    /// Last observed price.
    pub current_price: f64,
    /// Last observed stock code.
    pub stock_code: StockCode,
    /// Label for the last observed stock code.
    pub stock_label: String,
    /// Units to buy.
    pub quantity: u32,
    /// Highest acceptable price.
    pub expected_price: f64,
}

impl ProductSnapshot {
    /// Whether the price is within the limit.
    #[must_use]
    pub fn price_acceptable(&self) -> bool {
        self.current_price <= self.expected_price
    }

    /// Whether both purchase conditions hold.
    #[must_use]
    pub fn is_buyable(&self) -> bool {
        self.price_acceptable() && self.stock_code.is_on_sale()
    }
}
