//! Per-product watch state machine.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use super::{ProductSnapshot, Storefront, WatchError, WatchPolicy};
use crate::product::ExpectedProduct;

/// Watcher states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// Reading name, link, price, and stock.
    Fetching,
    /// Waiting for the price to drop to the limit.
    PriceGate,
    /// Waiting for the product to go on sale.
    StockGate,
    /// Adding to the cart and pinning the quantity.
    Purchasing,
    /// In the cart at the requested quantity.
    Committed,
    /// Gave up; see the outcome's error.
    Failed,
}

impl fmt::Display for WatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Fetching => "fetching",
            Self::PriceGate => "price gate",
            Self::StockGate => "stock gate",
            Self::Purchasing => "purchasing",
            Self::Committed => "committed",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Terminal report of one watcher.
#[derive(Debug)]
pub struct WatchOutcome {
    /// Product watched.
    pub product_id: String,
    /// Final snapshot when committed, or why the watcher failed.
    pub result: Result<ProductSnapshot, WatchError>,
}

impl WatchOutcome {
    /// `Committed` or `Failed`.
    #[must_use]
    pub fn state(&self) -> WatchState {
        if self.result.is_ok() {
            WatchState::Committed
        } else {
            WatchState::Failed
        }
    }
}

/// Watches one product until it is in the cart or the watch fails.
pub struct Watcher {
    product: ExpectedProduct,
    storefront: Arc<dyn Storefront>,
    policy: WatchPolicy,
}

impl Watcher {
    /// Creates a watcher for `product`.
    pub fn new(product: ExpectedProduct, storefront: Arc<dyn Storefront>, policy: WatchPolicy) -> Self {
        Self {
            product,
            storefront,
            policy,
        }
    }

    /// Runs the state machine to a terminal state.
    ///
    /// With rush mode on there is no time limit; the watch ends when the
    /// conditions clear, a request fails, or the task is dropped.
    #[instrument(skip(self), fields(product_id = %self.product.id))]
    pub async fn run(self) -> WatchOutcome {
        let result = self.watch().await;
        match &result {
            Ok(snapshot) => info!(
                quantity = snapshot.quantity,
                name = %snapshot.name,
                price = snapshot.current_price,
                state = %WatchState::Committed,
                "added to cart"
            ),
            Err(e) => warn!(
                phase = e.phase(),
                state = %WatchState::Failed,
                error = %e,
                "watch failed"
            ),
        }
        WatchOutcome {
            product_id: self.product.id,
            result,
        }
    }

    async fn watch(&self) -> Result<ProductSnapshot, WatchError> {
        let id = self.product.id.as_str();

        debug!(state = %WatchState::Fetching);
        let mut snapshot = self.fetch().await?;
        info!(
            name = %snapshot.name,
            price = snapshot.current_price,
            expected_price = snapshot.expected_price,
            stock = %snapshot.stock_label,
            buy_link = snapshot.buy_link.as_deref().unwrap_or(""),
            "product read"
        );

        debug!(state = %WatchState::PriceGate);
        while !snapshot.price_acceptable() && self.policy.rush {
            info!(
                price = snapshot.current_price,
                expected_price = snapshot.expected_price,
                "price above limit, watching"
            );
            tokio::time::sleep(self.policy.period).await;
            snapshot.current_price = self
                .storefront
                .price(id)
                .await
                .map_err(|source| WatchError::PricePoll {
                    id: id.to_string(),
                    source,
                })?;
        }

        debug!(state = %WatchState::StockGate);
        while !snapshot.stock_code.is_on_sale() && self.policy.rush {
            info!(stock = %snapshot.stock_label, code = %snapshot.stock_code, "not on sale, watching");
            tokio::time::sleep(self.policy.period).await;
            let status = self
                .storefront
                .stock(id)
                .await
                .map_err(|source| WatchError::StockPoll {
                    id: id.to_string(),
                    source,
                })?;
            snapshot.stock_code = status.code;
            snapshot.stock_label = status.label;
        }

        if !snapshot.is_buyable() {
            return Err(WatchError::ConditionsNotMet {
                id: id.to_string(),
                price: snapshot.current_price,
                expected_price: snapshot.expected_price,
                stock: snapshot.stock_code,
            });
        }

        debug!(state = %WatchState::Purchasing);
        self.purchase(&snapshot).await?;
        Ok(snapshot)
    }

    async fn fetch(&self) -> Result<ProductSnapshot, WatchError> {
        let id = self.product.id.as_str();
        let fetched = tokio::try_join!(
            self.storefront.product_detail(id),
            self.storefront.price(id),
            self.storefront.stock(id),
        );
        let (detail, price, stock) = fetched.map_err(|source| WatchError::Fetch {
            id: id.to_string(),
            source,
        })?;

        Ok(ProductSnapshot {
            id: id.to_string(),
            name: detail.name,
            buy_link: detail.buy_link,
            current_price: price,
            stock_code: stock.code,
            stock_label: stock.label,
            quantity: self.product.quantity,
            expected_price: self.product.max_price,
        })
    }

    async fn purchase(&self, snapshot: &ProductSnapshot) -> Result<(), WatchError> {
        let id = snapshot.id.as_str();
        let failed = |source| WatchError::Purchase {
            id: id.to_string(),
            source,
        };

        let link = self
            .storefront
            .buy_link(id, snapshot.quantity, snapshot.buy_link.as_deref())
            .map_err(failed)?;
        self.storefront.add_to_cart(id, &link).await.map_err(failed)?;
        self.storefront
            .set_quantity(id, snapshot.quantity)
            .await
            .map_err(failed)
    }
}
