//! Spawns one watcher per product and finalizes once all have finished.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, instrument, warn};

use super::{Storefront, WatchError, WatchOutcome, WatchPolicy, Watcher};
use crate::order::{FinalizeReport, OrderDesk, OrderFinalizer};
use crate::product::ExpectedProduct;

/// Outcome of a whole rush-buy run.
#[derive(Debug)]
pub struct RushReport {
    /// One outcome per requested product, in request order.
    pub outcomes: Vec<WatchOutcome>,
    /// Result of the single finalization pass.
    pub finalize: FinalizeReport,
}

impl RushReport {
    /// Number of products that made it into the cart.
    #[must_use]
    pub fn committed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Number of products whose watch failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.committed()
    }
}

/// Runs watchers concurrently and hands off to the order finalizer.
pub struct RushBuyEngine {
    storefront: Arc<dyn Storefront>,
    desk: Arc<dyn OrderDesk>,
    policy: WatchPolicy,
    finalizer: OrderFinalizer,
}

impl RushBuyEngine {
    /// Creates an engine.
    pub fn new(
        storefront: Arc<dyn Storefront>,
        desk: Arc<dyn OrderDesk>,
        policy: WatchPolicy,
        finalizer: OrderFinalizer,
    ) -> Self {
        Self {
            storefront,
            desk,
            policy,
            finalizer,
        }
    }

    /// Watches every product, waits for all watchers, then finalizes once.
    ///
    /// A failing watcher never affects its siblings.
    #[instrument(skip(self, products), fields(products = products.len()))]
    pub async fn run(&self, products: &[ExpectedProduct]) -> RushReport {
        info!(rush = self.policy.rush, period_ms = self.policy.period.as_millis(), "starting watchers");

        let handles: Vec<_> = products
            .iter()
            .cloned()
            .map(|product| {
                let watcher = Watcher::new(product, Arc::clone(&self.storefront), self.policy);
                tokio::spawn(watcher.run())
            })
            .collect();

        let outcomes: Vec<WatchOutcome> = join_all(handles)
            .await
            .into_iter()
            .zip(products)
            .map(|(joined, product)| {
                joined.unwrap_or_else(|e| {
                    warn!(product_id = %product.id, error = %e, "watcher task panicked");
                    WatchOutcome {
                        product_id: product.id.clone(),
                        result: Err(WatchError::Aborted {
                            id: product.id.clone(),
                            reason: e.to_string(),
                        }),
                    }
                })
            })
            .collect();

        let report_failed = outcomes.iter().filter(|o| o.result.is_err()).count();
        info!(
            committed = outcomes.len() - report_failed,
            failed = report_failed,
            "all watchers finished"
        );

        let finalize = self.finalizer.finalize(self.desk.as_ref()).await;
        RushReport { outcomes, finalize }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rush::WatchState;
    use crate::rush::testing::{RecordingDesk, Script, ScriptedStorefront};
    use std::time::Duration;

    fn engine(
        storefront: &Arc<ScriptedStorefront>,
        desk: &Arc<RecordingDesk>,
        rush: bool,
        auto_submit: bool,
    ) -> RushBuyEngine {
        let storefront: Arc<dyn Storefront> = storefront.clone();
        let desk: Arc<dyn OrderDesk> = desk.clone();
        RushBuyEngine::new(
            storefront,
            desk,
            WatchPolicy {
                rush,
                period: Duration::ZERO,
            },
            OrderFinalizer::new(auto_submit),
        )
    }

    #[tokio::test]
    async fn test_mixed_outcomes_all_reported_before_finalize() {
        let mut broken = Script::buyable();
        broken.fail_add = true;
        let storefront = Arc::new(
            ScriptedStorefront::default()
                .with("1", Script::buyable())
                .with("2", Script::new(&[10.0], &[34]))
                .with("3", broken)
                .with("4", Script::new(&[10.0], &[34, 34, 33])),
        );
        let desk = Arc::new(RecordingDesk::default());
        let products = vec![
            ExpectedProduct::new("1"),
            ExpectedProduct::new("2"),
            ExpectedProduct::new("3"),
            ExpectedProduct::new("4"),
        ];

        let report = engine(&storefront, &desk, false, true).run(&products).await;

        let ids: Vec<&str> = report.outcomes.iter().map(|o| o.product_id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3", "4"]);
        let states: Vec<WatchState> = report.outcomes.iter().map(WatchOutcome::state).collect();
        assert_eq!(
            states,
            [
                WatchState::Committed,
                WatchState::Failed,
                WatchState::Failed,
                WatchState::Failed
            ]
        );
        assert_eq!(report.committed(), 1);
        assert_eq!(report.failed(), 3);
        assert_eq!(desk.calls(), ["coupons", "summary", "submit"]);
        assert_eq!(report.finalize.order_id(), Some("42"));
    }

    #[tokio::test]
    async fn test_finalize_runs_once_after_rushing_watchers() {
        let storefront = Arc::new(
            ScriptedStorefront::default()
                .with("a", Script::new(&[50.0, 40.0], &[33]))
                .with("b", Script::new(&[10.0], &[34, 34, 34, 33])),
        );
        let desk = Arc::new(RecordingDesk::default());
        let products = vec![
            ExpectedProduct::new("a").with_max_price(45.0),
            ExpectedProduct::new("b").with_quantity(2),
        ];

        let report = engine(&storefront, &desk, true, false).run(&products).await;

        assert_eq!(report.committed(), 2);
        assert_eq!(storefront.count("add:a"), 1);
        assert_eq!(storefront.count("add:b"), 1);
        assert_eq!(desk.calls(), ["coupons", "summary"]);
        assert!(report.finalize.submission.is_none());
    }

    #[tokio::test]
    async fn test_empty_product_list_still_finalizes() {
        let storefront = Arc::new(ScriptedStorefront::default());
        let desk = Arc::new(RecordingDesk::default());

        let report = engine(&storefront, &desk, true, false).run(&[]).await;

        assert!(report.outcomes.is_empty());
        assert_eq!(desk.calls(), ["coupons", "summary"]);
    }
}
