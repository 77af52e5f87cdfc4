//! Order finalization: discount bundle, order summary, optional submission.
//!
//! [`OrderFinalizer`] runs once, after every watcher has finished, against
//! an [`OrderDesk`]. [`OrderClient`] is the storefront-backed desk.

mod error;
mod summary;

pub use error::OrderError;
pub use summary::OrderSummary;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::Endpoints;
use crate::session::SessionStore;
use crate::transport::{Transport, build_url, unix_millis};

/// Cookie carrying the tracking ID the submit endpoint expects.
const TRACK_ID_COOKIE: &str = "TrackID";

/// The order-side operations the finalizer drives.
#[async_trait]
pub trait OrderDesk: Send + Sync {
    /// Selects the best available discount bundle for the pending order.
    async fn apply_best_coupons(&self) -> Result<(), OrderError>;

    /// Reads the pending order's price breakdown and delivery details.
    async fn order_summary(&self) -> Result<OrderSummary, OrderError>;

    /// Submits the pending order and returns the order ID.
    async fn submit_order(&self) -> Result<String, OrderError>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    order_id: Option<Value>,
    #[serde(default)]
    result_code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Storefront-backed [`OrderDesk`].
#[derive(Clone)]
pub struct OrderClient {
    transport: Transport,
    endpoints: Endpoints,
    store: Arc<dyn SessionStore>,
}

impl OrderClient {
    /// Creates a client; `store` supplies the tracking cookie for submission.
    pub fn new(transport: Transport, endpoints: Endpoints, store: Arc<dyn SessionStore>) -> Self {
        Self {
            transport,
            endpoints,
            store,
        }
    }
}

#[async_trait]
impl OrderDesk for OrderClient {
    #[instrument(skip(self))]
    async fn apply_best_coupons(&self) -> Result<(), OrderError> {
        let url = build_url(&self.endpoints.best_coupons, &[])?;
        self.transport.post_bytes(&url).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn order_summary(&self) -> Result<OrderSummary, OrderError> {
        let now = unix_millis();
        let url = build_url(&self.endpoints.order_info, &[("rid", now.as_str())])?;
        let body = self.transport.get_bytes(&url).await?;
        summary::parse_order_page(&String::from_utf8_lossy(&body))
    }

    #[instrument(skip(self))]
    async fn submit_order(&self) -> Result<String, OrderError> {
        let track_id = self.store.get(TRACK_ID_COOKIE).unwrap_or_default();
        let url = build_url(
            &self.endpoints.submit_order,
            &[
                ("overseaPurchaseCookies", ""),
                ("submitOrderParam.fp", ""),
                ("submitOrderParam.eid", ""),
                ("submitOrderParam.btSupport", "1"),
                ("submitOrderParam.sopNotPutInvoice", "false"),
                ("submitOrderParam.ignorePriceChange", "0"),
                ("submitOrderParam.trackID", track_id.as_str()),
            ],
        )?;
        let body = self.transport.post_bytes(&url).await?;
        parse_submit_reply(&body)
    }
}

fn parse_submit_reply(body: &[u8]) -> Result<String, OrderError> {
    let reply: SubmitReply = serde_json::from_slice(body).map_err(OrderError::invalid_response)?;

    if reply.success {
        return reply
            .order_id
            .as_ref()
            .map(value_text)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| OrderError::invalid_response("submission succeeded without an order ID"));
    }

    Err(OrderError::SubmitRejected {
        code: reply.result_code.as_ref().map(value_text).unwrap_or_default(),
        message: reply.message.unwrap_or_default(),
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => String::new(),
    }
}

/// Outcome of one finalization pass.
#[derive(Debug)]
pub struct FinalizeReport {
    /// Order summary, or why it could not be read.
    pub summary: Result<OrderSummary, OrderError>,
    /// Submission result; `None` when auto-submit is off.
    pub submission: Option<Result<String, OrderError>>,
}

impl FinalizeReport {
    /// The order ID, when an order was placed.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        match &self.submission {
            Some(Ok(id)) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Drives an [`OrderDesk`] through finalization.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderFinalizer {
    auto_submit: bool,
}

impl OrderFinalizer {
    /// Creates a finalizer; with `auto_submit` the order is also placed.
    #[must_use]
    pub fn new(auto_submit: bool) -> Self {
        Self { auto_submit }
    }

    /// Applies the best discounts, reads and reports the summary, then
    /// submits when configured to.
    ///
    /// A discount failure is logged and ignored. A summary failure does not
    /// prevent submission.
    pub async fn finalize(&self, desk: &dyn OrderDesk) -> FinalizeReport {
        if let Err(e) = desk.apply_best_coupons().await {
            warn!(error = %e, "could not apply best coupons, continuing");
        }

        let summary = desk.order_summary().await;
        match &summary {
            Ok(summary) => report_summary(summary),
            Err(e) => warn!(error = %e, "could not read order summary"),
        }

        let submission = if self.auto_submit {
            let result = desk.submit_order().await;
            match &result {
                Ok(order_id) => info!(order_id = %order_id, "order submitted"),
                Err(OrderError::SubmitRejected { code, message }) => {
                    warn!(code = %code, message = %message, "order submission rejected");
                }
                Err(e) => warn!(error = %e, "order submission failed"),
            }
            Some(result)
        } else {
            info!("auto-submit disabled, order left pending");
            None
        };

        FinalizeReport {
            summary,
            submission,
        }
    }
}

fn report_summary(summary: &OrderSummary) {
    for (label, value) in summary.nonzero_charges() {
        info!(charge = label, amount = %value, "order charge");
    }
    info!(payable = %summary.payable_total, "amount payable");
    info!(contact = %summary.contact_phone, address = %summary.shipping_address, "delivery");
}
