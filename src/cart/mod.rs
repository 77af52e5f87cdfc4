//! Cart mutations: add a product, then pin its line quantity.
//!
//! [`CartOperator::add_to_cart`] must succeed before
//! [`CartOperator::set_quantity`] is attempted; the watcher enforces that
//! ordering.

mod error;

pub use error::CartError;

use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

use crate::catalog::{normalize_link, truncate_name};
use crate::config::Endpoints;
use crate::html;
use crate::transport::{Transport, TransportError, build_url};

#[allow(clippy::expect_used)]
static ADD_CONFIRMATION: LazyLock<Selector> =
    LazyLock::new(|| html::selector("h3.ftx-02").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static LINE_NAME: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.p-name a").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static SELECTED_LINE: LazyLock<Selector> = LazyLock::new(|| {
    html::selector("div[class*='item-item item-selected']").expect("static selector is valid")
});

#[allow(clippy::expect_used)]
static LINE_PRICE: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.p-price strong").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static LINE_SUM: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.p-sum strong").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static TOTAL_COUNT: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.amount-sum em").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static TOTAL_VALUE: LazyLock<Selector> =
    LazyLock::new(|| html::selector("span.sumPrice em").expect("static selector is valid"));

/// One selected line of the cart page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Product ID.
    pub id: String,
    /// Quantity as displayed.
    pub quantity: String,
    /// Unit price as displayed.
    pub unit_price: String,
    /// Line total as displayed.
    pub line_total: String,
    /// Truncated product name.
    pub name: String,
}

/// Selected cart lines and totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartOverview {
    /// Selected lines in page order.
    pub lines: Vec<CartLine>,
    /// Total item count as displayed.
    pub total_count: String,
    /// Total value as displayed.
    pub total_value: String,
}

#[derive(Debug, Deserialize)]
struct QuantityReply {
    pcount: i64,
}

/// Transaction parameters embedded in a cart line's checkbox.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LineParams {
    ptype: String,
    promo_id: String,
}

/// Mutates the remote cart.
#[derive(Debug, Clone)]
pub struct CartOperator {
    transport: Transport,
    endpoints: Endpoints,
    ship_area: String,
}

impl CartOperator {
    /// Creates an operator over the shared transport.
    pub fn new(transport: Transport, endpoints: Endpoints, ship_area: impl Into<String>) -> Self {
        Self {
            transport,
            endpoints,
            ship_area: ship_area.into(),
        }
    }

    /// Chooses the cart-add link for a purchase.
    ///
    /// The product page's link is used when exactly one unit is wanted;
    /// otherwise (or when the page had none) a quantity-bearing link is built
    /// from the cart-add endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] when the chosen link does not parse.
    pub fn buy_link(
        &self,
        id: &str,
        quantity: u32,
        catalog_link: Option<&str>,
    ) -> Result<Url, TransportError> {
        match catalog_link {
            Some(link) if quantity == 1 && !link.trim().is_empty() => {
                let link = normalize_link(link);
                Url::parse(&link).map_err(|_| TransportError::invalid_url(link))
            }
            _ => {
                let count = quantity.to_string();
                build_url(
                    &self.endpoints.cart_add,
                    &[("pid", id), ("pcount", count.as_str()), ("ptype", "1")],
                )
            }
        }
    }

    /// Requests the cart-add link and checks the page for a confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::AddFailed`] when neither the confirmation heading
    /// nor an echoed product name is present, or a transport error.
    #[instrument(skip(self, link), fields(product_id = %id, url = %link))]
    pub async fn add_to_cart(&self, id: &str, link: &Url) -> Result<(), CartError> {
        let body = self.transport.get_bytes(link).await?;
        let page = String::from_utf8_lossy(&body);

        if add_confirmed(&page) {
            debug!("cart-add confirmed");
            Ok(())
        } else {
            Err(CartError::AddFailed { id: id.to_string() })
        }
    }

    /// Sets the cart line for `id` to `quantity` and verifies the echo.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CartAttributeMissing`] when the line or its
    /// parameters are not on the cart page, [`CartError::QuantityMismatch`]
    /// when the storefront echoes a different count,
    /// [`CartError::InvalidResponse`] for an undecodable reply, or a
    /// transport error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn set_quantity(&self, id: &str, quantity: u32) -> Result<(), CartError> {
        let cart_url = build_url(&self.endpoints.cart_page, &[])?;
        let cart_page = self.transport.get_bytes(&cart_url).await?;
        let params = line_params(id, &String::from_utf8_lossy(&cart_page))?;
        debug!(ptype = %params.ptype, promo_id = %params.promo_id, "cart line parameters");

        let count = quantity.to_string();
        let nonce = format!("{:.16}", rand::random::<f64>());
        let url = build_url(
            &self.endpoints.change_quantity,
            &[
                ("t", "0"),
                ("venderId", "8888"),
                ("pid", id),
                ("pcount", count.as_str()),
                ("ptype", params.ptype.as_str()),
                ("targetId", params.promo_id.as_str()),
                ("packId", "0"),
                ("promoID", params.promo_id.as_str()),
                ("outSkus", ""),
                ("random", nonce.as_str()),
                ("locationId", self.ship_area.as_str()),
            ],
        )?;

        let body = self.transport.post_bytes(&url).await?;
        let reply: QuantityReply =
            serde_json::from_slice(&body).map_err(|e| CartError::invalid_response(id, e))?;

        if reply.pcount == i64::from(quantity) {
            Ok(())
        } else {
            Err(CartError::QuantityMismatch {
                id: id.to_string(),
                expected: quantity,
                actual: reply.pcount,
            })
        }
    }

    /// Reads the selected cart lines and totals and logs them.
    ///
    /// # Errors
    ///
    /// Returns a transport error when the cart page cannot be fetched.
    #[instrument(skip(self))]
    pub async fn cart_overview(&self) -> Result<CartOverview, CartError> {
        let url = build_url(&self.endpoints.cart_page, &[])?;
        let body = self.transport.get_bytes(&url).await?;
        let overview = parse_cart_overview(&String::from_utf8_lossy(&body));

        info!(lines = overview.lines.len(), "cart contents");
        for line in &overview.lines {
            info!(
                product_id = %line.id,
                quantity = %line.quantity,
                price = %line.unit_price,
                total = %line.line_total,
                name = %line.name,
                "cart line"
            );
        }
        info!(count = %overview.total_count, value = %overview.total_value, "cart totals");
        Ok(overview)
    }
}

fn add_confirmed(page: &str) -> bool {
    let document = Html::parse_document(page);
    let root = document.root_element();
    [&*ADD_CONFIRMATION, &*LINE_NAME]
        .into_iter()
        .any(|selector| html::first_text(root, selector).is_some_and(|text| !text.is_empty()))
}

fn line_params(id: &str, cart_page: &str) -> Result<LineParams, CartError> {
    let checkbox = html::selector(&format!("input[p-type^='{id}_']"))
        .map_err(|reason| CartError::attribute_missing(id, reason))?;
    let document = Html::parse_document(cart_page);
    let value = html::first_attr(document.root_element(), &checkbox, "value")
        .ok_or_else(|| CartError::attribute_missing(id, "product checkbox not found in cart"))?;

    let parts: Vec<&str> = value.split('_').collect();
    match parts.as_slice() {
        [line_id, ..] if *line_id != id => Err(CartError::attribute_missing(
            id,
            format!("checkbox value {value:?} belongs to another product"),
        )),
        [_, ptype] => Ok(LineParams {
            ptype: (*ptype).to_string(),
            promo_id: "0".to_string(),
        }),
        [_, ptype, promo_id, ..] => Ok(LineParams {
            ptype: (*ptype).to_string(),
            promo_id: (*promo_id).to_string(),
        }),
        _ => Err(CartError::attribute_missing(
            id,
            format!("malformed checkbox value {value:?}"),
        )),
    }
}

fn parse_cart_overview(page: &str) -> CartOverview {
    let document = Html::parse_document(page);
    let root = document.root_element();

    let lines = document
        .select(&SELECTED_LINE)
        .map(|line| {
            let id = line
                .value()
                .attr("id")
                .map(|raw| raw.trim_start_matches("product_").to_string())
                .unwrap_or_default();
            let name = html::text_or_empty(line, &LINE_NAME);
            CartLine {
                id,
                quantity: line.value().attr("num").unwrap_or("0").to_string(),
                unit_price: html::text_or_empty(line, &LINE_PRICE),
                line_total: html::text_or_empty(line, &LINE_SUM),
                name: truncate_name(&name).into_owned(),
            }
        })
        .collect();

    CartOverview {
        lines,
        total_count: html::text_or_empty(root, &TOTAL_COUNT),
        total_value: html::text_or_empty(root, &TOTAL_VALUE),
    }
}
