//! Product name, buy link, price, and stock lookups.
//!
//! The three lookups are independent and read-only. Transport errors are
//! passed through untouched; retrying is the watcher's decision.

mod error;
mod text;

pub use error::CatalogError;
pub use text::{MAX_NAME_LEN, decode_legacy_text, normalize_link, truncate_name};

use std::collections::HashMap;
use std::fmt;
use std::sync::LazyLock;

use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::Endpoints;
use crate::html;
use crate::transport::{Transport, build_url, unix_millis};

/// Tag the price lookup expects in front of product IDs.
const PRICE_ID_TAG: &str = "J_";

#[allow(clippy::expect_used)]
static NAME_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.sku-name").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static CART_LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| html::selector("a#InitCartUrl").expect("static selector is valid"));

/// Remote stock state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockCode {
    /// Code 33: purchasable now.
    OnSale,
    /// Code 34: not available.
    OutOfStock,
    /// Any other remote code; never buyable.
    Other(i64),
}

impl StockCode {
    /// Numeric code as the storefront reports it.
    #[must_use]
    pub fn code(self) -> i64 {
        match self {
            Self::OnSale => 33,
            Self::OutOfStock => 34,
            Self::Other(code) => code,
        }
    }

    /// Whether the product can be added to the cart now.
    #[must_use]
    pub fn is_on_sale(self) -> bool {
        self == Self::OnSale
    }
}

impl From<i64> for StockCode {
    fn from(code: i64) -> Self {
        match code {
            33 => Self::OnSale,
            34 => Self::OutOfStock,
            other => Self::Other(other),
        }
    }
}

impl fmt::Display for StockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Stock code plus the storefront's label for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockStatus {
    /// Parsed code.
    pub code: StockCode,
    /// Human label (for example "现货" or "无货").
    pub label: String,
}

/// Data read from a product page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDetail {
    /// Display name, truncated.
    pub name: String,
    /// Cart-add link offered by the page, upgraded to https when protocol-relative.
    pub buy_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PriceQuote {
    p: String,
}

#[derive(Debug, Deserialize)]
struct StockEntry {
    #[serde(rename = "StockState")]
    state: i64,
    #[serde(rename = "StockStateName", default)]
    label: String,
}

/// Reads product data from the storefront.
#[derive(Debug, Clone)]
pub struct CatalogReader {
    transport: Transport,
    endpoints: Endpoints,
}

impl CatalogReader {
    /// Creates a reader over the shared transport.
    pub fn new(transport: Transport, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    /// Fetches the product page and extracts display name and cart link.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ParseFailure`] when the page has no name
    /// element, or a transport error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_detail_page(&self, id: &str) -> Result<ProductDetail, CatalogError> {
        let url = build_url(&self.endpoints.item_page(id), &[])?;
        let body = self.transport.get_bytes(&url).await?;
        let page = decode_legacy_text(&body);
        let detail = parse_detail_page(id, &page)?;
        debug!(name = %detail.name, buy_link = ?detail.buy_link, "product page read");
        Ok(detail)
    }

    /// Fetches the current price.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::PriceUnavailable`] for an empty list or a
    /// non-numeric price, [`CatalogError::ParseFailure`] when the body is not
    /// a price list, or a transport error.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn fetch_price(&self, id: &str) -> Result<f64, CatalogError> {
        let tagged = format!("{PRICE_ID_TAG}{id}");
        let now = unix_millis();
        let url = build_url(
            &self.endpoints.price_lookup,
            &[("type", "1"), ("skuIds", tagged.as_str()), ("pduid", now.as_str())],
        )?;
        let body = self.transport.get_bytes(&url).await?;
        let price = parse_price(id, &body)?;
        debug!(price, "price read");
        Ok(price)
    }

    /// Fetches stock state for a shipping area.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::StockUnavailable`] when the response does not
    /// mention `id`, [`CatalogError::ParseFailure`] when it is not a stock
    /// map, or a transport error.
    #[instrument(skip(self), fields(product_id = %id, area = %ship_area))]
    pub async fn fetch_stock(&self, id: &str, ship_area: &str) -> Result<StockStatus, CatalogError> {
        let now = unix_millis();
        let url = build_url(
            &self.endpoints.stock_lookup,
            &[
                ("type", "getstocks"),
                ("skuIds", id),
                ("area", ship_area),
                ("_", now.as_str()),
            ],
        )?;
        let body = self.transport.get_bytes(&url).await?;
        let status = parse_stock(id, &decode_legacy_text(&body))?;
        debug!(stock = %status.code, label = %status.label, "stock read");
        Ok(status)
    }
}

fn parse_detail_page(id: &str, page: &str) -> Result<ProductDetail, CatalogError> {
    let document = Html::parse_document(page);
    let root = document.root_element();

    let name = html::first_text(root, &NAME_SELECTOR)
        .ok_or_else(|| CatalogError::parse(id, "product page", "no product name element"))?;
    let buy_link = html::first_attr(root, &CART_LINK_SELECTOR, "href")
        .map(|href| normalize_link(&href))
        .filter(|link| !link.is_empty());

    Ok(ProductDetail {
        name: truncate_name(&name).into_owned(),
        buy_link,
    })
}

fn parse_price(id: &str, body: &[u8]) -> Result<f64, CatalogError> {
    let quotes: Vec<PriceQuote> =
        serde_json::from_slice(body).map_err(|e| CatalogError::parse(id, "price list", e))?;
    let quote = quotes
        .first()
        .ok_or_else(|| CatalogError::price_unavailable(id, "empty price list"))?;

    match quote.p.trim().parse::<f64>() {
        Ok(price) if price.is_finite() => Ok(price),
        _ => Err(CatalogError::price_unavailable(
            id,
            format!("non-numeric price {:?}", quote.p),
        )),
    }
}

fn parse_stock(id: &str, body: &str) -> Result<StockStatus, CatalogError> {
    let mut entries: HashMap<String, StockEntry> =
        serde_json::from_str(body).map_err(|e| CatalogError::parse(id, "stock response", e))?;
    let entry = entries
        .remove(id)
        .ok_or_else(|| CatalogError::StockUnavailable { id: id.to_string() })?;

    Ok(StockStatus {
        code: StockCode::from(entry.state),
        label: entry.label,
    })
}
