//! Scripted storefront and order desk for watcher and engine tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use url::Url;

use super::Storefront;
use crate::cart::CartError;
use crate::catalog::{CatalogError, ProductDetail, StockCode, StockStatus};
use crate::order::{OrderDesk, OrderError, OrderSummary};

/// Responses for one product. The last price/stock value repeats forever.
#[derive(Debug, Clone)]
pub(crate) struct Script {
    pub(crate) prices: VecDeque<f64>,
    pub(crate) stocks: VecDeque<i64>,
    pub(crate) fail_detail: bool,
    pub(crate) fail_add: bool,
    pub(crate) echoed_quantity: Option<i64>,
}

impl Script {
    pub(crate) fn new(prices: &[f64], stocks: &[i64]) -> Self {
        Self {
            prices: prices.iter().copied().collect(),
            stocks: stocks.iter().copied().collect(),
            fail_detail: false,
            fail_add: false,
            echoed_quantity: None,
        }
    }

    pub(crate) fn buyable() -> Self {
        Self::new(&[10.0], &[33])
    }
}

fn next<T: Copy>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().copied()
    }
}

#[derive(Debug, Default)]
pub(crate) struct ScriptedStorefront {
    scripts: Mutex<HashMap<String, Script>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedStorefront {
    pub(crate) fn with(self, id: &str, script: Script) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(id.to_string(), script);
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn count(&self, call: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn script<R>(&self, id: &str, f: impl FnOnce(&mut Script) -> R) -> R {
        let mut scripts = self.scripts.lock().unwrap();
        let script = scripts
            .get_mut(id)
            .unwrap_or_else(|| panic!("no script for product {id}"));
        f(script)
    }
}

#[async_trait]
impl Storefront for ScriptedStorefront {
    async fn product_detail(&self, id: &str) -> Result<ProductDetail, CatalogError> {
        self.record(format!("detail:{id}"));
        if self.script(id, |s| s.fail_detail) {
            return Err(CatalogError::parse(id, "product page", "no product name element"));
        }
        Ok(ProductDetail {
            name: format!("Product {id}"),
            buy_link: Some(format!("https://cart.test/gate.action?pid={id}&pcount=1&ptype=1")),
        })
    }

    async fn price(&self, id: &str) -> Result<f64, CatalogError> {
        self.record(format!("price:{id}"));
        self.script(id, |s| next(&mut s.prices))
            .ok_or_else(|| CatalogError::price_unavailable(id, "empty price list"))
    }

    async fn stock(&self, id: &str) -> Result<StockStatus, CatalogError> {
        self.record(format!("stock:{id}"));
        let code = self
            .script(id, |s| next(&mut s.stocks))
            .ok_or_else(|| CatalogError::StockUnavailable { id: id.to_string() })?;
        let code = StockCode::from(code);
        Ok(StockStatus {
            code,
            label: if code.is_on_sale() { "现货" } else { "无货" }.to_string(),
        })
    }

    fn buy_link(
        &self,
        id: &str,
        quantity: u32,
        catalog_link: Option<&str>,
    ) -> Result<Url, CartError> {
        let link = match catalog_link {
            Some(link) if quantity == 1 => link.to_string(),
            _ => format!("https://cart.test/gate.action?pid={id}&pcount={quantity}&ptype=1"),
        };
        Ok(Url::parse(&link).unwrap())
    }

    async fn add_to_cart(&self, id: &str, link: &Url) -> Result<(), CartError> {
        self.record(format!("add:{id}"));
        self.record(format!("link:{link}"));
        if self.script(id, |s| s.fail_add) {
            Err(CartError::AddFailed { id: id.to_string() })
        } else {
            Ok(())
        }
    }

    async fn set_quantity(&self, id: &str, quantity: u32) -> Result<(), CartError> {
        self.record(format!("quantity:{id}"));
        let echoed = self
            .script(id, |s| s.echoed_quantity)
            .unwrap_or(i64::from(quantity));
        if echoed == i64::from(quantity) {
            Ok(())
        } else {
            Err(CartError::QuantityMismatch {
                id: id.to_string(),
                expected: quantity,
                actual: echoed,
            })
        }
    }
}

/// Order desk that records calls and always succeeds.
#[derive(Debug, Default)]
pub(crate) struct RecordingDesk {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingDesk {
    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderDesk for RecordingDesk {
    async fn apply_best_coupons(&self) -> Result<(), OrderError> {
        self.calls.lock().unwrap().push("coupons");
        Ok(())
    }

    async fn order_summary(&self) -> Result<OrderSummary, OrderError> {
        self.calls.lock().unwrap().push("summary");
        Ok(OrderSummary::default())
    }

    async fn submit_order(&self) -> Result<String, OrderError> {
        self.calls.lock().unwrap().push("submit");
        Ok("42".to_string())
    }
}
