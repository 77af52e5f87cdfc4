//! The storefront-backed [`Storefront`]: catalog reads plus cart mutations
//! over one shared transport.

use async_trait::async_trait;
use url::Url;

use crate::cart::{CartError, CartOperator};
use crate::catalog::{CatalogError, CatalogReader, ProductDetail, StockStatus};
use crate::config::{Endpoints, RushConfig};
use crate::rush::Storefront;
use crate::transport::Transport;

/// Catalog reader and cart operator bound to one shipping area.
#[derive(Debug, Clone)]
pub struct Shop {
    catalog: CatalogReader,
    cart: CartOperator,
    ship_area: String,
}

impl Shop {
    /// Builds both components over `transport`.
    pub fn new(transport: &Transport, endpoints: &Endpoints, config: &RushConfig) -> Self {
        Self {
            catalog: CatalogReader::new(transport.clone(), endpoints.clone()),
            cart: CartOperator::new(transport.clone(), endpoints.clone(), config.ship_area.clone()),
            ship_area: config.ship_area.clone(),
        }
    }

    /// The cart operator, for reads outside the watch loop.
    #[must_use]
    pub fn cart(&self) -> &CartOperator {
        &self.cart
    }
}

#[async_trait]
impl Storefront for Shop {
    async fn product_detail(&self, id: &str) -> Result<ProductDetail, CatalogError> {
        self.catalog.fetch_detail_page(id).await
    }

    async fn price(&self, id: &str) -> Result<f64, CatalogError> {
        self.catalog.fetch_price(id).await
    }

    async fn stock(&self, id: &str) -> Result<StockStatus, CatalogError> {
        self.catalog.fetch_stock(id, &self.ship_area).await
    }

    fn buy_link(
        &self,
        id: &str,
        quantity: u32,
        catalog_link: Option<&str>,
    ) -> Result<Url, CartError> {
        Ok(self.cart.buy_link(id, quantity, catalog_link)?)
    }

    async fn add_to_cart(&self, id: &str, link: &Url) -> Result<(), CartError> {
        self.cart.add_to_cart(id, link).await
    }

    async fn set_quantity(&self, id: &str, quantity: u32) -> Result<(), CartError> {
        self.cart.set_quantity(id, quantity).await
    }
}
