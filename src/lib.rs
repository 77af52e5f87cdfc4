//! Rush-buy Core Library
//!
//! This library watches products on a storefront until they become
//! purchasable (in stock, at or below a target price), places them in the
//! cart, and optionally submits the order.
//!
//! # Architecture
//!
//! The library is organized into the following modules, leaf first:
//! - [`session`] - Cookie jar shared by every request, with file persistence
//! - [`transport`] - Configured HTTP client (timeouts, headers, redirect suppression)
//! - [`auth`] - Challenge/response login handshake and session re-validation
//! - [`catalog`] - Product name, buy link, price, and stock lookups
//! - [`cart`] - Cart-add transaction and quantity verification
//! - [`order`] - Order summary, discount bundle, and submission
//! - [`rush`] - Per-product watch state machine and the engine that joins them
//! - [`shop`] - Composition of the storefront components behind the rush traits
//! - [`product`] - Product list parsing for requested items
//! - [`config`] - Explicit configuration values passed into each component

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub(crate) mod html;
pub mod order;
pub mod product;
pub mod rush;
pub mod session;
pub mod shop;
pub mod transport;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use auth::{AuthError, AuthState, Authenticator, ChallengeNotifier};
pub use cart::{CartError, CartOperator, CartOverview};
pub use catalog::{CatalogError, CatalogReader, ProductDetail, StockCode, StockStatus};
pub use config::{ChallengeConfig, Endpoints, HttpSettings, RushConfig, ScanPolicy};
pub use order::{FinalizeReport, OrderClient, OrderError, OrderFinalizer, OrderSummary};
pub use product::{ExpectedProduct, ProductListError, parse_product_list};
pub use rush::{
    OrderDesk, ProductSnapshot, RushBuyEngine, RushReport, Storefront, WatchError, WatchOutcome,
    WatchPolicy, WatchState, Watcher,
};
pub use session::{Cookie, FileSessionStore, SessionError, SessionJar, SessionStore};
pub use shop::Shop;
pub use transport::{Transport, TransportError};
