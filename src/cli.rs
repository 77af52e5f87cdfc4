//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use rushbuy_core::config::{DEFAULT_PERIOD_MS, DEFAULT_SHIP_AREA, RushConfig};

/// Watch storefront products and rush them into the cart.
///
/// Logs in with a scanned challenge code (or a still-valid stored session),
/// watches each requested product until it is in stock at or below its
/// price limit, adds it to the cart, and optionally submits the order.
#[derive(Parser, Debug)]
#[command(name = "rushbuy")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Shipping area code used for stock lookups and cart changes
    #[arg(long, default_value = DEFAULT_SHIP_AREA)]
    pub area: String,

    /// Refresh period while waiting for price or stock, in milliseconds (1-60000)
    #[arg(long, default_value_t = DEFAULT_PERIOD_MS, value_parser = clap::value_parser!(u64).range(1..=60000))]
    pub period: u64,

    /// Keep refreshing until price and stock conditions are met
    #[arg(long)]
    pub rush: bool,

    /// Submit the order once every product has been handled
    #[arg(long)]
    pub order: bool,

    /// Products to buy: id[:quantity[:maxPrice]], comma separated
    #[arg(long, default_value = "")]
    pub goods: String,

    /// File holding the session cookies between runs
    #[arg(long, default_value = "jd.cookies")]
    pub session_file: PathBuf,

    /// Root every storefront endpoint below this URL
    #[arg(long, hide = true)]
    pub storefront_url: Option<String>,
}

impl Args {
    /// Rush behavior selected by the flags.
    pub fn rush_config(&self) -> RushConfig {
        RushConfig {
            ship_area: self.area.clone(),
            period: Duration::from_millis(self.period),
            rush: self.rush,
            auto_submit: self.order,
        }
    }
}
