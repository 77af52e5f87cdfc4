//! Explicit configuration values passed into each component at construction.
//!
//! Nothing here is global: the binary builds these from CLI flags and tests
//! build them pointing at a mock storefront via [`Endpoints::rooted_at`].

use std::path::PathBuf;
use std::time::Duration;

/// Default shipping area code (province_city_district_town).
pub const DEFAULT_SHIP_AREA: &str = "18_1511_1513_40429";

/// Default poll period between gate re-checks, in milliseconds.
pub const DEFAULT_PERIOD_MS: u64 = 500;

/// Default whole-request timeout (seconds).
pub const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Default connect timeout (seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Scan-status poll budget before the login gives up.
pub const SCAN_MAX_ATTEMPTS: u32 = 50;

/// Wait between scan-status polls that did not report success.
pub const SCAN_INTERVAL: Duration = Duration::from_secs(3);

/// Every remote URL the core touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// Redirect-suppressed probe that answers 200 only for a live session.
    pub session_probe: String,
    /// Login page; establishes anti-forgery cookies.
    pub login_page: String,
    /// One-time visual challenge image.
    pub challenge_image: String,
    /// Scan-status poll (JSONP).
    pub scan_status: String,
    /// Ticket exchange for a validated session.
    pub ticket_validation: String,
    /// Prefix of product pages; the page is `{item_base}/{id}.html`.
    pub item_base: String,
    /// Price lookup.
    pub price_lookup: String,
    /// Stock lookup.
    pub stock_lookup: String,
    /// Cart-add gate used when the product page offers no usable link.
    pub cart_add: String,
    /// Quantity change for a cart line.
    pub change_quantity: String,
    /// Cart page (HTML).
    pub cart_page: String,
    /// Best discount bundle selection.
    pub best_coupons: String,
    /// Order confirmation page (HTML).
    pub order_info: String,
    /// Order submission.
    pub submit_order: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            session_probe: "https://home.jd.com/getUserVerifyRight.action".to_string(),
            login_page: "https://passport.jd.com/new/login.aspx".to_string(),
            challenge_image: "https://qr.m.jd.com/show".to_string(),
            scan_status: "https://qr.m.jd.com/check".to_string(),
            ticket_validation: "https://passport.jd.com/uc/qrCodeTicketValidation".to_string(),
            item_base: "https://item.jd.com".to_string(),
            price_lookup: "https://p.3.cn/prices/mgets".to_string(),
            stock_lookup: "https://c0.3.cn/stocks".to_string(),
            cart_add: "https://cart.jd.com/gate.action".to_string(),
            change_quantity: "https://cart.jd.com/changeNum.action".to_string(),
            cart_page: "https://cart.jd.com/cart.action".to_string(),
            best_coupons:
                "https://trade.jd.com/shopping/dynamic/coupon/getBestVertualCoupons.action"
                    .to_string(),
            order_info: "https://trade.jd.com/shopping/order/getOrderInfo.action".to_string(),
            submit_order: "https://trade.jd.com/shopping/order/submitOrder.action".to_string(),
        }
    }
}

impl Endpoints {
    /// Rebinds every endpoint below a single base URL, keeping the
    /// production path of each endpoint.
    #[must_use]
    pub fn rooted_at(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        let at = |path: &str| format!("{base}{path}");
        Self {
            session_probe: at("/getUserVerifyRight.action"),
            login_page: at("/new/login.aspx"),
            challenge_image: at("/show"),
            scan_status: at("/check"),
            ticket_validation: at("/uc/qrCodeTicketValidation"),
            item_base: at("/item"),
            price_lookup: at("/prices/mgets"),
            stock_lookup: at("/stocks"),
            cart_add: at("/gate.action"),
            change_quantity: at("/changeNum.action"),
            cart_page: at("/cart.action"),
            best_coupons: at("/shopping/dynamic/coupon/getBestVertualCoupons.action"),
            order_info: at("/shopping/order/getOrderInfo.action"),
            submit_order: at("/shopping/order/submitOrder.action"),
        }
    }

    /// Product page URL for an ID.
    #[must_use]
    pub fn item_page(&self, id: &str) -> String {
        format!("{}/{id}.html", self.item_base.trim_end_matches('/'))
    }
}

/// HTTP client timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    /// Whole-request timeout.
    pub request_timeout: Duration,
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

/// Rush behavior selected on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RushConfig {
    /// Shipping-area code used for stock lookups and cart changes.
    pub ship_area: String,
    /// Sleep between gate re-checks.
    pub period: Duration,
    /// Keep polling until conditions clear instead of failing fast.
    pub rush: bool,
    /// Submit the order once every watcher has finished.
    pub auto_submit: bool,
}

impl Default for RushConfig {
    fn default() -> Self {
        Self {
            ship_area: DEFAULT_SHIP_AREA.to_string(),
            period: Duration::from_millis(DEFAULT_PERIOD_MS),
            rush: false,
            auto_submit: false,
        }
    }
}

/// Bounded retry budget for the scan-status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanPolicy {
    /// Maximum number of scan-status requests.
    pub max_attempts: u32,
    /// Wait after each unsuccessful poll.
    pub interval: Duration,
}

impl Default for ScanPolicy {
    fn default() -> Self {
        Self {
            max_attempts: SCAN_MAX_ATTEMPTS,
            interval: SCAN_INTERVAL,
        }
    }
}

/// Where the challenge image is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChallengeConfig {
    /// Directory receiving the image.
    pub dir: PathBuf,
    /// File stem; the extension follows the response content type.
    pub file_stem: String,
}

impl Default for ChallengeConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            file_stem: "jd.qr".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rooted_at_keeps_production_paths() {
        let endpoints = Endpoints::rooted_at("http://127.0.0.1:9000/");
        assert_eq!(
            endpoints.session_probe,
            "http://127.0.0.1:9000/getUserVerifyRight.action"
        );
        assert_eq!(endpoints.scan_status, "http://127.0.0.1:9000/check");
        assert_eq!(
            endpoints.submit_order,
            "http://127.0.0.1:9000/shopping/order/submitOrder.action"
        );
    }

    #[test]
    fn test_item_page_formats_id() {
        let endpoints = Endpoints::default();
        assert_eq!(
            endpoints.item_page("3133811"),
            "https://item.jd.com/3133811.html"
        );
        let rooted = Endpoints::rooted_at("http://localhost:1234");
        assert_eq!(rooted.item_page("42"), "http://localhost:1234/item/42.html");
    }

    #[test]
    fn test_defaults_match_command_line_defaults() {
        let rush = RushConfig::default();
        assert_eq!(rush.ship_area, DEFAULT_SHIP_AREA);
        assert_eq!(rush.period, Duration::from_millis(500));
        assert!(!rush.rush);
        assert!(!rush.auto_submit);

        let scan = ScanPolicy::default();
        assert_eq!(scan.max_attempts, 50);
        assert_eq!(scan.interval, Duration::from_secs(3));
    }
}
