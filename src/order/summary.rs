//! Order confirmation page extraction.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};

use super::OrderError;
use crate::html;

/// Charge text the storefront shows for an empty charge.
const ZERO_CHARGE: &str = "￥0.00";

#[allow(clippy::expect_used)]
static ORDER_SUMMARY: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.order-summary").expect("static selector is valid"));

#[allow(clippy::expect_used)]
static TRADE_FOOT: LazyLock<Selector> =
    LazyLock::new(|| html::selector("div.trade-foot").expect("static selector is valid"));

/// Price breakdown and delivery details of the pending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSummary {
    /// Goods total.
    pub goods_total: String,
    /// Cash back.
    pub cash_back: String,
    /// Shipping charge.
    pub shipping: String,
    /// Service fee.
    pub service_fee: String,
    /// Coupon discount.
    pub coupon_discount: String,
    /// Shipping discount.
    pub freight_discount: String,
    /// Amount payable.
    pub payable_total: String,
    /// Contact phone line.
    pub contact_phone: String,
    /// Shipping address line.
    pub shipping_address: String,
}

impl OrderSummary {
    /// Every charge line with its label.
    #[must_use]
    pub fn charges(&self) -> [(&'static str, &str); 6] {
        [
            ("goods total", &self.goods_total),
            ("cash back", &self.cash_back),
            ("shipping", &self.shipping),
            ("service fee", &self.service_fee),
            ("coupon discount", &self.coupon_discount),
            ("shipping discount", &self.freight_discount),
        ]
    }

    /// Charge lines worth showing: zero charges are left out.
    #[must_use]
    pub fn nonzero_charges(&self) -> Vec<(&'static str, &str)> {
        self.charges()
            .into_iter()
            .filter(|(_, value)| !value.contains(ZERO_CHARGE))
            .collect()
    }
}

pub(super) fn parse_order_page(page: &str) -> Result<OrderSummary, OrderError> {
    let document = Html::parse_document(page);
    let summary = document.select(&ORDER_SUMMARY).next();
    let foot = document.select(&TRADE_FOOT).next();

    if summary.is_none() && foot.is_none() {
        return Err(OrderError::invalid_response(
            "order page has neither a price summary nor a payment footer",
        ));
    }

    let mut order = OrderSummary::default();
    if let Some(summary) = summary {
        order.goods_total = text_by_id(summary, "warePriceId")?;
        order.cash_back = text_by_id(summary, "cachBackId")?;
        order.shipping = text_by_id(summary, "freightPriceId")?;
        order.service_fee = text_by_id(summary, "serviceFeeId")?;
        order.coupon_discount = text_by_id(summary, "couponPriceId")?;
        order.freight_discount = text_by_id(summary, "freeFreightPriceId")?;
    }
    if let Some(foot) = foot {
        order.payable_total = text_by_id(foot, "sumPayPriceId")?;
        order.contact_phone = text_by_id(foot, "sendMobile")?;
        order.shipping_address = text_by_id(foot, "sendAddr")?;
    }
    Ok(order)
}

fn text_by_id(scope: ElementRef<'_>, id: &str) -> Result<String, OrderError> {
    let selector = html::selector(&format!("#{id}")).map_err(OrderError::invalid_response)?;
    Ok(html::text_or_empty(scope, &selector))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ORDER_PAGE: &str = r#"<html><body>
        <div class="order-summary">
            <div><span id="warePriceId">￥398.00</span></div>
            <div><span id="cachBackId">￥0.00</span></div>
            <div><span id="freightPriceId">￥6.00</span></div>
            <div><span id="serviceFeeId">￥0.00</span></div>
            <div><span id="couponPriceId">-￥20.00</span></div>
            <div><span id="freeFreightPriceId">-￥6.00</span></div>
        </div>
        <div class="trade-foot">
            <span id="sumPayPriceId">￥378.00</span>
            <span id="sendMobile">寄送至： 138****0000</span>
            <span id="sendAddr">收货人：Li 北京 朝阳区</span>
        </div>
    </body></html>"#;

    #[test]
    fn test_parse_order_page_reads_every_field() {
        let summary = parse_order_page(ORDER_PAGE).unwrap();
        assert_eq!(summary.goods_total, "￥398.00");
        assert_eq!(summary.shipping, "￥6.00");
        assert_eq!(summary.coupon_discount, "-￥20.00");
        assert_eq!(summary.payable_total, "￥378.00");
        assert_eq!(summary.contact_phone, "寄送至： 138****0000");
        assert_eq!(summary.shipping_address, "收货人：Li 北京 朝阳区");
    }

    #[test]
    fn test_zero_charges_are_omitted() {
        let summary = parse_order_page(ORDER_PAGE).unwrap();
        let labels: Vec<&str> = summary
            .nonzero_charges()
            .into_iter()
            .map(|(label, _)| label)
            .collect();
        assert_eq!(
            labels,
            ["goods total", "shipping", "coupon discount", "shipping discount"]
        );
    }

    #[test]
    fn test_page_without_summary_is_rejected() {
        let err = parse_order_page("<html><body>login</body></html>").unwrap_err();
        assert!(matches!(err, OrderError::InvalidResponse { .. }));
    }
}
