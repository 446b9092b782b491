//! Deal-discount, shipping and tax math
//!
//! Every price shown by the storefront (catalog cards, cart lines, cart and
//! order summaries, checkout) is computed here. The functions are pure: the
//! current instant is passed in through a [`DealClock`].
//!
//! Deal windows are half-open, `[start, end)`, and compared as UTC instants.
//! Deal dates come from the backend as local date and time strings; the clock
//! carries the fixed offset of the store so that they can be normalized.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::cart::CartLine;
use crate::models::{Deal, Order, ShippingConfig};

/// Whether `now` lies in `[start, end)`; a missing start is unbounded
pub fn is_within(now: DateTime<Utc>, start: Option<DateTime<Utc>>, end: DateTime<Utc>) -> bool {
    start.is_none_or(|start| start <= now) && now < end
}

/// Clamp a discount percentage to `[0, 100]`
pub fn clamp_discount(percentage: Decimal) -> Decimal {
    percentage.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
}

/// Round an amount to cents for display
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The instant deals are evaluated at, plus the store's UTC offset
#[derive(Debug, Clone, Copy)]
pub struct DealClock {
    now: DateTime<Utc>,
    offset: FixedOffset,
}

impl DealClock {
    /// Clock at `now`, interpreting deal dates as UTC
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            offset: Utc.fix(),
        }
    }

    /// Clock at the current instant with the given store offset
    pub fn now_with_offset(offset: FixedOffset) -> Self {
        Self::at(Utc::now()).with_offset(offset)
    }

    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Combine a local date and optional time into a UTC instant
    ///
    /// Returns `None` when either part is malformed.
    fn instant(&self, date: &str, time: Option<&str>, default_time: NaiveTime) -> Option<DateTime<Utc>> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()?;
        let time = match time.map(str::trim).filter(|t| !t.is_empty()) {
            Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .ok()?,
            None => default_time,
        };
        let local = NaiveDateTime::new(date, time);
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Resolve the deal's `[start, end)` window
    ///
    /// `None` when the end is missing or any present date/time is malformed.
    pub fn window(&self, deal: &Deal) -> Option<(Option<DateTime<Utc>>, DateTime<Utc>)> {
        let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)?;
        let end = self.instant(deal.end_date.as_deref()?, deal.end_time.as_deref(), end_of_day)?;

        let start = match deal.start_date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            Some(date) => Some(self.instant(date, deal.start_time.as_deref(), NaiveTime::MIN)?),
            None => None,
        };

        Some((start, end))
    }

    /// Whether the deal applies right now
    pub fn is_active(&self, deal: &Deal) -> bool {
        if deal.active == Some(false) {
            return false;
        }
        self.window(deal)
            .is_some_and(|(start, end)| is_within(self.now, start, end))
    }

    /// Whole seconds until the deal ends, if it is active
    pub fn seconds_remaining(&self, deal: &Deal) -> Option<i64> {
        if !self.is_active(deal) {
            return None;
        }
        self.window(deal)
            .map(|(_, end)| (end - self.now).num_seconds())
    }
}

/// Price of one unit with any deal applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub list_price: Decimal,
    pub unit_price: Decimal,
    pub savings: Decimal,
    /// Clamped percentage of the deal that was applied
    pub discount_percentage: Option<Decimal>,
}

impl PriceQuote {
    pub fn is_discounted(&self) -> bool {
        self.discount_percentage.is_some()
    }
}

/// Price a unit at `base`, applying `deal` only while it is active
pub fn quote(base: Decimal, deal: Option<&Deal>, clock: &DealClock) -> PriceQuote {
    let list_price = base.max(Decimal::ZERO);

    match deal.filter(|d| clock.is_active(d)) {
        Some(deal) => {
            let pct = clamp_discount(deal.discount_percentage);
            let unit_price = list_price * (Decimal::ONE - pct / Decimal::ONE_HUNDRED);
            PriceQuote {
                list_price,
                unit_price,
                savings: list_price - unit_price,
                discount_percentage: Some(pct),
            }
        }
        None => PriceQuote {
            list_price,
            unit_price: list_price,
            savings: Decimal::ZERO,
            discount_percentage: None,
        },
    }
}

/// Best currently active deal covering the product
pub fn best_deal_for<'a>(product_id: i64, deals: &'a [Deal], clock: &DealClock) -> Option<&'a Deal> {
    deals
        .iter()
        .filter(|d| d.covers(product_id) && clock.is_active(d))
        .max_by_key(|d| clamp_discount(d.discount_percentage))
}

/// Aggregates over a cart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    /// Sum of discounted unit price times quantity
    pub total_price: Decimal,
    /// Sum of per-unit savings times quantity, over lines with a valid deal
    pub total_savings: Decimal,
    /// Sum of list price times quantity
    pub original_total: Decimal,
    pub item_count: i64,
}

/// Sum a cart; lines without a product or with a non-positive quantity count as zero
pub fn cart_totals(lines: &[CartLine], clock: &DealClock) -> CartTotals {
    lines.iter().fold(CartTotals::default(), |mut totals, line| {
        let Some(product) = line.product.as_ref() else {
            return totals;
        };
        if line.quantity <= 0 {
            return totals;
        }

        let qty = Decimal::from(line.quantity);
        let price = quote(product.price, line.deal_info.as_ref(), clock);

        totals.total_price += price.unit_price * qty;
        totals.total_savings += price.savings * qty;
        totals.original_total += price.list_price * qty;
        totals.item_count += line.quantity;
        totals
    })
}

/// Delivery speed chosen at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShippingMethod {
    #[default]
    Standard,
    Express,
}

/// Shipping fees, free-shipping threshold and flat tax rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingPolicy {
    pub standard_fee: Decimal,
    pub express_fee: Decimal,
    pub free_shipping_threshold: Decimal,
    pub free_shipping_enabled: bool,
    pub tax_rate: Decimal,
}

impl Default for ShippingPolicy {
    /// Free shipping from 1000, otherwise 100; 10% tax
    fn default() -> Self {
        Self {
            standard_fee: Decimal::ONE_HUNDRED,
            express_fee: Decimal::from(200),
            free_shipping_threshold: Decimal::ONE_THOUSAND,
            free_shipping_enabled: true,
            tax_rate: Decimal::new(10, 2),
        }
    }
}

impl ShippingPolicy {
    /// Overlay the fields the backend configuration sets
    pub fn merged_with(mut self, config: &ShippingConfig) -> Self {
        if let Some(fee) = config.standard_shipping_fee {
            self.standard_fee = fee.max(Decimal::ZERO);
        }
        if let Some(fee) = config.express_shipping_fee {
            self.express_fee = fee.max(Decimal::ZERO);
        }
        if let Some(threshold) = config.free_shipping_threshold {
            self.free_shipping_threshold = threshold;
        }
        if let Some(enabled) = config.free_shipping_enabled {
            self.free_shipping_enabled = enabled;
        }
        self
    }

    pub fn fee_for(&self, method: ShippingMethod) -> Decimal {
        match method {
            ShippingMethod::Standard => self.standard_fee,
            ShippingMethod::Express => self.express_fee,
        }
    }
}

/// Subtotal, shipping, tax and grand total of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub free_shipping: bool,
}

impl OrderTotals {
    /// Same totals rounded to cents
    pub fn rounded(self) -> Self {
        Self {
            subtotal: round_money(self.subtotal),
            shipping: round_money(self.shipping),
            tax: round_money(self.tax),
            total: round_money(self.total),
            free_shipping: self.free_shipping,
        }
    }
}

/// Totals for a post-discount subtotal
pub fn order_totals(subtotal: Decimal, policy: &ShippingPolicy, method: ShippingMethod) -> OrderTotals {
    let subtotal = subtotal.max(Decimal::ZERO);
    let free_shipping = policy.free_shipping_enabled && subtotal >= policy.free_shipping_threshold;
    let shipping = if free_shipping {
        Decimal::ZERO
    } else {
        policy.fee_for(method)
    };
    let tax = subtotal * policy.tax_rate;

    OrderTotals {
        subtotal,
        shipping,
        tax,
        total: subtotal + shipping + tax,
        free_shipping,
    }
}

/// Savings and totals of a placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    /// List-price total where the product is known
    pub original_subtotal: Decimal,
    pub savings: Decimal,
    pub shipping_method: ShippingMethod,
    #[serde(flatten)]
    pub totals: OrderTotals,
}

/// Summarize a placed order from the unit prices captured at order time
///
/// Savings are measured against the product's current list price when the
/// order line embeds the product and that price is higher.
pub fn order_summary(order: &Order, policy: &ShippingPolicy, method: ShippingMethod) -> OrderSummary {
    let mut subtotal = Decimal::ZERO;
    let mut original_subtotal = Decimal::ZERO;

    for item in order.items.iter().filter(|i| i.quantity > 0) {
        let qty = Decimal::from(item.quantity);
        let paid = item.price.max(Decimal::ZERO);
        let list = item
            .product
            .as_ref()
            .map(|p| p.price)
            .filter(|list| *list > paid)
            .unwrap_or(paid);

        subtotal += paid * qty;
        original_subtotal += list * qty;
    }

    let totals = order_totals(subtotal, policy, method);
    OrderSummary {
        original_subtotal: round_money(original_subtotal),
        savings: round_money(original_subtotal - subtotal),
        shipping_method: method,
        totals: totals.rounded(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn clock() -> DealClock {
        DealClock::at(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap())
    }

    fn deal(pct: i64, start: Option<&str>, end: Option<&str>) -> Deal {
        Deal {
            id: 1,
            title: "Summer".into(),
            description: None,
            discount_percentage: Decimal::from(pct),
            image_url: None,
            start_date: start.map(Into::into),
            start_time: None,
            end_date: end.map(Into::into),
            end_time: None,
            active: Some(true),
            products: vec![],
        }
    }

    #[test]
    fn test_is_within_is_half_open() {
        let now = clock().now();
        assert!(is_within(now, Some(now), now + Duration::seconds(1)));
        assert!(!is_within(now, None, now));
        assert!(!is_within(now, Some(now + Duration::seconds(1)), now + Duration::days(1)));
        assert!(is_within(now, None, now + Duration::seconds(1)));
    }

    #[test]
    fn test_end_date_defaults_to_end_of_day() {
        let d = deal(10, None, Some("2024-06-15"));
        assert!(clock().is_active(&d));

        let late = DealClock::at(Utc.with_ymd_and_hms(2024, 6, 15, 23, 59, 59).unwrap());
        assert!(!late.is_active(&d));
    }

    #[test]
    fn test_start_in_future_is_inactive() {
        let d = deal(10, Some("2024-06-16"), Some("2024-06-30"));
        assert!(!clock().is_active(&d));
    }

    #[test]
    fn test_start_time_is_honoured() {
        let mut d = deal(10, Some("2024-06-15"), Some("2024-06-30"));
        d.start_time = Some("12:00:00".into());
        assert!(clock().is_active(&d));

        d.start_time = Some("12:00:01".into());
        assert!(!clock().is_active(&d));
    }

    #[test]
    fn test_malformed_dates_are_inactive() {
        assert!(!clock().is_active(&deal(10, None, None)));
        assert!(!clock().is_active(&deal(10, None, Some("next week"))));
        assert!(!clock().is_active(&deal(10, Some("06/01/2024"), Some("2024-06-30"))));

        let mut d = deal(10, None, Some("2024-06-30"));
        d.end_time = Some("25:99".into());
        assert!(!clock().is_active(&d));
    }

    #[test]
    fn test_past_end_ignores_flag() {
        let mut d = deal(10, None, Some("2024-06-14"));
        d.active = Some(true);
        assert!(!clock().is_active(&d));
        d.active = None;
        assert!(!clock().is_active(&d));
    }

    #[test]
    fn test_disabled_flag_wins() {
        let mut d = deal(10, None, Some("2024-06-30"));
        d.active = Some(false);
        assert!(!clock().is_active(&d));
    }

    #[test]
    fn test_offset_shifts_window() {
        // 2024-06-15 17:00 at +05:30 is 11:30 UTC, before the clock's noon
        let mut d = deal(10, None, Some("2024-06-15"));
        d.end_time = Some("17:00".into());
        let ist = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();

        assert!(clock().is_active(&d));
        assert!(!clock().with_offset(ist).is_active(&d));
    }

    #[test]
    fn test_quote_applies_active_deal() {
        let d = deal(25, None, Some("2024-06-30"));
        let q = quote(Decimal::from(200), Some(&d), &clock());

        assert_eq!(q.unit_price, Decimal::from(150));
        assert_eq!(q.savings, Decimal::from(50));
        assert_eq!(q.discount_percentage, Some(Decimal::from(25)));
    }

    #[test]
    fn test_quote_clamps_percentage() {
        let over = deal(150, None, Some("2024-06-30"));
        let under = deal(-20, None, Some("2024-06-30"));

        assert_eq!(quote(Decimal::from(80), Some(&over), &clock()).unit_price, Decimal::ZERO);
        assert_eq!(
            quote(Decimal::from(80), Some(&under), &clock()).unit_price,
            Decimal::from(80)
        );
    }

    #[test]
    fn test_quote_without_deal_is_list_price() {
        let base = Decimal::new(4999, 2);
        let first = quote(base, None, &clock());
        let second = quote(first.unit_price, None, &clock());

        assert_eq!(first.unit_price, base);
        assert_eq!(second.unit_price, base);
        assert!(!first.is_discounted());
    }

    #[test]
    fn test_best_deal_picks_largest_active_discount() {
        let product: crate::models::Product = serde_json::from_str(r#"{"id":4}"#).unwrap();
        let mut small = deal(10, None, Some("2024-06-30"));
        small.products = vec![product.clone()];
        let mut big = deal(30, None, Some("2024-06-30"));
        big.id = 2;
        big.products = vec![product.clone()];
        let mut expired = deal(60, None, Some("2024-06-01"));
        expired.id = 3;
        expired.products = vec![product];

        let deals = vec![small, big, expired];
        assert_eq!(best_deal_for(4, &deals, &clock()).map(|d| d.id), Some(2));
        assert!(best_deal_for(5, &deals, &clock()).is_none());
    }

    #[test]
    fn test_order_totals_thresholds() {
        let policy = ShippingPolicy::default();

        let t = order_totals(Decimal::from(800), &policy, ShippingMethod::Standard);
        assert_eq!((t.shipping, t.tax, t.total), (Decimal::from(100), Decimal::from(80), Decimal::from(980)));

        let t = order_totals(Decimal::from(1200), &policy, ShippingMethod::Standard);
        assert_eq!((t.shipping, t.tax, t.total), (Decimal::ZERO, Decimal::from(120), Decimal::from(1320)));

        let t = order_totals(Decimal::from(1000), &policy, ShippingMethod::Standard);
        assert_eq!(t.shipping, Decimal::ZERO);
        assert!(t.free_shipping);
    }

    #[test]
    fn test_express_and_disabled_free_shipping() {
        let config = ShippingConfig {
            express_shipping_fee: Some(Decimal::from(250)),
            free_shipping_enabled: Some(false),
            ..Default::default()
        };
        let policy = ShippingPolicy::default().merged_with(&config);

        let t = order_totals(Decimal::from(5000), &policy, ShippingMethod::Express);
        assert_eq!(t.shipping, Decimal::from(250));
        assert!(!t.free_shipping);
    }

    #[test]
    fn test_order_summary_uses_captured_prices() {
        let order: Order = serde_json::from_str(
            r#"{"id":1,"status":"PENDING","items":[
                {"productId":1,"quantity":2,"price":80,"product":{"id":1,"price":100}},
                {"productId":2,"quantity":1,"price":50}]}"#,
        )
        .unwrap();

        let summary = order_summary(&order, &ShippingPolicy::default(), ShippingMethod::Standard);
        assert_eq!(summary.totals.subtotal, Decimal::from(210));
        assert_eq!(summary.savings, Decimal::from(40));
        assert_eq!(summary.original_subtotal, Decimal::from(250));
        assert_eq!(summary.totals.shipping, Decimal::from(100));
        assert_eq!(summary.totals.total, Decimal::from(331));

        let express = order_summary(&order, &ShippingPolicy::default(), ShippingMethod::Express);
        assert_eq!(express.shipping_method, ShippingMethod::Express);
        assert_eq!(express.totals.shipping, Decimal::from(200));
        assert_eq!(express.totals.total, Decimal::from(431));
    }
}
