use std::fmt::Write as _;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::types::{MarketLeg, TrackedOrder};

pub fn status_timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn fmt_opt(value: Option<Decimal>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "-".to_string(),
    }
}

/// One status line per venue leg: health plus both asset balances.
pub fn leg_status_line(leg: &MarketLeg) -> String {
    let mut line = String::new();
    let _ = write!(
        line,
        "    {} [{}] {}: {} {} ({} available), {} {} ({} available)",
        leg.venue.name(),
        if leg.venue.ready() { "ready" } else { "not ready" },
        leg.trading_pair,
        leg.venue.balance(&leg.base_asset),
        leg.base_asset,
        leg.venue.available_balance(&leg.base_asset),
        leg.venue.balance(&leg.quote_asset),
        leg.quote_asset,
        leg.venue.available_balance(&leg.quote_asset),
    );
    line
}

/// One status line per resting maker order, with the current hedging price
/// alongside for eyeballing the remaining edge.
pub fn order_status_line(
    order: &TrackedOrder,
    hedging_price: Option<Decimal>,
    now: f64,
) -> String {
    let age = (now - order.creation_ts).max(0.0);
    let mut line = String::new();
    let _ = write!(
        line,
        "    {} {} @ {} (hedge {} | age {:.0}s)",
        order.trade_type.as_str(),
        order.quantity,
        fmt_opt(order.price),
        fmt_opt(hedging_price),
        age,
    );
    line
}
