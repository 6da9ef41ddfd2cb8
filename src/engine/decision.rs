use rust_decimal::Decimal;
use tracing::{error, info};

use crate::config::LogOption;
use crate::engine::strategy::XemmStrategy;
use crate::types::{PairId, TrackedOrder, TradeType};

impl XemmStrategy {
    /// Per-tick routine for one pair: hedge leftovers, then run every
    /// resting maker order through the profitability → balance → drift
    /// checks, then create whatever side is missing. At most one bid and
    /// one ask survive each pass.
    pub(crate) fn process_pair(&mut self, pid: PairId) {
        // Fills that could not be hedged earlier retry before anything else.
        self.drain_hedges(pid);

        // In-flight cancels are already hidden here.
        let active = self.order_tracker.active_maker_orders(pid);
        let has_bid = active.iter().any(|o| o.trade_type.is_buy());
        let has_ask = active.iter().any(|o| !o.trade_type.is_buy());

        for order in &active {
            self.review_order(pid, order);
        }

        // While a taker hedge is pending, hold off on new exposure.
        if self.order_tracker.taker_order_count(pid) > 0 {
            return;
        }

        self.check_and_create(pid, has_bid, has_ask);
    }

    /// Decide whether one resting order survives this tick.
    fn review_order(&mut self, pid: PairId, order: &TrackedOrder) {
        let is_bid = order.trade_type.is_buy();
        let Some(order_price) = order.price else {
            return;
        };

        // Profitability: compare against what hedging the full remaining
        // quantity would earn right now.
        let hedge = self.effective_hedging_price(pid, is_bid, order.quantity);
        let threshold = if self.cfg.active_order_canceling {
            self.cfg.min_profitability
        } else {
            self.cfg.cancel_order_threshold
        };
        let edge = Decimal::ONE + threshold;
        let profitable = match hedge {
            None => false,
            Some(h) => {
                if is_bid {
                    h >= order_price * edge
                } else {
                    order_price >= h * edge
                }
            }
        };
        if !profitable {
            if self.cfg.logs(LogOption::REMOVING_ORDER) {
                info!(
                    pair = pid.0,
                    order_id = %order.id,
                    side = order.trade_type.as_str(),
                    price = %order_price,
                    hedging_price = ?hedge,
                    "order no longer profitable; cancelling"
                );
            }
            self.cancel_maker_order(pid, &order.id);
            return;
        }

        // Passive mode stops at profitability; the venue-side TTL does the
        // rest.
        if !self.cfg.active_order_canceling {
            return;
        }

        // Balance: the maker must still be able to fund the fill.
        let size_limit = self.order_size_limit(pid, is_bid, order_price);
        if order.quantity > size_limit {
            if self.cfg.logs(LogOption::REMOVING_ORDER) {
                info!(
                    pair = pid.0,
                    order_id = %order.id,
                    quantity = %order.quantity,
                    size_limit = %size_limit,
                    "insufficient maker balance for resting order; cancelling"
                );
            }
            self.cancel_maker_order(pid, &order.id);
            return;
        }

        // Drift: re-price when the suggested quote moved, at most once per
        // anti-hysteresis window per pair.
        let timer = self
            .anti_hysteresis_timers
            .get(&pid)
            .copied()
            .unwrap_or(f64::MIN);
        if self.current_timestamp <= timer {
            return;
        }
        if let Some(suggested) = self.maker_price(pid, is_bid, order.quantity) {
            if suggested != order_price {
                if self.cfg.logs(LogOption::REMOVING_ORDER) {
                    info!(
                        pair = pid.0,
                        order_id = %order.id,
                        side = order.trade_type.as_str(),
                        price = %order_price,
                        suggested = %suggested,
                        "order price drifted; cancelling for re-quote"
                    );
                }
                self.cancel_maker_order(pid, &order.id);
                self.anti_hysteresis_timers.insert(
                    pid,
                    self.current_timestamp + self.cfg.anti_hysteresis_duration,
                );
            }
        }
    }

    /// Largest order the maker balance can still fund at this price,
    /// quantized onto the maker size grid.
    fn order_size_limit(&self, pid: PairId, is_bid: bool, price: Decimal) -> Decimal {
        let maker = &self.pairs[pid.0].maker;
        let amount = if is_bid {
            if price <= Decimal::ZERO {
                Decimal::ZERO
            } else {
                maker.venue.balance(&maker.quote_asset) / price
            }
        } else {
            maker.venue.balance(&maker.base_asset)
        };
        maker.venue.quantize_order_amount(&maker.trading_pair, amount)
    }

    /// Open whichever maker side has no resting order, provided the sizer
    /// and pricer both produce something workable.
    fn check_and_create(&mut self, pid: PairId, has_bid: bool, has_ask: bool) {
        for (is_bid, present) in [(true, has_bid), (false, has_ask)] {
            if present {
                continue;
            }
            let size = self.desired_size(pid, is_bid);
            if size <= Decimal::ZERO {
                if self.cfg.logs(LogOption::NULL_ORDER_SIZE) {
                    info!(
                        pair = pid.0,
                        side = if is_bid { "bid" } else { "ask" },
                        "order size is zero; skipping"
                    );
                }
                continue;
            }
            let Some(price) = self.maker_price(pid, is_bid, size) else {
                if self.cfg.logs(LogOption::NULL_ORDER_SIZE) {
                    info!(
                        pair = pid.0,
                        side = if is_bid { "bid" } else { "ask" },
                        "no hedgeable taker price; skipping"
                    );
                }
                continue;
            };
            if price <= Decimal::ZERO {
                continue;
            }
            if self.cfg.logs(LogOption::CREATE_ORDER) {
                info!(
                    pair = pid.0,
                    side = if is_bid { "bid" } else { "ask" },
                    price = %price,
                    size = %size,
                    "creating maker limit order"
                );
            }
            let trade_type = if is_bid { TradeType::Buy } else { TradeType::Sell };
            if let Err(e) = self.place_maker_order(pid, trade_type, size, price) {
                error!(pair = pid.0, error = %e, "maker order placement failed");
            }
        }
    }
}
