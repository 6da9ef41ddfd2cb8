use std::collections::HashMap;
use std::fmt::Write as _;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::config::{Config, ConfigError, LogOption};
use crate::engine::sampler::PriceSampler;
use crate::exchange::{NetworkStatus, Venue, VenueError};
use crate::oracle::RateOracle;
use crate::report;
use crate::state::orders::OrderTracker;
use crate::state::pairs::PairTracker;
use crate::types::{
    ClientOrderId, FillRecord, MarketPair, OrderCancelledEvent, OrderCompletedEvent,
    OrderFilledEvent, OrderType, PairId, TrackedOrder, TradeType, VenueEvent,
};

/// Cross-exchange market-making strategy. Owns every piece of mutable
/// state; driven by `tick(t)` and the `did_*` event entry points on a
/// single thread. Venue I/O never blocks: submissions return ids
/// immediately and settle through later events.
pub struct XemmStrategy {
    pub(crate) cfg: Config,
    pub(crate) pairs: Vec<MarketPair>,
    pub(crate) pair_tracker: PairTracker,
    pub(crate) order_tracker: OrderTracker,
    pub(crate) sampler: PriceSampler,
    pub(crate) pending_buy_fills: HashMap<PairId, Vec<FillRecord>>,
    pub(crate) pending_sell_fills: HashMap<PairId, Vec<FillRecord>>,
    pub(crate) anti_hysteresis_timers: HashMap<PairId, f64>,
    pub(crate) oracle: Arc<dyn RateOracle>,
    pub(crate) current_timestamp: f64,
    pub(crate) last_timestamp: f64,
    all_markets_ready: bool,
    last_conn_warning_ts: f64,
    last_status_report_ts: f64,
}

impl XemmStrategy {
    pub fn new(
        cfg: Config,
        pairs: Vec<MarketPair>,
        oracle: Arc<dyn RateOracle>,
    ) -> Result<Self, ConfigError> {
        cfg.validate()?;
        if pairs.is_empty() {
            return Err(ConfigError::NoMarketPairs);
        }
        Ok(Self {
            cfg,
            pairs,
            pair_tracker: PairTracker::default(),
            order_tracker: OrderTracker::default(),
            sampler: PriceSampler::default(),
            pending_buy_fills: HashMap::new(),
            pending_sell_fills: HashMap::new(),
            anti_hysteresis_timers: HashMap::new(),
            oracle,
            current_timestamp: 0.0,
            last_timestamp: 0.0,
            all_markets_ready: false,
            last_conn_warning_ts: f64::MIN,
            last_status_report_ts: f64::MIN,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Timestamp of the last completed tick.
    pub fn last_tick_timestamp(&self) -> f64 {
        self.last_timestamp
    }

    pub fn pair(&self, id: PairId) -> &MarketPair {
        &self.pairs[id.0]
    }

    pub fn pair_ids(&self) -> impl Iterator<Item = PairId> + use<> {
        (0..self.pairs.len()).map(PairId)
    }

    pub fn order_tracker(&self) -> &OrderTracker {
        &self.order_tracker
    }

    pub fn anti_hysteresis_timer(&self, pair: PairId) -> Option<f64> {
        self.anti_hysteresis_timers.get(&pair).copied()
    }

    /// Resolve an order id to its owning pair (live or shadow).
    pub fn lookup_pair(&self, id: &ClientOrderId) -> Option<PairId> {
        self.pair_tracker.lookup(id)
    }

    fn venues(&self) -> Vec<Arc<dyn Venue>> {
        let mut venues: Vec<Arc<dyn Venue>> = Vec::new();
        for pair in &self.pairs {
            for leg in [&pair.maker, &pair.taker] {
                if !venues.iter().any(|v| Arc::ptr_eq(v, &leg.venue)) {
                    venues.push(leg.venue.clone());
                }
            }
        }
        venues
    }

    /// Drain every venue's completion stream and dispatch, in delivery
    /// order. Called by the engine loop ahead of each tick.
    pub fn pump_events(&mut self) {
        for venue in self.venues() {
            for event in venue.drain_events() {
                self.dispatch_event(event);
            }
        }
    }

    pub fn dispatch_event(&mut self, event: VenueEvent) {
        match event {
            VenueEvent::OrderFilled(e) => self.did_fill_order(&e),
            VenueEvent::BuyOrderCompleted(e) => self.did_complete_buy_order(&e),
            VenueEvent::SellOrderCompleted(e) => self.did_complete_sell_order(&e),
            VenueEvent::OrderCancelled(e) => self.did_cancel_order(&e),
        }
    }

    /// Clock entry point. One pass over every configured pair; a failure
    /// inside one pair is contained and must not take down the engine.
    pub fn tick(&mut self, timestamp: f64) {
        self.current_timestamp = timestamp;
        self.pair_tracker.check_expiry(timestamp);

        if !self.all_markets_ready {
            let ready = self
                .pairs
                .iter()
                .all(|p| p.maker.venue.ready() && p.taker.venue.ready());
            if !ready {
                debug!("venues not ready; no market making this tick");
                return;
            }
            self.all_markets_ready = true;
            info!("all venues ready; market making started");
        }

        let disconnected = self.disconnected_venue_names();
        if !disconnected.is_empty()
            && timestamp >= self.last_conn_warning_ts + self.cfg.status_report_interval
        {
            self.last_conn_warning_ts = timestamp;
            warn!(
                venues = ?disconnected,
                "venues disconnected; continuing to trade with caution"
            );
        }

        for pid in (0..self.pairs.len()).map(PairId) {
            let (bid, ask) = self.top_of_book(pid);
            self.sampler.maybe_sample(pid, timestamp, bid, ask);
        }

        for pid in (0..self.pairs.len()).map(PairId) {
            let outcome = catch_unwind(AssertUnwindSafe(|| self.process_pair(pid)));
            if outcome.is_err() {
                error!(pair = pid.0, "pair processing panicked; skipping to next pair");
            }
        }

        if self.cfg.logs(LogOption::STATUS_REPORT)
            && timestamp >= self.last_status_report_ts + self.cfg.status_report_interval
        {
            self.last_status_report_ts = timestamp;
            info!("status report\n{}", self.format_status());
        }

        self.last_timestamp = timestamp;
    }

    fn disconnected_venue_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .pairs
            .iter()
            .flat_map(|p| [&p.maker, &p.taker])
            .filter(|leg| leg.venue.network_status() == NetworkStatus::NotConnected)
            .map(|leg| leg.venue.name().to_string())
            .collect();
        names.dedup();
        names
    }

    /// Maker fills feed the hedging pipeline; everything else is dropped
    /// here (taker market fills settle at completion time).
    pub fn did_fill_order(&mut self, event: &OrderFilledEvent) {
        if event.order_type != OrderType::Limit {
            return;
        }
        let Some(pid) = self.pair_tracker.lookup(&event.order_id) else {
            // Expected path for orders outside this strategy's universe.
            return;
        };
        self.order_tracker.apply_fill(&event.order_id, event.amount);
        if self.cfg.logs(LogOption::MAKER_ORDER_FILLED) {
            info!(
                pair = pid.0,
                order_id = %event.order_id,
                side = event.trade_type.as_str(),
                amount = %event.amount,
                price = %event.price,
                "maker order filled"
            );
        }
        self.buffer_maker_fill(pid, event);
    }

    pub fn did_complete_buy_order(&mut self, event: &OrderCompletedEvent) {
        self.complete_order(event, TradeType::Buy);
    }

    pub fn did_complete_sell_order(&mut self, event: &OrderCompletedEvent) {
        self.complete_order(event, TradeType::Sell);
    }

    fn complete_order(&mut self, event: &OrderCompletedEvent, trade_type: TradeType) {
        let Some(pid) = self.pair_tracker.lookup(&event.order_id) else {
            return;
        };
        if self.order_tracker.remove_limit_order(&event.order_id).is_some() {
            info!(
                pair = pid.0,
                order_id = %event.order_id,
                side = trade_type.as_str(),
                "maker order fully filled"
            );
            self.pair_tracker
                .stop_tracking(&event.order_id, self.current_timestamp);
        } else if self
            .order_tracker
            .remove_market_order(&event.order_id)
            .is_some()
        {
            if self.cfg.logs(LogOption::MAKER_ORDER_HEDGED) {
                info!(
                    pair = pid.0,
                    order_id = %event.order_id,
                    side = trade_type.as_str(),
                    "taker hedge order completed"
                );
            }
            self.pair_tracker
                .stop_tracking(&event.order_id, self.current_timestamp);
        }
    }

    pub fn did_cancel_order(&mut self, event: &OrderCancelledEvent) {
        let removed = self.order_tracker.remove_limit_order(&event.order_id).is_some()
            || self.order_tracker.remove_market_order(&event.order_id).is_some();
        if removed {
            self.pair_tracker
                .stop_tracking(&event.order_id, self.current_timestamp);
        }
    }

    /// Emit a maker limit order. Passive-cancel mode attaches the venue-side
    /// TTL so the venue expires what we will not actively re-price. The id
    /// is registered before returning.
    pub(crate) fn place_maker_order(
        &mut self,
        pid: PairId,
        trade_type: TradeType,
        amount: Decimal,
        price: Decimal,
    ) -> Result<ClientOrderId, VenueError> {
        let pair = self.pairs[pid.0].clone();
        let expiration =
            (!self.cfg.active_order_canceling).then_some(self.cfg.limit_order_min_expiration);
        let id = match trade_type {
            TradeType::Buy => pair.maker.venue.buy(
                &pair.maker.trading_pair,
                amount,
                OrderType::Limit,
                Some(price),
                expiration,
            )?,
            TradeType::Sell => pair.maker.venue.sell(
                &pair.maker.trading_pair,
                amount,
                OrderType::Limit,
                Some(price),
                expiration,
            )?,
        };
        self.pair_tracker.start_tracking(id.clone(), pid);
        self.order_tracker.start_tracking_limit(TrackedOrder {
            id: id.clone(),
            pair: pid,
            trade_type,
            order_type: OrderType::Limit,
            price: Some(price),
            quantity: amount,
            creation_ts: self.current_timestamp,
        });
        Ok(id)
    }

    /// Emit a taker market order for hedging.
    pub(crate) fn place_taker_order(
        &mut self,
        pid: PairId,
        trade_type: TradeType,
        amount: Decimal,
    ) -> Result<ClientOrderId, VenueError> {
        let pair = self.pairs[pid.0].clone();
        let id = match trade_type {
            TradeType::Buy => {
                pair.taker
                    .venue
                    .buy(&pair.taker.trading_pair, amount, OrderType::Market, None, None)?
            }
            TradeType::Sell => {
                pair.taker
                    .venue
                    .sell(&pair.taker.trading_pair, amount, OrderType::Market, None, None)?
            }
        };
        self.pair_tracker.start_tracking(id.clone(), pid);
        self.order_tracker.start_tracking_market(TrackedOrder {
            id: id.clone(),
            pair: pid,
            trade_type,
            order_type: OrderType::Market,
            price: None,
            quantity: amount,
            creation_ts: self.current_timestamp,
        });
        Ok(id)
    }

    /// Fire-and-forget cancellation. The order stays hidden from
    /// re-evaluation until the cancellation event lands; a venue error
    /// leaves state untouched so the next tick retries.
    pub(crate) fn cancel_maker_order(&mut self, pid: PairId, id: &ClientOrderId) {
        let pair = &self.pairs[pid.0];
        match pair.maker.venue.cancel(&pair.maker.trading_pair, id) {
            Ok(()) => self.order_tracker.add_in_flight_cancel(id),
            Err(e) => error!(pair = pid.0, order_id = %id, error = %e, "cancel failed"),
        }
    }

    /// Human-readable snapshot: venue health, balances, inside markets,
    /// and resting orders for every pair.
    pub fn format_status(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "  generated at {}", report::status_timestamp());
        for pid in (0..self.pairs.len()).map(PairId) {
            let pair = &self.pairs[pid.0];
            let _ = writeln!(
                out,
                "\n  [{}] maker {} {} / taker {} {}",
                pid.0,
                pair.maker.venue.name(),
                pair.maker.trading_pair,
                pair.taker.venue.name(),
                pair.taker.trading_pair,
            );

            for leg in [&pair.maker, &pair.taker] {
                let _ = writeln!(out, "{}", report::leg_status_line(leg));
            }

            let (top_bid, top_ask) = self.top_of_book(pid);
            let (smooth_bid, smooth_ask) = self.smoothed_top(pid);
            let _ = writeln!(
                out,
                "    maker top: bid {} / ask {} (smoothed {} / {})",
                report::fmt_opt(top_bid),
                report::fmt_opt(top_ask),
                report::fmt_opt(smooth_bid),
                report::fmt_opt(smooth_ask),
            );

            let orders = self.order_tracker.active_maker_orders(pid);
            if orders.is_empty() {
                let _ = writeln!(out, "    no active maker orders");
            } else {
                for order in &orders {
                    let hedge = order.price.and_then(|_| {
                        self.effective_hedging_price(
                            pid,
                            order.trade_type.is_buy(),
                            order.quantity,
                        )
                    });
                    let _ = writeln!(
                        out,
                        "{}",
                        report::order_status_line(order, hedge, self.current_timestamp)
                    );
                }
            }
        }
        out
    }
}
