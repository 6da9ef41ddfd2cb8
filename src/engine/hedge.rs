use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::config::LogOption;
use crate::engine::strategy::XemmStrategy;
use crate::types::{FillRecord, OrderFilledEvent, PairId, TradeType};

impl XemmStrategy {
    /// Buffer a maker fill and immediately try to hedge the pair's
    /// accumulated exposure.
    pub(crate) fn buffer_maker_fill(&mut self, pid: PairId, event: &OrderFilledEvent) {
        let record = FillRecord {
            order_id: event.order_id.clone(),
            trade_type: event.trade_type,
            amount: event.amount,
            price: event.price,
            event_ts: event.timestamp,
        };
        let bucket = match event.trade_type {
            TradeType::Buy => self.pending_buy_fills.entry(pid).or_default(),
            TradeType::Sell => self.pending_sell_fills.entry(pid).or_default(),
        };
        bucket.push(record);
        self.drain_hedges(pid);
    }

    /// Turn buffered maker fills into taker market orders. Each bucket is
    /// hedged as one aggregate order and cleared only once the venue
    /// accepts it; anything else stays queued for the next tick or fill.
    pub(crate) fn drain_hedges(&mut self, pid: PairId) {
        self.drain_buy_bucket(pid);
        self.drain_sell_bucket(pid);
    }

    /// Maker buys are offset by selling base on the taker venue.
    fn drain_buy_bucket(&mut self, pid: PairId) {
        let total = bucket_total(self.pending_buy_fills.get(&pid));
        if total <= Decimal::ZERO {
            return;
        }
        let taker = self.pairs[pid.0].taker.clone();
        let cap = taker.venue.available_balance(&taker.base_asset)
            * self.cfg.order_size_taker_balance_factor;
        let hedge = taker
            .venue
            .quantize_order_amount(&taker.trading_pair, total.min(cap));
        if hedge <= Decimal::ZERO {
            return;
        }
        match self.place_taker_order(pid, TradeType::Sell, hedge) {
            Ok(id) => {
                if hedge < total {
                    warn!(
                        pair = pid.0,
                        filled = %total,
                        hedged = %hedge,
                        "taker balance caps the hedge; residual exposure accepted"
                    );
                }
                if self.cfg.logs(LogOption::MAKER_ORDER_HEDGED) {
                    info!(
                        pair = pid.0,
                        order_id = %id,
                        amount = %hedge,
                        "hedging maker buy fills with taker sell order"
                    );
                }
                self.pending_buy_fills.remove(&pid);
            }
            Err(e) => {
                // Bucket untouched: the next tick retries.
                error!(pair = pid.0, error = %e, "taker sell hedge rejected");
            }
        }
    }

    /// Maker sells are offset by buying base back on the taker venue; the
    /// spendable quote converts into base at the taker VWAP for the full
    /// buffered quantity.
    fn drain_sell_bucket(&mut self, pid: PairId) {
        let total = bucket_total(self.pending_sell_fills.get(&pid));
        if total <= Decimal::ZERO {
            return;
        }
        let taker = self.pairs[pid.0].taker.clone();
        let vwap = taker
            .venue
            .order_book(&taker.trading_pair)
            .and_then(|b| b.vwap_for_volume(true, total))
            .or_else(|| taker.venue.best_price(&taker.trading_pair, true));
        let Some(vwap) = vwap else {
            return;
        };
        if vwap <= Decimal::ZERO {
            return;
        }
        let cap = taker.venue.available_balance(&taker.quote_asset) / vwap
            * self.cfg.order_size_taker_balance_factor;
        let hedge = taker
            .venue
            .quantize_order_amount(&taker.trading_pair, total.min(cap));
        if hedge <= Decimal::ZERO {
            return;
        }
        match self.place_taker_order(pid, TradeType::Buy, hedge) {
            Ok(id) => {
                if hedge < total {
                    warn!(
                        pair = pid.0,
                        filled = %total,
                        hedged = %hedge,
                        "taker balance caps the hedge; residual exposure accepted"
                    );
                }
                if self.cfg.logs(LogOption::MAKER_ORDER_HEDGED) {
                    info!(
                        pair = pid.0,
                        order_id = %id,
                        amount = %hedge,
                        "hedging maker sell fills with taker buy order"
                    );
                }
                self.pending_sell_fills.remove(&pid);
            }
            Err(e) => {
                error!(pair = pid.0, error = %e, "taker buy hedge rejected");
            }
        }
    }

    pub fn pending_fill_totals(&self, pid: PairId) -> (Decimal, Decimal) {
        (
            bucket_total(self.pending_buy_fills.get(&pid)),
            bucket_total(self.pending_sell_fills.get(&pid)),
        )
    }
}

fn bucket_total(bucket: Option<&Vec<FillRecord>>) -> Decimal {
    bucket
        .map(|fills| fills.iter().map(|f| f.amount).sum())
        .unwrap_or(Decimal::ZERO)
}
