use rust_decimal::Decimal;
use tracing::info;

use crate::config::LogOption;
use crate::engine::strategy::XemmStrategy;
use crate::types::PairId;

/// Round down onto the venue price/size grid.
pub fn floor_to_quantum(value: Decimal, quantum: Decimal) -> Decimal {
    if quantum <= Decimal::ZERO {
        return value;
    }
    (value / quantum).floor() * quantum
}

/// Round up onto the venue price/size grid.
pub fn ceil_to_quantum(value: Decimal, quantum: Decimal) -> Decimal {
    if quantum <= Decimal::ZERO {
        return value;
    }
    (value / quantum).ceil() * quantum
}

impl XemmStrategy {
    /// Maker top of book at the configured depth tolerance. Zero tolerance
    /// reads the raw best bid/ask; otherwise the price at which the
    /// tolerance volume is reached on each side.
    pub(crate) fn top_of_book(&self, pid: PairId) -> (Option<Decimal>, Option<Decimal>) {
        let maker = &self.pairs[pid.0].maker;
        let Some(book) = maker.venue.order_book(&maker.trading_pair) else {
            return (None, None);
        };
        let tolerance = self.cfg.top_depth_tolerance;
        if tolerance.is_zero() {
            (book.best_bid(), book.best_ask())
        } else {
            (
                book.price_for_volume(false, tolerance),
                book.price_for_volume(true, tolerance),
            )
        }
    }

    /// Sample-smoothed inside market (widest bid, narrowest ask).
    pub(crate) fn smoothed_top(&self, pid: PairId) -> (Option<Decimal>, Option<Decimal>) {
        let (bid, ask) = self.top_of_book(pid);
        self.sampler.smoothed_top(pid, bid, ask)
    }

    /// Taker-side VWAP for offsetting a maker order of `size`: a maker bid
    /// is hedged by selling into taker bids, a maker ask by buying taker
    /// asks. `None` signals the fill cannot be hedged at any size.
    fn taker_hedge_vwap(&self, pid: PairId, is_bid: bool, size: Decimal) -> Option<Decimal> {
        let taker = &self.pairs[pid.0].taker;
        let book = taker.venue.order_book(&taker.trading_pair)?;
        book.vwap_for_volume(!is_bid, size)
    }

    fn convert_to_maker_quote(&self, pid: PairId, price: Decimal) -> Decimal {
        let pair = &self.pairs[pid.0];
        if pair.maker.quote_asset == pair.taker.quote_asset {
            price
        } else {
            self.oracle.convert_token_value(
                price,
                &pair.taker.quote_asset,
                &pair.maker.quote_asset,
            )
        }
    }

    /// The price at which a maker fill of `size` could be offset right now,
    /// in maker-quote units. This is what the supervisor compares resting
    /// orders against.
    pub fn effective_hedging_price(
        &self,
        pid: PairId,
        is_bid: bool,
        size: Decimal,
    ) -> Option<Decimal> {
        let vwap = self.taker_hedge_vwap(pid, is_bid, size)?;
        Some(self.convert_to_maker_quote(pid, vwap))
    }

    /// Tick-aligned maker price for a new or re-evaluated order.
    ///
    /// Bids divide the hedging price by (1 + min_profitability) and round
    /// down; asks multiply and round up, so quantization can never cross
    /// the profitability threshold. With order adjustment on, the bid is
    /// capped one tick above the smoothed top bid; the ask is *raised* to
    /// one tick below the smoothed top ask when profitability would imply
    /// a tighter quote (the clamp directions are intentionally asymmetric).
    pub fn maker_price(&self, pid: PairId, is_bid: bool, size: Decimal) -> Option<Decimal> {
        let (top_bid, top_ask) = self.smoothed_top(pid);
        let hedge = self.effective_hedging_price(pid, is_bid, size)?;
        let maker = &self.pairs[pid.0].maker;
        let quantum = maker.venue.order_price_quantum(&maker.trading_pair);
        let edge = Decimal::ONE + self.cfg.min_profitability;

        if is_bid {
            let mut price = hedge / edge;
            if self.cfg.adjust_order_enabled {
                if let Some(top_bid) = top_bid {
                    let price_above_bid =
                        ((top_bid / quantum).ceil() + Decimal::ONE) * quantum;
                    if price > price_above_bid && self.cfg.logs(LogOption::ADJUST_ORDER) {
                        info!(
                            pair = pid.0,
                            raw = %price,
                            clamped = %price_above_bid,
                            "bid capped one tick above top bid"
                        );
                    }
                    price = price.min(price_above_bid);
                }
            }
            Some(floor_to_quantum(price, quantum))
        } else {
            let mut price = hedge * edge;
            if self.cfg.adjust_order_enabled {
                if let Some(top_ask) = top_ask {
                    let price_below_ask =
                        ((top_ask / quantum).floor() - Decimal::ONE) * quantum;
                    if price < price_below_ask && self.cfg.logs(LogOption::ADJUST_ORDER) {
                        info!(
                            pair = pid.0,
                            raw = %price,
                            clamped = %price_below_ask,
                            "ask raised to one tick below top ask"
                        );
                    }
                    price = price.max(price_below_ask);
                }
            }
            Some(ceil_to_quantum(price, quantum))
        }
    }
}
