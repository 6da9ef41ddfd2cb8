use rust_decimal::Decimal;

use crate::engine::strategy::XemmStrategy;
use crate::types::PairId;

impl XemmStrategy {
    /// User override, or the portfolio-ratio base size: the maker portfolio
    /// valued in base units (base balance plus quote at mid), scaled by the
    /// configured ratio. Quantized onto the maker size grid.
    fn base_order_size(&self, pid: PairId) -> Decimal {
        let maker = &self.pairs[pid.0].maker;
        if self.cfg.order_amount > Decimal::ZERO {
            return maker
                .venue
                .quantize_order_amount(&maker.trading_pair, self.cfg.order_amount);
        }
        let Some(mid) = maker
            .venue
            .order_book(&maker.trading_pair)
            .and_then(|b| b.mid_price())
        else {
            return Decimal::ZERO;
        };
        if mid <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let base_balance = maker.venue.balance(&maker.base_asset);
        let quote_balance = maker.venue.balance(&maker.quote_asset);
        let portfolio_value = base_balance + quote_balance / mid;
        maker.venue.quantize_order_amount(
            &maker.trading_pair,
            portfolio_value * self.cfg.order_size_portfolio_ratio_limit,
        )
    }

    /// Order size for one maker side: the base size capped by what the
    /// maker can post, what the taker can absorb, and what the taker book
    /// actually holds. Zero means "skip placement this tick".
    pub fn desired_size(&self, pid: PairId, is_bid: bool) -> Decimal {
        let base = self.base_order_size(pid);
        if base <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let pair = &self.pairs[pid.0];
        let maker = &pair.maker;
        let taker = &pair.taker;
        let taker_book = taker.venue.order_book(&taker.trading_pair);

        // Hedgeable depth: the taker side a hedge of this maker side would
        // consume, derated by the volume factor.
        let hedge_depth = taker_book
            .as_ref()
            .map(|b| b.total_volume(!is_bid))
            .unwrap_or(Decimal::ZERO)
            * self.cfg.order_size_taker_volume_factor;

        // Hedge valuation for converting quote balances into base units.
        // Empty-book VWAP falls back to the top quote on that side.
        let taker_price = taker_book
            .as_ref()
            .and_then(|b| b.vwap_for_volume(!is_bid, base))
            .or_else(|| taker.venue.best_price(&taker.trading_pair, !is_bid));
        let Some(taker_price) = taker_price else {
            return Decimal::ZERO;
        };
        if taker_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let size = if is_bid {
            let maker_limit =
                maker.venue.available_balance(&maker.quote_asset) / taker_price;
            let taker_limit = taker.venue.available_balance(&taker.base_asset)
                * self.cfg.order_size_taker_balance_factor;
            base.min(maker_limit).min(taker_limit).min(hedge_depth)
        } else {
            let maker_limit = maker.venue.available_balance(&maker.base_asset);
            let taker_limit = taker.venue.available_balance(&taker.quote_asset)
                / taker_price
                * self.cfg.order_size_taker_balance_factor;
            base.min(maker_limit).min(taker_limit).min(hedge_depth)
        };

        maker
            .venue
            .quantize_order_amount(&maker.trading_pair, size.max(Decimal::ZERO))
    }
}
