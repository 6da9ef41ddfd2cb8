#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use xemm_bot::{
    Book, BookLevel, Config, FixedRateOracle, MarketLeg, MarketPair, PairId, PaperVenue,
    TrackedOrder, TradeType, XemmStrategy,
};

pub const PAIR: PairId = PairId(0);
pub const TRADING_PAIR: &str = "ETH-USDT";

pub fn levels(levels: &[(Decimal, Decimal)]) -> Vec<BookLevel> {
    levels
        .iter()
        .map(|&(price, amount)| BookLevel::new(price, amount))
        .collect()
}

/// Config matching the canonical quoting fixture: 1% edge, fixed 1.0 size.
pub fn scenario_config() -> Config {
    Config {
        min_profitability: dec!(0.01),
        order_amount: dec!(1),
        ..Config::default()
    }
}

pub struct Rig {
    pub maker: Arc<PaperVenue>,
    pub taker: Arc<PaperVenue>,
    pub strategy: XemmStrategy,
}

impl Rig {
    /// One engine pass: drain venue events into the strategy, then tick.
    pub fn step(&mut self, t: f64) {
        self.strategy.pump_events();
        self.strategy.tick(t);
    }

    pub fn active_orders(&self) -> Vec<TrackedOrder> {
        self.strategy.order_tracker().active_maker_orders(PAIR)
    }

    pub fn active_bid(&self) -> Option<TrackedOrder> {
        self.active_orders()
            .into_iter()
            .find(|o| o.trade_type == TradeType::Buy)
    }

    pub fn active_ask(&self) -> Option<TrackedOrder> {
        self.active_orders()
            .into_iter()
            .find(|o| o.trade_type == TradeType::Sell)
    }
}

/// Maker top (100.0 / 101.0), taker top (99.5 / 100.5), ample balances,
/// 0.01 price and size grids on both venues.
pub fn rig_with(cfg: Config) -> Rig {
    let maker = Arc::new(PaperVenue::new("maker"));
    maker.set_balance("ETH", dec!(100));
    maker.set_balance("USDT", dec!(100000));
    maker.set_quantums(TRADING_PAIR, dec!(0.01), dec!(0.01));
    maker.set_book(
        TRADING_PAIR,
        Book::new(
            levels(&[(dec!(100.0), dec!(10))]),
            levels(&[(dec!(101.0), dec!(10))]),
        ),
    );

    let taker = Arc::new(PaperVenue::new("taker"));
    taker.set_balance("ETH", dec!(100));
    taker.set_balance("USDT", dec!(100000));
    taker.set_quantums(TRADING_PAIR, dec!(0.01), dec!(0.01));
    taker.set_book(
        TRADING_PAIR,
        Book::new(
            levels(&[(dec!(99.5), dec!(10))]),
            levels(&[(dec!(100.5), dec!(10))]),
        ),
    );

    let pair = MarketPair::new(
        MarketLeg::new(maker.clone(), TRADING_PAIR, "ETH", "USDT"),
        MarketLeg::new(taker.clone(), TRADING_PAIR, "ETH", "USDT"),
    );
    let strategy = XemmStrategy::new(cfg, vec![pair], Arc::new(FixedRateOracle::new()))
        .expect("valid test config");

    Rig {
        maker,
        taker,
        strategy,
    }
}

pub fn rig() -> Rig {
    rig_with(scenario_config())
}

pub fn set_taker_top(rig: &Rig, bid: Decimal, ask: Decimal) {
    rig.taker.set_book(
        TRADING_PAIR,
        Book::new(levels(&[(bid, dec!(10))]), levels(&[(ask, dec!(10))])),
    );
}
