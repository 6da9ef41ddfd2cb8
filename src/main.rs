use std::sync::Arc;

use anyhow::Result;
use dotenv::dotenv;
use rust_decimal_macros::dec;
use tracing_subscriber::EnvFilter;

use xemm_bot::engine::task;
use xemm_bot::{
    Book, BookLevel, Config, FixedRateOracle, MarketLeg, MarketPair, PaperVenue, XemmStrategy,
};

/// Paper-trading demo harness: two in-process venues seeded with static
/// books, one market pair. Live connectors are supplied by the embedder
/// through the `Venue` trait; the strategy itself never knows the
/// difference.
#[tokio::main]
async fn main() -> Result<()> {
    // Set RUST_LOG=info (or debug) to see output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    dotenv().ok();

    let cfg = Config::default();

    let maker = Arc::new(PaperVenue::new("paper-maker"));
    maker.set_balance("ETH", dec!(10));
    maker.set_balance("USDT", dec!(20000));
    maker.set_quantums("ETH-USDT", dec!(0.01), dec!(0.0001));
    maker.set_book(
        "ETH-USDT",
        Book::new(
            vec![
                BookLevel::new(dec!(1999.50), dec!(4)),
                BookLevel::new(dec!(1999.00), dec!(8)),
            ],
            vec![
                BookLevel::new(dec!(2000.50), dec!(4)),
                BookLevel::new(dec!(2001.00), dec!(8)),
            ],
        ),
    );

    let taker = Arc::new(PaperVenue::new("paper-taker"));
    taker.set_balance("ETH", dec!(10));
    taker.set_balance("USDT", dec!(20000));
    taker.set_quantums("ETH-USDT", dec!(0.01), dec!(0.0001));
    taker.set_book(
        "ETH-USDT",
        Book::new(
            vec![
                BookLevel::new(dec!(1999.80), dec!(6)),
                BookLevel::new(dec!(1999.30), dec!(12)),
            ],
            vec![
                BookLevel::new(dec!(2000.20), dec!(6)),
                BookLevel::new(dec!(2000.70), dec!(12)),
            ],
        ),
    );

    let pair = MarketPair::new(
        MarketLeg::new(maker.clone(), "ETH-USDT", "ETH", "USDT"),
        MarketLeg::new(taker.clone(), "ETH-USDT", "ETH", "USDT"),
    );

    let oracle = Arc::new(FixedRateOracle::new());
    let strategy = XemmStrategy::new(cfg, vec![pair], oracle)?;

    task::run_engine(strategy).await
}
