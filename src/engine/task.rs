use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use tokio::time::{self, Duration};

use crate::engine::strategy::XemmStrategy;

fn unix_now_s() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs_f64()
}

/// Drive the strategy on a fixed clock: drain venue events, then tick.
/// The strategy itself is synchronous; this loop is the only place the
/// runtime appears.
pub async fn run_engine(mut strategy: XemmStrategy) -> Result<()> {
    let mut interval = time::interval(Duration::from_millis(
        strategy.config().tick_interval_ms,
    ));

    loop {
        interval.tick().await;
        strategy.pump_events();
        strategy.tick(unix_now_s());
    }
}
