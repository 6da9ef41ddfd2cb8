use bitflags::bitflags;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use thiserror::Error;

bitflags! {
    /// Optional log classes. Everything not listed here is always logged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct LogOption: u32 {
        const NULL_ORDER_SIZE    = 1 << 0;
        const REMOVING_ORDER     = 1 << 1;
        const ADJUST_ORDER       = 1 << 2;
        const CREATE_ORDER       = 1 << 3;
        const MAKER_ORDER_FILLED = 1 << 4;
        const STATUS_REPORT      = 1 << 5;
        const MAKER_ORDER_HEDGED = 1 << 6;
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("min_profitability must be >= 0, got {0}")]
    MinProfitability(Decimal),
    #[error("order_amount must be >= 0, got {0}")]
    OrderAmount(Decimal),
    #[error("{name} must be in (0, 1], got {value}")]
    Factor { name: &'static str, value: Decimal },
    #[error("anti_hysteresis_duration must be > 0, got {0}")]
    AntiHysteresisDuration(f64),
    #[error("limit_order_min_expiration must be >= 0, got {0}")]
    LimitOrderMinExpiration(f64),
    #[error("top_depth_tolerance must be >= 0, got {0}")]
    TopDepthTolerance(Decimal),
    #[error("at least one market pair must be configured")]
    NoMarketPairs,
}

#[derive(Debug, Clone)]
pub struct Config {
    // Minimum ratio of maker-vs-taker edge required to keep or open an order.
    pub min_profitability: Decimal,

    // Absolute order size override in base units. Zero means "derive the size
    // from the maker portfolio via order_size_portfolio_ratio_limit".
    pub order_amount: Decimal,

    // Order size caps, all applied as a min-chain in the sizer.
    pub order_size_taker_volume_factor: Decimal,
    pub order_size_taker_balance_factor: Decimal,
    pub order_size_portfolio_ratio_limit: Decimal,

    // Clamp maker prices to one tick past the maker top of book.
    pub adjust_order_enabled: bool,

    // Active mode: the supervisor cancels on min_profitability and runs the
    // balance + drift checks. Passive mode: cancel_order_threshold only, and
    // maker orders carry a venue-side TTL instead.
    pub active_order_canceling: bool,
    pub cancel_order_threshold: Decimal,

    // Seconds between drift-triggered re-cancels, per pair.
    pub anti_hysteresis_duration: f64,

    // TTL attached to maker limit orders when active canceling is off.
    pub limit_order_min_expiration: f64,

    // Volume depth at which "top of book" is measured. Zero uses best bid/ask.
    pub top_depth_tolerance: Decimal,

    pub logging_options: LogOption,

    // Rate limit for disconnect warnings and periodic status reports.
    pub status_report_interval: f64,

    // Engine clock period for the tokio loop. The core itself only sees
    // tick(t) calls.
    pub tick_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_profitability: dec!(0.003),

            order_amount: Decimal::ZERO,

            order_size_taker_volume_factor: dec!(0.25),
            order_size_taker_balance_factor: dec!(0.995),
            order_size_portfolio_ratio_limit: dec!(0.1667),

            adjust_order_enabled: true,

            active_order_canceling: true,
            // Looser than min_profitability: passive mode only cancels once
            // the edge is fully gone.
            cancel_order_threshold: Decimal::ZERO,

            anti_hysteresis_duration: 60.0,

            limit_order_min_expiration: 130.0,

            top_depth_tolerance: Decimal::ZERO,

            logging_options: LogOption::all(),

            status_report_interval: 900.0,

            tick_interval_ms: 1000,
        }
    }
}

impl Config {
    /// Construction-time validation. Out-of-range knobs are fatal; the
    /// strategy refuses to start rather than trade on them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_profitability < Decimal::ZERO {
            return Err(ConfigError::MinProfitability(self.min_profitability));
        }
        if self.order_amount < Decimal::ZERO {
            return Err(ConfigError::OrderAmount(self.order_amount));
        }
        for (name, value) in [
            (
                "order_size_taker_volume_factor",
                self.order_size_taker_volume_factor,
            ),
            (
                "order_size_taker_balance_factor",
                self.order_size_taker_balance_factor,
            ),
            (
                "order_size_portfolio_ratio_limit",
                self.order_size_portfolio_ratio_limit,
            ),
        ] {
            if value <= Decimal::ZERO || value > Decimal::ONE {
                return Err(ConfigError::Factor { name, value });
            }
        }
        if self.anti_hysteresis_duration <= 0.0 {
            return Err(ConfigError::AntiHysteresisDuration(
                self.anti_hysteresis_duration,
            ));
        }
        if self.limit_order_min_expiration < 0.0 {
            return Err(ConfigError::LimitOrderMinExpiration(
                self.limit_order_min_expiration,
            ));
        }
        if self.top_depth_tolerance < Decimal::ZERO {
            return Err(ConfigError::TopDepthTolerance(self.top_depth_tolerance));
        }
        Ok(())
    }

    pub fn logs(&self, option: LogOption) -> bool {
        self.logging_options.contains(option)
    }
}
