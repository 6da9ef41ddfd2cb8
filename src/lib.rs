pub mod config;
pub mod engine;
pub mod exchange;
pub mod oracle;
pub mod report;
pub mod state;
pub mod types;

pub use config::{Config, ConfigError, LogOption};
pub use engine::strategy::XemmStrategy;
pub use exchange::paper::PaperVenue;
pub use exchange::{NetworkStatus, Venue, VenueError};
pub use oracle::{FixedRateOracle, RateOracle};
pub use state::book::{Book, BookLevel};
pub use types::{
    ClientOrderId, FillRecord, MarketLeg, MarketPair, OrderType, PairId, TrackedOrder, TradeType,
    VenueEvent,
};
