pub mod paper;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::state::book::Book;
use crate::types::{ClientOrderId, OrderType, VenueEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkStatus {
    Connected,
    NotConnected,
}

#[derive(Debug, Error)]
pub enum VenueError {
    #[error("{venue}: unknown trading pair {trading_pair}")]
    UnknownTradingPair { venue: String, trading_pair: String },
    #[error("{venue}: no liquidity on {trading_pair} to fill a market order")]
    NoLiquidity { venue: String, trading_pair: String },
    #[error("{venue}: order rejected: {reason}")]
    Rejected { venue: String, reason: String },
}

/// The exchange adapter surface the strategy consumes. Submission is
/// fire-and-forget: `buy`/`sell` return a client order id immediately and
/// fills, completions, and cancellations arrive later through
/// `drain_events`, on the same single strategy thread.
pub trait Venue: Send + Sync {
    fn name(&self) -> &str;

    fn ready(&self) -> bool;

    fn network_status(&self) -> NetworkStatus;

    /// Total balance of an asset, including amounts locked in open orders.
    fn balance(&self, asset: &str) -> Decimal;

    /// Balance spendable right now.
    fn available_balance(&self, asset: &str) -> Decimal;

    /// Top of book on the side a taker order of the given direction would
    /// fill against.
    fn best_price(&self, trading_pair: &str, is_buy: bool) -> Option<Decimal>;

    /// Point-in-time order book snapshot.
    fn order_book(&self, trading_pair: &str) -> Option<Book>;

    /// Minimum price increment for the pair.
    fn order_price_quantum(&self, trading_pair: &str) -> Decimal;

    /// Round an order amount down onto the venue's size grid.
    fn quantize_order_amount(&self, trading_pair: &str, amount: Decimal) -> Decimal;

    fn buy(
        &self,
        trading_pair: &str,
        amount: Decimal,
        order_type: OrderType,
        price: Option<Decimal>,
        expiration_seconds: Option<f64>,
    ) -> Result<ClientOrderId, VenueError>;

    fn sell(
        &self,
        trading_pair: &str,
        amount: Decimal,
        order_type: OrderType,
        price: Option<Decimal>,
        expiration_seconds: Option<f64>,
    ) -> Result<ClientOrderId, VenueError>;

    /// Request cancellation. Idempotent: unknown ids are a successful no-op.
    fn cancel(&self, trading_pair: &str, id: &ClientOrderId) -> Result<(), VenueError>;

    /// Take everything the adapter has accumulated since the last drain,
    /// in delivery order.
    fn drain_events(&self) -> Vec<VenueEvent>;
}
