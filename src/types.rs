use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::exchange::Venue;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeType {
    Buy,
    Sell,
}

impl TradeType {
    pub fn opposite(self) -> TradeType {
        match self {
            TradeType::Buy => TradeType::Sell,
            TradeType::Sell => TradeType::Buy,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeType::Buy => "buy",
            TradeType::Sell => "sell",
        }
    }

    pub fn is_buy(self) -> bool {
        matches!(self, TradeType::Buy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderType {
    Limit,
    Market,
}

/// Process-unique order id. The `buy://` / `sell://` prefix is load-bearing:
/// the fill hedger and taker-side correlation read the side back from it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientOrderId(String);

impl ClientOrderId {
    pub fn new(trade_type: TradeType) -> Self {
        Self(format!("{}://{}", trade_type.as_str(), uuid::Uuid::new_v4()))
    }

    pub fn is_buy(&self) -> bool {
        self.0.starts_with("buy://")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable in-process handle for a configured market pair. Venues only know
/// `trading_pair` strings, which can collide across pairs; orders are
/// correlated back to their pair through this handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairId(pub usize);

/// One leg of a market pair: a venue plus the traded market on it.
#[derive(Clone)]
pub struct MarketLeg {
    pub venue: Arc<dyn Venue>,
    pub trading_pair: String,
    pub base_asset: String,
    pub quote_asset: String,
}

impl MarketLeg {
    pub fn new(
        venue: Arc<dyn Venue>,
        trading_pair: impl Into<String>,
        base_asset: impl Into<String>,
        quote_asset: impl Into<String>,
    ) -> Self {
        Self {
            venue,
            trading_pair: trading_pair.into(),
            base_asset: base_asset.into(),
            quote_asset: quote_asset.into(),
        }
    }
}

impl fmt::Debug for MarketLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MarketLeg")
            .field("venue", &self.venue.name())
            .field("trading_pair", &self.trading_pair)
            .finish()
    }
}

/// Immutable maker/taker leg pair. Two pairs are distinct even when they
/// share a leg.
#[derive(Debug, Clone)]
pub struct MarketPair {
    pub maker: MarketLeg,
    pub taker: MarketLeg,
}

impl MarketPair {
    pub fn new(maker: MarketLeg, taker: MarketLeg) -> Self {
        Self { maker, taker }
    }
}

/// An order the strategy has emitted and still cares about. Quantity is the
/// remaining (unfilled) amount.
#[derive(Debug, Clone)]
pub struct TrackedOrder {
    pub id: ClientOrderId,
    pub pair: PairId,
    pub trade_type: TradeType,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub quantity: Decimal,
    pub creation_ts: f64,
}

/// A maker fill waiting to be hedged on the taker venue.
#[derive(Debug, Clone)]
pub struct FillRecord {
    pub order_id: ClientOrderId,
    pub trade_type: TradeType,
    pub amount: Decimal,
    pub price: Decimal,
    pub event_ts: f64,
}

#[derive(Debug, Clone)]
pub struct OrderFilledEvent {
    pub order_id: ClientOrderId,
    pub trade_type: TradeType,
    pub order_type: OrderType,
    pub amount: Decimal,
    pub price: Decimal,
    pub timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct OrderCompletedEvent {
    pub order_id: ClientOrderId,
    pub timestamp: f64,
}

#[derive(Debug, Clone)]
pub struct OrderCancelledEvent {
    pub order_id: ClientOrderId,
    pub timestamp: f64,
}

/// Completion stream delivered by venue adapters, drained on the strategy
/// thread between ticks.
#[derive(Debug, Clone)]
pub enum VenueEvent {
    OrderFilled(OrderFilledEvent),
    BuyOrderCompleted(OrderCompletedEvent),
    SellOrderCompleted(OrderCompletedEvent),
    OrderCancelled(OrderCancelledEvent),
}
