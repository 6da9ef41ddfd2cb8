use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::info;

use crate::exchange::{NetworkStatus, Venue, VenueError};
use crate::state::book::Book;
use crate::types::{
    ClientOrderId, OrderCancelledEvent, OrderCompletedEvent, OrderFilledEvent, OrderType,
    TradeType, VenueEvent,
};

#[derive(Debug, Clone)]
pub struct PaperOrder {
    pub trading_pair: String,
    pub trade_type: TradeType,
    pub order_type: OrderType,
    pub price: Option<Decimal>,
    pub amount: Decimal,
    pub filled: Decimal,
    pub expiration_seconds: Option<f64>,
}

/// In-process venue adapter backed by seeded books and balances. Market
/// orders fill immediately against the book (or rest until
/// `settle_market_orders` when deferral is on); limit fills are triggered
/// by the embedding test/demo. Placement locks funds the way a real venue
/// would, so `available_balance` diverges from `balance` while orders rest.
pub struct PaperVenue {
    name: String,
    ready: AtomicBool,
    connected: AtomicBool,
    defer_market_fills: AtomicBool,
    now: Mutex<f64>,
    balances: DashMap<String, Decimal>,
    available: DashMap<String, Decimal>,
    books: DashMap<String, Book>,
    price_quantums: DashMap<String, Decimal>,
    amount_quantums: DashMap<String, Decimal>,
    open_orders: DashMap<ClientOrderId, PaperOrder>,
    events: Mutex<VecDeque<VenueEvent>>,
}

impl PaperVenue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ready: AtomicBool::new(true),
            connected: AtomicBool::new(true),
            defer_market_fills: AtomicBool::new(false),
            now: Mutex::new(0.0),
            balances: DashMap::new(),
            available: DashMap::new(),
            books: DashMap::new(),
            price_quantums: DashMap::new(),
            amount_quantums: DashMap::new(),
            open_orders: DashMap::new(),
            events: Mutex::new(VecDeque::new()),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    /// When on, market orders rest until `settle_market_orders` instead of
    /// filling on submission.
    pub fn set_defer_market_fills(&self, defer: bool) {
        self.defer_market_fills.store(defer, Ordering::Release);
    }

    pub fn set_time(&self, now: f64) {
        *self.now.lock().expect("paper clock poisoned") = now;
    }

    fn now(&self) -> f64 {
        *self.now.lock().expect("paper clock poisoned")
    }

    /// Seed total and available balance together.
    pub fn set_balance(&self, asset: &str, amount: Decimal) {
        self.balances.insert(asset.to_string(), amount);
        self.available.insert(asset.to_string(), amount);
    }

    pub fn set_available_balance(&self, asset: &str, amount: Decimal) {
        self.available.insert(asset.to_string(), amount);
    }

    pub fn set_book(&self, trading_pair: &str, book: Book) {
        self.books.insert(trading_pair.to_string(), book);
    }

    pub fn remove_book(&self, trading_pair: &str) {
        self.books.remove(trading_pair);
    }

    pub fn set_quantums(&self, trading_pair: &str, price: Decimal, amount: Decimal) {
        self.price_quantums.insert(trading_pair.to_string(), price);
        self.amount_quantums.insert(trading_pair.to_string(), amount);
    }

    pub fn open_order(&self, id: &ClientOrderId) -> Option<PaperOrder> {
        self.open_orders.get(id).map(|o| o.clone())
    }

    pub fn open_limit_orders(&self, trading_pair: &str) -> Vec<(ClientOrderId, PaperOrder)> {
        self.open_orders
            .iter()
            .filter(|e| {
                e.value().order_type == OrderType::Limit && e.value().trading_pair == trading_pair
            })
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    fn credit(&self, asset: &str, amount: Decimal) {
        *self.balances.entry(asset.to_string()).or_default() += amount;
        *self.available.entry(asset.to_string()).or_default() += amount;
    }

    fn push_event(&self, event: VenueEvent) {
        self.events
            .lock()
            .expect("paper event queue poisoned")
            .push_back(event);
    }

    fn place(
        &self,
        trading_pair: &str,
        trade_type: TradeType,
        amount: Decimal,
        order_type: OrderType,
        price: Option<Decimal>,
        expiration_seconds: Option<f64>,
    ) -> Result<ClientOrderId, VenueError> {
        let id = ClientOrderId::new(trade_type);
        let order = PaperOrder {
            trading_pair: trading_pair.to_string(),
            trade_type,
            order_type,
            price,
            amount,
            filled: Decimal::ZERO,
            expiration_seconds,
        };

        match order_type {
            OrderType::Limit => {
                let price = price.ok_or_else(|| VenueError::Rejected {
                    venue: self.name.clone(),
                    reason: "limit order without a price".into(),
                })?;
                // Lock funds while the order rests.
                let (asset, lock) = self.lock_for(trading_pair, trade_type, amount, price);
                *self.available.entry(asset).or_default() -= lock;
                self.open_orders.insert(id.clone(), order);
            }
            OrderType::Market => {
                if self.defer_market_fills.load(Ordering::Acquire) {
                    self.open_orders.insert(id.clone(), order);
                } else {
                    self.execute_market(&id, &order)?;
                }
            }
        }
        Ok(id)
    }

    fn lock_for(
        &self,
        trading_pair: &str,
        trade_type: TradeType,
        amount: Decimal,
        price: Decimal,
    ) -> (String, Decimal) {
        let (base, quote) = split_pair(trading_pair);
        match trade_type {
            TradeType::Buy => (quote, amount * price),
            TradeType::Sell => (base, amount),
        }
    }

    fn execute_market(&self, id: &ClientOrderId, order: &PaperOrder) -> Result<(), VenueError> {
        let is_buy = order.trade_type.is_buy();
        let vwap = self
            .books
            .get(&order.trading_pair)
            .and_then(|b| b.vwap_for_volume(is_buy, order.amount))
            .ok_or_else(|| VenueError::NoLiquidity {
                venue: self.name.clone(),
                trading_pair: order.trading_pair.clone(),
            })?;

        let (base, quote) = split_pair(&order.trading_pair);
        let notional = order.amount * vwap;
        if is_buy {
            self.credit(&base, order.amount);
            self.credit(&quote, -notional);
        } else {
            self.credit(&base, -order.amount);
            self.credit(&quote, notional);
        }

        let now = self.now();
        info!(venue = %self.name, order_id = %id, side = order.trade_type.as_str(),
              amount = %order.amount, price = %vwap, "paper market fill");
        self.push_event(VenueEvent::OrderFilled(OrderFilledEvent {
            order_id: id.clone(),
            trade_type: order.trade_type,
            order_type: OrderType::Market,
            amount: order.amount,
            price: vwap,
            timestamp: now,
        }));
        let completed = OrderCompletedEvent {
            order_id: id.clone(),
            timestamp: now,
        };
        self.push_event(match order.trade_type {
            TradeType::Buy => VenueEvent::BuyOrderCompleted(completed),
            TradeType::Sell => VenueEvent::SellOrderCompleted(completed),
        });
        Ok(())
    }

    /// Execute any deferred market orders that can fill against the current
    /// book. Ones that still cannot fill keep resting.
    pub fn settle_market_orders(&self) {
        let pending: Vec<(ClientOrderId, PaperOrder)> = self
            .open_orders
            .iter()
            .filter(|e| e.value().order_type == OrderType::Market)
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        for (id, order) in pending {
            if self.execute_market(&id, &order).is_ok() {
                self.open_orders.remove(&id);
            }
        }
    }

    /// Fill a resting limit order at its posted price, fully or partially,
    /// and emit the corresponding events.
    pub fn fill_limit_order(&self, id: &ClientOrderId, amount: Option<Decimal>) {
        let Some(mut order) = self.open_orders.get(id).map(|o| o.clone()) else {
            return;
        };
        let price = order.price.expect("limit orders carry a price");
        let remaining = order.amount - order.filled;
        let fill = amount.unwrap_or(remaining).min(remaining);
        if fill <= Decimal::ZERO {
            return;
        }

        let (base, quote) = split_pair(&order.trading_pair);
        let notional = fill * price;
        match order.trade_type {
            TradeType::Buy => {
                // Quote was locked at placement; settle it against totals.
                self.credit(&base, fill);
                *self.balances.entry(quote).or_default() -= notional;
            }
            TradeType::Sell => {
                self.credit(&quote, notional);
                *self.balances.entry(base).or_default() -= fill;
            }
        }

        let now = self.now();
        self.push_event(VenueEvent::OrderFilled(OrderFilledEvent {
            order_id: id.clone(),
            trade_type: order.trade_type,
            order_type: OrderType::Limit,
            amount: fill,
            price,
            timestamp: now,
        }));

        order.filled += fill;
        if order.filled >= order.amount {
            self.open_orders.remove(id);
            let completed = OrderCompletedEvent {
                order_id: id.clone(),
                timestamp: now,
            };
            self.push_event(match order.trade_type {
                TradeType::Buy => VenueEvent::BuyOrderCompleted(completed),
                TradeType::Sell => VenueEvent::SellOrderCompleted(completed),
            });
        } else {
            self.open_orders.insert(id.clone(), order);
        }
    }
}

impl Venue for PaperVenue {
    fn name(&self) -> &str {
        &self.name
    }

    fn ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn network_status(&self) -> NetworkStatus {
        if self.connected.load(Ordering::Acquire) {
            NetworkStatus::Connected
        } else {
            NetworkStatus::NotConnected
        }
    }

    fn balance(&self, asset: &str) -> Decimal {
        self.balances.get(asset).map(|b| *b).unwrap_or_default()
    }

    fn available_balance(&self, asset: &str) -> Decimal {
        self.available.get(asset).map(|b| *b).unwrap_or_default()
    }

    fn best_price(&self, trading_pair: &str, is_buy: bool) -> Option<Decimal> {
        let book = self.books.get(trading_pair)?;
        if is_buy { book.best_ask() } else { book.best_bid() }
    }

    fn order_book(&self, trading_pair: &str) -> Option<Book> {
        self.books.get(trading_pair).map(|b| b.clone())
    }

    fn order_price_quantum(&self, trading_pair: &str) -> Decimal {
        self.price_quantums
            .get(trading_pair)
            .map(|q| *q)
            .unwrap_or(dec!(0.01))
    }

    fn quantize_order_amount(&self, trading_pair: &str, amount: Decimal) -> Decimal {
        let quantum = self
            .amount_quantums
            .get(trading_pair)
            .map(|q| *q)
            .unwrap_or(dec!(0.000001));
        if quantum.is_zero() {
            return amount;
        }
        (amount / quantum).floor() * quantum
    }

    fn buy(
        &self,
        trading_pair: &str,
        amount: Decimal,
        order_type: OrderType,
        price: Option<Decimal>,
        expiration_seconds: Option<f64>,
    ) -> Result<ClientOrderId, VenueError> {
        self.place(
            trading_pair,
            TradeType::Buy,
            amount,
            order_type,
            price,
            expiration_seconds,
        )
    }

    fn sell(
        &self,
        trading_pair: &str,
        amount: Decimal,
        order_type: OrderType,
        price: Option<Decimal>,
        expiration_seconds: Option<f64>,
    ) -> Result<ClientOrderId, VenueError> {
        self.place(
            trading_pair,
            TradeType::Sell,
            amount,
            order_type,
            price,
            expiration_seconds,
        )
    }

    fn cancel(&self, _trading_pair: &str, id: &ClientOrderId) -> Result<(), VenueError> {
        // Idempotent: cancelling an unknown or already-closed id is a no-op.
        let Some((_, order)) = self.open_orders.remove(id) else {
            return Ok(());
        };
        if order.order_type == OrderType::Limit {
            let remaining = order.amount - order.filled;
            let price = order.price.expect("limit orders carry a price");
            let (asset, lock) =
                self.lock_for(&order.trading_pair, order.trade_type, remaining, price);
            *self.available.entry(asset).or_default() += lock;
        }
        info!(venue = %self.name, order_id = %id, "paper cancel ack");
        self.push_event(VenueEvent::OrderCancelled(OrderCancelledEvent {
            order_id: id.clone(),
            timestamp: self.now(),
        }));
        Ok(())
    }

    fn drain_events(&self) -> Vec<VenueEvent> {
        self.events
            .lock()
            .expect("paper event queue poisoned")
            .drain(..)
            .collect()
    }
}

fn split_pair(trading_pair: &str) -> (String, String) {
    match trading_pair.split_once('-') {
        Some((base, quote)) => (base.to_string(), quote.to_string()),
        None => (trading_pair.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::book::BookLevel;

    fn venue() -> PaperVenue {
        let v = PaperVenue::new("paper");
        v.set_balance("ETH", dec!(10));
        v.set_balance("USDT", dec!(10000));
        v.set_book(
            "ETH-USDT",
            Book::new(
                vec![BookLevel::new(dec!(99), dec!(5))],
                vec![BookLevel::new(dec!(101), dec!(5))],
            ),
        );
        v
    }

    #[test]
    fn market_order_fills_and_settles_balances() {
        let v = venue();
        let id = v
            .sell("ETH-USDT", dec!(2), OrderType::Market, None, None)
            .unwrap();
        assert_eq!(v.balance("ETH"), dec!(8));
        assert_eq!(v.balance("USDT"), dec!(10198));

        let events = v.drain_events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            VenueEvent::OrderFilled(e) => {
                assert_eq!(e.order_id, id);
                assert_eq!(e.price, dec!(99));
                assert_eq!(e.order_type, OrderType::Market);
            }
            other => panic!("expected fill, got {other:?}"),
        }
        assert!(matches!(&events[1], VenueEvent::SellOrderCompleted(e) if e.order_id == id));
    }

    #[test]
    fn market_order_without_liquidity_is_rejected() {
        let v = venue();
        v.remove_book("ETH-USDT");
        let err = v.buy("ETH-USDT", dec!(1), OrderType::Market, None, None);
        assert!(matches!(err, Err(VenueError::NoLiquidity { .. })));
        assert!(v.drain_events().is_empty());
    }

    #[test]
    fn limit_orders_lock_and_release_funds() {
        let v = venue();
        let id = v
            .buy(
                "ETH-USDT",
                dec!(1),
                OrderType::Limit,
                Some(dec!(100)),
                None,
            )
            .unwrap();
        assert_eq!(v.balance("USDT"), dec!(10000));
        assert_eq!(v.available_balance("USDT"), dec!(9900));

        v.cancel("ETH-USDT", &id).unwrap();
        assert_eq!(v.available_balance("USDT"), dec!(10000));
        assert!(matches!(
            v.drain_events().as_slice(),
            [VenueEvent::OrderCancelled(e)] if e.order_id == id
        ));
        // Second cancel is a no-op.
        v.cancel("ETH-USDT", &id).unwrap();
        assert!(v.drain_events().is_empty());
    }

    #[test]
    fn partial_then_full_limit_fill() {
        let v = venue();
        let id = v
            .buy(
                "ETH-USDT",
                dec!(2),
                OrderType::Limit,
                Some(dec!(100)),
                None,
            )
            .unwrap();
        v.fill_limit_order(&id, Some(dec!(0.5)));
        assert_eq!(v.balance("ETH"), dec!(10.5));
        assert_eq!(v.open_order(&id).unwrap().filled, dec!(0.5));
        let events = v.drain_events();
        assert_eq!(events.len(), 1);

        v.fill_limit_order(&id, None);
        assert!(v.open_order(&id).is_none());
        let events = v.drain_events();
        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], VenueEvent::BuyOrderCompleted(_)));
    }

    #[test]
    fn deferred_market_orders_rest_until_settled() {
        let v = venue();
        v.set_defer_market_fills(true);
        let id = v
            .sell("ETH-USDT", dec!(1), OrderType::Market, None, None)
            .unwrap();
        assert!(v.open_order(&id).is_some());
        assert!(v.drain_events().is_empty());

        v.settle_market_orders();
        assert!(v.open_order(&id).is_none());
        assert_eq!(v.drain_events().len(), 2);
    }
}
