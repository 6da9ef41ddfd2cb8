use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;

use crate::types::{ClientOrderId, PairId, TrackedOrder};

/// Book-keeping for orders the strategy has in play: resting maker limit
/// orders, taker market orders awaiting completion, and the in-flight
/// cancel set that hides an order between the cancel request and the
/// cancellation event.
#[derive(Debug, Default)]
pub struct OrderTracker {
    maker_orders: HashMap<ClientOrderId, TrackedOrder>,
    taker_orders: HashMap<ClientOrderId, TrackedOrder>,
    in_flight_cancels: HashSet<ClientOrderId>,
}

impl OrderTracker {
    pub fn start_tracking_limit(&mut self, order: TrackedOrder) {
        self.maker_orders.insert(order.id.clone(), order);
    }

    pub fn start_tracking_market(&mut self, order: TrackedOrder) {
        self.taker_orders.insert(order.id.clone(), order);
    }

    /// Active maker orders for a pair, minus anything with a cancellation
    /// already in flight.
    pub fn active_maker_orders(&self, pair: PairId) -> Vec<TrackedOrder> {
        let mut orders: Vec<TrackedOrder> = self
            .maker_orders
            .values()
            .filter(|o| o.pair == pair && !self.in_flight_cancels.contains(&o.id))
            .cloned()
            .collect();
        orders.sort_by(|a, b| a.creation_ts.total_cmp(&b.creation_ts));
        orders
    }

    pub fn get_limit_order(&self, id: &ClientOrderId) -> Option<&TrackedOrder> {
        self.maker_orders.get(id)
    }

    pub fn get_market_order(&self, id: &ClientOrderId) -> Option<&TrackedOrder> {
        self.taker_orders.get(id)
    }

    pub fn taker_order_count(&self, pair: PairId) -> usize {
        self.taker_orders.values().filter(|o| o.pair == pair).count()
    }

    /// Taker market orders still awaiting completion for a pair.
    pub fn taker_orders(&self, pair: PairId) -> Vec<TrackedOrder> {
        self.taker_orders
            .values()
            .filter(|o| o.pair == pair)
            .cloned()
            .collect()
    }

    pub fn add_in_flight_cancel(&mut self, id: &ClientOrderId) {
        self.in_flight_cancels.insert(id.clone());
    }

    pub fn has_in_flight_cancel(&self, id: &ClientOrderId) -> bool {
        self.in_flight_cancels.contains(id)
    }

    /// Reduce the remaining quantity of a tracked order by a fill amount.
    /// Unknown ids are ignored; late fills for foreign orders are expected.
    pub fn apply_fill(&mut self, id: &ClientOrderId, amount: Decimal) {
        if let Some(order) = self
            .maker_orders
            .get_mut(id)
            .or_else(|| self.taker_orders.get_mut(id))
        {
            order.quantity = (order.quantity - amount).max(Decimal::ZERO);
        }
    }

    pub fn remove_limit_order(&mut self, id: &ClientOrderId) -> Option<TrackedOrder> {
        self.in_flight_cancels.remove(id);
        self.maker_orders.remove(id)
    }

    pub fn remove_market_order(&mut self, id: &ClientOrderId) -> Option<TrackedOrder> {
        self.taker_orders.remove(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderType, TradeType};
    use rust_decimal_macros::dec;

    fn order(pair: usize, trade_type: TradeType, ts: f64) -> TrackedOrder {
        TrackedOrder {
            id: ClientOrderId::new(trade_type),
            pair: PairId(pair),
            trade_type,
            order_type: OrderType::Limit,
            price: Some(dec!(100)),
            quantity: dec!(1),
            creation_ts: ts,
        }
    }

    #[test]
    fn in_flight_cancels_hide_orders() {
        let mut tracker = OrderTracker::default();
        let bid = order(0, TradeType::Buy, 1.0);
        let ask = order(0, TradeType::Sell, 2.0);
        let bid_id = bid.id.clone();
        tracker.start_tracking_limit(bid);
        tracker.start_tracking_limit(ask);

        assert_eq!(tracker.active_maker_orders(PairId(0)).len(), 2);
        tracker.add_in_flight_cancel(&bid_id);
        let active = tracker.active_maker_orders(PairId(0));
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].trade_type, TradeType::Sell);

        // Cancellation event clears the flag together with the order.
        assert!(tracker.remove_limit_order(&bid_id).is_some());
        assert!(!tracker.has_in_flight_cancel(&bid_id));
    }

    #[test]
    fn fills_reduce_remaining_quantity() {
        let mut tracker = OrderTracker::default();
        let o = order(0, TradeType::Buy, 1.0);
        let id = o.id.clone();
        tracker.start_tracking_limit(o);

        tracker.apply_fill(&id, dec!(0.4));
        assert_eq!(tracker.get_limit_order(&id).unwrap().quantity, dec!(0.6));
        tracker.apply_fill(&id, dec!(1.0));
        assert_eq!(tracker.get_limit_order(&id).unwrap().quantity, Decimal::ZERO);
    }

    #[test]
    fn taker_orders_are_counted_per_pair() {
        let mut tracker = OrderTracker::default();
        let mut o = order(1, TradeType::Sell, 1.0);
        o.order_type = OrderType::Market;
        tracker.start_tracking_market(o);

        assert_eq!(tracker.taker_order_count(PairId(1)), 1);
        assert_eq!(tracker.taker_order_count(PairId(0)), 0);
    }
}
