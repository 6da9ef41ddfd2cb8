use rust_decimal::Decimal;

/// One price level of an order book side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookLevel {
    pub price: Decimal,
    pub amount: Decimal,
}

impl BookLevel {
    pub fn new(price: Decimal, amount: Decimal) -> Self {
        Self { price, amount }
    }
}

/// Read-only order book snapshot. Bids are held best-first (descending),
/// asks best-first (ascending). Staleness between snapshots is accepted;
/// callers take a fresh snapshot per decision.
#[derive(Debug, Clone, Default)]
pub struct Book {
    bids: Vec<BookLevel>,
    asks: Vec<BookLevel>,
}

impl Book {
    pub fn new(mut bids: Vec<BookLevel>, mut asks: Vec<BookLevel>) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        bids.retain(|l| l.amount > Decimal::ZERO);
        asks.retain(|l| l.amount > Decimal::ZERO);
        Self { bids, asks }
    }

    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(|l| l.price)
    }

    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(|l| l.price)
    }

    pub fn mid_price(&self) -> Option<Decimal> {
        Some((self.best_bid()? + self.best_ask()?) / Decimal::TWO)
    }

    fn side(&self, is_buy: bool) -> &[BookLevel] {
        // A buy consumes asks, a sell consumes bids.
        if is_buy { &self.asks } else { &self.bids }
    }

    /// Total base volume resting on the side a buy/sell would consume.
    pub fn total_volume(&self, is_buy: bool) -> Decimal {
        self.side(is_buy).iter().map(|l| l.amount).sum()
    }

    /// Volume-weighted average fill price for taking `volume` from the top
    /// of the book. Consumes as much as exists; `None` when the side is
    /// empty or the volume is non-positive (the expected empty-market path,
    /// not an error).
    pub fn vwap_for_volume(&self, is_buy: bool, volume: Decimal) -> Option<Decimal> {
        if volume <= Decimal::ZERO {
            return None;
        }
        let mut remaining = volume;
        let mut notional = Decimal::ZERO;
        let mut taken = Decimal::ZERO;
        for level in self.side(is_buy) {
            let take = level.amount.min(remaining);
            notional += take * level.price;
            taken += take;
            remaining -= take;
            if remaining <= Decimal::ZERO {
                break;
            }
        }
        if taken <= Decimal::ZERO {
            return None;
        }
        Some(notional / taken)
    }

    /// Price of the level at which cumulative volume reaches `volume`.
    /// Falls back to the deepest level when the book is shallower.
    pub fn price_for_volume(&self, is_buy: bool, volume: Decimal) -> Option<Decimal> {
        if volume <= Decimal::ZERO {
            return if is_buy { self.best_ask() } else { self.best_bid() };
        }
        let mut cumulative = Decimal::ZERO;
        let mut last = None;
        for level in self.side(is_buy) {
            cumulative += level.amount;
            last = Some(level.price);
            if cumulative >= volume {
                break;
            }
        }
        last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book() -> Book {
        Book::new(
            vec![
                BookLevel::new(dec!(99), dec!(1)),
                BookLevel::new(dec!(100), dec!(2)),
                BookLevel::new(dec!(98), dec!(5)),
            ],
            vec![
                BookLevel::new(dec!(101), dec!(1)),
                BookLevel::new(dec!(102), dec!(3)),
            ],
        )
    }

    #[test]
    fn levels_are_sorted_best_first() {
        let b = book();
        assert_eq!(b.best_bid(), Some(dec!(100)));
        assert_eq!(b.best_ask(), Some(dec!(101)));
        assert_eq!(b.mid_price(), Some(dec!(100.5)));
    }

    #[test]
    fn vwap_walks_the_ladder() {
        let b = book();
        // Selling 3: 2 @ 100 + 1 @ 99 => 299/3.
        assert_eq!(
            b.vwap_for_volume(false, dec!(3)),
            Some(dec!(299) / dec!(3))
        );
        // Buying 2: 1 @ 101 + 1 @ 102 => 101.5.
        assert_eq!(b.vwap_for_volume(true, dec!(2)), Some(dec!(101.5)));
    }

    #[test]
    fn vwap_handles_overflow_and_empty() {
        let b = book();
        // More than the book holds: average over what exists.
        let deep = b.vwap_for_volume(true, dec!(100)).unwrap();
        assert_eq!(deep, (dec!(101) + dec!(102) * dec!(3)) / dec!(4));

        let empty = Book::default();
        assert_eq!(empty.vwap_for_volume(true, dec!(1)), None);
        assert_eq!(b.vwap_for_volume(false, Decimal::ZERO), None);
    }

    #[test]
    fn price_for_volume_reports_depth_price() {
        let b = book();
        assert_eq!(b.price_for_volume(false, dec!(1)), Some(dec!(100)));
        assert_eq!(b.price_for_volume(false, dec!(3)), Some(dec!(99)));
        assert_eq!(b.price_for_volume(true, Decimal::ZERO), Some(dec!(101)));
        assert_eq!(Book::default().price_for_volume(true, dec!(1)), None);
    }
}
