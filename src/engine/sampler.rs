use std::collections::{HashMap, VecDeque};

use rust_decimal::Decimal;

use crate::types::PairId;

/// Most recent top-of-book snapshots kept per pair.
pub const SAMPLE_WINDOW: usize = 12;

/// Seconds between samples, enforced on floor-division slot boundaries.
pub const SAMPLE_INTERVAL: f64 = 5.0;

#[derive(Debug, Default)]
struct SampleWindow {
    bids: VecDeque<Decimal>,
    asks: VecDeque<Decimal>,
    last_slot: Option<i64>,
}

/// Sliding-window maker top-bid/top-ask samples. Smoothing treats the
/// widest-seen bid and narrowest-seen ask as the effective inside market,
/// so a transient spike or momentarily empty book does not trigger
/// re-pricing.
#[derive(Debug, Default)]
pub struct PriceSampler {
    windows: HashMap<PairId, SampleWindow>,
}

impl PriceSampler {
    /// Append one snapshot if `now` has crossed into a new sample slot.
    /// Missing sides (empty book) are skipped rather than sampled.
    pub fn maybe_sample(
        &mut self,
        pair: PairId,
        now: f64,
        top_bid: Option<Decimal>,
        top_ask: Option<Decimal>,
    ) {
        let window = self.windows.entry(pair).or_default();
        let slot = (now / SAMPLE_INTERVAL).floor() as i64;
        if let Some(last) = window.last_slot {
            if slot <= last {
                return;
            }
        }
        window.last_slot = Some(slot);

        if let Some(bid) = top_bid {
            window.bids.push_back(bid);
            if window.bids.len() > SAMPLE_WINDOW {
                window.bids.pop_front();
            }
        }
        if let Some(ask) = top_ask {
            window.asks.push_back(ask);
            if window.asks.len() > SAMPLE_WINDOW {
                window.asks.pop_front();
            }
        }
    }

    /// Smoothed inside market: max over bid samples and the current bid,
    /// min over ask samples and the current ask.
    pub fn smoothed_top(
        &self,
        pair: PairId,
        current_bid: Option<Decimal>,
        current_ask: Option<Decimal>,
    ) -> (Option<Decimal>, Option<Decimal>) {
        let Some(window) = self.windows.get(&pair) else {
            return (current_bid, current_ask);
        };
        let bid = window.bids.iter().copied().chain(current_bid).max();
        let ask = window.asks.iter().copied().chain(current_ask).min();
        (bid, ask)
    }

    #[cfg(test)]
    fn sample_counts(&self, pair: PairId) -> (usize, usize) {
        self.windows
            .get(&pair)
            .map(|w| (w.bids.len(), w.asks.len()))
            .unwrap_or((0, 0))
    }
}
