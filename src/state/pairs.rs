use std::collections::{HashMap, VecDeque};

use crate::types::{ClientOrderId, PairId};

/// Grace period during which a closed order's id still resolves, so late
/// fill/completion events can be attributed.
pub const SHADOW_KEEP_ALIVE: f64 = 900.0;

/// Bidirectional id ↔ pair correlation. Live entries cover resting orders;
/// shadow entries cover recently closed ones and age out through a
/// time-indexed queue drained on tick.
#[derive(Debug, Default)]
pub struct PairTracker {
    live: HashMap<ClientOrderId, PairId>,
    shadow: HashMap<ClientOrderId, PairId>,
    expiry: VecDeque<(f64, ClientOrderId)>,
}

impl PairTracker {
    pub fn start_tracking(&mut self, id: ClientOrderId, pair: PairId) {
        self.live.insert(id, pair);
    }

    /// Move an id to the shadow map; it keeps resolving until
    /// `now + SHADOW_KEEP_ALIVE`. Unknown ids are ignored.
    pub fn stop_tracking(&mut self, id: &ClientOrderId, now: f64) {
        if let Some(pair) = self.live.remove(id) {
            self.shadow.insert(id.clone(), pair);
            self.expiry.push_back((now + SHADOW_KEEP_ALIVE, id.clone()));
        }
    }

    /// Fails silently for ids outside the strategy's universe.
    pub fn lookup(&self, id: &ClientOrderId) -> Option<PairId> {
        self.live
            .get(id)
            .or_else(|| self.shadow.get(id))
            .copied()
    }

    /// Drain expired shadow entries. Tick timestamps are monotonic, so the
    /// queue front always holds the oldest deadline.
    pub fn check_expiry(&mut self, now: f64) {
        while let Some((deadline, _)) = self.expiry.front() {
            if *deadline > now {
                break;
            }
            if let Some((_, id)) = self.expiry.pop_front() {
                // Re-tracked ids stay resolvable through the live map.
                self.shadow.remove(&id);
            }
        }
    }

    pub fn live_len(&self) -> usize {
        self.live.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TradeType;

    #[test]
    fn shadow_keeps_closed_ids_resolvable() {
        let mut tracker = PairTracker::default();
        let id = ClientOrderId::new(TradeType::Buy);
        tracker.start_tracking(id.clone(), PairId(3));
        assert_eq!(tracker.lookup(&id), Some(PairId(3)));

        tracker.stop_tracking(&id, 1_000.0);
        assert_eq!(tracker.lookup(&id), Some(PairId(3)));

        // Still alive just before the deadline, gone right after.
        tracker.check_expiry(1_000.0 + SHADOW_KEEP_ALIVE - 1.0);
        assert_eq!(tracker.lookup(&id), Some(PairId(3)));
        tracker.check_expiry(1_000.0 + SHADOW_KEEP_ALIVE);
        assert_eq!(tracker.lookup(&id), None);
    }

    #[test]
    fn unknown_ids_resolve_to_none() {
        let mut tracker = PairTracker::default();
        let id = ClientOrderId::new(TradeType::Sell);
        assert_eq!(tracker.lookup(&id), None);
        // stop_tracking on an unknown id is a no-op.
        tracker.stop_tracking(&id, 0.0);
        assert_eq!(tracker.lookup(&id), None);
    }

    #[test]
    fn expiry_queue_drains_in_order() {
        let mut tracker = PairTracker::default();
        let a = ClientOrderId::new(TradeType::Buy);
        let b = ClientOrderId::new(TradeType::Sell);
        tracker.start_tracking(a.clone(), PairId(0));
        tracker.start_tracking(b.clone(), PairId(1));
        tracker.stop_tracking(&a, 10.0);
        tracker.stop_tracking(&b, 20.0);

        tracker.check_expiry(10.0 + SHADOW_KEEP_ALIVE);
        assert_eq!(tracker.lookup(&a), None);
        assert_eq!(tracker.lookup(&b), Some(PairId(1)));
    }
}
