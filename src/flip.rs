use std::collections::BTreeMap;
use std::mem;

/// FlipLedger keeps the running count of node recolorings across all
/// structural mutations of a [`Shelf`](crate::Shelf).
///
/// It holds two color snapshots keyed by book id: `before` (colors as
/// of the end of the previous insert or delete) and `after` (colors
/// right after the current one). Each mutation contributes the number
/// of ids present in both snapshots whose color differs. A node whose
/// color flips twice within one fixup therefore contributes nothing;
/// that net-difference semantics is deliberate.
///
/// The ledger is owned by its index, threaded through insert/delete
/// only, and reset only when the index is constructed.
#[derive(Clone, Debug, Default)]
pub struct FlipLedger {
    before: BTreeMap<u32, bool>, // id -> black
    after: BTreeMap<u32, bool>,
    total: u64,
}

impl FlipLedger {
    pub fn new() -> FlipLedger {
        Default::default()
    }

    /// Running total of counted recolorings.
    #[inline]
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Start a new mutation: last mutation's "after" becomes "before".
    pub fn shift(&mut self) {
        self.before = mem::take(&mut self.after);
    }

    /// Seed a freshly inserted id with its provisional color, so a
    /// recoloring during its own insert fixup is counted.
    pub fn seed(&mut self, id: u32, black: bool) {
        self.before.insert(id, black);
    }

    /// Drop a deleted id from "before"; a removed node can never be
    /// counted as a flip.
    pub fn forget(&mut self, id: u32) {
        self.before.remove(&id);
    }

    /// Record the post-mutation snapshot and accumulate the diff.
    pub fn observe(&mut self, snapshot: BTreeMap<u32, bool>) {
        self.after = snapshot;
        let mut flips = 0u64;
        for (id, black) in &self.before {
            if let Some(now) = self.after.get(id) {
                if now != black {
                    flips += 1;
                }
            }
        }
        self.total += flips;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(pairs: &[(u32, bool)]) -> BTreeMap<u32, bool> {
        pairs.iter().copied().collect()
    }

    #[test]
    fn test_counts_net_difference_only() {
        let mut ledger = FlipLedger::new();
        ledger.shift();
        ledger.seed(10, true);
        ledger.observe(snap(&[(10, true)]));
        assert_eq!(ledger.total(), 0);

        // 10 stays black, 20 seeded red and stays red.
        ledger.shift();
        ledger.seed(20, false);
        ledger.observe(snap(&[(10, true), (20, false)]));
        assert_eq!(ledger.total(), 0);

        // recoloring 20 red -> black counts once.
        ledger.shift();
        ledger.seed(30, false);
        ledger.observe(snap(&[(10, true), (20, true), (30, false)]));
        assert_eq!(ledger.total(), 1);
    }

    #[test]
    fn test_forgotten_id_never_counts() {
        let mut ledger = FlipLedger::new();
        ledger.shift();
        ledger.seed(5, true);
        ledger.observe(snap(&[(5, true)]));

        ledger.shift();
        ledger.forget(5);
        ledger.observe(snap(&[]));
        assert_eq!(ledger.total(), 0);
    }
}
