//! Item id generation.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::ItemId;

/// Hands out strictly increasing ids, seeded from the wall clock so ids
/// minted in a later session sort after ids stored by an earlier one.
#[derive(Debug)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    /// Seed from the current time in milliseconds.
    pub fn new() -> Self {
        let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::starting_at(now)
    }

    /// The first id returned will be `first`.
    pub fn starting_at(first: ItemId) -> Self {
        Self {
            last: AtomicU64::new(first.saturating_sub(1)),
        }
    }

    /// Next id in sequence.
    pub fn next_id(&self) -> ItemId {
        self.last.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Next id that is not already present in `taken`.
    pub fn next_unused(&self, taken: &[ItemId]) -> ItemId {
        loop {
            let id = self.next_id();
            if !taken.contains(&id) {
                return id;
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_increase() {
        let ids = IdGenerator::starting_at(100);
        assert_eq!(ids.next_id(), 100);
        assert_eq!(ids.next_id(), 101);
    }

    #[test]
    fn skips_taken_ids() {
        let ids = IdGenerator::starting_at(1);
        assert_eq!(ids.next_unused(&[1, 2, 4]), 3);
        assert_eq!(ids.next_unused(&[1, 2, 4]), 5);
    }

    #[test]
    fn clock_seeded_ids_are_large() {
        let ids = IdGenerator::new();
        assert!(ids.next_id() > 1_600_000_000_000);
    }
}
