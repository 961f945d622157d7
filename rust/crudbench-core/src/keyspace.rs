//! Logical key space shared by all workers.
//!
//! Record ids are 1-based. The live range is `(deleted, records]`: the
//! deletion boundary is exclusive, the creation counter inclusive. Both only
//! grow, and `deleted <= records` always holds because the boundary is only
//! advanced over ids that were already created.

use crate::workload::HotSpotConfig;
use rand::rngs::StdRng;
use rand::Rng;
use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct KeySpace {
    records: AtomicU64,
    deleted: AtomicU64,
}

impl KeySpace {
    /// Key space with ids `1..=records` already present.
    pub fn new(records: u64) -> Self {
        Self {
            records: AtomicU64::new(records),
            deleted: AtomicU64::new(0),
        }
    }

    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Acquire)
    }

    pub fn deleted(&self) -> u64 {
        self.deleted.load(Ordering::Acquire)
    }

    /// Reserve the next id for a create.
    pub fn next_record(&self) -> u64 {
        self.records.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Move the deletion boundary one id forward and return that id, or
    /// `None` if every created id is already deleted.
    pub fn next_removal(&self) -> Option<u64> {
        self.deleted
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |deleted| {
                (deleted < self.records()).then_some(deleted + 1)
            })
            .ok()
            .map(|previous| previous + 1)
    }

    /// Ids currently considered present.
    pub fn live(&self) -> Option<RangeInclusive<u64>> {
        let deleted = self.deleted();
        let records = self.records();
        (deleted < records).then(|| deleted + 1..=records)
    }
}

/// Picks an existing record id out of the live range.
pub trait KeySelector: Send + Sync {
    fn existing_id(&self, live: RangeInclusive<u64>, rng: &mut StdRng) -> u64;
}

/// Every live id is equally likely.
#[derive(Debug, Clone, Copy, Default)]
pub struct Uniform;

impl KeySelector for Uniform {
    fn existing_id(&self, live: RangeInclusive<u64>, rng: &mut StdRng) -> u64 {
        rng.gen_range(live)
    }
}

/// The newest `data_percentage` of live ids receive `access_percentage` of
/// the draws.
#[derive(Debug, Clone, Copy)]
pub struct HotSpot {
    pub data_percentage: u64,
    pub access_percentage: u64,
}

impl HotSpot {
    /// Split the live range into its cold (older) and hot (newer) parts.
    /// Either side may be empty.
    pub fn partition(&self, live: &RangeInclusive<u64>) -> (RangeInclusive<u64>, RangeInclusive<u64>) {
        let (first, last) = (*live.start(), *live.end());
        let total = last - first + 1;
        let hot = total * self.data_percentage / 100;
        let cold = total - hot;
        let split = first + cold;
        (first..=split - 1, split..=last)
    }
}

impl From<HotSpotConfig> for HotSpot {
    fn from(cfg: HotSpotConfig) -> Self {
        Self {
            data_percentage: cfg.data_percentage,
            access_percentage: cfg.access_percentage,
        }
    }
}

impl KeySelector for HotSpot {
    fn existing_id(&self, live: RangeInclusive<u64>, rng: &mut StdRng) -> u64 {
        let (cold, hot) = self.partition(&live);
        let want_hot = rng.gen_range(0..100) < self.access_percentage;
        let range = match (want_hot, hot.is_empty(), cold.is_empty()) {
            (true, false, _) | (false, false, true) => hot,
            _ => cold,
        };
        rng.gen_range(range)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn removal_is_sequential_and_bounded() {
        let keys = KeySpace::new(3);
        assert_eq!(keys.next_removal(), Some(1));
        assert_eq!(keys.next_removal(), Some(2));
        assert_eq!(keys.next_removal(), Some(3));
        assert_eq!(keys.next_removal(), None);
        assert_eq!(keys.deleted(), 3);
        assert_eq!(keys.live(), None);

        assert_eq!(keys.next_record(), 4);
        assert_eq!(keys.live(), Some(4..=4));
        assert_eq!(keys.next_removal(), Some(4));
    }

    #[test]
    fn removal_never_repeats_across_threads() {
        let keys = std::sync::Arc::new(KeySpace::new(10_000));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let keys = keys.clone();
                std::thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(id) = keys.next_removal() {
                        got.push(id);
                    }
                    got
                })
            })
            .collect();
        let mut all: Vec<u64> = handles.into_iter().flat_map(|h| h.join().unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=10_000).collect::<Vec<_>>());
        assert!(keys.deleted() <= keys.records());
    }

    #[test]
    fn uniform_stays_in_live_range() {
        let keys = KeySpace::new(50);
        for _ in 0..20 {
            keys.next_removal();
        }
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1_000 {
            let id = Uniform.existing_id(keys.live().unwrap(), &mut rng);
            assert!((21..=50).contains(&id));
        }
    }

    #[test]
    fn hot_spot_full_access_hits_only_hot_range() {
        let sel = HotSpot {
            data_percentage: 10,
            access_percentage: 100,
        };
        let live = 1..=1_000;
        let (_, hot) = sel.partition(&live);
        assert_eq!(hot, 901..=1_000);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5_000 {
            assert!(hot.contains(&sel.existing_id(live.clone(), &mut rng)));
        }
    }

    #[test]
    fn hot_spot_zero_access_hits_only_cold_range() {
        let sel = HotSpot {
            data_percentage: 10,
            access_percentage: 0,
        };
        let live = 101..=1_100;
        let (cold, _) = sel.partition(&live);
        assert_eq!(cold, 101..=1_000);
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..5_000 {
            assert!(cold.contains(&sel.existing_id(live.clone(), &mut rng)));
        }
    }

    #[test]
    fn hot_spot_falls_back_when_a_side_is_empty() {
        let sel = HotSpot {
            data_percentage: 10,
            access_percentage: 100,
        };
        // a single live record has no hot part
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(sel.existing_id(7..=7, &mut rng), 7);
    }
}
