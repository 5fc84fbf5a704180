//! Process-wide bit-vector interning
//!
//! Large analyses materialize enormous numbers of identical or
//! near-identical sets (the same exception set at thousands of program
//! points). The repository interns them behind `Arc`s so equal sets share
//! one allocation, bucketed by cardinality and held through weak references
//! so interning never extends a set's lifetime. Cleared weak entries are
//! evicted lazily on lookup.
//!
//! This is an optional memory optimization: nothing in the solver requires
//! it for correctness.

use std::sync::{Arc, Weak};

use once_cell::sync::Lazy;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::features::bitvector::domain::bitvector::BitVector;

/// How far below a set's cardinality `find_shared_subset` searches.
const SUBSET_DELTA: usize = 8;

/// Bound on retained entries per cardinality bucket.
const MAX_BUCKET_ENTRIES: usize = 64;

static GLOBAL: Lazy<BitVectorRepository> = Lazy::new(BitVectorRepository::new);

/// Weak interning cache for bit-vector sets, keyed by cardinality bucket.
///
/// Shared process state: access is serialized by a mutex so independent
/// solver instances on separate threads can use it concurrently.
#[derive(Debug, Default)]
pub struct BitVectorRepository {
    buckets: Mutex<FxHashMap<usize, Vec<Weak<BitVector>>>>,
}

impl BitVectorRepository {
    pub fn new() -> Self {
        BitVectorRepository {
            buckets: Mutex::new(FxHashMap::default()),
        }
    }

    /// The process-wide instance
    pub fn global() -> &'static BitVectorRepository {
        &GLOBAL
    }

    /// Return a shared handle to a set equal to `set`, interning a copy on
    /// first sight.
    pub fn find_or_create_shared(&self, set: &BitVector) -> Arc<BitVector> {
        let mut buckets = self.buckets.lock();
        let bucket = buckets.entry(set.len()).or_default();
        bucket.retain(|w| w.strong_count() > 0);
        for weak in bucket.iter() {
            if let Some(shared) = weak.upgrade() {
                if *shared == *set {
                    return shared;
                }
            }
        }
        let shared = Arc::new(set.clone());
        if bucket.len() >= MAX_BUCKET_ENTRIES {
            bucket.remove(0);
        }
        bucket.push(Arc::downgrade(&shared));
        shared
    }

    /// Largest interned subset of `set` whose cardinality is within
    /// `SUBSET_DELTA` of `set`'s — the near-duplicate query.
    pub fn find_shared_subset(&self, set: &BitVector) -> Option<Arc<BitVector>> {
        let mut buckets = self.buckets.lock();
        let lo = set.len().saturating_sub(SUBSET_DELTA);
        for cardinality in (lo..=set.len()).rev() {
            let Some(bucket) = buckets.get_mut(&cardinality) else {
                continue;
            };
            bucket.retain(|w| w.strong_count() > 0);
            for weak in bucket.iter() {
                if let Some(shared) = weak.upgrade() {
                    if shared.is_subset_of(set) {
                        return Some(shared);
                    }
                }
            }
        }
        None
    }

    /// Number of live interned sets
    pub fn len(&self) -> usize {
        self.buckets
            .lock()
            .values()
            .map(|bucket| bucket.iter().filter(|w| w.strong_count() > 0).count())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every interned entry
    pub fn clear(&self) {
        self.buckets.lock().clear();
    }
}
