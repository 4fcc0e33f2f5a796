//! In-memory series cache for one evaluation context.

use barwise_core::{CacheKey, Series, SeriesCache};
use std::cell::Cell;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Hit/miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// HashMap-backed [`SeriesCache`].
///
/// Owned by a single evaluation context; a concurrent host gives each
/// context its own instance.
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: HashMap<CacheKey, Series>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl MemoCache {
    /// Creates a new empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Checks if a key is already cached.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of cached series.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        debug!(entries = self.entries.len(), "Clearing series cache");
        self.entries.clear();
        self.hits.set(0);
        self.misses.set(0);
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.get(),
            misses: self.misses.get(),
            entries: self.entries.len(),
        }
    }
}

impl SeriesCache for MemoCache {
    fn lookup(&self, key: &CacheKey) -> Option<Series> {
        match self.entries.get(key) {
            Some(series) => {
                self.hits.set(self.hits.get() + 1);
                trace!(key = %key, "Cache hit");
                Some(series.clone())
            }
            None => {
                self.misses.set(self.misses.get() + 1);
                trace!(key = %key, "Cache miss");
                None
            }
        }
    }

    fn store(&mut self, key: CacheKey, series: Series) {
        debug!(key = %key, len = series.len(), "Caching series");
        self.entries.insert(key, series);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barwise_core::SourceId;

    fn key(op: &str) -> CacheKey {
        CacheKey::new(op, "3", SourceId::from_hash(1))
    }

    #[test]
    fn test_get_or_compute_runs_producer_once() {
        let mut cache = MemoCache::new();
        let mut calls = 0;

        let first = cache.get_or_compute(key("EMA"), &mut || {
            calls += 1;
            Series::new(vec![1.0, 2.0])
        });
        let second = cache.get_or_compute(key("EMA"), &mut || {
            calls += 1;
            Series::new(vec![9.0, 9.0])
        });

        assert_eq!(calls, 1);
        assert!(first.shares_buffer(&second));
        assert_eq!(second.values(), &[1.0, 2.0]);
    }

    #[test]
    fn test_distinct_keys_are_separate() {
        let mut cache = MemoCache::with_capacity(4);
        cache.store(key("EMA"), Series::new(vec![1.0]));
        cache.store(key("SMA"), Series::new(vec![2.0]));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(&key("SMA")));
        assert!(!cache.contains(&CacheKey::new("EMA", "4", SourceId::from_hash(1))));
        assert!(!cache.contains(&CacheKey::new("EMA", "3", SourceId::from_hash(2))));
    }

    #[test]
    fn test_stats_and_clear() {
        let mut cache = MemoCache::new();
        assert!(cache.lookup(&key("EMA")).is_none());
        cache.store(key("EMA"), Series::new(vec![1.0]));
        assert!(cache.lookup(&key("EMA")).is_some());

        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
