//! Memoization cache contract.

use std::fmt;

use crate::types::{Series, SourceId};

/// Key identifying one memoized computation:
/// operation name, stringified parameters and source identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// Operation name (e.g. "EMA")
    pub op: String,
    /// Stringified parameters
    pub params: String,
    /// Identity of the input the operation ran on
    pub source: SourceId,
}

impl CacheKey {
    /// Create a new cache key.
    pub fn new(op: impl Into<String>, params: impl Into<String>, source: SourceId) -> Self {
        Self {
            op: op.into(),
            params: params.into(),
            source,
        }
    }

    /// Derive a key for one named output of a multi-output computation.
    pub fn with_output(&self, output: &str) -> Self {
        Self {
            op: format!("{}.{}", self.op, output),
            params: self.params.clone(),
            source: self.source,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})@{}", self.op, self.params, self.source)
    }
}

/// Keyed series store owned by one evaluation context.
///
/// Producers handed to [`SeriesCache::get_or_compute`] must be pure, so a
/// hit and a miss are indistinguishable to the caller.
pub trait SeriesCache {
    /// Look up a previously stored series.
    fn lookup(&self, key: &CacheKey) -> Option<Series>;

    /// Store a computed series.
    fn store(&mut self, key: CacheKey, series: Series);

    /// Return the stored series for `key`, or run `producer` once, store and
    /// return its result.
    fn get_or_compute(&mut self, key: CacheKey, producer: &mut dyn FnMut() -> Series) -> Series {
        if let Some(hit) = self.lookup(&key) {
            return hit;
        }
        let series = producer();
        self.store(key, series.clone());
        series
    }
}

/// Cache that never stores anything; every request recomputes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCache;

impl SeriesCache for NoCache {
    fn lookup(&self, _key: &CacheKey) -> Option<Series> {
        None
    }

    fn store(&mut self, _key: CacheKey, _series: Series) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cache_always_recomputes() {
        let mut cache = NoCache;
        let key = CacheKey::new("TEST", "1", SourceId::from_hash(7));
        let mut calls = 0;

        for _ in 0..3 {
            let series = cache.get_or_compute(key.clone(), &mut || {
                calls += 1;
                Series::new(vec![1.0])
            });
            assert_eq!(series.len(), 1);
        }

        assert_eq!(calls, 3);
    }

    #[test]
    fn test_output_key_differs() {
        let key = CacheKey::new("BB", "20,2", SourceId::from_hash(1));
        let upper = key.with_output("upper");

        assert_ne!(key, upper);
        assert_eq!(upper.op, "BB.upper");
        assert_eq!(upper.source, key.source);
    }

    #[test]
    fn test_key_display() {
        let key = CacheKey::new("EMA", "3", SourceId::from_hash(255));
        assert_eq!(key.to_string(), "EMA(3)@00000000000000ff");
    }
}
