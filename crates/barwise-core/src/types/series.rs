//! Immutable, index-aligned value series.

use serde::{Serialize, Serializer};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

/// Content fingerprint identifying the source of a computation.
///
/// Two sources with bit-identical contents share an id, so a memoized
/// result computed for one is valid for the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    /// Fingerprint a slice of values by length and bit pattern.
    pub fn of_values(values: &[f64]) -> Self {
        let mut hasher = DefaultHasher::new();
        values.len().hash(&mut hasher);
        for value in values {
            value.to_bits().hash(&mut hasher);
        }
        SourceId(hasher.finish())
    }

    /// Build an id from an already computed hash.
    pub fn from_hash(hash: u64) -> Self {
        SourceId(hash)
    }

    /// Raw hash value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// One value per bar, created once and never mutated afterwards.
///
/// Clones share the underlying buffer, which is what lets a cache hand the
/// same result to several callers.
#[derive(Clone)]
pub struct Series {
    values: Arc<[f64]>,
    id: SourceId,
}

impl Series {
    /// Wrap computed values.
    pub fn new(values: Vec<f64>) -> Self {
        let id = SourceId::of_values(&values);
        Self {
            values: values.into(),
            id,
        }
    }

    /// A series of `len` copies of `value`.
    pub fn constant(value: f64, len: usize) -> Self {
        Self::new(vec![value; len])
    }

    /// An empty series.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Content fingerprint of this series.
    #[inline]
    pub fn source_id(&self) -> SourceId {
        self.id
    }

    /// Number of values.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the values.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Last value, if any.
    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }

    /// Copy the values out.
    pub fn to_vec(&self) -> Vec<f64> {
        self.values.to_vec()
    }

    /// Check whether two series point at the same buffer.
    pub fn shares_buffer(&self, other: &Series) -> bool {
        Arc::ptr_eq(&self.values, &other.values)
    }

    /// Apply `f` to every value.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Series {
        Series::new(self.values.iter().map(|&v| f(v)).collect())
    }

    /// Combine two aligned series element-wise.
    ///
    /// The result is as long as the shorter input.
    pub fn zip_with(&self, other: &Series, f: impl Fn(f64, f64) -> f64) -> Series {
        Series::new(
            self.values
                .iter()
                .zip(other.values.iter())
                .map(|(&a, &b)| f(a, b))
                .collect(),
        )
    }
}

impl Deref for Series {
    type Target = [f64];

    fn deref(&self) -> &[f64] {
        &self.values
    }
}

impl AsRef<[f64]> for Series {
    fn as_ref(&self) -> &[f64] {
        &self.values
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Series::new(values)
    }
}

impl From<&[f64]> for Series {
    fn from(values: &[f64]) -> Self {
        Series::new(values.to_vec())
    }
}

impl FromIterator<f64> for Series {
    fn from_iter<T: IntoIterator<Item = f64>>(iter: T) -> Self {
        Series::new(iter.into_iter().collect())
    }
}

/// Bitwise equality: NaN equals NaN when the bits match.
impl PartialEq for Series {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(other.values.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("id", &self.id)
            .field("values", &&*self.values)
            .finish()
    }
}

impl Serialize for Series {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values().serialize(serializer)
    }
}
