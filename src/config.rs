//! Construction parameters for `ChainedHashMap`.

use crate::error::{Error, Result};

pub const DEFAULT_CAPACITY: usize = 16;
pub const DEFAULT_LOAD_FACTOR: f64 = 0.75;
/// Largest bucket count. A table at this size stops growing and lets its
/// chains lengthen instead.
pub const MAX_CAPACITY: usize = 1 << 30;
/// Growth never spreads the table thinner than this many buckets per entry,
/// however small the load factor.
pub(crate) const MAX_BUCKETS_PER_ENTRY: usize = 64;

/// Initial capacity and load factor for a new table.
///
/// The capacity is a bucket count and is rounded up to the next power of
/// two. The load factor bounds `len / capacity`; exceeding it doubles the
/// bucket array.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TableConfig {
    pub initial_capacity: usize,
    pub load_factor: f64,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_CAPACITY,
            load_factor: DEFAULT_LOAD_FACTOR,
        }
    }
}

impl TableConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    pub fn with_load_factor(mut self, load_factor: f64) -> Self {
        self.load_factor = load_factor;
        self
    }

    /// Checks the parameters and returns the power-of-two bucket count,
    /// clamped to [`MAX_CAPACITY`].
    pub fn validate(&self) -> Result<usize> {
        if self.initial_capacity == 0 {
            return Err(Error::InvalidArgument(
                "initial capacity must be positive".into(),
            ));
        }
        if self.load_factor.is_nan() || self.load_factor <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "load factor must be a positive number, got {}",
                self.load_factor
            )));
        }
        if self.initial_capacity >= MAX_CAPACITY {
            return Ok(MAX_CAPACITY);
        }
        Ok(self.initial_capacity.next_power_of_two())
    }
}

/// `floor(capacity * load_factor)`, saturating at `usize::MAX`.
///
/// Never below `capacity / MAX_BUCKETS_PER_ENTRY`, and unbounded once the
/// table is at [`MAX_CAPACITY`], so growth always terminates.
pub(crate) fn threshold_for(capacity: usize, load_factor: f64) -> usize {
    if capacity >= MAX_CAPACITY {
        return usize::MAX;
    }
    // float-to-int `as` saturates and truncates toward zero
    let wanted = (capacity as f64 * load_factor) as usize;
    wanted.max(capacity / MAX_BUCKETS_PER_ENTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = TableConfig::default();
        assert_eq!(c.initial_capacity, 16);
        assert_eq!(c.load_factor, 0.75);
        assert_eq!(c.validate(), Ok(16));
    }

    #[test]
    fn capacity_rounds_up_to_power_of_two() {
        for (req, want) in [(1, 1), (2, 2), (3, 4), (5, 8), (16, 16), (17, 32), (1000, 1024)] {
            assert_eq!(TableConfig::new().with_capacity(req).validate(), Ok(want));
        }
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad = [
            TableConfig::new().with_capacity(0),
            TableConfig::new().with_load_factor(0.0),
            TableConfig::new().with_load_factor(-1.5),
            TableConfig::new().with_load_factor(f64::NAN),
        ];
        for c in bad {
            assert!(
                matches!(c.validate(), Err(Error::InvalidArgument(_))),
                "{:?} should be rejected",
                c
            );
        }
    }

    #[test]
    fn threshold_floors_and_saturates() {
        assert_eq!(threshold_for(2, 0.75), 1);
        assert_eq!(threshold_for(16, 0.75), 12);
        assert_eq!(threshold_for(16, 0.5), 8);
        assert_eq!(threshold_for(1, 0.1), 0);
        assert_eq!(threshold_for(4, f64::INFINITY), usize::MAX);
    }

    #[test]
    fn tiny_load_factor_is_floored_by_bucket_spread() {
        assert_eq!(threshold_for(64, 1e-300), 1);
        assert_eq!(threshold_for(1024, 1e-9), 16);
        assert_eq!(threshold_for(32, 1e-300), 0);
        assert_eq!(threshold_for(MAX_CAPACITY, 1e-300), usize::MAX);
        assert_eq!(threshold_for(MAX_CAPACITY, 0.75), usize::MAX);
    }

    #[test]
    fn huge_capacity_is_clamped() {
        for req in [MAX_CAPACITY, MAX_CAPACITY + 1, usize::MAX] {
            assert_eq!(TableConfig::new().with_capacity(req).validate(), Ok(MAX_CAPACITY));
        }
    }
}
