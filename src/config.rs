//! Construction parameters

use crate::hash::DEFAULT_HASH_SEED;

/// Capacity used by [`FilterConfig::default`]; allocates about 1 MiB of fingerprints
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Everything needed to build a [`CuckooFilter`](crate::CuckooFilter) with the default hash provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    /// Expected number of items. Rounded up to a power of two, then divided into buckets of 4.
    pub capacity: usize,
    /// Seed for the Murmur3 hash provider. Filters only agree on layout when they share it.
    pub hash_seed: u32,
    /// Seed for the eviction RNG. `None` seeds from OS entropy.
    pub rng_seed: Option<u64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            capacity: DEFAULT_CAPACITY,
            hash_seed: DEFAULT_HASH_SEED,
            rng_seed: None,
        }
    }
}

impl FilterConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        FilterConfig {
            capacity,
            ..Default::default()
        }
    }

    pub fn hash_seed(mut self, seed: u32) -> Self {
        self.hash_seed = seed;
        self
    }

    pub fn rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

/* -------------------- Unit Tests -------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.capacity, DEFAULT_CAPACITY);
        assert_eq!(config.hash_seed, DEFAULT_HASH_SEED);
        assert_eq!(config.rng_seed, None);
    }

    #[test]
    fn setters_chain() {
        let config = FilterConfig::with_capacity(64).hash_seed(9).rng_seed(3);
        assert_eq!(config.capacity, 64);
        assert_eq!(config.hash_seed, 9);
        assert_eq!(config.rng_seed, Some(3));
    }
}
