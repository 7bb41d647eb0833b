//! # Cuckoo Filter
//!
//! This implementation is based on the paper _Cuckoo Filter: Practically Better Than Bloom_, by Fan et. al.
//!
//! Every key maps to a 1 byte fingerprint and two home buckets. The second home is derived from the first and the fingerprint alone, which lets the filter move a stored fingerprint to its other home during insertion without knowing the key it came from.
//!
//! [`CuckooFilter`] is the single owner, unsynchronized filter. Wrap it in a [`SyncCuckooFilter`](crate::SyncCuckooFilter) to share it between threads.

use crate::bucket::{Bucket, Fingerprint, BUCKET_SIZE};
use crate::config::FilterConfig;
use crate::error::CuckooFilterError;
use crate::hash::{next_pow2, HashProvider, Murmur3Provider};
use crate::trace::Trace;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

/// Upper bound on displacements attempted by one insertion
pub const MAX_EVICTIONS: u16 = 500;
/// The default provider derives the primary index from 32 hash bits, so we can address up to 2^32 buckets
pub const MAX_BUCKETS: u64 = 1 << 32;
/// The item limit needs to respect the POW(2) rounding we do
pub const ITEM_LIMIT: u64 = MAX_BUCKETS * BUCKET_SIZE as u64;

/// A Cuckoo Filter over 1 byte fingerprints in buckets of 4
///
/// ### Notes
///
/// - `count` always equals the number of occupied slots across all buckets
/// - `bucket_pow` is `log2` of the bucket count and masks hash outputs into valid indices
/// - The eviction RNG is owned by the filter; seed it with [`CuckooFilter::with_seed`] for reproducible eviction paths
#[derive(Debug, Clone)]
pub struct CuckooFilter<H = Murmur3Provider> {
    buckets: Vec<Bucket>,
    count: usize,
    bucket_pow: u32,
    hasher: H,
    rng: ChaCha8Rng,
}

impl CuckooFilter<Murmur3Provider> {
    /// Create a filter sized for `capacity` items, with an entropy seeded eviction RNG
    ///
    /// ### Caveats
    ///
    /// - We round `capacity` up to a power of two before dividing it into buckets of 4, so the table may hold up to twice what was asked for. The bucket count is never less than 1.
    pub fn new(capacity: usize) -> Result<Self, CuckooFilterError> {
        Self::with_parts(
            capacity,
            Murmur3Provider::default(),
            ChaCha8Rng::from_entropy(),
        )
    }

    /// Like [`CuckooFilter::new`] but with a deterministic eviction RNG
    pub fn with_seed(capacity: usize, seed: u64) -> Result<Self, CuckooFilterError> {
        Self::with_parts(
            capacity,
            Murmur3Provider::default(),
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    pub fn from_config(config: &FilterConfig) -> Result<Self, CuckooFilterError> {
        let rng = match config.rng_seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self::with_parts(
            config.capacity,
            Murmur3Provider::with_seed(config.hash_seed),
            rng,
        )
    }

    /// Rebuild a filter from [`CuckooFilter::encode`] output using the default hash provider
    pub fn decode(bytes: &[u8]) -> Result<Self, CuckooFilterError> {
        Self::decode_with(bytes, Murmur3Provider::default(), ChaCha8Rng::from_entropy())
    }
}

impl<H: HashProvider> CuckooFilter<H> {
    /// Create a filter from its parts
    ///
    /// Fails when `capacity` exceeds [`ITEM_LIMIT`].
    pub fn with_parts(
        capacity: usize,
        hasher: H,
        rng: ChaCha8Rng,
    ) -> Result<Self, CuckooFilterError> {
        let requested = capacity as u64;
        let too_large = CuckooFilterError::CapacityExceedsItemLimit {
            requested,
            limit: ITEM_LIMIT,
        };
        if requested > ITEM_LIMIT {
            return Err(too_large);
        }
        let rounded = next_pow2(requested).ok_or_else(|| too_large.clone())?;
        let bucket_count =
            usize::try_from((rounded / BUCKET_SIZE as u64).max(1)).map_err(|_| too_large)?;
        let bucket_pow = bucket_count.trailing_zeros();
        debug!(capacity, bucket_count, bucket_pow, "created cuckoo filter");
        Ok(CuckooFilter {
            buckets: vec![Bucket::new(); bucket_count],
            count: 0,
            bucket_pow,
            hasher,
            rng,
        })
    }

    /// Rebuild a filter from [`CuckooFilter::encode`] output
    ///
    /// `hasher` must be the provider the encoded filter was built with, otherwise lookups will miss.
    pub fn decode_with(
        bytes: &[u8],
        hasher: H,
        rng: ChaCha8Rng,
    ) -> Result<Self, CuckooFilterError> {
        if bytes.is_empty() {
            return Err(CuckooFilterError::EmptyEncoding);
        }
        if bytes.len() % BUCKET_SIZE != 0 {
            return Err(CuckooFilterError::MisalignedEncoding { len: bytes.len() });
        }
        let buckets: Vec<Bucket> = bytes
            .chunks_exact(BUCKET_SIZE)
            .map(|chunk| {
                let mut slots = [0u8; BUCKET_SIZE];
                slots.copy_from_slice(chunk);
                Bucket::from_bytes(slots)
            })
            .collect();
        let count = occupancy(&buckets);
        let bucket_pow = buckets.len().trailing_zeros();
        debug!(
            bucket_count = buckets.len(),
            bucket_pow, count, "decoded cuckoo filter"
        );
        Ok(CuckooFilter {
            buckets,
            count,
            bucket_pow,
            hasher,
            rng,
        })
    }

    /// Serialize the table: 4 bytes per bucket, in bucket order, 0 for an empty slot
    ///
    /// There is no header, so the reader must know which hash provider to pair it with.
    pub fn encode(&self) -> Vec<u8> {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.to_bytes())
            .collect()
    }

    /// Check if item is in filter
    ///
    /// Never wrong for a resident key, but may report keys that were never inserted.
    pub fn lookup(&self, key: &[u8]) -> bool {
        let (i1, fingerprint) = self.hasher.index_and_fingerprint(key, self.bucket_pow);
        if self.buckets[i1].contains(fingerprint) {
            return true;
        }
        let i2 = self.hasher.alt_index(fingerprint, i1, self.bucket_pow);
        self.buckets[i2].contains(fingerprint)
    }

    /// Add item to filter. Returns Err if filter is full
    ///
    /// When the eviction chain gives up, the table keeps whatever the chain left behind: occupancy is unchanged, but the last displaced fingerprint (which may belong to an earlier key) is gone.
    pub fn insert(&mut self, key: &[u8]) -> Result<(), CuckooFilterError> {
        let (i1, fingerprint) = self.hasher.index_and_fingerprint(key, self.bucket_pow);
        if self.place(fingerprint, i1) {
            Ok(())
        } else {
            Err(CuckooFilterError::OutOfSpace)
        }
    }

    /// Add item to filter unless it already appears to be present
    ///
    /// `Ok(false)` means the lookup hit (possibly a false positive) and nothing was written.
    pub fn insert_unique(&mut self, key: &[u8]) -> Result<bool, CuckooFilterError> {
        if self.lookup(key) {
            return Ok(false);
        }
        self.insert(key).map(|()| true)
    }

    /// Delete an item from the filter, returning whether a matching fingerprint was removed
    pub fn delete(&mut self, key: &[u8]) -> bool {
        let (i1, fingerprint) = self.hasher.index_and_fingerprint(key, self.bucket_pow);
        self.remove(fingerprint, i1)
    }

    /// Number of occupied slots
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Empty every bucket
    pub fn reset(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.reset();
        }
        self.count = 0;
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn bucket_pow(&self) -> u32 {
        self.bucket_pow
    }

    /// Total number of fingerprint slots
    pub fn slot_capacity(&self) -> usize {
        self.buckets.len() * BUCKET_SIZE
    }

    /// Occupied slots over total slots
    pub fn load_factor(&self) -> f64 {
        self.count as f64 / self.slot_capacity() as f64
    }

    /// Approximately how many bytes is this CF using?
    pub fn estimate_size(&self) -> usize {
        self.buckets.len() * BUCKET_SIZE * core::mem::size_of::<Fingerprint>()
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Direct view of the bucket table, for snapshots
    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }

    /// Swap in a whole new bucket table
    ///
    /// `count` and `bucket_pow` are recomputed from the new table. Traces recorded before a replacement that changes `bucket_pow` will refuse to sync.
    pub fn replace_buckets(&mut self, buckets: Vec<Bucket>) -> Result<(), CuckooFilterError> {
        if buckets.is_empty() {
            return Err(CuckooFilterError::EmptyBuckets);
        }
        self.count = occupancy(&buckets);
        self.bucket_pow = buckets.len().trailing_zeros();
        self.buckets = buckets;
        debug!(
            bucket_count = self.buckets.len(),
            bucket_pow = self.bucket_pow,
            count = self.count,
            "replaced bucket table"
        );
        Ok(())
    }

    /// Start recording deferred mutations against this filter
    pub fn trace(&mut self) -> Trace<'_, H> {
        Trace::new(self)
    }

    /// Store `fingerprint` in bucket `i1`, its alternate bucket, or by evicting
    ///
    /// Shared by [`CuckooFilter::insert`] and trace replay.
    pub(crate) fn place(&mut self, fingerprint: Fingerprint, i1: usize) -> bool {
        if self.insert_fingerprint(fingerprint, i1) {
            return true;
        }
        let i2 = self.hasher.alt_index(fingerprint, i1, self.bucket_pow);
        if self.insert_fingerprint(fingerprint, i2) {
            return true;
        }
        let start = if self.rng.gen::<bool>() { i1 } else { i2 };
        self.reinsert(fingerprint, start)
    }

    /// Remove `fingerprint` from bucket `i1`, or failing that from its alternate bucket
    pub(crate) fn remove(&mut self, fingerprint: Fingerprint, i1: usize) -> bool {
        if self.delete_fingerprint(fingerprint, i1) {
            return true;
        }
        let i2 = self.hasher.alt_index(fingerprint, i1, self.bucket_pow);
        self.delete_fingerprint(fingerprint, i2)
    }

    /// Internal method to try inserting a fingerprint into a bucket.
    ///
    /// True means success, false means the bucket was full
    fn insert_fingerprint(&mut self, fingerprint: Fingerprint, index: usize) -> bool {
        if self.buckets[index].insert(fingerprint) {
            self.count += 1;
            return true;
        }
        false
    }

    fn delete_fingerprint(&mut self, fingerprint: Fingerprint, index: usize) -> bool {
        if self.buckets[index].delete(fingerprint) {
            self.count = self.count.saturating_sub(1);
            return true;
        }
        false
    }

    /// The eviction chain
    ///
    /// Swap the incoming fingerprint into a random slot, carry the displaced one to its other home, and repeat until something lands in a free slot. Swaps conserve occupancy, so only the final write touches `count`.
    fn reinsert(&mut self, mut fingerprint: Fingerprint, mut index: usize) -> bool {
        for _ in 0..MAX_EVICTIONS {
            let slot = self.rng.gen_range(0..BUCKET_SIZE);
            fingerprint = self.buckets[index].swap(slot, fingerprint);
            index = self.hasher.alt_index(fingerprint, index, self.bucket_pow);
            if self.insert_fingerprint(fingerprint, index) {
                return true;
            }
        }
        warn!(
            fingerprint,
            bucket = index,
            count = self.count,
            "eviction chain exhausted, dropping displaced fingerprint"
        );
        false
    }
}

fn occupancy(buckets: &[Bucket]) -> usize {
    buckets.iter().map(Bucket::occupied).sum()
}

/* -------------------- Unit Tests -------------------- */
