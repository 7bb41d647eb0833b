//! Hash provider contract and the default Murmur3 provider
//!
//! A provider turns a key into a primary bucket index and a non-zero fingerprint, and maps a fingerprint plus one of its buckets to the other one. The second mapping must be an involution so an evicted fingerprint can always find its way back home without the original key.

use crate::bucket::Fingerprint;

/// Seed used by [`Murmur3Provider::default`]
pub const DEFAULT_HASH_SEED: u32 = 1337;

/// Derives bucket indices and fingerprints for the filter
pub trait HashProvider {
    /// Primary bucket index in `[0, 2^bucket_pow)` and a fingerprint in `1..=255`
    fn index_and_fingerprint(&self, key: &[u8], bucket_pow: u32) -> (usize, Fingerprint);

    /// The other home bucket of `fingerprint` when it currently sits in `index`
    ///
    /// Must satisfy `alt_index(fp, alt_index(fp, i, p), p) == i` for every `i < 2^p`.
    fn alt_index(&self, fingerprint: Fingerprint, index: usize, bucket_pow: u32) -> usize;
}

/// Smallest power of two greater than or equal to `n`, or `None` if that overflows
///
/// `next_pow2(0)` is 1.
pub fn next_pow2(n: u64) -> Option<u64> {
    n.checked_next_power_of_two()
}

/// Mask selecting the low `bucket_pow` bits of a hash
#[inline]
pub fn index_mask(bucket_pow: u32) -> usize {
    1usize
        .checked_shl(bucket_pow)
        .map_or(usize::MAX, |bound| bound - 1)
}

/// Default provider backed by Murmur3 x86/128
///
/// The low 64 bits of the digest are split: the upper 32 bits pick the primary bucket and the whole word, reduced modulo 255, picks the fingerprint. The alternate bucket XORs the index with the (masked) hash of the fingerprint byte itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Murmur3Provider {
    seed: u32,
}

impl Murmur3Provider {
    pub fn with_seed(seed: u32) -> Self {
        Murmur3Provider { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    fn hash64(&self, data: &[u8]) -> u64 {
        // Reading from an in-memory slice cannot fail
        let mut source = data;
        murmur3::murmur3_x86_128(&mut source, self.seed).map_or(0, |hash| hash as u64)
    }
}

impl Default for Murmur3Provider {
    fn default() -> Self {
        Murmur3Provider::with_seed(DEFAULT_HASH_SEED)
    }
}

/// Compute a 1 byte fingerprint from a hash digest
///
/// The fingerprint cannot be zero because 0 marks an empty slot.
#[inline]
fn fingerprint_from_hash(hash: u64) -> Fingerprint {
    (hash % 255 + 1) as Fingerprint
}

impl HashProvider for Murmur3Provider {
    fn index_and_fingerprint(&self, key: &[u8], bucket_pow: u32) -> (usize, Fingerprint) {
        let hash = self.hash64(key);
        let index = (hash >> 32) as usize & index_mask(bucket_pow);
        (index, fingerprint_from_hash(hash))
    }

    fn alt_index(&self, fingerprint: Fingerprint, index: usize, bucket_pow: u32) -> usize {
        let mask = index_mask(bucket_pow);
        let offset = self.hash64(&[fingerprint]) as usize & mask;
        (index & mask) ^ offset
    }
}

/* -------------------- Unit Tests -------------------- */
