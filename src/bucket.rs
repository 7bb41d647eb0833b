//! Fixed size fingerprint buckets

/// A 1 byte tag derived from a key. Collisions between keys are expected.
pub type Fingerprint = u8;

/// Sentinel stored in a slot that holds no fingerprint
pub const EMPTY_SLOT: Fingerprint = 0;

/// Each bucket holds 4 fingerprints
///
/// The paper recommends (2, 4) as space optimal for practical false positive rates: 2 candidate buckets per item, 4 fingerprints per bucket.
pub const BUCKET_SIZE: usize = 4;

/// A bucket of [`BUCKET_SIZE`] fingerprint slots
///
/// Slot order carries no meaning, and the same fingerprint may appear in more than one slot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bucket([Fingerprint; BUCKET_SIZE]);

impl Bucket {
    pub const fn new() -> Self {
        Bucket([EMPTY_SLOT; BUCKET_SIZE])
    }

    /// Write `fingerprint` into the first empty slot. False means the bucket was full.
    pub fn insert(&mut self, fingerprint: Fingerprint) -> bool {
        for slot in self.0.iter_mut() {
            if *slot == EMPTY_SLOT {
                *slot = fingerprint;
                return true;
            }
        }
        false
    }

    /// Clear the first slot holding `fingerprint`
    pub fn delete(&mut self, fingerprint: Fingerprint) -> bool {
        match self.index_of(fingerprint) {
            Some(slot) => {
                self.0[slot] = EMPTY_SLOT;
                true
            }
            None => false,
        }
    }

    /// Position of the first slot holding `fingerprint`
    pub fn index_of(&self, fingerprint: Fingerprint) -> Option<usize> {
        self.0.iter().position(|&slot| slot == fingerprint)
    }

    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.index_of(fingerprint).is_some()
    }

    /// Put `fingerprint` into `slot` and hand back whatever was there (the cuckoo mechanism)
    ///
    /// Panics if `slot >= BUCKET_SIZE`.
    pub fn swap(&mut self, slot: usize, fingerprint: Fingerprint) -> Fingerprint {
        core::mem::replace(&mut self.0[slot], fingerprint)
    }

    pub fn reset(&mut self) {
        self.0 = [EMPTY_SLOT; BUCKET_SIZE];
    }

    /// Number of non-empty slots
    pub fn occupied(&self) -> usize {
        self.0.iter().filter(|&&slot| slot != EMPTY_SLOT).count()
    }

    pub fn is_full(&self) -> bool {
        self.occupied() == BUCKET_SIZE
    }

    pub fn slots(&self) -> &[Fingerprint; BUCKET_SIZE] {
        &self.0
    }

    /// Wire form of the bucket: one byte per slot, 0 for empty
    pub fn to_bytes(self) -> [u8; BUCKET_SIZE] {
        self.0
    }

    pub fn from_bytes(bytes: [u8; BUCKET_SIZE]) -> Self {
        Bucket(bytes)
    }
}

impl From<[Fingerprint; BUCKET_SIZE]> for Bucket {
    fn from(slots: [Fingerprint; BUCKET_SIZE]) -> Self {
        Bucket(slots)
    }
}

/* -------------------- Unit Tests -------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_until_full() {
        let mut bucket = Bucket::new();
        for fp in 1..=4 {
            assert!(bucket.insert(fp));
        }
        assert!(bucket.is_full());
        assert!(!bucket.insert(5));
        assert_eq!(bucket.slots(), &[1, 2, 3, 4]);
    }

    #[test]
    fn insert_fills_first_empty_slot() {
        let mut bucket = Bucket::from([7, 0, 9, 0]);
        assert!(bucket.insert(3));
        assert_eq!(bucket.slots(), &[7, 3, 9, 0]);
    }

    #[test]
    fn duplicates_are_allowed() {
        let mut bucket = Bucket::new();
        assert!(bucket.insert(42));
        assert!(bucket.insert(42));
        assert_eq!(bucket.occupied(), 2);
        assert!(bucket.delete(42));
        assert!(bucket.contains(42));
        assert!(bucket.delete(42));
        assert!(!bucket.contains(42));
    }

    #[test]
    fn delete_clears_first_match_only() {
        let mut bucket = Bucket::from([5, 6, 5, 0]);
        assert!(bucket.delete(5));
        assert_eq!(bucket.slots(), &[0, 6, 5, 0]);
        assert!(!bucket.delete(8));
    }

    #[test]
    fn index_of_reports_position() {
        let bucket = Bucket::from([1, 2, 3, 0]);
        assert_eq!(bucket.index_of(3), Some(2));
        assert_eq!(bucket.index_of(4), None);
    }

    #[test]
    fn swap_returns_displaced() {
        let mut bucket = Bucket::from([1, 2, 3, 4]);
        assert_eq!(bucket.swap(2, 9), 3);
        assert_eq!(bucket.slots(), &[1, 2, 9, 4]);
        assert_eq!(bucket.occupied(), 4);
    }

    #[test]
    fn reset_empties_all_slots() {
        let mut bucket = Bucket::from([1, 2, 3, 4]);
        bucket.reset();
        assert_eq!(bucket, Bucket::new());
        assert_eq!(bucket.occupied(), 0);
    }

    #[test]
    fn bytes_mirror_slots() {
        let bucket = Bucket::from([0, 255, 1, 0]);
        assert_eq!(bucket.to_bytes(), [0, 255, 1, 0]);
        assert_eq!(Bucket::from_bytes([0, 255, 1, 0]), bucket);
    }
}
