//! Thread-safe wrapper around [`CuckooFilter`]
//!
//! One mutex guards the whole bucket table. Every method holds it for the duration of the call, so operations on a shared filter are totally ordered by lock acquisition.

use crate::bucket::Bucket;
use crate::error::CuckooFilterError;
use crate::filter::CuckooFilter;
use crate::hash::{HashProvider, Murmur3Provider};
use crate::trace::SharedTrace;

use parking_lot::{Mutex, MutexGuard};

#[derive(Debug)]
pub struct SyncCuckooFilter<H = Murmur3Provider> {
    inner: Mutex<CuckooFilter<H>>,
}

impl<H: HashProvider> SyncCuckooFilter<H> {
    pub fn new(filter: CuckooFilter<H>) -> Self {
        SyncCuckooFilter {
            inner: Mutex::new(filter),
        }
    }

    pub fn insert(&self, key: &[u8]) -> Result<(), CuckooFilterError> {
        self.inner.lock().insert(key)
    }

    /// Lookup and insert under one acquisition, so concurrent callers insert a key at most once
    pub fn insert_unique(&self, key: &[u8]) -> Result<bool, CuckooFilterError> {
        self.inner.lock().insert_unique(key)
    }

    pub fn delete(&self, key: &[u8]) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn lookup(&self, key: &[u8]) -> bool {
        self.inner.lock().lookup(key)
    }

    pub fn count(&self) -> usize {
        self.inner.lock().count()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn reset(&self) {
        self.inner.lock().reset()
    }

    pub fn encode(&self) -> Vec<u8> {
        self.inner.lock().encode()
    }

    /// Copy of the bucket table taken under the lock
    pub fn buckets(&self) -> Vec<Bucket> {
        self.inner.lock().buckets().to_vec()
    }

    pub fn replace_buckets(&self, buckets: Vec<Bucket>) -> Result<(), CuckooFilterError> {
        self.inner.lock().replace_buckets(buckets)
    }

    /// Hold the lock across several operations
    pub fn lock(&self) -> MutexGuard<'_, CuckooFilter<H>> {
        self.inner.lock()
    }

    pub fn into_inner(self) -> CuckooFilter<H> {
        self.inner.into_inner()
    }

    /// Start recording deferred mutations; the lock is only taken while hashing and while syncing
    pub fn trace(&self) -> SharedTrace<'_, H> {
        SharedTrace::new(self)
    }
}

impl<H: HashProvider> From<CuckooFilter<H>> for SyncCuckooFilter<H> {
    fn from(filter: CuckooFilter<H>) -> Self {
        SyncCuckooFilter::new(filter)
    }
}

/* -------------------- Unit Tests -------------------- */
