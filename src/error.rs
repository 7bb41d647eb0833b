//! Error types for the cuckoo filter

use thiserror::Error;

/// Possible errors for the Cuckoo Filter
///
/// "Not found" is never an error: lookups and deletes answer with a `bool`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CuckooFilterError {
    /// Requested capacity at initialization exceeds item limit
    #[error("capacity {requested} exceeds the item limit of {limit}")]
    CapacityExceedsItemLimit { requested: u64, limit: u64 },

    /// Model had too many collisions and ran out of effective space
    #[error("eviction chain exhausted; filter is effectively full")]
    OutOfSpace,

    #[error("encoded filter can not be empty")]
    EmptyEncoding,

    #[error("expected encoded length to be a multiple of 4, got {len}")]
    MisalignedEncoding { len: usize },

    /// A replacement bucket table must hold at least one bucket
    #[error("bucket table can not be empty")]
    EmptyBuckets,

    /// A traced record carries the empty-slot fingerprint or a bucket outside the traced table
    #[error("trace record {position} is invalid: fingerprint {fingerprint}, bucket {index}")]
    InvalidRecord {
        position: usize,
        fingerprint: u8,
        index: usize,
    },

    /// The trace was recorded against a table of a different size
    #[error("trace recorded for 2^{traced} buckets but the filter now has 2^{current}")]
    LayoutMismatch { traced: u32, current: u32 },
}
