//! # Cuckoo Filter with deferred mutation traces
//!
//! A Cuckoo Filter is an efficient data structure for determining "set membership" (i.e. 'have I seen this thing before?'). It is similar to a Bloom Filter, but unlike a Bloom Filter, Cuckoo Filters support item deletion.
//!
//! This crate implements a (2, 4) Cuckoo Filter with 1 byte fingerprints, a fixed capacity chosen at construction, and a flat binary encoding (4 bytes per bucket, no header). On top of the filter sits a [`Trace`]: a log of intended inserts and deletes that is hashed up front and replayed later in one step, which for a [`SyncCuckooFilter`] means a single lock acquisition.
//!
//! ```
//! use cuckoo_trace::CuckooFilter;
//!
//! let mut filter = CuckooFilter::new(1000).unwrap();
//! filter.insert(b"foo").unwrap();
//!
//! let mut trace = filter.trace();
//! trace.add(b"bar");
//! trace.delete(b"foo");
//! let report = trace.sync().unwrap();
//! assert!(report.is_complete());
//!
//! assert!(filter.lookup(b"bar"));
//! assert!(!filter.lookup(b"foo"));
//! ```

mod bucket;
mod config;
mod error;
mod filter;
mod hash;
mod sync;
mod trace;

pub use bucket::{Bucket, Fingerprint, BUCKET_SIZE, EMPTY_SLOT};
pub use config::{FilterConfig, DEFAULT_CAPACITY};
pub use error::CuckooFilterError;
pub use filter::{CuckooFilter, ITEM_LIMIT, MAX_BUCKETS, MAX_EVICTIONS};
pub use hash::{index_mask, next_pow2, HashProvider, Murmur3Provider, DEFAULT_HASH_SEED};
pub use sync::SyncCuckooFilter;
pub use trace::{Record, SharedTrace, SyncReport, Trace, TraceOp};
