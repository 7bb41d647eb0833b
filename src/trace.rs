//! Deferred mutation log
//!
//! A trace hashes keys up front and stores only what the filter needs to apply the mutation later: a fingerprint, its primary bucket, and whether to insert or delete. [`Trace::sync`] and [`SharedTrace::sync`] then replay every record, in order, through the same primitives the filter uses for direct calls. For a shared filter that means many logical operations cost one lock acquisition.
//!
//! Records are computed against the `bucket_pow` captured when the trace was created. A trace refuses to sync against a filter whose `bucket_pow` has changed since, because its indices would be masked for the wrong table. A replacement table with a different bucket count but the same `bucket_pow` (e.g. 768 buckets after 256) is not detected.
//!
//! Every record is checked before the first one is applied, so a sync either fails without touching the filter or replays the whole log.

use crate::bucket::{Fingerprint, EMPTY_SLOT};
use crate::error::CuckooFilterError;
use crate::filter::CuckooFilter;
use crate::hash::{index_mask, HashProvider, Murmur3Provider};
use crate::sync::SyncCuckooFilter;

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TraceOp {
    Insert,
    Delete,
}

/// One captured mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Record {
    pub fingerprint: Fingerprint,
    /// Primary bucket, masked with the trace's `bucket_pow`
    pub index: usize,
    pub op: TraceOp,
}

/// Outcome of replaying a trace
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncReport {
    /// Records that changed the filter
    pub applied: usize,
    /// Delete records whose fingerprint was in neither home bucket
    pub not_found: usize,
    /// Insert records whose eviction chain was exhausted
    pub failed: Vec<Record>,
}

impl SyncReport {
    /// True when no insert record was dropped
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
struct RecordLog {
    records: Vec<Record>,
    bucket_pow: u32,
}

impl RecordLog {
    fn new(bucket_pow: u32, size_hint: usize) -> Self {
        RecordLog {
            records: Vec::with_capacity(size_hint),
            bucket_pow,
        }
    }

    fn record<H: HashProvider>(&mut self, hasher: &H, key: &[u8], op: TraceOp) {
        let (index, fingerprint) = hasher.index_and_fingerprint(key, self.bucket_pow);
        self.records.push(Record {
            fingerprint,
            index,
            op,
        });
    }

    fn replay<H: HashProvider>(
        &self,
        filter: &mut CuckooFilter<H>,
    ) -> Result<SyncReport, CuckooFilterError> {
        let current = filter.bucket_pow();
        if current != self.bucket_pow {
            return Err(CuckooFilterError::LayoutMismatch {
                traced: self.bucket_pow,
                current,
            });
        }
        let mask = index_mask(self.bucket_pow);
        if let Some((position, record)) = self
            .records
            .iter()
            .enumerate()
            .find(|(_, record)| record.fingerprint == EMPTY_SLOT || record.index > mask)
        {
            return Err(CuckooFilterError::InvalidRecord {
                position,
                fingerprint: record.fingerprint,
                index: record.index,
            });
        }

        let mut report = SyncReport::default();
        for record in &self.records {
            match record.op {
                TraceOp::Insert => {
                    if filter.place(record.fingerprint, record.index) {
                        report.applied += 1;
                    } else {
                        warn!(
                            fingerprint = record.fingerprint,
                            index = record.index,
                            "failed to replay traced insert"
                        );
                        report.failed.push(*record);
                    }
                }
                TraceOp::Delete => {
                    if filter.remove(record.fingerprint, record.index) {
                        report.applied += 1;
                    } else {
                        report.not_found += 1;
                    }
                }
            }
        }
        debug!(
            records = self.records.len(),
            applied = report.applied,
            not_found = report.not_found,
            failed = report.failed.len(),
            "synced trace"
        );
        Ok(report)
    }
}

/// A trace over a single owner [`CuckooFilter`]
///
/// The trace borrows the filter mutably, so nothing else can change it between recording and [`Trace::sync`]. Use [`Trace::filter`] to read it in the meantime.
#[derive(Debug)]
pub struct Trace<'f, H = Murmur3Provider> {
    filter: &'f mut CuckooFilter<H>,
    log: RecordLog,
}

impl<'f, H: HashProvider> Trace<'f, H> {
    pub(crate) fn new(filter: &'f mut CuckooFilter<H>) -> Self {
        let log = RecordLog::new(filter.bucket_pow(), filter.count());
        Trace { filter, log }
    }

    /// Record an insertion of `key`
    pub fn add(&mut self, key: &[u8]) {
        self.log.record(self.filter.hasher(), key, TraceOp::Insert);
    }

    /// Record a deletion of `key`
    pub fn delete(&mut self, key: &[u8]) {
        self.log.record(self.filter.hasher(), key, TraceOp::Delete);
    }

    /// Append a record computed elsewhere
    ///
    /// A record with fingerprint 0 or an index at or above `2^bucket_pow` makes [`Trace::sync`] fail with [`CuckooFilterError::InvalidRecord`].
    pub fn push(&mut self, record: Record) {
        self.log.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.log.records
    }

    pub fn len(&self) -> usize {
        self.log.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.records.is_empty()
    }

    /// The layout the records were computed against
    pub fn bucket_pow(&self) -> u32 {
        self.log.bucket_pow
    }

    /// Apply every record, in order
    ///
    /// Records are kept, so syncing twice applies them twice.
    pub fn sync(&mut self) -> Result<SyncReport, CuckooFilterError> {
        self.log.replay(&mut *self.filter)
    }

    /// Drop all records without touching the filter
    pub fn reset(&mut self) {
        self.log.records.clear();
    }

    pub fn filter(&self) -> &CuckooFilter<H> {
        &*self.filter
    }
}

/// A trace over a [`SyncCuckooFilter`]
///
/// Recording takes the filter's lock only while hashing. [`SharedTrace::sync`] holds it once for the whole replay.
#[derive(Debug)]
pub struct SharedTrace<'f, H = Murmur3Provider> {
    filter: &'f SyncCuckooFilter<H>,
    log: RecordLog,
}

impl<'f, H: HashProvider> SharedTrace<'f, H> {
    pub(crate) fn new(filter: &'f SyncCuckooFilter<H>) -> Self {
        let log = {
            let guard = filter.lock();
            RecordLog::new(guard.bucket_pow(), guard.count())
        };
        SharedTrace { filter, log }
    }

    pub fn add(&mut self, key: &[u8]) {
        let guard = self.filter.lock();
        self.log.record(guard.hasher(), key, TraceOp::Insert);
    }

    pub fn delete(&mut self, key: &[u8]) {
        let guard = self.filter.lock();
        self.log.record(guard.hasher(), key, TraceOp::Delete);
    }

    pub fn push(&mut self, record: Record) {
        self.log.records.push(record);
    }

    pub fn records(&self) -> &[Record] {
        &self.log.records
    }

    pub fn len(&self) -> usize {
        self.log.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.records.is_empty()
    }

    pub fn bucket_pow(&self) -> u32 {
        self.log.bucket_pow
    }

    /// Apply every record, in order, under a single lock acquisition
    pub fn sync(&mut self) -> Result<SyncReport, CuckooFilterError> {
        let mut guard = self.filter.lock();
        self.log.replay(&mut *guard)
    }

    pub fn reset(&mut self) {
        self.log.records.clear();
    }
}

/* -------------------- Unit Tests -------------------- */
