use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters shared by the submitting side and the worker.
///
/// Producer-side and worker-side counters are padded apart so the hot path
/// never shares a line with the worker's bookkeeping.
#[derive(Default)]
pub struct SinkCounters {
    /// Records handed to `log` (accepted or not).
    pub(crate) submitted: CachePadded<AtomicU64>,
    /// Records discarded because the ring was full.
    pub(crate) dropped: AtomicU64,
    /// Records copied into the backing file.
    pub(crate) persisted: CachePadded<AtomicU64>,
    /// Payload plus separator bytes copied into the backing file.
    pub(crate) bytes_written: AtomicU64,
    /// Records lost after a failed growth (only with `GrowthFailurePolicy::DropRecord`).
    pub(crate) lost_on_grow: AtomicU64,
    /// Successful remaps.
    pub(crate) grows: AtomicU64,
}

impl SinkCounters {
    pub fn snapshot(&self) -> LoggerStats {
        LoggerStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            persisted: self.persisted.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            lost_on_grow: self.lost_on_grow.load(Ordering::Relaxed),
            grows: self.grows.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of a logger's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    pub submitted: u64,
    pub dropped: u64,
    pub persisted: u64,
    pub bytes_written: u64,
    pub lost_on_grow: u64,
    pub grows: u64,
}

impl LoggerStats {
    /// Records accepted into the ring.
    pub fn accepted(&self) -> u64 {
        self.submitted.saturating_sub(self.dropped)
    }
}
