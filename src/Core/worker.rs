//! Background persistence worker.
//!
//! The worker is the only consumer of the ring and the only thread that
//! touches the mapping while the logger is open:
//! 1. `recv_blocking_with` hands it the next record (or idles)
//! 2. the backend grows if the record plus its separator does not fit
//! 3. the record is appended and the counters advance
//! 4. when the ring is idle, pending sync requests are served
//!
//! On shutdown the ring is drained completely and the backend is returned
//! through the join handle so the owner can finalize it.

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, warn};

use super::stats::SinkCounters;
use super::MappedFile::MappedLog;
use crate::error::LogError;
use crate::SPSC::Consumer;

/// Name given to the worker thread.
pub const WORKER_THREAD_NAME: &str = "dmxp-logsink-worker";

/// Default sleep between empty polls.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_micros(10);

/// What the worker does when the backing file cannot be grown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GrowthFailurePolicy {
    /// Report the error and terminate the process with status 1.
    #[default]
    Exit,
    /// Report the error, drop the record and keep going at the current size.
    DropRecord,
}

/// Worker tuning.
#[derive(Debug, Clone, Copy)]
pub struct WorkerConfig {
    pub idle_interval: Duration,
    pub growth_failure_policy: GrowthFailurePolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            idle_interval: DEFAULT_IDLE_INTERVAL,
            growth_failure_policy: GrowthFailurePolicy::Exit,
        }
    }
}

/// State shared between the logger facade and its worker.
#[derive(Default)]
pub struct SinkShared {
    /// Cleared once to request drain-and-exit.
    pub(crate) running: AtomicBool,
    pub(crate) counters: SinkCounters,
    /// Sync tickets handed out by `flush`.
    pub(crate) sync_requested: AtomicU64,
    /// Highest ticket the worker has synced.
    pub(crate) sync_completed: AtomicU64,
    pub(crate) sync_failures: AtomicU64,
}

impl SinkShared {
    pub fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            ..Default::default()
        }
    }

    /// Ask the worker to drain and exit. Idempotent.
    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::Release);
    }
}

/// Start the worker thread.
///
/// # Returns
/// The join handle; joining yields the backend once the ring is drained.
pub fn spawn(
    consumer: Consumer,
    backend: MappedLog,
    shared: Arc<SinkShared>,
    config: WorkerConfig,
) -> io::Result<JoinHandle<MappedLog>> {
    thread::Builder::new()
        .name(WORKER_THREAD_NAME.to_string())
        .spawn(move || run(consumer, backend, &shared, config))
}

/// The consumer loop. Returns the backend after the ring is closed and empty.
pub fn run(
    mut consumer: Consumer,
    mut backend: MappedLog,
    shared: &SinkShared,
    config: WorkerConfig,
) -> MappedLog {
    loop {
        let record = match consumer.recv_blocking_with(
            &shared.running,
            config.idle_interval,
            || serve_sync(&backend, shared),
        ) {
            Some(record) => record,
            None => break,
        };

        if let Err(e) = persist(&mut backend, record, shared) {
            match config.growth_failure_policy {
                GrowthFailurePolicy::Exit => {
                    error!(
                        path = %backend.path().display(),
                        capacity = backend.capacity(),
                        error = %e,
                        "log file resize failed, exiting"
                    );
                    std::process::exit(1);
                }
                GrowthFailurePolicy::DropRecord => {
                    warn!(
                        path = %backend.path().display(),
                        len = record.len(),
                        error = %e,
                        "log file resize failed, record dropped"
                    );
                    shared.counters.lost_on_grow.fetch_add(1, Ordering::Release);
                }
            }
        }
    }

    serve_sync(&backend, shared);
    backend
}

/// Reserve room for `record` and its separator, then append it.
fn persist(backend: &mut MappedLog, record: &[u8], shared: &SinkShared) -> Result<(), LogError> {
    let needed = record.len() + 1;
    let grown = backend
        .ensure_capacity(needed)
        .map_err(|source| LogError::Grow {
            from: backend.capacity(),
            to: backend.cursor().saturating_add(needed),
            source,
        })?;
    if let Some((from, to)) = grown {
        shared.counters.grows.fetch_add(1, Ordering::Relaxed);
        debug!(path = %backend.path().display(), from, to, "grew log file");
    }

    let before = backend.cursor();
    backend.append(record)?;
    shared
        .counters
        .bytes_written
        .fetch_add((backend.cursor() - before) as u64, Ordering::Relaxed);
    shared.counters.persisted.fetch_add(1, Ordering::Release);
    Ok(())
}

/// msync the committed range if any flush is waiting.
fn serve_sync(backend: &MappedLog, shared: &SinkShared) {
    let requested = shared.sync_requested.load(Ordering::Acquire);
    if requested <= shared.sync_completed.load(Ordering::Relaxed) {
        return;
    }

    if let Err(e) = backend.flush() {
        error!(path = %backend.path().display(), error = %e, "msync failed");
        shared.sync_failures.fetch_add(1, Ordering::Relaxed);
    }
    shared.sync_completed.store(requested, Ordering::Release);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::SPSC;

    #[test]
    fn drains_everything_before_returning_backend() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MappedLog::open(dir.path().join("w.log"), 4096).unwrap();
        let (mut producer, consumer) = SPSC::channel(1024).unwrap();
        let shared = SinkShared::new();

        for record in ["a", "bb", "ccc"] {
            assert!(producer.try_send(record).is_accepted());
        }
        shared.request_shutdown();

        let backend = run(consumer, backend, &shared, WorkerConfig::default());
        assert_eq!(backend.committed(), b"a\nbb\nccc\n");
        assert_eq!(shared.counters.snapshot().persisted, 3);
        assert_eq!(shared.counters.snapshot().bytes_written, 9);
    }

    #[test]
    fn grows_for_records_past_initial_size() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MappedLog::open(dir.path().join("g.log"), 16).unwrap();
        let (mut producer, consumer) = SPSC::channel(1024).unwrap();
        let shared = SinkShared::new();

        let big = vec![b'x'; 100];
        assert!(producer.try_send(&big).is_accepted());
        shared.request_shutdown();

        let backend = run(consumer, backend, &shared, WorkerConfig::default());
        assert_eq!(backend.capacity(), 128);
        assert_eq!(backend.cursor(), 101);
        assert_eq!(shared.counters.snapshot().grows, 1);
    }

    #[test]
    fn pending_sync_is_completed_on_exit() {
        let dir = tempfile::tempdir().unwrap();
        let backend = MappedLog::open(dir.path().join("s.log"), 64).unwrap();
        let (_producer, consumer) = SPSC::channel(64).unwrap();
        let shared = SinkShared::new();

        shared.sync_requested.fetch_add(1, Ordering::AcqRel);
        shared.request_shutdown();
        run(consumer, backend, &shared, WorkerConfig::default());

        assert_eq!(shared.sync_completed.load(Ordering::Acquire), 1);
    }
}
