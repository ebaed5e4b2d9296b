// src/Sink/mod.rs

mod builder;

pub use builder::LoggerBuilder;

use crate::error::{LogError, Result};
use crate::Core::{LoggerStats, MappedLog, SinkShared};
use crate::SPSC::{Producer, SendOutcome};

use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info};

/// An asynchronous log sink backed by one memory-mapped file.
///
/// `log` copies the record into a lock-free ring and returns; a dedicated
/// worker thread appends records to the file in submission order. Records
/// that do not fit in the ring are dropped and counted.
///
/// Any number of threads may call `log` on a shared `&Logger`: they are
/// serialized in front of the ring by a short mutex that covers only the
/// copy into the ring, never file I/O.
///
/// Closing (explicitly with [`close`](Logger::close) or by dropping) drains
/// every accepted record, then trims the file to its committed size.
pub struct Logger {
    producer: Mutex<Producer>,
    shared: Arc<SinkShared>,
    worker: Option<JoinHandle<MappedLog>>,
    path: PathBuf,
    ring_size: usize,
    idle_interval: Duration,
}

impl Logger {
    /// Open a logger at `path` with default settings.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        LoggerBuilder::new().open(path)
    }

    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    pub(crate) fn from_parts(
        producer: Producer,
        shared: Arc<SinkShared>,
        worker: JoinHandle<MappedLog>,
        path: PathBuf,
        ring_size: usize,
        idle_interval: Duration,
    ) -> Self {
        Self {
            producer: Mutex::new(producer),
            shared,
            worker: Some(worker),
            path,
            ring_size,
            idle_interval,
        }
    }

    /// Submit one record. Never waits on I/O.
    ///
    /// # Returns
    /// * `SendOutcome::Accepted` if the record will be persisted
    /// * `SendOutcome::Dropped` if the ring had no room for it
    pub fn log<T: AsRef<[u8]>>(&self, record: T) -> SendOutcome {
        let mut producer = self.producer.lock();
        let counters = &self.shared.counters;
        counters.submitted.fetch_add(1, Ordering::Relaxed);

        let outcome = producer.try_send(record);
        if outcome == SendOutcome::Dropped {
            counters.dropped.fetch_add(1, Ordering::Relaxed);
        }
        outcome
    }

    /// Block until every record accepted before this call is in the file and
    /// the committed range has been synced to disk.
    pub fn flush(&self) -> Result<()> {
        let target = {
            // Submission counters only move under this lock.
            let _producer = self.producer.lock();
            self.stats().accepted()
        };

        let counters = &self.shared.counters;
        while counters.persisted.load(Ordering::Acquire)
            + counters.lost_on_grow.load(Ordering::Acquire)
            < target
        {
            self.ensure_worker_alive()?;
            std::thread::sleep(self.idle_interval);
        }

        let failures_before = self.shared.sync_failures.load(Ordering::Acquire);
        let ticket = self.shared.sync_requested.fetch_add(1, Ordering::AcqRel) + 1;
        while self.shared.sync_completed.load(Ordering::Acquire) < ticket {
            self.ensure_worker_alive()?;
            std::thread::sleep(self.idle_interval);
        }

        if self.shared.sync_failures.load(Ordering::Acquire) > failures_before {
            return Err(LogError::Io(io::Error::new(
                io::ErrorKind::Other,
                format!("msync of {} failed", self.path.display()),
            )));
        }
        Ok(())
    }

    fn ensure_worker_alive(&self) -> Result<()> {
        match &self.worker {
            Some(handle) if !handle.is_finished() => Ok(()),
            _ => Err(LogError::WorkerStopped),
        }
    }

    /// Snapshot of the submission and persistence counters.
    pub fn stats(&self) -> LoggerStats {
        self.shared.counters.snapshot()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn ring_size(&self) -> usize {
        self.ring_size
    }

    /// Drain, stop the worker, trim the file and close it.
    ///
    /// # Returns
    /// The final counters.
    pub fn close(mut self) -> Result<LoggerStats> {
        self.shutdown()?;
        Ok(self.stats())
    }

    fn shutdown(&mut self) -> Result<()> {
        let handle = match self.worker.take() {
            Some(handle) => handle,
            None => return Ok(()),
        };

        self.shared.request_shutdown();

        let backend = handle.join().map_err(|_| LogError::WorkerPanicked)?;
        let size = backend.finalize().map_err(|source| LogError::Finalize {
            path: self.path.clone(),
            source,
        })?;

        let stats = self.stats();
        info!(
            path = %self.path.display(),
            size,
            persisted = stats.persisted,
            dropped = stats.dropped,
            "closed log sink"
        );
        Ok(())
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            error!(path = %self.path.display(), error = %e, "failed to close log sink");
        }
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_logger(self, f)
    }
}
