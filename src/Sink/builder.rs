use super::Logger;
use crate::error::{LogError, Result};
use crate::Core::worker::{self, GrowthFailurePolicy, SinkShared, WorkerConfig, DEFAULT_IDLE_INTERVAL};
use crate::Core::{MappedLog, DEFAULT_INITIAL_SIZE};
use crate::SPSC::{self, Buffer::DEFAULT_RING_SIZE, Buffer::MIN_RING_SIZE};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

pub struct LoggerBuilder {
    ring_size: usize,
    initial_file_size: usize,
    idle_interval: Duration,
    growth_failure_policy: GrowthFailurePolicy,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self {
            ring_size: DEFAULT_RING_SIZE, // 4MB ring
            initial_file_size: DEFAULT_INITIAL_SIZE,
            idle_interval: DEFAULT_IDLE_INTERVAL,
            growth_failure_policy: GrowthFailurePolicy::Exit,
        }
    }
}

impl LoggerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ring capacity in bytes. Must be a power of two.
    pub fn with_ring_size(mut self, size: usize) -> Self {
        self.ring_size = size;
        self
    }

    /// Size a brand-new log file is preallocated to.
    pub fn with_initial_file_size(mut self, size: usize) -> Self {
        self.initial_file_size = size;
        self
    }

    /// How long the worker sleeps when the ring is empty.
    pub fn with_idle_interval(mut self, idle: Duration) -> Self {
        self.idle_interval = idle;
        self
    }

    pub fn with_growth_failure_policy(mut self, policy: GrowthFailurePolicy) -> Self {
        self.growth_failure_policy = policy;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.ring_size < MIN_RING_SIZE || !self.ring_size.is_power_of_two() {
            return Err(LogError::InvalidConfig(format!(
                "ring size must be a power of two >= {MIN_RING_SIZE}, got {}",
                self.ring_size
            )));
        }
        if self.initial_file_size == 0 {
            return Err(LogError::InvalidConfig(
                "initial file size must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Open (or create) the log at `path` and start the worker.
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<Logger> {
        self.validate()?;
        let path = path.as_ref().to_path_buf();

        let backend = MappedLog::open(&path, self.initial_file_size).map_err(|source| {
            LogError::Open {
                path: path.clone(),
                source,
            }
        })?;

        let (producer, consumer) = SPSC::channel(self.ring_size)?;
        let shared = Arc::new(SinkShared::new());

        info!(
            path = %path.display(),
            cursor = backend.cursor(),
            capacity = backend.capacity(),
            ring_size = self.ring_size,
            "opened log sink"
        );

        let config = WorkerConfig {
            idle_interval: self.idle_interval,
            growth_failure_policy: self.growth_failure_policy,
        };
        let handle = worker::spawn(consumer, backend, Arc::clone(&shared), config)?;

        Ok(Logger::from_parts(
            producer,
            shared,
            handle,
            path,
            self.ring_size,
            self.idle_interval,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_power_of_two_ring() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoggerBuilder::new()
            .with_ring_size(1000)
            .open(dir.path().join("x.log"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidConfig(_)));
        assert!(!dir.path().join("x.log").exists());
    }

    #[test]
    fn rejects_tiny_ring() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoggerBuilder::new()
            .with_ring_size(8)
            .open(dir.path().join("x.log"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_initial_size() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoggerBuilder::new()
            .with_initial_file_size(0)
            .open(dir.path().join("x.log"))
            .unwrap_err();
        assert!(matches!(err, LogError::InvalidConfig(_)));
    }

    #[test]
    fn open_failure_is_an_error_not_an_inert_logger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("x.log");
        match LoggerBuilder::new().open(&path) {
            Err(LogError::Open { path: p, .. }) => assert_eq!(p, path),
            other => panic!("expected open error, got {other:?}"),
        }
    }
}
