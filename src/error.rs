//! Logger error types.

use std::path::PathBuf;

/// Errors surfaced by the logger facade.
///
/// A full ring is deliberately absent: dropped records are counted, not reported.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The log file could not be opened, created, sized or mapped.
    #[error("failed to open log file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Remapping to a larger size failed.
    #[error("failed to grow log file from {from} to at least {to} bytes: {source}")]
    Grow {
        from: usize,
        to: usize,
        #[source]
        source: std::io::Error,
    },

    /// Trimming the file to its committed size failed on close.
    #[error("failed to finalize log file {path}: {source}")]
    Finalize {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Builder settings were rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The worker thread panicked and the backend could not be recovered.
    #[error("log worker thread panicked")]
    WorkerPanicked,

    /// The worker is no longer running.
    #[error("log worker is not running")]
    WorkerStopped,

    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LogError>;
