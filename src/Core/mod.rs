pub mod MappedFile;
pub mod stats;
pub mod worker;

pub use stats::{LoggerStats, SinkCounters};
pub use worker::{GrowthFailurePolicy, SinkShared, WorkerConfig};
pub use MappedFile::{MappedLog, DEFAULT_INITIAL_SIZE, RECORD_SEPARATOR};
