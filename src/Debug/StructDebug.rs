use crate::Core::MappedLog;
use crate::Sink::Logger;
use crate::SPSC::Buffer::ByteRing;
use std::fmt;

/// Debug function for ByteRing
///
/// Shows capacity and the live occupancy; never reads the payload bytes.
pub fn debug_byte_ring(ring: &ByteRing, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ByteRing")
        .field("capacity", &ring.capacity())
        .field("occupied", &ring.occupied())
        .finish_non_exhaustive()
}

/// Debug function for MappedLog
///
/// Shows:
/// - Path
/// - Write cursor and mapped capacity
pub fn debug_mapped_file(log: &MappedLog, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MappedLog")
        .field("path", &log.path())
        .field("cursor", &log.cursor())
        .field("capacity", &log.capacity())
        .finish_non_exhaustive()
}

/// Debug function for Logger
pub fn debug_logger(logger: &Logger, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Logger")
        .field("path", &logger.path())
        .field("ring_size", &logger.ring_size())
        .field("stats", &logger.stats())
        .finish_non_exhaustive()
}
