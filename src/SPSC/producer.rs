// src/SPSC/producer.rs
use super::Buffer::ByteRing;
use std::sync::Arc;

/// Result of handing one record to the ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The whole frame was published and will reach the consumer.
    Accepted,
    /// Not enough free space; the record was discarded and left no trace.
    Dropped,
}

impl SendOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, SendOutcome::Accepted)
    }
}

/// The writing half of an SPSC byte ring.
///
/// There is exactly one `Producer` per ring and it is not `Clone`. Sharing it
/// between threads requires external serialization, e.g. a mutex, which is
/// what the logger does.
pub struct Producer {
    ring: Arc<ByteRing>,
}

impl Producer {
    pub(crate) fn new(ring: Arc<ByteRing>) -> Self {
        Self { ring }
    }

    /// Try to enqueue one record. Never blocks.
    ///
    /// # Returns
    /// * `SendOutcome::Accepted` if the frame was published
    /// * `SendOutcome::Dropped` if the ring was too full (or the record is
    ///   larger than the ring can ever hold)
    pub fn try_send<T: AsRef<[u8]>>(&mut self, record: T) -> SendOutcome {
        // Safety: `&mut self` on the only producer handle.
        if unsafe { self.ring.enqueue(record.as_ref()) } {
            SendOutcome::Accepted
        } else {
            SendOutcome::Dropped
        }
    }

    /// Bytes currently in flight.
    pub fn occupied(&self) -> usize {
        self.ring.occupied()
    }

    /// Ring capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }
}
