// src/SPSC/consumer.rs

use super::Buffer::ByteRing;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Initial scratch reservation. Grown on demand, never shrunk.
const SCRATCH_RESERVE: usize = 4096;

/// The reading half of an SPSC byte ring.
///
/// Owns the scratch buffer records are copied into, so a received record
/// borrows the consumer until the next call.
pub struct Consumer {
    ring: Arc<ByteRing>,
    scratch: Vec<u8>,
}

impl Consumer {
    pub(crate) fn new(ring: Arc<ByteRing>) -> Self {
        Self {
            ring,
            scratch: Vec::with_capacity(SCRATCH_RESERVE),
        }
    }

    #[inline]
    fn pop(&mut self) -> Option<usize> {
        // Safety: `&mut self` on the only consumer handle.
        unsafe { self.ring.dequeue_into(&mut self.scratch) }
    }

    /// Receives a record if one is available.
    ///
    /// # Returns
    /// * `Some(bytes)` with the next record in FIFO order
    /// * `None` if the ring is empty
    pub fn try_recv(&mut self) -> Option<&[u8]> {
        let len = self.pop()?;
        Some(&self.scratch[..len])
    }

    /// Receives a record, idling while the ring is empty.
    ///
    /// While `running` is set an empty ring makes the consumer sleep for
    /// `idle` and poll again. Once `running` is cleared the ring is drained,
    /// and `None` (channel closed) is returned only after it is observed
    /// empty with shutdown already requested.
    pub fn recv_blocking(&mut self, running: &AtomicBool, idle: Duration) -> Option<&[u8]> {
        self.recv_blocking_with(running, idle, || {})
    }

    /// Same as [`recv_blocking`](Self::recv_blocking), calling `on_idle`
    /// every time the ring is found empty, before sleeping.
    pub fn recv_blocking_with<F: FnMut()>(
        &mut self,
        running: &AtomicBool,
        idle: Duration,
        mut on_idle: F,
    ) -> Option<&[u8]> {
        let len = loop {
            if let Some(len) = self.pop() {
                break len;
            }
            if !running.load(Ordering::Acquire) {
                // Everything enqueued before shutdown happens-before the flag
                // we just read, so one more look is enough.
                break self.pop()?;
            }
            on_idle();
            std::thread::sleep(idle);
        };
        Some(&self.scratch[..len])
    }

    /// True if no record is waiting.
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Ring capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.ring.capacity()
    }

    /// Current size of the reusable scratch buffer.
    pub fn scratch_len(&self) -> usize {
        self.scratch.len()
    }
}
