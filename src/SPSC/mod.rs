mod consumer;
mod producer;

pub use consumer::Consumer;
pub use producer::{Producer, SendOutcome};

pub mod Buffer {
    pub mod Buffer;
    pub mod Buffer_impl;
    pub mod layout;
    pub use Buffer::ByteRing; // re-export for stable path
    pub use layout::{RingCursors, DEFAULT_RING_SIZE, FRAME_HEADER, MIN_RING_SIZE};
}

use std::io;
use std::sync::Arc;

/// Create a byte ring of `ring_size` bytes and split it into its only
/// producer and its only consumer.
pub fn channel(ring_size: usize) -> io::Result<(Producer, Consumer)> {
    let ring = Arc::new(Buffer::ByteRing::new(ring_size)?);
    Ok((Producer::new(Arc::clone(&ring)), Consumer::new(ring)))
}
