// This is the byte ring shared by the producer and the consumer of one log sink

use super::layout::RingCursors;

use std::cell::UnsafeCell;

/// A fixed-capacity byte ring carrying length-framed records.
///
/// Frame layout: `[u64 little-endian length][payload]`. A frame may straddle
/// the end of the storage and continue at offset 0.
///
/// ### Concurrency Design:
/// - **Producer (Enqueue)**: reads its own `head` relaxed and the consumer's
///   `tail` with acquire, copies the whole frame, then publishes the new
///   `head` with release. Nothing is visible to the consumer before that store.
/// - **Consumer (Dequeue)**: reads its own `tail` relaxed and `head` with
///   acquire, copies the payload out, then releases the new `tail`.
/// - One byte of slack is always kept free so `head == tail` only ever
///   means empty.
///
/// The storage is shared, but each byte range belongs to whichever side
/// currently owns the matching cursor range, so no byte is ever written by
/// both sides at once.
pub struct ByteRing {
    pub(crate) cursors: RingCursors,

    /// Backing storage. Accessed only through raw pointers.
    pub(crate) storage: Box<[UnsafeCell<u8>]>,

    /// Capacity of the ring in bytes. Always a power of two.
    pub(crate) capacity: usize,

    /// `capacity - 1`, used to wrap offsets.
    pub(crate) mask: usize,
}

unsafe impl Send for ByteRing {}
unsafe impl Sync for ByteRing {}

impl std::fmt::Debug for ByteRing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        crate::Debug::StructDebug::debug_byte_ring(self, f)
    }
}
