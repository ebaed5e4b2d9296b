use crossbeam_utils::CachePadded;
use std::sync::atomic::AtomicUsize;

/// Size of the length prefix that precedes every payload in the ring.
/// The prefix is a `u64` stored little-endian.
pub const FRAME_HEADER: usize = std::mem::size_of::<u64>();

/// Smallest ring the builder accepts. Anything smaller cannot hold a
/// single empty frame plus the reserved slack byte.
pub const MIN_RING_SIZE: usize = 16;

/// Default ring size (4 MiB).
pub const DEFAULT_RING_SIZE: usize = 4 * 1024 * 1024;

/// The two cursors of the byte ring.
///
/// Each cursor has exactly one writer:
/// - `head` is advanced only by the producer, after the frame bytes are copied.
/// - `tail` is advanced only by the consumer, after the payload has been copied out.
///
/// Both are kept modulo the ring size. They sit on separate cache lines so the
/// producer and the consumer never bounce the same line while polling.
#[repr(C)]
pub struct RingCursors {
    /// Next write offset. Producer cacheline.
    pub head: CachePadded<AtomicUsize>,

    /// Next read offset. Consumer cacheline.
    pub tail: CachePadded<AtomicUsize>,
}

impl RingCursors {
    pub const fn new() -> Self {
        Self {
            head: CachePadded::new(AtomicUsize::new(0)),
            tail: CachePadded::new(AtomicUsize::new(0)),
        }
    }
}

impl Default for RingCursors {
    fn default() -> Self {
        Self::new()
    }
}
