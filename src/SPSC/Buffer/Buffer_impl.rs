use std::cell::UnsafeCell;
use std::io;
use std::ptr;
use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};

use super::layout::{RingCursors, FRAME_HEADER, MIN_RING_SIZE};
use super::Buffer::ByteRing;

impl ByteRing {
    /// Allocate a zeroed ring of `capacity` bytes.
    ///
    /// `capacity` must be a power of two and at least [`MIN_RING_SIZE`].
    pub fn new(capacity: usize) -> io::Result<Self> {
        if capacity < MIN_RING_SIZE || (capacity & (capacity - 1)) != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "ring size must be a power of two >= {MIN_RING_SIZE}, got {capacity}"
                ),
            ));
        }

        Ok(Self {
            cursors: RingCursors::new(),
            storage: (0..capacity).map(|_| UnsafeCell::new(0u8)).collect(),
            capacity,
            mask: capacity - 1,
        })
    }

    /// Capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    fn base(&self) -> *mut u8 {
        UnsafeCell::raw_get(self.storage.as_ptr())
    }

    /// Bytes currently occupied, `(head - tail) mod capacity`.
    #[inline]
    pub fn occupied(&self) -> usize {
        let head = self.cursors.head.load(Acquire);
        let tail = self.cursors.tail.load(Acquire);
        head.wrapping_sub(tail) & self.mask
    }

    /// Free bytes as seen from the producer side.
    #[inline]
    fn free_space(&self, head: usize, tail: usize) -> usize {
        if head >= tail {
            self.capacity - (head - tail)
        } else {
            tail - head
        }
    }

    /// Copy `src` into the ring starting at `offset`, wrapping at the end.
    ///
    /// # Safety
    /// The caller must own `[offset, offset + src.len())` (mod capacity) and
    /// `src.len()` must not exceed the capacity.
    #[inline]
    unsafe fn write_wrapped(&self, offset: usize, src: &[u8]) {
        let start = offset & self.mask;
        let first_part = (self.capacity - start).min(src.len());
        let base = self.base();
        ptr::copy_nonoverlapping(src.as_ptr(), base.add(start), first_part);
        if first_part < src.len() {
            ptr::copy_nonoverlapping(
                src.as_ptr().add(first_part),
                base,
                src.len() - first_part,
            );
        }
    }

    /// Copy `dst.len()` bytes out of the ring starting at `offset`, wrapping at the end.
    ///
    /// # Safety
    /// The caller must own `[offset, offset + dst.len())` (mod capacity).
    #[inline]
    unsafe fn read_wrapped(&self, offset: usize, dst: &mut [u8]) {
        let start = offset & self.mask;
        let first_part = (self.capacity - start).min(dst.len());
        let base = self.base();
        ptr::copy_nonoverlapping(base.add(start), dst.as_mut_ptr(), first_part);
        if first_part < dst.len() {
            ptr::copy_nonoverlapping(
                base,
                dst.as_mut_ptr().add(first_part),
                dst.len() - first_part,
            );
        }
    }

    /// Enqueue one framed record.
    /// Returns false, leaving the ring untouched, if the frame does not fit.
    ///
    /// # Safety
    /// Must only be called from the single producer.
    pub(crate) unsafe fn enqueue(&self, payload: &[u8]) -> bool {
        let packet_len = match FRAME_HEADER.checked_add(payload.len()) {
            Some(len) => len,
            None => return false,
        };

        let head = self.cursors.head.load(Relaxed);
        let tail = self.cursors.tail.load(Acquire);

        // One byte of slack keeps "full" distinguishable from "empty".
        if self.free_space(head, tail) <= packet_len.saturating_add(1) {
            return false;
        }

        let len_prefix = (payload.len() as u64).to_le_bytes();
        self.write_wrapped(head, &len_prefix);
        self.write_wrapped(head + FRAME_HEADER, payload);

        self.cursors
            .head
            .store((head + packet_len) & self.mask, Release);
        true
    }

    /// Dequeue one record into `scratch`, growing it if needed.
    /// Returns the payload length, or None if the ring is empty.
    ///
    /// `scratch` is only ever grown, so after warm-up this does not allocate.
    ///
    /// # Safety
    /// Must only be called from the single consumer.
    pub(crate) unsafe fn dequeue_into(&self, scratch: &mut Vec<u8>) -> Option<usize> {
        let tail = self.cursors.tail.load(Relaxed);
        let head = self.cursors.head.load(Acquire);

        if head == tail {
            return None;
        }

        let mut len_prefix = [0u8; FRAME_HEADER];
        self.read_wrapped(tail, &mut len_prefix);
        let msg_len = u64::from_le_bytes(len_prefix) as usize;

        if scratch.len() < msg_len {
            scratch.resize(msg_len, 0);
        }
        self.read_wrapped(tail + FRAME_HEADER, &mut scratch[..msg_len]);

        self.cursors
            .tail
            .store((tail + FRAME_HEADER + msg_len) & self.mask, Release);
        Some(msg_len)
    }

    /// True if the consumer would currently see no record.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursors.tail.load(Relaxed) == self.cursors.head.load(Acquire)
    }
}
