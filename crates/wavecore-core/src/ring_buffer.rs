//! Lock-free SPSC ring buffer for interleaved float samples.
//!
//! One writer thread, one reader thread, zero allocation after construction.
//! This is the transport primitive that bridges the application's
//! best-effort producer with a hard-real-time device callback: the producer
//! calls [`RingBuffer::write`], the consumer calls [`RingBuffer::read`], and
//! neither side ever blocks or allocates.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// Lock-free single-producer / single-consumer ring buffer of `f32` samples.
///
/// Capacity is fixed at construction. Indices are 64-bit and monotonically
/// increasing; wraparound onto the backing slice happens modulo capacity,
/// so the indices themselves never observably wrap in practice. The
/// invariant `0 <= write - read <= capacity` holds at every observable
/// instant as long as exactly one thread calls `write` and exactly one
/// (possibly different) thread calls `read`.
///
/// `write`/`read` never allocate, never block, and never yield: a write
/// that would exceed free space simply writes the prefix that fits and
/// reports how many samples it actually wrote. It is the caller's job
/// (see `BufferController`) to turn a short write into an underrun event.
///
/// Each slot is an `AtomicU32` holding a sample's bit pattern rather than
/// a plain `f32` behind a raw pointer: the workspace denies `unsafe_code`,
/// so per-slot atomics (`Relaxed` within the window guarded by the index's
/// `Acquire`/`Release`) give the same one-writer/one-reader safety without
/// reaching for `unsafe`.
pub struct RingBuffer {
    buffer: Vec<AtomicU32>,
    capacity: u64,
    write_index: AtomicU64,
    read_index: AtomicU64,
}

impl RingBuffer {
    /// Create a new ring buffer with room for `capacity` samples.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be > 0");
        let mut buffer = Vec::with_capacity(capacity);
        buffer.resize_with(capacity, || AtomicU32::new(0));
        Self {
            buffer,
            capacity: capacity as u64,
            write_index: AtomicU64::new(0),
            read_index: AtomicU64::new(0),
        }
    }

    /// Total capacity in samples.
    #[inline]
    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Samples currently available to read.
    #[inline]
    pub fn available(&self) -> u64 {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    /// Free space available to write.
    #[inline]
    pub fn free_space(&self) -> u64 {
        self.capacity - self.available()
    }

    /// Write as many samples from `samples` as fit. Returns the number
    /// actually written, in `[0, samples.len()]`. Never allocates,
    /// blocks, or yields. Safe to call from exactly one producer thread
    /// concurrently with a consumer calling [`read`](Self::read).
    pub fn write(&self, samples: &[f32]) -> usize {
        let free = self.free_space();
        let to_write = (samples.len() as u64).min(free) as usize;
        if to_write == 0 {
            return 0;
        }

        let write_pos = self.write_index.load(Ordering::Relaxed);
        let cap = self.capacity;

        for (i, &sample) in samples[..to_write].iter().enumerate() {
            let slot = ((write_pos + i as u64) % cap) as usize;
            self.buffer[slot].store(sample.to_bits(), Ordering::Relaxed);
        }

        self.write_index
            .store(write_pos + to_write as u64, Ordering::Release);
        to_write
    }

    /// Read as many samples into `dst` as are available. Returns the
    /// number actually read, in `[0, dst.len()]`. A short read is not an
    /// error — it signals producer starvation (underrun) to the caller.
    pub fn read(&self, dst: &mut [f32]) -> usize {
        let available = self.available();
        let to_read = (dst.len() as u64).min(available) as usize;
        if to_read == 0 {
            return 0;
        }

        let read_pos = self.read_index.load(Ordering::Relaxed);
        let cap = self.capacity;

        for (i, slot) in dst[..to_read].iter_mut().enumerate() {
            let idx = ((read_pos + i as u64) % cap) as usize;
            *slot = f32::from_bits(self.buffer[idx].load(Ordering::Relaxed));
        }

        self.read_index
            .store(read_pos + to_read as u64, Ordering::Release);
        to_read
    }

    /// Reset both indices to zero. **Not** safe to call concurrently with
    /// an in-flight `write` or `read` — the caller must quiesce both
    /// peers first (documented caller-serialized operation).
    pub fn clear(&self) {
        self.write_index.store(0, Ordering::Release);
        self.read_index.store(0, Ordering::Release);
    }
}
