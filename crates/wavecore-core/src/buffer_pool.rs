//! Bounded pool of fixed-size scratch buffers.
//!
//! Eliminates allocation on the audio hot path by reusing heap-allocated
//! `Vec<f32>` scratch buffers of a single configured size. Not itself
//! thread-safe — callers that share a pool across threads wrap it in a
//! `Mutex` or give each thread its own pool (the buffer controller uses
//! one pool per direction, each touched by exactly one side).

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

/// A bounded set of equally-sized `f32` arrays available for reuse.
///
/// `rent` returns a pooled array if one is available, or allocates a new
/// one if the pool is empty (regardless of `max_population` — the cap
/// only bounds how many idle buffers the pool *holds onto*, not how many
/// can be in flight at once). `return_buffer` puts an array back if the
/// pool is below `max_population`; otherwise it is dropped. Arrays handed
/// out by `rent` are **not** zero-initialized — they carry whatever was
/// in them the last time they were returned.
pub struct BufferPool {
    buffer_size: usize,
    max_population: usize,
    free: Vec<Vec<f32>>,
}

impl BufferPool {
    /// Create a pool of buffers sized `buffer_size`, pre-populated with
    /// `initial_population` buffers (capped at `max_population`), and
    /// never holding more than `max_population` idle buffers at once.
    pub fn new(buffer_size: usize, initial_population: usize, max_population: usize) -> Self {
        let initial = initial_population.min(max_population);
        let free = (0..initial).map(|_| vec![0.0; buffer_size]).collect();
        Self {
            buffer_size,
            max_population,
            free,
        }
    }

    /// Size (in samples) of buffers managed by this pool.
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Number of idle buffers currently held by the pool.
    pub fn idle_count(&self) -> usize {
        self.free.len()
    }

    /// Rent a buffer: pops one from the free list, or allocates a fresh
    /// one of the configured size if the free list is empty.
    pub fn rent(&mut self) -> Vec<f32> {
        self.free.pop().unwrap_or_else(|| vec![0.0; self.buffer_size])
    }

    /// Return a buffer to the pool for reuse.
    ///
    /// Rejected (dropped) if its length doesn't match `buffer_size`, or
    /// if the pool already holds `max_population` idle buffers.
    pub fn return_buffer(&mut self, buffer: Vec<f32>) {
        if buffer.len() != self.buffer_size {
            return;
        }
        if self.free.len() < self.max_population {
            self.free.push(buffer);
        }
    }
}
