//! Engine-level output ring plus counters and events (component E, composes
//! the ring buffer from 4.A with the buffer pool from 4.B).
//!
//! `BufferController` sits between the application thread and the pump
//! worker: the application calls [`BufferController::send`] to enqueue
//! output samples, and the pump worker drains them into the device adapter.
//! Capture does not pass through this controller or the pump at all — per
//! the producer/capture dataflow, the callback writes straight into the
//! adapter's own input ring and the engine's `receive()` reads from the
//! adapter directly. `rent_input`/`return_input` only hand out and reclaim
//! the scratch [`BufferPool`] arrays that `receive()` copies into.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError, sync_channel};

use wavecore_core::buffer_pool::BufferPool;
use wavecore_core::ring_buffer::RingBuffer;

use crate::events::Event;

/// Bound on the event channel. Events are diagnostic; a slow consumer
/// should not be able to stall the producer, so old events are better
/// dropped than buffered unboundedly — hence a bounded channel plus a
/// best-effort `try_send`.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// How many idle scratch buffers the input pool holds onto at once.
const INPUT_POOL_MAX_POPULATION: usize = 4;

/// Engine-level buffering: the output ring the application and pump worker
/// share, an input scratch pool for `receive()`, plus underrun/throughput
/// counters and an event channel.
pub struct BufferController {
    output: RingBuffer,
    input_pool: Option<Mutex<BufferPool>>,
    channels: usize,
    total_sent_frames: AtomicU64,
    total_received_frames: AtomicU64,
    underrun_count: AtomicU64,
    events_tx: Sender<Event>,
    events_rx: Receiver<Event>,
}

impl BufferController {
    /// Build a controller with the given output ring `capacity` (in
    /// samples) and `channels` count. `with_input` allocates a scratch pool
    /// sized `capacity` for `receive()`'s use.
    pub fn new(capacity: usize, channels: usize, with_input: bool) -> Self {
        let (events_tx, events_rx) = sync_channel(EVENT_CHANNEL_CAPACITY);
        Self {
            output: RingBuffer::new(capacity),
            input_pool: if with_input {
                Some(Mutex::new(BufferPool::new(capacity, 1, INPUT_POOL_MAX_POPULATION)))
            } else {
                None
            },
            channels,
            total_sent_frames: AtomicU64::new(0),
            total_received_frames: AtomicU64::new(0),
            underrun_count: AtomicU64::new(0),
            events_tx,
            events_rx,
        }
    }

    /// Enqueue `samples` (interleaved) into the output ring. Short writes
    /// increment the underrun counter and emit [`Event::BufferUnderrun`]
    /// with `missed_frames` expressed in frames, not samples.
    pub fn send(&self, samples: &[f32]) -> usize {
        let written = self.output.write(samples);
        let missed_samples = samples.len() - written;
        if missed_samples > 0 {
            let missed_frames = (missed_samples / self.channels.max(1)) as u64;
            self.underrun_count.fetch_add(1, Ordering::Relaxed);
            let position = self.total_sent_frames.load(Ordering::Relaxed);
            let _ = self.events_tx.try_send(Event::BufferUnderrun {
                missed_frames,
                position,
            });
        }
        let frames_written = (written / self.channels.max(1)) as u64;
        self.total_sent_frames
            .fetch_add(frames_written, Ordering::Relaxed);
        written
    }

    /// Frames available to drain from the output ring right now.
    pub fn available_output(&self) -> u64 {
        self.output.available() / self.channels.max(1) as u64
    }

    /// Drain up to `dst.len()` output samples, for the pump worker.
    pub fn drain_output(&self, dst: &mut [f32]) -> usize {
        self.output.read(dst)
    }

    /// Rent a scratch buffer for the engine's `receive()` to copy captured
    /// samples into. Returns `None` if input was not enabled.
    pub fn rent_input(&self) -> Option<Vec<f32>> {
        self.input_pool.as_ref().map(|pool| pool.lock().unwrap().rent())
    }

    /// Return a scratch buffer previously obtained from `rent_input`.
    pub fn return_input(&self, buffer: Vec<f32>) {
        if let Some(pool) = &self.input_pool {
            pool.lock().unwrap().return_buffer(buffer);
        }
    }

    /// Record that `frames` frames of captured audio were just delivered to
    /// the application, for the `total_received_frames` counter.
    pub fn record_received(&self, frames: u64) {
        self.total_received_frames
            .fetch_add(frames, Ordering::Relaxed);
    }

    /// Discard any buffered output, e.g. on seek or device switch.
    pub fn clear_output(&self) {
        let mut scratch = [0.0f32; 1024];
        while self.output.read(&mut scratch) > 0 {}
    }

    /// Total frames accepted by `send` so far (monotonically non-decreasing).
    pub fn total_sent_frames(&self) -> u64 {
        self.total_sent_frames.load(Ordering::Relaxed)
    }

    /// Total frames delivered to the application via `read` so far.
    pub fn total_received_frames(&self) -> u64 {
        self.total_received_frames.load(Ordering::Relaxed)
    }

    /// Cumulative count of short writes since construction.
    pub fn underrun_count(&self) -> u64 {
        self.underrun_count.load(Ordering::Relaxed)
    }

    /// Non-blocking poll for the next queued event, if any.
    pub fn try_recv_event(&self) -> Option<Event> {
        match self.events_rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Push an event (e.g. device-change notifications from the engine).
    pub fn emit(&self, event: Event) {
        let _ = self.events_tx.try_send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underrun_scenario_matches_expected_missed_frames() {
        let controller = BufferController::new(2048, 2, false);
        for _ in 0..100 {
            controller.send(&[0.0; 4096]);
        }
        // (100 * 4096 - 2048) / 2 channels = 203776
        let mut missed_total = 0u64;
        while let Some(Event::BufferUnderrun { missed_frames, .. }) = controller.try_recv_event() {
            missed_total += missed_frames;
        }
        assert_eq!(missed_total, 203_776);
    }

    #[test]
    fn send_then_drain_roundtrips() {
        let controller = BufferController::new(16, 2, false);
        controller.send(&[1.0, 2.0, 3.0, 4.0]);
        let mut dst = [0.0; 4];
        let n = controller.drain_output(&mut dst);
        assert_eq!(n, 4);
        assert_eq!(dst, [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn total_sent_frames_is_monotonic() {
        let controller = BufferController::new(1024, 2, false);
        let mut last = 0;
        for _ in 0..10 {
            controller.send(&[0.0; 8]);
            let now = controller.total_sent_frames();
            assert!(now >= last);
            last = now;
        }
    }
}
