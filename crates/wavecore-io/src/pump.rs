//! Dedicated pump thread moving output samples from the engine-level
//! [`BufferController`] to the native [`DeviceAdapter`] (component F).
//!
//! One thread is spawned per `Start` and joined (with a bounded timeout) on
//! `Stop`; it is never reused across a Stop/Start cycle, since the adapter
//! itself is reopened each time. The sleep interval between drain attempts
//! follows the spec's formula so the pump neither busy-spins nor lags more
//! than half a buffer period behind the device. The pump only moves the
//! producer (output) path; capture bypasses it entirely — the device
//! callback writes straight into the adapter's own input ring, and the
//! engine's `receive()` reads from the adapter directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::adapter::DeviceAdapter;
use crate::buffer_controller::BufferController;

/// Cap on the exponential sleep backoff applied after a caught panic in the
/// drain loop, so a persistently failing adapter doesn't spin the CPU.
const MAX_BACKOFF_MS: u64 = 500;

/// Bound on how long `stop` waits for the pump thread to notice the stop
/// flag and exit before abandoning it (never force-killed).
const JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Owns the background thread that shuttles samples between the engine
/// ring and the device adapter while the engine is Running.
///
/// The cumulative pumped-frames counter is owned by the caller (the
/// `Engine`), not by the worker: the worker is recreated on every `Start`,
/// but `TotalPumpedFrames` must keep rising monotonically across Stop/Start
/// cycles for the whole lifetime of the engine, so `start` only ever
/// `fetch_add`s into an `Arc<AtomicU64>` handed to it.
pub struct PumpWorker {
    handle: Option<JoinHandle<()>>,
    stop_flag: Arc<AtomicBool>,
    pumped_frames: Arc<AtomicU64>,
}

/// Compute the per-iteration sleep in milliseconds from the negotiated
/// buffer size and sample rate: half a buffer period, rounded, floored at 1.
fn sleep_interval_ms(frames_per_buffer: u32, sample_rate: u32) -> u64 {
    let half_period_ms = (frames_per_buffer as f64 / 2.0) / sample_rate as f64 * 1000.0;
    (half_period_ms.round() as u64).max(1)
}

impl PumpWorker {
    /// Spawn the pump thread. `engine_buffer_samples` is
    /// `frames_per_buffer * channels`; `channels` recovers frame counts from
    /// sample counts for the `pumped_frames` counter. `pumped_frames` is the
    /// engine's lifetime counter — this worker only ever adds to it, never
    /// resets it, so the total survives this worker being stopped and a new
    /// one spawned on the next `Start`.
    pub fn start(
        controller: Arc<BufferController>,
        adapter: Arc<dyn DeviceAdapter>,
        engine_buffer_samples: usize,
        channels: usize,
        frames_per_buffer: u32,
        sample_rate: u32,
        pumped_frames: Arc<AtomicU64>,
    ) -> Self {
        let stop_flag = Arc::new(AtomicBool::new(false));
        let thread_stop = stop_flag.clone();
        let thread_pumped = pumped_frames.clone();
        let sleep_ms = sleep_interval_ms(frames_per_buffer, sample_rate);

        let handle = std::thread::Builder::new()
            .name("wavecore-pump".into())
            .spawn(move || {
                let mut scratch = vec![0.0f32; engine_buffer_samples];
                let mut backoff_ms = sleep_ms;
                while !thread_stop.load(Ordering::Relaxed) {
                    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let available = controller.available_output() as usize;
                        if available * channels >= engine_buffer_samples {
                            let read = controller.drain_output(&mut scratch);
                            if read > 0 {
                                adapter.send(&scratch[..read]);
                                thread_pumped.fetch_add((read / channels.max(1)) as u64, Ordering::Relaxed);
                            }
                        }
                        true
                    }));
                    match outcome {
                        Ok(_) => {
                            backoff_ms = sleep_ms;
                            std::thread::sleep(Duration::from_millis(sleep_ms));
                        }
                        Err(_) => {
                            tracing::error!("pump worker iteration panicked, backing off");
                            std::thread::sleep(Duration::from_millis(backoff_ms));
                            backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
                        }
                    }
                }
            })
            .expect("failed to spawn pump thread");

        Self {
            handle: Some(handle),
            stop_flag,
            pumped_frames,
        }
    }

    /// Total frames the pump has moved from the engine ring to the adapter
    /// so far. Shares the engine's lifetime counter, so this is monotonically
    /// non-decreasing across Stop/Start cycles, not just for this worker.
    pub fn pumped_frames(&self) -> u64 {
        self.pumped_frames.load(Ordering::Relaxed)
    }

    /// Signal the pump thread to exit and wait up to [`JOIN_TIMEOUT`] for it.
    /// If the thread doesn't exit in time it is abandoned, not force-killed.
    pub fn stop(mut self) {
        self.stop_flag.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let (done_tx, done_rx) = std::sync::mpsc::channel();
            let waiter = std::thread::spawn(move || {
                let _ = handle.join();
                let _ = done_tx.send(());
            });
            if done_rx.recv_timeout(JOIN_TIMEOUT).is_err() {
                tracing::warn!("pump worker did not stop within timeout, abandoning");
            }
            drop(waiter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_interval_matches_half_buffer_period() {
        // 512 frames / 2 = 256 samples @ 48000 Hz -> 5.33ms -> rounds to 5.
        assert_eq!(sleep_interval_ms(512, 48_000), 5);
    }

    #[test]
    fn sleep_interval_floors_at_one_millisecond() {
        assert_eq!(sleep_interval_ms(1, 192_000), 1);
    }
}
