//! Top-level orchestrator the application holds (component G).
//!
//! [`Engine`] composes the buffer controller (E), the device adapter (C,
//! chosen by the selector D), and the pump worker (F) into the public
//! surface described in §4.G: initialize once, start/stop any number of
//! times, send/receive while Running, and observe events and counters
//! throughout. Every operation on a disposed engine fails with `Disposed`.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::Result;
use crate::adapter::{DeviceAdapter, PrebufferState};
use crate::buffer_controller::BufferController;
use crate::config::{ActivationState, Config, DeviceDescriptor, HostApi};
use crate::events::Event;
use crate::pump::PumpWorker;
use crate::selector::select_backend;

const STATE_CREATED: u8 = 0;
const STATE_INITIALIZED: u8 = 1;
const STATE_RUNNING: u8 = 2;
const STATE_DISPOSED: u8 = 3;

/// Lifecycle state of an [`Engine`] (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Constructed but not yet initialized.
    Created,
    /// Initialized; not currently running.
    Initialized,
    /// Running: the pump worker is active and send/receive are available.
    Running,
    /// Disposed. No further operations are valid.
    Disposed,
}

fn decode_state(raw: u8) -> EngineState {
    match raw {
        STATE_INITIALIZED => EngineState::Initialized,
        STATE_RUNNING => EngineState::Running,
        STATE_DISPOSED => EngineState::Disposed,
        _ => EngineState::Created,
    }
}

/// Real-time audio playback/capture engine: the application-facing
/// orchestrator described in §4.G.
///
/// Construct with [`Engine::new`], call [`Engine::initialize`] once, then
/// [`Engine::start`]/[`Engine::stop`] any number of times. `send`/`receive`
/// are only valid while Running. Dropping a Running engine stops it first.
pub struct Engine {
    adapter: Arc<dyn DeviceAdapter>,
    controller: Mutex<Arc<BufferController>>,
    state: AtomicU8,
    config: Mutex<Option<Config>>,
    pump: Mutex<Option<PumpWorker>>,
    pumped_frames: Arc<AtomicU64>,
}

impl Engine {
    /// Construct an engine that will pick a backend (per §4.D) lazily on
    /// [`Engine::initialize`]. `host_api` is a preference, not a guarantee.
    pub fn new(host_api: HostApi) -> Self {
        Self {
            adapter: Arc::from(select_backend(host_api)),
            controller: Mutex::new(Arc::new(BufferController::new(1, 1, false))),
            state: AtomicU8::new(STATE_CREATED),
            config: Mutex::new(None),
            pump: Mutex::new(None),
            pumped_frames: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Construct an engine around an already-built adapter, bypassing
    /// backend selection. Used by tests to inject [`crate::mock_backend::MockAdapter`].
    pub fn with_adapter(adapter: Arc<dyn DeviceAdapter>) -> Self {
        Self {
            adapter,
            controller: Mutex::new(Arc::new(BufferController::new(1, 1, false))),
            state: AtomicU8::new(STATE_CREATED),
            config: Mutex::new(None),
            pump: Mutex::new(None),
            pumped_frames: Arc::new(AtomicU64::new(0)),
        }
    }

    fn state(&self) -> EngineState {
        decode_state(self.state.load(Ordering::Acquire))
    }

    fn require_not_disposed(&self) -> Result<()> {
        if self.state() == EngineState::Disposed {
            return Err(crate::Error::Disposed);
        }
        Ok(())
    }

    fn controller(&self) -> Arc<BufferController> {
        self.controller.lock().unwrap().clone()
    }

    /// Negotiate a configuration with the adapter. Valid from Created or
    /// Initialized (re-initializing while Running fails with `InvalidState`).
    pub fn initialize(&self, config: Config) -> Result<()> {
        self.require_not_disposed()?;
        if self.state() == EngineState::Running {
            return Err(crate::Error::InvalidState);
        }
        config.validate()?;
        let negotiated = self.adapter.initialize(&config)?;
        let mut effective = config;
        effective.frames_per_buffer = negotiated.frames_per_buffer;
        effective.sample_rate = negotiated.sample_rate;
        *self.controller.lock().unwrap() = Arc::new(BufferController::new(
            effective.ring_capacity(),
            effective.channels as usize,
            effective.enable_input,
        ));
        *self.config.lock().unwrap() = Some(effective);
        self.state.store(STATE_INITIALIZED, Ordering::Release);
        Ok(())
    }

    /// Start the adapter and launch the pump worker. Idempotent while
    /// already Running. Requires a prior `initialize`.
    pub fn start(&self) -> Result<()> {
        self.require_not_disposed()?;
        if self.state() == EngineState::Running {
            return Ok(());
        }
        let config = self
            .config
            .lock()
            .unwrap()
            .ok_or(crate::Error::NotInitialized)?;
        self.adapter.start()?;
        let pump = PumpWorker::start(
            self.controller(),
            self.adapter.clone(),
            config.buffer_samples(),
            config.channels as usize,
            config.frames_per_buffer,
            config.sample_rate,
            self.pumped_frames.clone(),
        );
        *self.pump.lock().unwrap() = Some(pump);
        self.state.store(STATE_RUNNING, Ordering::Release);
        Ok(())
    }

    /// Stop the pump worker and the adapter. Idempotent. Blocks up to the
    /// pump's bounded join timeout.
    pub fn stop(&self) -> Result<()> {
        self.require_not_disposed()?;
        if self.state() != EngineState::Running {
            return Ok(());
        }
        if let Some(pump) = self.pump.lock().unwrap().take() {
            pump.stop();
        }
        self.adapter.stop()?;
        self.state.store(STATE_INITIALIZED, Ordering::Release);
        Ok(())
    }

    /// Stop asynchronously on a background thread. Cancelling the returned
    /// handle's wait does not cancel the stop itself (§4.F).
    pub fn stop_async(self: &Arc<Self>) -> std::thread::JoinHandle<Result<()>> {
        let engine = self.clone();
        std::thread::spawn(move || engine.stop())
    }

    /// Enqueue `samples` (interleaved) for playback. Requires Running.
    pub fn send(&self, samples: &[f32]) -> Result<usize> {
        self.require_not_disposed()?;
        if self.state() != EngineState::Running {
            return Err(crate::Error::NotRunning);
        }
        Ok(self.controller().send(samples))
    }

    /// Drain captured samples directly from the adapter's input ring,
    /// bypassing the pump and the buffer controller's output path entirely
    /// (capture dataflow: callback -> adapter input ring -> here). Returns
    /// the rented buffer and the count of valid samples written into it.
    pub fn receive(&self) -> Result<(Vec<f32>, usize)> {
        self.require_not_disposed()?;
        if self.state() != EngineState::Running {
            return Err(crate::Error::NotRunning);
        }
        let mut buffer = self.controller().rent_input().unwrap_or_default();
        let count = self.adapter.receive(&mut buffer);
        if count > 0 {
            let channels = self
                .config
                .lock()
                .unwrap()
                .map(|c| c.channels as u64)
                .unwrap_or(1)
                .max(1);
            self.controller().record_received(count as u64 / channels);
        }
        Ok((buffer, count))
    }

    /// Return a buffer previously obtained from [`Engine::receive`] to the
    /// input scratch pool for reuse.
    pub fn return_receive_buffer(&self, buffer: Vec<f32>) {
        self.controller().return_input(buffer);
    }

    /// Discard buffered output. Caller-serialized: do not call concurrently
    /// with another `clear_output` or `send`.
    pub fn clear_output(&self) -> Result<()> {
        self.require_not_disposed()?;
        self.controller().clear_output();
        Ok(())
    }

    /// Current lifecycle state.
    pub fn state_snapshot(&self) -> EngineState {
        self.state()
    }

    /// Current pre-buffering substate of the adapter (§3).
    pub fn prebuffer_state(&self) -> PrebufferState {
        self.adapter.prebuffer_state()
    }

    /// Current activation state of the adapter's native stream(s).
    pub fn activation(&self) -> ActivationState {
        self.adapter.activation()
    }

    /// Enumerate output-capable devices. Valid in any non-disposed state.
    pub fn list_output_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        self.require_not_disposed()?;
        self.adapter.list_output_devices()
    }

    /// Enumerate input-capable devices.
    pub fn list_input_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        self.require_not_disposed()?;
        self.adapter.list_input_devices()
    }

    /// Switch the active output device. Requires not-Running.
    pub fn set_output_device(&self, device_id: Option<&str>) -> Result<DeviceDescriptor> {
        self.require_not_disposed()?;
        if self.state() == EngineState::Running {
            return Err(crate::Error::InvalidState);
        }
        let old_id = None;
        let descriptor = self.adapter.set_output_device(device_id)?;
        self.controller().emit(Event::OutputDeviceChanged {
            old_id,
            new_id: descriptor.id.clone(),
            descriptor: descriptor.clone(),
        });
        Ok(descriptor)
    }

    /// Switch the active input device. Requires not-Running.
    pub fn set_input_device(&self, device_id: Option<&str>) -> Result<DeviceDescriptor> {
        self.require_not_disposed()?;
        if self.state() == EngineState::Running {
            return Err(crate::Error::InvalidState);
        }
        let old_id = None;
        let descriptor = self.adapter.set_input_device(device_id)?;
        self.controller().emit(Event::InputDeviceChanged {
            old_id,
            new_id: descriptor.id.clone(),
            descriptor: descriptor.clone(),
        });
        Ok(descriptor)
    }

    /// Total frames accepted by `send` so far.
    pub fn total_sent_frames(&self) -> u64 {
        self.controller().total_sent_frames()
    }

    /// Total frames delivered to the application via `receive` so far.
    pub fn total_received_frames(&self) -> u64 {
        self.controller().total_received_frames()
    }

    /// Cumulative count of output underruns since construction.
    pub fn underrun_count(&self) -> u64 {
        self.controller().underrun_count()
    }

    /// Total frames the pump has moved from the controller to the adapter
    /// over the whole lifetime of this engine. Monotonically non-decreasing
    /// across Stop/Start cycles, since a fresh `PumpWorker` is spawned on
    /// each `Start` but they all accumulate into the same counter.
    pub fn pumped_frames(&self) -> u64 {
        self.pumped_frames.load(Ordering::Relaxed)
    }

    /// Non-blocking poll for the next queued event, if any.
    pub fn try_recv_event(&self) -> Option<Event> {
        self.controller().try_recv_event()
    }

    /// Name of the backend currently in use ("cpal", "tinyaudio", "mock").
    pub fn backend_name(&self) -> &'static str {
        self.adapter.backend_name()
    }

    /// Stop (if Running) and permanently disable the engine. Every
    /// subsequent operation fails with `Disposed`.
    pub fn dispose(&self) {
        if self.state() == EngineState::Disposed {
            return;
        }
        let _ = self.stop();
        self.state.store(STATE_DISPOSED, Ordering::Release);
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_backend::MockAdapter;

    fn test_config() -> Config {
        Config {
            sample_rate: 48_000,
            channels: 2,
            frames_per_buffer: 4,
            enable_input: true,
            ring_multiplier: 2,
            ..Config::default()
        }
    }

    fn mock_engine() -> Engine {
        Engine::with_adapter(Arc::new(MockAdapter::new()))
    }

    #[test]
    fn starts_in_created_state() {
        let engine = mock_engine();
        assert_eq!(engine.state_snapshot(), EngineState::Created);
    }

    #[test]
    fn send_before_running_fails_with_not_running() {
        let engine = mock_engine();
        engine.initialize(test_config()).unwrap();
        assert!(matches!(
            engine.send(&[0.0; 4]),
            Err(crate::Error::NotRunning)
        ));
    }

    #[test]
    fn full_lifecycle_transitions_and_send_succeeds() {
        let engine = mock_engine();
        assert!(engine.initialize(test_config()).is_ok());
        assert_eq!(engine.state_snapshot(), EngineState::Initialized);
        engine.start().unwrap();
        assert_eq!(engine.state_snapshot(), EngineState::Running);
        assert_eq!(engine.send(&[1.0, 2.0, 3.0, 4.0]).unwrap(), 4);
        engine.stop().unwrap();
        assert_eq!(engine.state_snapshot(), EngineState::Initialized);
    }

    #[test]
    fn device_change_while_running_is_invalid_state() {
        let engine = mock_engine();
        engine.initialize(test_config()).unwrap();
        engine.start().unwrap();
        assert!(matches!(
            engine.set_output_device(None),
            Err(crate::Error::InvalidState)
        ));
    }

    #[test]
    fn disposed_engine_rejects_every_operation() {
        let engine = mock_engine();
        engine.initialize(test_config()).unwrap();
        engine.dispose();
        assert!(matches!(
            engine.initialize(test_config()),
            Err(crate::Error::Disposed)
        ));
        assert!(matches!(
            engine.send(&[0.0; 4]),
            Err(crate::Error::Disposed)
        ));
        assert!(matches!(engine.receive(), Err(crate::Error::Disposed)));
    }

    #[test]
    fn start_is_idempotent() {
        let engine = mock_engine();
        engine.initialize(test_config()).unwrap();
        engine.start().unwrap();
        engine.start().unwrap();
        assert_eq!(engine.state_snapshot(), EngineState::Running);
    }

    #[test]
    fn receive_reads_whatever_the_adapter_has_captured() {
        let engine = mock_engine();
        engine.initialize(test_config()).unwrap();
        engine.start().unwrap();
        let (buffer, count) = engine.receive().unwrap();
        assert_eq!(count, 0);
        engine.return_receive_buffer(buffer);
    }

    #[test]
    fn pumped_frames_survives_stop_and_keeps_rising_across_restarts() {
        let engine = mock_engine();
        engine.initialize(test_config()).unwrap();

        engine.start().unwrap();
        for _ in 0..16 {
            engine.send(&[0.5; 8]).unwrap();
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
        engine.stop().unwrap();
        let after_first_stop = engine.pumped_frames();
        // Stopping must not reset the lifetime counter back to 0.
        assert_eq!(engine.pumped_frames(), after_first_stop);

        engine.start().unwrap();
        for _ in 0..16 {
            engine.send(&[0.5; 8]).unwrap();
        }
        std::thread::sleep(std::time::Duration::from_millis(50));
        engine.stop().unwrap();
        let after_second_stop = engine.pumped_frames();

        assert!(after_second_stop >= after_first_stop);
    }
}
