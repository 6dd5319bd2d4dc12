//! Ring-buffer-backed device adapter (§4.C).
//!
//! A [`DeviceAdapter`] wraps an [`AudioBackend`] native stream with its own
//! internal ring buffer. The pump worker ([`crate::pump::PumpWorker`]) writes
//! engine-produced chunks into the adapter via [`DeviceAdapter::send`]; the
//! real native device callback (running on the OS audio thread) drains that
//! ring directly. This decouples the engine's buffer controller (which the
//! application thread writes to) from the platform callback's timing, which
//! is why the transport has two ring buffers rather than one.

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use wavecore_core::ring_buffer::RingBuffer;

use crate::Result;
use crate::backend::{AudioBackend, BackendStreamConfig, StreamHandle};
use crate::config::{ActivationState, Config, DeviceDescriptor};

/// Negotiated outcome of [`DeviceAdapter::initialize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiatedConfig {
    /// The frames-per-buffer the adapter will actually honor. May differ
    /// from the requested value if the backend snaps to a native size.
    pub frames_per_buffer: u32,
    /// The sample rate the adapter will actually honor.
    pub sample_rate: u32,
}

/// Component C: adapts a raw [`AudioBackend`] stream into the engine's
/// ring-based send/receive contract.
///
/// `initialize`/`start`/`stop` must be idempotent in their respective valid
/// states. The real-time device callback installed by `start` must never
/// allocate, lock a non-lock-free structure, or panic; underrun is handled
/// by zero-padding, never by blocking.
///
/// Methods that change adapter state take `&self`: implementations use
/// interior mutability (a handful of `Mutex`-guarded fields touched only
/// from the application thread, never from the real-time callback) so the
/// same `Arc<dyn DeviceAdapter>` can be handed to the pump worker (for
/// `send`/`receive`) while the engine still issues `start`/`stop`/device
/// changes through its own clone of that `Arc`.
pub trait DeviceAdapter: Send + Sync {
    /// Negotiate a configuration with the backend, opening no stream yet.
    /// Returns `Error::ConfigRejected` if no compatible mode exists.
    fn initialize(&self, config: &Config) -> Result<NegotiatedConfig>;

    /// Open the native stream(s) and begin running the device callback.
    /// Idempotent: calling `start` while already started is a no-op.
    fn start(&self) -> Result<()>;

    /// Stop and tear down the native stream(s). Idempotent.
    fn stop(&self) -> Result<()>;

    /// Enqueue `samples` for eventual playback. Blocks (spin + short sleep)
    /// while the internal ring is full, applying backpressure to the pump
    /// thread rather than dropping data silently.
    fn send(&self, samples: &[f32]) -> usize;

    /// Drain captured samples into `dst`, returning the count written.
    /// Returns 0 immediately if input is not enabled.
    fn receive(&self, dst: &mut [f32]) -> usize;

    /// Enumerate output-capable devices.
    fn list_output_devices(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Enumerate input-capable devices.
    fn list_input_devices(&self) -> Result<Vec<DeviceDescriptor>>;

    /// Switch the active output device. Requires the adapter to be stopped.
    fn set_output_device(&self, device_id: Option<&str>) -> Result<DeviceDescriptor>;

    /// Switch the active input device. Requires the adapter to be stopped.
    fn set_input_device(&self, device_id: Option<&str>) -> Result<DeviceDescriptor>;

    /// Current activation state of the underlying native stream(s).
    fn activation(&self) -> ActivationState;

    /// Current pre-buffering substate (§3, §4.C item 2). `Buffering` on
    /// every fresh `start`; the real-time callback flips it to `Playing`
    /// itself once the output ring holds at least the pre-buffer threshold.
    fn prebuffer_state(&self) -> PrebufferState;

    /// Name of the underlying backend, for diagnostics and `Event` payloads.
    fn backend_name(&self) -> &'static str;
}

/// Pre-buffering substate of a Running engine (§3). While `Buffering`, the
/// real-time callback outputs silence regardless of what is actually
/// available, giving the application's producer time to fill the ring
/// before audible playback starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrebufferState {
    /// The callback is outputting silence until the ring reaches the
    /// pre-buffer threshold.
    Buffering,
    /// The threshold was crossed; the callback now plays real samples.
    Playing,
}

/// Shared ring-pair plumbing common to every real [`DeviceAdapter`]
/// implementation (cpal, tinyaudio). Built once from a negotiated
/// [`Config`] and handed to the native callback closures.
pub(crate) struct AdapterRings {
    pub output: RingBuffer,
    pub input: Option<RingBuffer>,
    pub activation: AtomicU8,
    pub substate: AtomicU8,
    /// `2 * frames_per_buffer * channels`, fixed regardless of the ring's
    /// own capacity (which may be a larger multiple for large-mixer setups).
    pub prebuffer_threshold: u64,
}

const ACTIVATION_IDLE: u8 = 0;
const ACTIVATION_ACTIVE: u8 = 1;
const ACTIVATION_ERROR: u8 = 2;

const SUBSTATE_BUFFERING: u8 = 0;
const SUBSTATE_PLAYING: u8 = 1;

/// Sleep between retries while `send` spin-waits on a full internal ring.
/// Short enough that the bounded wait tracks the device's own buffer drain
/// rate rather than lagging noticeably behind it.
const SEND_SPIN_SLEEP: Duration = Duration::from_micros(250);

impl AdapterRings {
    pub fn new(config: &Config) -> Arc<Self> {
        let capacity = config.ring_capacity();
        let buffer_samples = config.buffer_samples() as u64;
        Arc::new(Self {
            output: RingBuffer::new(capacity),
            input: if config.enable_input {
                Some(RingBuffer::new(capacity))
            } else {
                None
            },
            activation: AtomicU8::new(ACTIVATION_IDLE),
            substate: AtomicU8::new(SUBSTATE_BUFFERING),
            prebuffer_threshold: 2 * buffer_samples,
        })
    }

    pub fn set_active(&self) {
        self.substate.store(SUBSTATE_BUFFERING, Ordering::Relaxed);
        self.activation.store(ACTIVATION_ACTIVE, Ordering::Relaxed);
    }

    pub fn set_idle(&self) {
        self.activation.store(ACTIVATION_IDLE, Ordering::Relaxed);
    }

    pub fn set_error(&self) {
        self.activation.store(ACTIVATION_ERROR, Ordering::Relaxed);
    }

    pub fn activation_state(&self) -> ActivationState {
        match self.activation.load(Ordering::Relaxed) {
            ACTIVATION_ACTIVE => ActivationState::Active,
            ACTIVATION_ERROR => ActivationState::Error,
            _ => ActivationState::Idle,
        }
    }

    pub fn prebuffer_state(&self) -> PrebufferState {
        match self.substate.load(Ordering::Relaxed) {
            SUBSTATE_PLAYING => PrebufferState::Playing,
            _ => PrebufferState::Buffering,
        }
    }

    /// Write `samples` to the output ring, spin-waiting with short sleeps
    /// while it is full rather than dropping the remainder on the first
    /// partial write. The wait is bounded by the adapter leaving the
    /// `Active` state (stopped or errored), never indefinite: the real
    /// device callback is what drains this ring, so as long as it keeps
    /// running the wait resolves within a buffer period or two.
    pub fn send(&self, samples: &[f32]) -> usize {
        let mut written = self.output.write(samples);
        while written < samples.len() && self.activation_state() == ActivationState::Active {
            std::thread::sleep(SEND_SPIN_SLEEP);
            written += self.output.write(&samples[written..]);
        }
        written
    }

    pub fn receive(&self, dst: &mut [f32]) -> usize {
        match &self.input {
            Some(ring) => ring.read(dst),
            None => 0,
        }
    }
}

/// Real-time output callback body shared by every backend: drain the ring
/// into `out`, zero-padding any shortfall. Never allocates or blocks.
///
/// While the pre-buffering substate is `Buffering` (§4.C item 2), this
/// outputs silence unconditionally — never peeking at the ring's contents —
/// and only checks whether `available >= prebuffer_threshold` to decide
/// whether the *next* callback may start playing. The transition is never
/// observed mid-buffer: the callback that crosses the threshold still plays
/// silence itself.
pub(crate) fn fill_output(rings: &AdapterRings, out: &mut [f32]) {
    if rings.substate.load(Ordering::Relaxed) == SUBSTATE_BUFFERING {
        out.fill(0.0);
        if rings.output.available() >= rings.prebuffer_threshold {
            rings.substate.store(SUBSTATE_PLAYING, Ordering::Relaxed);
        }
        return;
    }
    let read = rings.output.read(out);
    if read < out.len() {
        out[read..].fill(0.0);
    }
}

/// Real-time input callback body shared by every backend: best-effort copy
/// of captured samples into the input ring. Drops samples on overflow
/// rather than blocking the native audio thread.
pub(crate) fn drain_input(rings: &AdapterRings, captured: &[f32]) {
    if let Some(ring) = &rings.input {
        ring.write(captured);
    }
}

/// Holds the built native stream handle(s) plus the shared rings, returned
/// by a backend-specific constructor function.
pub(crate) struct OpenStreams {
    pub output: Option<StreamHandle>,
    pub input: Option<StreamHandle>,
}

impl OpenStreams {
    pub fn none() -> Self {
        Self {
            output: None,
            input: None,
        }
    }
}

/// Build the [`BackendStreamConfig`] a native backend stream should be
/// opened with, given a negotiated [`Config`] and an optional device id.
pub(crate) fn stream_config(config: &Config, device_id: Option<String>) -> BackendStreamConfig {
    BackendStreamConfig {
        sample_rate: config.sample_rate,
        buffer_size: config.frames_per_buffer,
        channels: config.channels,
        device_id,
    }
}

/// Resolve a [`DeviceDescriptor`] for `device_id` (or the default, if
/// `None`) from `backend`, in the given direction.
pub(crate) fn resolve_device(
    backend: &dyn AudioBackend,
    device_id: Option<&str>,
    input: bool,
) -> Result<DeviceDescriptor> {
    match device_id {
        Some(id) => backend
            .list_devices()?
            .into_iter()
            .find(|d| d.id == id && if input { d.is_input } else { d.is_output })
            .ok_or_else(|| crate::Error::DeviceNotFound(id.to_string())),
        None => {
            let default = if input {
                backend.default_input_device()?
            } else {
                backend.default_output_device()?
            };
            default.ok_or_else(|| crate::Error::DeviceNotFound("<default>".to_string()))
        }
    }
}

/// Generic [`DeviceAdapter`] over any [`AudioBackend`].
///
/// Both the primary (`cpal`) and secondary (`tinyaudio`) adapters are this
/// same struct parameterized over their respective backend; the ring
/// plumbing, backpressure, and activation tracking are identical, so only
/// the native stream construction differs, and that is already isolated
/// behind the `AudioBackend` trait.
pub struct BackendAdapter<B: AudioBackend> {
    backend: B,
    config: Mutex<Option<Config>>,
    rings: Mutex<Option<Arc<AdapterRings>>>,
    streams: Mutex<Option<OpenStreams>>,
    output_device_id: Mutex<Option<String>>,
    input_device_id: Mutex<Option<String>>,
}

impl<B: AudioBackend> BackendAdapter<B> {
    /// Wrap `backend` in adapter plumbing. Call `initialize` before `start`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: Mutex::new(None),
            rings: Mutex::new(None),
            streams: Mutex::new(None),
            output_device_id: Mutex::new(None),
            input_device_id: Mutex::new(None),
        }
    }

    fn current_rings(&self) -> Option<Arc<AdapterRings>> {
        self.rings.lock().unwrap().clone()
    }
}

impl<B: AudioBackend> DeviceAdapter for BackendAdapter<B> {
    fn initialize(&self, config: &Config) -> Result<NegotiatedConfig> {
        config.validate()?;
        // Touch the backend so a genuinely unreachable host surfaces here
        // rather than on the first `start`.
        self.backend.list_devices()?;
        let rings = AdapterRings::new(config);
        let negotiated = NegotiatedConfig {
            frames_per_buffer: config.frames_per_buffer,
            sample_rate: self.backend.actual_sample_rate(&stream_config(config, None)),
        };
        *self.config.lock().unwrap() = Some(*config);
        *self.rings.lock().unwrap() = Some(rings);
        Ok(negotiated)
    }

    fn start(&self) -> Result<()> {
        let config = self
            .config
            .lock()
            .unwrap()
            .ok_or(crate::Error::NotInitialized)?;
        if self.streams.lock().unwrap().is_some() {
            return Ok(());
        }
        let rings = self.current_rings().ok_or(crate::Error::NotInitialized)?;

        let out_rings = rings.clone();
        let out_error_rings = rings.clone();
        let output_device_id = self.output_device_id.lock().unwrap().clone();
        let out_stream_config = stream_config(&config, output_device_id);
        let output = self.backend.build_output_stream(
            &out_stream_config,
            Box::new(move |out: &mut [f32]| fill_output(&out_rings, out)),
            Box::new(move |msg| {
                tracing::warn!(error = msg, "output stream error");
                out_error_rings.set_error();
            }),
        )?;

        let input = if config.enable_input {
            let in_rings = rings.clone();
            let in_error_rings = rings.clone();
            let input_device_id = self.input_device_id.lock().unwrap().clone();
            let in_stream_config = stream_config(&config, input_device_id);
            match self.backend.build_input_stream(
                &in_stream_config,
                Box::new(move |data: &[f32]| drain_input(&in_rings, data)),
                Box::new(move |msg| {
                    tracing::warn!(error = msg, "input stream error");
                    in_error_rings.set_error();
                }),
            ) {
                Ok(handle) => Some(handle),
                Err(e) => {
                    tracing::warn!(error = %e, "input stream unavailable, continuing output-only");
                    None
                }
            }
        } else {
            None
        };

        rings.set_active();
        *self.streams.lock().unwrap() = Some(OpenStreams {
            output: Some(output),
            input,
        });
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if let Some(rings) = self.current_rings() {
            rings.set_idle();
        }
        *self.streams.lock().unwrap() = None;
        Ok(())
    }

    fn send(&self, samples: &[f32]) -> usize {
        match self.current_rings() {
            Some(rings) => rings.send(samples),
            None => 0,
        }
    }

    fn receive(&self, dst: &mut [f32]) -> usize {
        match self.current_rings() {
            Some(rings) => rings.receive(dst),
            None => 0,
        }
    }

    fn list_output_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(self
            .backend
            .list_devices()?
            .into_iter()
            .filter(|d| d.is_output)
            .collect())
    }

    fn list_input_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(self
            .backend
            .list_devices()?
            .into_iter()
            .filter(|d| d.is_input)
            .collect())
    }

    fn set_output_device(&self, device_id: Option<&str>) -> Result<DeviceDescriptor> {
        if self.streams.lock().unwrap().is_some() {
            return Err(crate::Error::InvalidState);
        }
        let descriptor = resolve_device(&self.backend, device_id, false)?;
        *self.output_device_id.lock().unwrap() = Some(descriptor.id.clone());
        Ok(descriptor)
    }

    fn set_input_device(&self, device_id: Option<&str>) -> Result<DeviceDescriptor> {
        if self.streams.lock().unwrap().is_some() {
            return Err(crate::Error::InvalidState);
        }
        let descriptor = resolve_device(&self.backend, device_id, true)?;
        *self.input_device_id.lock().unwrap() = Some(descriptor.id.clone());
        Ok(descriptor)
    }

    fn activation(&self) -> ActivationState {
        match self.current_rings() {
            Some(rings) => rings.activation_state(),
            None => ActivationState::Idle,
        }
    }

    fn prebuffer_state(&self) -> PrebufferState {
        match self.current_rings() {
            Some(rings) => rings.prebuffer_state(),
            None => PrebufferState::Buffering,
        }
    }

    fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}
