//! Pluggable native audio backend abstraction (§4.C, §4.D).
//!
//! This module defines the [`AudioBackend`] trait, which decouples the
//! engine's transport from any specific platform audio API. Two concrete
//! implementations exist: [`crate::cpal_backend::CpalBackend`] (primary,
//! covers ALSA/CoreAudio/WASAPI/JACK via `cpal`) and
//! [`crate::miniaudio_backend::MiniaudioBackend`] (secondary, wraps the
//! bundled `tinyaudio` crate). [`crate::mock_backend::MockBackend`] (K)
//! implements the same contract deterministically for tests.
//!
//! ## Design Rationale
//!
//! The trait uses boxed closures for callbacks rather than generic
//! parameters, making `AudioBackend` object-safe and enabling runtime
//! backend selection by [`crate::selector::BackendSelector`]. Stream handles
//! are returned as [`StreamHandle`], a type-erased wrapper that automatically
//! stops playback on drop. This keeps platform-specific types out of
//! application code.

use crate::Result;
use crate::config::DeviceDescriptor;

/// Configuration for building a single native stream.
#[derive(Debug, Clone)]
pub struct BackendStreamConfig {
    /// Requested sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred buffer size in frames.
    pub buffer_size: u32,
    /// Number of audio channels.
    pub channels: u16,
    /// Device id from a prior [`AudioBackend::list_devices`] call, or
    /// `None` to use the backend's default device.
    pub device_id: Option<String>,
}

impl Default for BackendStreamConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: 512,
            channels: 2,
            device_id: None,
        }
    }
}

/// Type-erased native stream handle.
///
/// Wraps a backend-specific stream object. The stream is active while this
/// handle exists; dropping it stops playback/capture. This design ensures
/// RAII cleanup regardless of which backend produced the stream.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wrap a backend-specific stream object, kept alive until dropped.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

/// Audio output callback signature, invoked on the real-time audio thread.
///
/// The buffer is interleaved f32 (`[L0, R0, L1, R1, ...]` for stereo) and
/// must be entirely filled. Implementations must not allocate, lock, or
/// perform I/O.
pub type OutputCallback = Box<dyn FnMut(&mut [f32]) + Send>;

/// Audio input callback signature, invoked on the real-time audio thread
/// with captured interleaved f32 samples.
pub type InputCallback = Box<dyn FnMut(&[f32]) + Send>;

/// Error callback signature, invoked with a human-readable message when the
/// backend encounters a streaming error.
pub type ErrorCallback = Box<dyn FnMut(&str) + Send>;

/// Pluggable native audio backend trait (§4.C's device-callback adapter,
/// minus the higher-level ring/backpressure policy layered on top by
/// [`crate::adapter::DeviceAdapter`]).
///
/// Object-safe, enabling runtime backend selection via `Box<dyn AudioBackend>`.
pub trait AudioBackend: Send + Sync {
    /// Human-readable name of this backend (e.g. "cpal", "tinyaudio", "mock").
    fn name(&self) -> &'static str;

    /// Enumerate all devices this backend can see, in both directions.
    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>>;

    /// The backend's default output device, if any.
    fn default_output_device(&self) -> Result<Option<DeviceDescriptor>>;

    /// The backend's default input device, if any.
    fn default_input_device(&self) -> Result<Option<DeviceDescriptor>>;

    /// Build an output-only native stream.
    ///
    /// `callback` is invoked per buffer to generate output samples;
    /// `error_callback` is invoked when the backend hits a streaming error.
    /// The returned [`StreamHandle`] keeps the stream alive; dropping it
    /// stops playback.
    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Build an input-only native stream.
    ///
    /// `callback` is invoked per buffer with captured samples. The returned
    /// [`StreamHandle`] keeps the stream alive; dropping it stops capture.
    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        callback: InputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle>;

    /// Query the sample rate the backend will actually use for `config`.
    ///
    /// Some backends cannot honor the exact requested rate. Default
    /// implementation returns the requested rate unchanged.
    fn actual_sample_rate(&self, config: &BackendStreamConfig) -> u32 {
        config.sample_rate
    }
}
