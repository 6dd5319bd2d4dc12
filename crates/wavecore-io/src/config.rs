//! Immutable session configuration and device description.

/// Preferred native host API. `Default` lets the backend selector apply the
/// platform-default mapping (Windows → WASAPI, macOS/iOS → CoreAudio,
/// Linux → ALSA, Android → AAudio).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostApi {
    /// Let the backend selector choose the platform default.
    Default,
    Wasapi,
    CoreAudio,
    Alsa,
    Jack,
    Asio,
    Wdmks,
    AAudio,
    OpenSl,
}

impl Default for HostApi {
    fn default() -> Self {
        Self::Default
    }
}

/// Immutable per-session configuration for the audio engine.
///
/// Produced once by the caller and passed to [`crate::Engine::initialize`].
/// `validate` rejects combinations no backend can realistically support
/// before any native resources are touched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Sample rate in Hz, `8_000..=192_000`.
    pub sample_rate: u32,
    /// Channel count, 1 (mono) or 2 (stereo).
    pub channels: u16,
    /// Frames per buffer, ideally a power of two in `128..=4096`.
    pub frames_per_buffer: u32,
    /// Whether an input (capture) stream should be opened alongside output.
    pub enable_input: bool,
    /// Preferred native host API.
    pub host_api: HostApi,
    /// Output ring capacity as a multiple of `frames_per_buffer * channels`.
    /// Lower values reduce latency; higher values add safety margin for
    /// bursty producers. Defaults to 2 (see DESIGN.md Open Questions).
    pub ring_multiplier: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_rate: 48_000,
            channels: 2,
            frames_per_buffer: 512,
            enable_input: false,
            host_api: HostApi::Default,
            ring_multiplier: 2,
        }
    }
}

impl Config {
    /// Reject configurations no backend could plausibly open.
    ///
    /// This is a cheap, backend-independent sanity check; the backend
    /// selector may still fail a config that passes here with
    /// `DeviceOpenFailed` if the hardware refuses it.
    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(8_000..=192_000).contains(&self.sample_rate) {
            return Err(crate::Error::ConfigRejected(format!(
                "sample_rate {} out of range 8000..=192000",
                self.sample_rate
            )));
        }
        if self.channels != 1 && self.channels != 2 {
            return Err(crate::Error::ConfigRejected(format!(
                "channels {} must be 1 or 2",
                self.channels
            )));
        }
        if self.frames_per_buffer == 0 {
            return Err(crate::Error::ConfigRejected(
                "frames_per_buffer must be nonzero".into(),
            ));
        }
        if self.ring_multiplier == 0 {
            return Err(crate::Error::ConfigRejected(
                "ring_multiplier must be nonzero".into(),
            ));
        }
        Ok(())
    }

    /// Output/input ring capacity in samples for this configuration.
    pub fn ring_capacity(&self) -> usize {
        self.frames_per_buffer as usize * self.channels as usize * self.ring_multiplier as usize
    }

    /// Engine-buffer size in samples (`frames_per_buffer * channels`).
    pub fn buffer_samples(&self) -> usize {
        self.frames_per_buffer as usize * self.channels as usize
    }
}

/// Lifecycle state of an enumerated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceState {
    Active,
    Disabled,
    NotPresent,
    Unplugged,
}

/// Activation state of a running (or not-yet-running) adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationState {
    Idle,
    Active,
    Error,
}

/// A device as enumerated by a backend.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceDescriptor {
    /// Opaque identifier, stable for the lifetime of the backend instance.
    /// Pass back into `set_output_device`/`set_input_device`.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    /// Name of the backend API that produced this descriptor (e.g. "cpal", "tinyaudio").
    pub backend_api: String,
    /// Whether the device supports capture.
    pub is_input: bool,
    /// Whether the device supports playback.
    pub is_output: bool,
    /// Whether this is the backend's default device for its direction.
    pub is_default: bool,
    /// Current device state.
    pub state: DeviceState,
    /// Maximum supported input channels (0 if output-only).
    pub max_input_channels: u16,
    /// Maximum supported output channels (0 if input-only).
    pub max_output_channels: u16,
}
