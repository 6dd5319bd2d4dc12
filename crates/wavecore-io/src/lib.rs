//! Real-time audio transport, backend abstraction, and WAV I/O for wavecore.
//!
//! This crate provides:
//!
//! - **The engine wrapper** ([`Engine`], component G): the application-facing
//!   orchestrator — initialize, start/stop, send/receive, device enumeration
//!   and selection, and events.
//! - **The device-callback adapter** ([`adapter`], component C) and the
//!   pluggable native backend trait ([`backend`]), with `cpal` ([`cpal_backend`])
//!   as the primary backend and `tinyaudio` ([`miniaudio_backend`]) as the
//!   secondary, chosen by [`selector::select_backend`] (component D).
//! - **The buffer controller** ([`buffer_controller`], component E) and
//!   **pump worker** ([`pump`], component F) that move samples between the
//!   application and the adapter.
//! - **A deterministic test substitute** ([`mock_backend::MockAdapter`],
//!   component K) for driving the whole transport without real hardware.
//! - **WAV file I/O**: [`read_wav`]/[`write_wav`] and their stereo
//!   counterparts for loading/saving audio files.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use wavecore_io::{Config, Engine, HostApi};
//!
//! let engine = Engine::new(HostApi::Default);
//! engine.initialize(Config::default())?;
//! engine.start()?;
//! engine.send(&[0.0f32; 1024])?;
//! engine.stop()?;
//! ```

mod adapter;
mod backend;
mod buffer_controller;
mod config;
mod cpal_backend;
mod engine;
mod error;
mod events;
mod miniaudio_backend;
mod mock_backend;
mod pump;
mod selector;
mod wav;

pub use adapter::{DeviceAdapter, NegotiatedConfig, PrebufferState};
pub use backend::{AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle};
pub use buffer_controller::BufferController;
pub use config::{ActivationState, Config, DeviceDescriptor, DeviceState, HostApi};
pub use cpal_backend::CpalBackend;
pub use engine::{Engine, EngineState};
pub use error::{Error, Result};
pub use events::Event;
pub use miniaudio_backend::MiniaudioBackend;
pub use mock_backend::MockAdapter;
pub use pump::PumpWorker;
pub use selector::{SelectedBackend, select_backend, selected_backend};
pub use wav::{
    StereoSamples, WavFormat, WavInfo, WavSpec, read_wav, read_wav_info, read_wav_stereo,
    write_wav, write_wav_stereo,
};
