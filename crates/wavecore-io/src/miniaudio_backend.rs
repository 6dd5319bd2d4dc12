//! Secondary [`AudioBackend`] implementation, wrapping `tinyaudio` (which in
//! turn binds `miniaudio`). Used as the fallback when the primary `cpal`
//! backend fails to open a device (§4.D).
//!
//! `tinyaudio`'s public surface does not expose device enumeration or
//! selection by id — it always opens the platform default device. This
//! backend therefore reports a single synthetic device per direction and
//! ignores `device_id` when building a stream.

use std::sync::{Arc, Mutex};

use tinyaudio::{OutputDeviceParameters, run_output_device};

use crate::Result;
use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle};
use crate::config::{DeviceDescriptor, DeviceState};

const DEFAULT_DEVICE_ID: &str = "secondary:0";

/// Secondary audio backend, wrapping `tinyaudio`'s default-device playback.
///
/// Input capture is not supported by `tinyaudio`'s stable API in this
/// version; `build_input_stream` returns `BackendUnavailable`.
pub struct MiniaudioBackend;

impl MiniaudioBackend {
    /// Construct the secondary backend. Never fails: `tinyaudio` defers
    /// device resolution to stream-build time.
    pub fn new() -> Self {
        tracing::info!("tinyaudio (miniaudio) backend initialized");
        Self
    }

    fn descriptor(is_output: bool) -> DeviceDescriptor {
        DeviceDescriptor {
            id: DEFAULT_DEVICE_ID.to_string(),
            name: "System Default".to_string(),
            backend_api: "tinyaudio".to_string(),
            is_input: !is_output,
            is_output,
            is_default: true,
            state: DeviceState::Active,
            max_input_channels: if is_output { 0 } else { 2 },
            max_output_channels: if is_output { 2 } else { 0 },
        }
    }
}

impl Default for MiniaudioBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBackend for MiniaudioBackend {
    fn name(&self) -> &'static str {
        "tinyaudio"
    }

    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![Self::descriptor(true), Self::descriptor(false)])
    }

    fn default_output_device(&self) -> Result<Option<DeviceDescriptor>> {
        Ok(Some(Self::descriptor(true)))
    }

    fn default_input_device(&self) -> Result<Option<DeviceDescriptor>> {
        Ok(Some(Self::descriptor(false)))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let error_callback = Arc::new(Mutex::new(error_callback));
        let params = OutputDeviceParameters {
            channels_count: config.channels as usize,
            sample_rate: config.sample_rate as usize,
            channel_sample_count: config.buffer_size as usize,
        };
        let device = run_output_device(params, move |data: &mut [f32]| {
            callback(data);
        })
        .map_err(|e| {
            (error_callback.lock().unwrap())(&e.to_string());
            crate::Error::DeviceOpenFailed(e.to_string())
        })?;
        Ok(StreamHandle::new(device))
    }

    fn build_input_stream(
        &self,
        _config: &BackendStreamConfig,
        _callback: InputCallback,
        _error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        Err(crate::Error::BackendUnavailable(
            "tinyaudio backend does not support capture in this build".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_name_is_tinyaudio() {
        let backend = MiniaudioBackend::new();
        assert_eq!(backend.name(), "tinyaudio");
    }

    #[test]
    fn lists_a_single_synthetic_device_per_direction() {
        let backend = MiniaudioBackend::new();
        let devices = backend.list_devices().unwrap();
        assert_eq!(devices.len(), 2);
        assert!(devices.iter().any(|d| d.is_input));
        assert!(devices.iter().any(|d| d.is_output));
    }

    #[test]
    fn input_stream_is_unsupported() {
        let backend = MiniaudioBackend::new();
        let result = backend.build_input_stream(
            &BackendStreamConfig::default(),
            Box::new(|_| {}),
            Box::new(|_| {}),
        );
        assert!(result.is_err());
    }
}
