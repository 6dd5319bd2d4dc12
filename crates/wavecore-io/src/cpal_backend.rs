//! Primary [`AudioBackend`] implementation, built on `cpal`.
//!
//! `cpal` covers ALSA/PulseAudio/JACK on Linux, CoreAudio on macOS/iOS,
//! WASAPI/ASIO on Windows, and AAudio/OpenSL ES on Android — the platform
//! matrix the backend selector (§4.D) tries first.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::Result;
use crate::backend::{AudioBackend, BackendStreamConfig, ErrorCallback, InputCallback, OutputCallback, StreamHandle};
use crate::config::{DeviceDescriptor, DeviceState};

/// Primary audio backend, wrapping a `cpal::Host`.
pub struct CpalBackend {
    host: cpal::Host,
}

impl CpalBackend {
    /// Open the platform's default `cpal` host.
    pub fn new() -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal backend initialized");
        Self { host }
    }

    fn find_device(&self, device_id: Option<&str>, input: bool) -> Result<cpal::Device> {
        match device_id {
            Some(id) => {
                let devices = if input {
                    self.host.input_devices()
                } else {
                    self.host.output_devices()
                }
                .map_err(|e| crate::Error::BackendUnavailable(e.to_string()))?;
                devices
                    .into_iter()
                    .find(|d| device_name(d) == id)
                    .ok_or_else(|| crate::Error::DeviceNotFound(id.to_string()))
            }
            None => {
                let device = if input {
                    self.host.default_input_device()
                } else {
                    self.host.default_output_device()
                };
                device.ok_or_else(|| crate::Error::DeviceNotFound("<default>".to_string()))
            }
        }
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn device_name(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| "<unknown>".to_string())
}

fn to_descriptor(device: &cpal::Device, backend_api: &'static str, is_default: bool) -> DeviceDescriptor {
    let name = device_name(device);
    let max_input_channels = device
        .supported_input_configs()
        .map(|mut cs| cs.next().map(|c| c.channels()).unwrap_or(0))
        .unwrap_or(0);
    let max_output_channels = device
        .supported_output_configs()
        .map(|mut cs| cs.next().map(|c| c.channels()).unwrap_or(0))
        .unwrap_or(0);
    DeviceDescriptor {
        id: name.clone(),
        name,
        backend_api: backend_api.to_string(),
        is_input: max_input_channels > 0,
        is_output: max_output_channels > 0,
        is_default,
        state: DeviceState::Active,
        max_input_channels,
        max_output_channels,
    }
}

impl AudioBackend for CpalBackend {
    fn name(&self) -> &'static str {
        "cpal"
    }

    fn list_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        let default_out = self.host.default_output_device().map(|d| device_name(&d));
        let default_in = self.host.default_input_device().map(|d| device_name(&d));
        let devices = self
            .host
            .devices()
            .map_err(|e| crate::Error::BackendUnavailable(e.to_string()))?;
        Ok(devices
            .map(|d| {
                let name = device_name(&d);
                let is_default = Some(&name) == default_out.as_ref() || Some(&name) == default_in.as_ref();
                to_descriptor(&d, "cpal", is_default)
            })
            .collect())
    }

    fn default_output_device(&self) -> Result<Option<DeviceDescriptor>> {
        Ok(self
            .host
            .default_output_device()
            .map(|d| to_descriptor(&d, "cpal", true)))
    }

    fn default_input_device(&self) -> Result<Option<DeviceDescriptor>> {
        Ok(self
            .host
            .default_input_device()
            .map(|d| to_descriptor(&d, "cpal", true)))
    }

    fn build_output_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: OutputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(config.device_id.as_deref(), false)?;
        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback(data);
                },
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| crate::Error::DeviceOpenFailed(e.to_string()))?;
        stream
            .play()
            .map_err(|e| crate::Error::DeviceOpenFailed(e.to_string()))?;
        Ok(StreamHandle::new(stream))
    }

    fn build_input_stream(
        &self,
        config: &BackendStreamConfig,
        mut callback: InputCallback,
        mut error_callback: ErrorCallback,
    ) -> Result<StreamHandle> {
        let device = self.find_device(config.device_id.as_deref(), true)?;
        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.buffer_size),
        };
        let stream = device
            .build_input_stream(
                &stream_config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    callback(data);
                },
                move |err| error_callback(&err.to_string()),
                None,
            )
            .map_err(|e| crate::Error::DeviceOpenFailed(e.to_string()))?;
        stream
            .play()
            .map_err(|e| crate::Error::DeviceOpenFailed(e.to_string()))?;
        Ok(StreamHandle::new(stream))
    }
}
