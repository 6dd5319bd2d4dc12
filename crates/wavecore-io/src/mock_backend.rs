//! Deterministic test substitute for a real native backend (component K).
//!
//! [`MockAdapter`] implements [`DeviceAdapter`] without touching any OS audio
//! API. Instead of a real-time device callback running on its own thread,
//! tests drive the "device side" explicitly via [`MockAdapter::pump_device`],
//! making the whole transport deterministic and fast under test.

use std::sync::{Arc, Mutex};

use crate::Result;
use crate::adapter::{
    AdapterRings, DeviceAdapter, NegotiatedConfig, PrebufferState, drain_input, fill_output,
};
use crate::config::{ActivationState, Config, DeviceDescriptor, DeviceState};

const MOCK_OUTPUT_ID: &str = "mock:output";
const MOCK_INPUT_ID: &str = "mock:input";

/// Deterministic [`DeviceAdapter`] for tests, with no real audio thread.
pub struct MockAdapter {
    config: Mutex<Option<Config>>,
    rings: Mutex<Option<Arc<AdapterRings>>>,
    started: Mutex<bool>,
    /// Samples captured by the most recent `pump_device` call, delivered to
    /// the input ring on the next pump, simulating a capture device.
    fake_capture: Mutex<Vec<f32>>,
}

impl MockAdapter {
    /// Construct an idle mock adapter.
    pub fn new() -> Self {
        Self {
            config: Mutex::new(None),
            rings: Mutex::new(None),
            started: Mutex::new(false),
            fake_capture: Mutex::new(Vec::new()),
        }
    }

    /// Simulate one native device callback period: drain `buffer_samples`
    /// from the output ring (as the speaker would) and feed `fake_capture`
    /// into the input ring (as the microphone would).
    ///
    /// Returns the samples the "speaker" actually played, for assertions.
    pub fn pump_device(&self, buffer_samples: usize) -> Vec<f32> {
        let rings = {
            let rings = self.rings.lock().unwrap();
            let started = *self.started.lock().unwrap();
            match &*rings {
                Some(r) if started => r.clone(),
                _ => return vec![0.0; buffer_samples],
            }
        };
        let mut out = vec![0.0; buffer_samples];
        fill_output(&rings, &mut out);
        let mut fake_capture = self.fake_capture.lock().unwrap();
        if !fake_capture.is_empty() {
            drain_input(&rings, &fake_capture);
            fake_capture.clear();
        }
        out
    }

    /// Queue samples to be delivered to the input ring on the next
    /// `pump_device` call, simulating captured microphone input.
    pub fn queue_capture(&self, samples: &[f32]) {
        self.fake_capture.lock().unwrap().extend_from_slice(samples);
    }
}

impl Default for MockAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceAdapter for MockAdapter {
    fn initialize(&self, config: &Config) -> Result<NegotiatedConfig> {
        config.validate()?;
        *self.config.lock().unwrap() = Some(*config);
        *self.rings.lock().unwrap() = Some(AdapterRings::new(config));
        Ok(NegotiatedConfig {
            frames_per_buffer: config.frames_per_buffer,
            sample_rate: config.sample_rate,
        })
    }

    fn start(&self) -> Result<()> {
        let rings = self
            .rings
            .lock()
            .unwrap()
            .clone()
            .ok_or(crate::Error::NotInitialized)?;
        rings.set_active();
        *self.started.lock().unwrap() = true;
        Ok(())
    }

    fn stop(&self) -> Result<()> {
        if let Some(rings) = self.rings.lock().unwrap().clone() {
            rings.set_idle();
        }
        *self.started.lock().unwrap() = false;
        Ok(())
    }

    fn send(&self, samples: &[f32]) -> usize {
        match self.rings.lock().unwrap().clone() {
            Some(rings) => rings.send(samples),
            None => 0,
        }
    }

    fn receive(&self, dst: &mut [f32]) -> usize {
        match self.rings.lock().unwrap().clone() {
            Some(rings) => rings.receive(dst),
            None => 0,
        }
    }

    fn list_output_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![mock_descriptor(true)])
    }

    fn list_input_devices(&self) -> Result<Vec<DeviceDescriptor>> {
        Ok(vec![mock_descriptor(false)])
    }

    fn set_output_device(&self, _device_id: Option<&str>) -> Result<DeviceDescriptor> {
        if *self.started.lock().unwrap() {
            return Err(crate::Error::InvalidState);
        }
        Ok(mock_descriptor(true))
    }

    fn set_input_device(&self, _device_id: Option<&str>) -> Result<DeviceDescriptor> {
        if *self.started.lock().unwrap() {
            return Err(crate::Error::InvalidState);
        }
        Ok(mock_descriptor(false))
    }

    fn activation(&self) -> ActivationState {
        match self.rings.lock().unwrap().clone() {
            Some(rings) => rings.activation_state(),
            None => ActivationState::Idle,
        }
    }

    fn prebuffer_state(&self) -> PrebufferState {
        match self.rings.lock().unwrap().clone() {
            Some(rings) => rings.prebuffer_state(),
            None => PrebufferState::Buffering,
        }
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

fn mock_descriptor(output: bool) -> DeviceDescriptor {
    DeviceDescriptor {
        id: if output { MOCK_OUTPUT_ID } else { MOCK_INPUT_ID }.to_string(),
        name: "Mock Device".to_string(),
        backend_api: "mock".to_string(),
        is_input: !output,
        is_output: output,
        is_default: true,
        state: DeviceState::Active,
        max_input_channels: if output { 0 } else { 2 },
        max_output_channels: if output { 2 } else { 0 },
    }
}
