//! Trivial scalar gain stage (§4.I).

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;

use wavecore_core::{DspEffect, EffectId, ParamDescriptor, ParamId, ParamUnit, ParameterInfo};

/// Configuration consumed by [`Volume::initialize`].
#[derive(Debug, Clone, Copy)]
pub struct VolumeConfig {
    /// Audio sample rate in Hz (unused by volume itself, carried for
    /// contract symmetry with the other effects).
    pub sample_rate: f32,
    /// Number of interleaved channels `process` will receive.
    pub channels: usize,
}

/// Multiplies every sample by a volume factor.
#[derive(Debug, Clone)]
pub struct Volume {
    id: EffectId,
    name: String,
    enabled: bool,
    mix: f32,
    factor: f32,
    channels: usize,
}

impl Volume {
    /// Create a volume stage at unity gain for `channels` channels.
    pub fn new(id: EffectId, channels: usize) -> Self {
        Self {
            id,
            name: String::from("Volume"),
            enabled: true,
            mix: 1.0,
            factor: 1.0,
            channels: channels.max(1),
        }
    }

    /// Set the volume factor (linear, unclamped — callers wanting a
    /// documented range should clamp before calling, e.g. `[0, 4]`).
    pub fn set_factor(&mut self, factor: f32) {
        self.factor = factor;
    }

    /// Current volume factor.
    pub fn factor(&self) -> f32 {
        self.factor
    }
}

impl DspEffect for Volume {
    type Config = VolumeConfig;

    fn initialize(&mut self, config: VolumeConfig) {
        self.channels = config.channels.max(1);
    }

    fn process(&mut self, buffer: &mut [f32], frame_count: usize) {
        if !self.is_active() {
            return;
        }
        let n = (frame_count * self.channels).min(buffer.len());
        for sample in &mut buffer[..n] {
            *sample *= self.factor;
        }
    }

    fn reset(&mut self) {}

    fn dispose(&mut self) {}

    fn id(&self) -> EffectId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn mix(&self) -> f32 {
        self.mix
    }

    fn set_mix(&mut self, mix: f32) {
        self.mix = mix.clamp(0.0, 1.0);
    }
}

impl ParameterInfo for Volume {
    fn param_count(&self) -> usize {
        1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(
                ParamDescriptor {
                    name: "Volume",
                    short_name: "Volume",
                    unit: ParamUnit::None,
                    min: 0.0,
                    max: 4.0,
                    default: 1.0,
                    step: 0.01,
                    ..ParamDescriptor::mix()
                }
                .with_id(ParamId(1500), "vol_factor"),
            ),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.factor,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index == 0 {
            if let Some(desc) = self.param_info(0) {
                self.factor = desc.clamp(value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scales_every_sample() {
        let mut vol = Volume::new(EffectId(1), 1);
        vol.set_factor(0.5);
        let mut buf = [1.0_f32, -2.0, 0.25];
        vol.process(&mut buf, 3);
        assert_eq!(buf, [0.5, -1.0, 0.125]);
    }

    #[test]
    fn disabled_is_a_no_op() {
        let mut vol = Volume::new(EffectId(2), 1);
        vol.set_factor(2.0);
        vol.set_enabled(false);
        let mut buf = [1.0_f32, -2.0];
        vol.process(&mut buf, 2);
        assert_eq!(buf, [1.0, -2.0]);
    }

    #[test]
    fn parameter_info_clamps_to_documented_range() {
        let mut vol = Volume::new(EffectId(3), 1);
        assert_eq!(vol.param_count(), 1);

        vol.set_param(0, 2.5);
        assert_eq!(vol.get_param(0), 2.5);
        assert_eq!(vol.factor(), 2.5);

        vol.set_param(0, 100.0);
        assert_eq!(vol.get_param(0), 4.0);
    }
}
