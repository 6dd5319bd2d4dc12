//! Harmonic exciter: high-pass, drive, and saturate the top end, then blend
//! it back in over the dry signal (§4.I).

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use libm::tanhf;
use wavecore_core::DspEffect;
use wavecore_core::EffectId;
use wavecore_core::{ParamDescriptor, ParamId, ParamUnit, ParameterInfo};

/// Configuration consumed by [`Enhancer::initialize`].
#[derive(Debug, Clone, Copy)]
pub struct EnhancerConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Number of interleaved channels `process` will receive.
    pub channels: usize,
}

/// Single-pole highpass coefficient for cutoff `frequency` at `sample_rate`.
///
/// `RC = 1 / (2π f)`, `α = RC / (RC + 1 / (2π f · sr))`.
fn highpass_alpha(frequency: f32, sample_rate: f32) -> f32 {
    let rc = 1.0 / (core::f32::consts::TAU * frequency);
    let dt = 1.0 / (core::f32::consts::TAU * frequency * sample_rate);
    rc / (rc + dt)
}

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    prev_input: f32,
    prev_output: f32,
}

impl ChannelState {
    fn clear(&mut self) {
        self.prev_input = 0.0;
        self.prev_output = 0.0;
    }

    #[inline]
    fn process(&mut self, input: f32, alpha: f32, gain: f32, mix: f32) -> f32 {
        let hpf_out = alpha * (self.prev_output + input - self.prev_input);
        self.prev_input = input;
        self.prev_output = hpf_out;

        let driven = tanhf(hpf_out * gain / 2.0) * 2.0;
        input + mix * driven
    }
}

/// Harmonic enhancer implementing the [`DspEffect`] contract.
#[derive(Debug, Clone)]
pub struct Enhancer {
    id: EffectId,
    name: String,
    enabled: bool,
    mix: f32,
    gain: f32,
    cutoff_hz: f32,
    sample_rate: f32,
    channels: Vec<ChannelState>,
}

impl Enhancer {
    /// Create an enhancer with defaults (gain 2.0, cutoff 3000 Hz).
    pub fn new(id: EffectId, sample_rate: f32, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            id,
            name: String::from("Enhancer"),
            enabled: true,
            mix: 0.0,
            gain: 2.0,
            cutoff_hz: 3000.0,
            sample_rate,
            channels: vec![ChannelState::default(); channels],
        }
    }

    /// Drive applied before saturation. Clamped to `[0.1, 10]`.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.clamp(0.1, 10.0);
    }

    /// Current drive gain.
    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// High-pass cutoff frequency in Hz. Clamped to `[100, 20000]`.
    pub fn set_cutoff_hz(&mut self, hz: f32) {
        self.cutoff_hz = hz.clamp(100.0, 20_000.0);
    }

    /// Current cutoff frequency in Hz.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff_hz
    }
}

impl DspEffect for Enhancer {
    type Config = EnhancerConfig;

    fn initialize(&mut self, config: EnhancerConfig) {
        self.sample_rate = config.sample_rate;
        let channels = config.channels.max(1);
        self.channels = vec![ChannelState::default(); channels];
    }

    fn process(&mut self, buffer: &mut [f32], frame_count: usize) {
        if !self.is_active() {
            return;
        }
        let channels = self.channels.len();
        let frames = frame_count.min(buffer.len() / channels.max(1));
        let alpha = highpass_alpha(self.cutoff_hz, self.sample_rate);
        let gain = self.gain;
        let mix = self.mix;

        for frame in 0..frames {
            for (ch, state) in self.channels.iter_mut().enumerate() {
                let idx = frame * channels + ch;
                buffer[idx] = state.process(buffer[idx], alpha, gain, mix);
            }
        }
    }

    fn reset(&mut self) {
        for state in &mut self.channels {
            state.clear();
        }
    }

    fn dispose(&mut self) {
        self.channels.clear();
    }

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

impl ParameterInfo for Enhancer {
    fn param_count(&self) -> usize {
        3
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(
                ParamDescriptor {
                    name: "Gain",
                    short_name: "Gain",
                    unit: ParamUnit::None,
                    min: 0.1,
                    max: 10.0,
                    default: 2.0,
                    step: 0.1,
                    ..ParamDescriptor::mix()
                }
                .with_id(ParamId(1300), "enh_gain"),
            ),
            1 => Some(
                ParamDescriptor {
                    name: "Cutoff",
                    short_name: "Cutoff",
                    ..ParamDescriptor::rate_hz(100.0, 20_000.0, 3000.0)
                }
                .with_id(ParamId(1301), "enh_cutoff"),
            ),
            2 => Some(ParamDescriptor::mix().with_id(ParamId(1302), "enh_mix")),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.gain,
            1 => self.cutoff_hz,
            2 => self.mix * 100.0,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.set_gain(value),
            1 => self.set_cutoff_hz(value),
            2 => self.set_mix(value / 100.0),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_mix_passes_through() {
        let mut enh = Enhancer::new(EffectId(1), 48_000.0, 1);
        enh.set_mix(0.0);
        let mut buf = vec![0.3_f32, -0.4, 0.6];
        let original = buf.clone();
        enh.process(&mut buf, 3);
        assert_eq!(buf, original);
    }

    #[test]
    fn full_mix_adds_high_frequency_content() {
        let sample_rate = 48_000.0;
        let mut enh = Enhancer::new(EffectId(2), sample_rate, 1);
        enh.set_mix(1.0);
        enh.set_gain(5.0);
        enh.set_cutoff_hz(1000.0);

        // A 5 kHz tone (well above cutoff) should be driven and saturated,
        // pushing the processed signal away from the unprocessed tone.
        let n = 512;
        let mut buf: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate;
                libm::sinf(core::f32::consts::TAU * 5000.0 * t) * 0.5
            })
            .collect();
        let original = buf.clone();
        enh.process(&mut buf, n);

        let mut max_delta = 0.0_f32;
        for (o, p) in original.iter().zip(buf.iter()) {
            let delta = (o - p).abs();
            if delta > max_delta {
                max_delta = delta;
            }
        }
        assert!(max_delta > 1e-4, "enhancer should perturb the signal");
    }

    #[test]
    fn reset_clears_filter_state() {
        let mut enh = Enhancer::new(EffectId(3), 48_000.0, 1);
        enh.set_mix(1.0);
        let mut buf = vec![1.0_f32; 64];
        enh.process(&mut buf, 64);
        enh.reset();
        assert!(enh.channels[0].prev_input == 0.0);
        assert!(enh.channels[0].prev_output == 0.0);
    }

    #[test]
    fn disabled_enhancer_is_a_no_op() {
        let mut enh = Enhancer::new(EffectId(4), 48_000.0, 1);
        enh.set_mix(1.0);
        enh.set_enabled(false);
        let mut buf = vec![0.2_f32, 0.9, -0.3];
        let original = buf.clone();
        enh.process(&mut buf, 3);
        assert_eq!(buf, original);
    }

    #[test]
    fn parameter_info_round_trips_through_set_get() {
        let mut enh = Enhancer::new(EffectId(5), 48_000.0, 1);
        assert_eq!(enh.param_count(), 3);

        enh.set_param(0, 4.0);
        assert_eq!(enh.get_param(0), 4.0);
        assert_eq!(enh.gain(), 4.0);

        enh.set_param(1, 500.0);
        assert_eq!(enh.cutoff_hz(), 500.0);

        // Clamped at the documented boundary.
        enh.set_param(0, 999.0);
        assert_eq!(enh.get_param(0), 10.0);
    }
}
