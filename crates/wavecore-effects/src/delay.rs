//! Feedback delay with per-channel damping and a soft-clip saturator in the
//! feedback path.
//!
//! Each channel owns an independent circular buffer sized to the current
//! delay time; `write_pos` doubles as both the read and write cursor since
//! the buffer length equals the delay itself — reading `buffer[write_pos]`
//! always yields the sample written exactly `buffer.len()` samples ago,
//! right before it gets overwritten with the new feedback sample.
//!
//! Each channel also keeps its own one-pole damping history. Sharing a
//! single history value across channels (as a naive port from a mono
//! reference implementation might) leaks high-frequency content between
//! channels; keeping history per channel avoids that.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use libm::ceilf;
use wavecore_core::{DspEffect, EffectId, ParamDescriptor, ParamId, ParameterInfo};

/// Soft-clip threshold: input magnitudes below this pass through linearly.
const SATURATOR_THRESHOLD: f32 = 0.7;

/// Configuration consumed by [`Delay::initialize`].
#[derive(Debug, Clone, Copy)]
pub struct DelayConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Number of interleaved channels `process` will receive.
    pub channels: usize,
}

/// Named presets setting `(time_ms, feedback, mix, damping)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelayPreset {
    /// Moderate slap-back-ish starting point.
    Default,
    /// Short, tight single repeat.
    SlapBack,
    /// Mid-length repeats with noticeable feedback.
    ClassicEcho,
    /// Long, heavily damped wash.
    Ambient,
    /// Dotted-feel repeats for rhythmic parts.
    Rhythmic,
    /// Long delay, high feedback, moderate damping.
    PingPong,
    /// Short delay, heavy damping — emulates worn tape HF loss.
    TapeEcho,
    /// Long, dark, heavily-fed-back dub-style delay.
    Dub,
    /// Very short delay used for doubling/thickening, not audible as an echo.
    Thickening,
}

impl DelayPreset {
    /// Return this preset's `(time_ms, feedback, mix, damping)` tuple.
    pub fn values(self) -> (f32, f32, f32, f32) {
        match self {
            Self::Default => (350.0, 0.35, 0.30, 0.20),
            Self::SlapBack => (90.0, 0.15, 0.35, 0.10),
            Self::ClassicEcho => (450.0, 0.45, 0.40, 0.30),
            Self::Ambient => (650.0, 0.55, 0.50, 0.60),
            Self::Rhythmic => (375.0, 0.50, 0.45, 0.25),
            Self::PingPong => (600.0, 0.60, 0.50, 0.35),
            Self::TapeEcho => (250.0, 0.50, 0.40, 0.70),
            Self::Dub => (500.0, 0.70, 0.55, 0.50),
            Self::Thickening => (20.0, 0.10, 0.30, 0.10),
        }
    }
}

/// Compute the delay-line length in samples for `time_ms` at `sample_rate`.
fn delay_samples(time_ms: f32, sample_rate: f32) -> usize {
    (ceilf((time_ms / 1000.0) * sample_rate) as usize).max(1)
}

/// Piecewise soft-clip saturator used in the feedback path: linear below
/// [`SATURATOR_THRESHOLD`], smoothly compressing above it.
#[inline]
fn saturate(x: f32) -> f32 {
    let ax = if x < 0.0 { -x } else { x };
    if ax < SATURATOR_THRESHOLD {
        x
    } else {
        let sign = if x < 0.0 { -1.0 } else { 1.0 };
        let shaped = SATURATOR_THRESHOLD
            + (1.0 - SATURATOR_THRESHOLD) * (1.0 - 1.0 / (1.0 + 2.0 * (ax - SATURATOR_THRESHOLD)));
        shaped * sign
    }
}

/// Per-channel delay line state: circular buffer, cursor, damping history.
#[derive(Debug, Clone)]
struct ChannelLine {
    buffer: Vec<f32>,
    write_pos: usize,
    damping_history: f32,
}

impl ChannelLine {
    fn new(len: usize) -> Self {
        Self {
            buffer: vec![0.0; len],
            write_pos: 0,
            damping_history: 0.0,
        }
    }

    fn resize(&mut self, len: usize) {
        self.buffer = vec![0.0; len];
        self.write_pos = 0;
        self.damping_history = 0.0;
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
        self.damping_history = 0.0;
    }

    /// Advance one sample: returns the damped delayed sample and writes the
    /// saturated feedback signal into the line.
    #[inline]
    fn process(&mut self, input: f32, feedback: f32, damping: f32) -> f32 {
        let delayed = self.buffer[self.write_pos];
        self.damping_history += (1.0 - damping) * (delayed - self.damping_history);
        let delayed_damped = self.damping_history;

        let feedback_signal = saturate(input + delayed_damped * feedback);
        self.buffer[self.write_pos] = feedback_signal;

        self.write_pos += 1;
        if self.write_pos >= self.buffer.len() {
            self.write_pos = 0;
        }

        delayed_damped
    }
}

/// Feedback delay effect implementing the transport-facing [`DspEffect`]
/// contract (§4.H/§4.I).
#[derive(Debug, Clone)]
pub struct Delay {
    id: EffectId,
    name: String,
    enabled: bool,
    mix: f32,
    time_ms: f32,
    feedback: f32,
    damping: f32,
    sample_rate: f32,
    lines: Vec<ChannelLine>,
}

impl Delay {
    /// Create a delay with default parameters (350 ms, no feedback, no mix,
    /// no damping) for `channels` channels at `sample_rate`.
    pub fn new(id: EffectId, sample_rate: f32, channels: usize) -> Self {
        let channels = channels.max(1);
        let len = delay_samples(350.0, sample_rate);
        Self {
            id,
            name: String::from("Delay"),
            enabled: true,
            mix: 0.0,
            time_ms: 350.0,
            feedback: 0.0,
            damping: 0.0,
            sample_rate,
            lines: (0..channels).map(|_| ChannelLine::new(len)).collect(),
        }
    }

    /// Apply a named preset's `(time_ms, feedback, mix, damping)` values.
    pub fn apply_preset(&mut self, preset: DelayPreset) {
        let (time_ms, feedback, mix, damping) = preset.values();
        self.set_time_ms(time_ms);
        self.set_feedback(feedback);
        self.set_mix(mix);
        self.set_damping(damping);
    }

    /// Delay time in milliseconds. Clamped to `[1, 5000]`.
    pub fn set_time_ms(&mut self, time_ms: f32) {
        self.time_ms = time_ms.clamp(1.0, 5000.0);
        self.resize_lines();
    }

    /// Current delay time in milliseconds.
    pub fn time_ms(&self) -> f32 {
        self.time_ms
    }

    /// Feedback amount. Clamped to `[0, 1]`.
    pub fn set_feedback(&mut self, feedback: f32) {
        self.feedback = feedback.clamp(0.0, 1.0);
    }

    /// Current feedback amount.
    pub fn feedback(&self) -> f32 {
        self.feedback
    }

    /// Damping coefficient. Clamped to `[0, 1]`.
    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping.clamp(0.0, 1.0);
    }

    /// Current damping coefficient.
    pub fn damping(&self) -> f32 {
        self.damping
    }

    fn resize_lines(&mut self) {
        let len = delay_samples(self.time_ms, self.sample_rate);
        for line in &mut self.lines {
            line.resize(len);
        }
    }
}

impl DspEffect for Delay {
    type Config = DelayConfig;

    fn initialize(&mut self, config: DelayConfig) {
        self.sample_rate = config.sample_rate;
        let channels = config.channels.max(1);
        let len = delay_samples(self.time_ms, self.sample_rate);
        self.lines = (0..channels).map(|_| ChannelLine::new(len)).collect();
    }

    fn process(&mut self, buffer: &mut [f32], frame_count: usize) {
        if !self.is_active() {
            return;
        }
        let channels = self.lines.len();
        let frames = frame_count.min(buffer.len() / channels.max(1));
        let mix = self.mix;
        let feedback = self.feedback;
        let damping = self.damping;

        for frame in 0..frames {
            for (ch, line) in self.lines.iter_mut().enumerate() {
                let idx = frame * channels + ch;
                let input = buffer[idx];
                let delayed = line.process(input, feedback, damping);
                buffer[idx] = input * (1.0 - mix) + delayed * mix;
            }
        }
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.clear();
        }
    }

    fn dispose(&mut self) {
        for line in &mut self.lines {
            line.buffer.clear();
        }
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

impl ParameterInfo for Delay {
    fn param_count(&self) -> usize {
        4
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(
                ParamDescriptor::time_ms("Time", "Time", 1.0, 5000.0, 350.0)
                    .with_id(ParamId(1100), "dly_time"),
            ),
            1 => Some(ParamDescriptor::feedback().with_id(ParamId(1101), "dly_feedback")),
            2 => Some(
                ParamDescriptor {
                    name: "Damping",
                    short_name: "Damp",
                    min: 0.0,
                    max: 1.0,
                    default: 0.0,
                    step: 0.01,
                    ..ParamDescriptor::mix()
                }
                .with_id(ParamId(1102), "dly_damping"),
            ),
            3 => Some(ParamDescriptor::mix().with_id(ParamId(1103), "dly_mix")),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.time_ms,
            1 => self.feedback * 100.0,
            2 => self.damping * 100.0,
            3 => self.mix * 100.0,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.set_time_ms(value),
            1 => self.set_feedback(value / 100.0),
            2 => self.set_damping(value / 100.0),
            3 => self.set_mix(value / 100.0),
            _ => {}
        }
    }
}
