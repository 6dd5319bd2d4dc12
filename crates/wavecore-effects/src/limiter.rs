//! Lookahead peak limiter with a brickwall ceiling (§4.I).
//!
//! Two parallel circular buffers share one write cursor: `delay` holds raw
//! input samples (read back `lookahead_samples` later), `envelope` holds the
//! instantaneous gain target computed at write time. The gain actually
//! applied to a given output sample is the minimum gain target anywhere in
//! the lookahead window — the worst case the limiter will face between now
//! and when that sample reaches the output — which is what lets lookahead
//! reduce gain *before* a peak arrives instead of reacting to it.
//!
//! That per-sample worst-case gain is then smoothed once more: attack is
//! instantaneous (a new, lower target is adopted immediately), release
//! climbs back toward unity exponentially.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use libm::{expf, fabsf};
use wavecore_core::{DspEffect, EffectId, ParamDescriptor, ParamId, ParameterInfo, db_to_linear};

/// Configuration consumed by [`Limiter::initialize`].
#[derive(Debug, Clone, Copy)]
pub struct LimiterConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Number of interleaved channels `process` will receive.
    pub channels: usize,
}

fn lookahead_samples(lookahead_ms: f32, sample_rate: f32) -> usize {
    (libm::ceilf((lookahead_ms / 1000.0) * sample_rate) as usize).max(1)
}

fn release_coeff(release_ms: f32, sample_rate: f32) -> f32 {
    expf(-1.0 / (release_ms * sample_rate / 1000.0))
}

/// Per-channel lookahead state: delay buffer, gain-target envelope, cursor.
#[derive(Debug, Clone)]
struct ChannelLine {
    delay: Vec<f32>,
    envelope: Vec<f32>,
    write_pos: usize,
    smoothed_gain: f32,
}

impl ChannelLine {
    fn new(len: usize) -> Self {
        Self {
            delay: vec![0.0; len],
            envelope: vec![1.0; len],
            write_pos: 0,
            smoothed_gain: 1.0,
        }
    }

    fn resize(&mut self, len: usize) {
        self.delay = vec![0.0; len];
        self.envelope = vec![1.0; len];
        self.write_pos = 0;
        self.smoothed_gain = 1.0;
    }

    fn clear(&mut self) {
        self.delay.fill(0.0);
        self.envelope.fill(1.0);
        self.write_pos = 0;
        self.smoothed_gain = 1.0;
    }

    #[inline]
    fn process(
        &mut self,
        input: f32,
        threshold_linear: f32,
        ceiling_linear: f32,
        release_coeff: f32,
    ) -> f32 {
        let len = self.delay.len();

        self.delay[self.write_pos] = input;
        let peak = fabsf(input);
        let gain_target = if peak > threshold_linear {
            threshold_linear / peak
        } else {
            1.0
        };
        self.envelope[self.write_pos] = gain_target;

        let mut applied = 1.0_f32;
        for &g in &self.envelope {
            if g < applied {
                applied = g;
            }
        }

        self.smoothed_gain = if applied < self.smoothed_gain {
            applied
        } else {
            release_coeff * self.smoothed_gain + (1.0 - release_coeff) * applied
        };

        let read_pos = (self.write_pos + 1) % len;
        let delayed = self.delay[read_pos];

        self.write_pos = read_pos;

        let out = delayed * self.smoothed_gain;
        out.clamp(-ceiling_linear, ceiling_linear)
    }
}

/// Lookahead peak limiter implementing the [`DspEffect`] contract.
#[derive(Debug, Clone)]
pub struct Limiter {
    id: EffectId,
    name: String,
    enabled: bool,
    mix: f32,
    threshold_db: f32,
    ceiling_db: f32,
    release_ms: f32,
    lookahead_ms: f32,
    sample_rate: f32,
    lines: Vec<ChannelLine>,
}

impl Limiter {
    /// Create a limiter with defaults (threshold −6 dB, ceiling −0.1 dB,
    /// release 50 ms, lookahead 5 ms).
    pub fn new(id: EffectId, sample_rate: f32, channels: usize) -> Self {
        let channels = channels.max(1);
        let len = lookahead_samples(5.0, sample_rate);
        Self {
            id,
            name: String::from("Limiter"),
            enabled: true,
            mix: 1.0,
            threshold_db: -6.0,
            ceiling_db: -0.1,
            release_ms: 50.0,
            lookahead_ms: 5.0,
            sample_rate,
            lines: (0..channels).map(|_| ChannelLine::new(len)).collect(),
        }
    }

    /// Threshold in dB. Clamped to `[-20, 0]`.
    pub fn set_threshold_db(&mut self, db: f32) {
        self.threshold_db = db.clamp(-20.0, 0.0);
    }

    /// Current threshold in dB.
    pub fn threshold_db(&self) -> f32 {
        self.threshold_db
    }

    /// Ceiling in dB. Clamped to `[-2, 0]`.
    pub fn set_ceiling_db(&mut self, db: f32) {
        self.ceiling_db = db.clamp(-2.0, 0.0);
    }

    /// Current ceiling in dB.
    pub fn ceiling_db(&self) -> f32 {
        self.ceiling_db
    }

    /// Release time in milliseconds. Clamped to `[1, 1000]`.
    pub fn set_release_ms(&mut self, ms: f32) {
        self.release_ms = ms.clamp(1.0, 1000.0);
    }

    /// Current release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Lookahead time in milliseconds. Clamped to `[1, 20]`; resizes buffers
    /// and resets state.
    pub fn set_lookahead_ms(&mut self, ms: f32) {
        self.lookahead_ms = ms.clamp(1.0, 20.0);
        let len = lookahead_samples(self.lookahead_ms, self.sample_rate);
        for line in &mut self.lines {
            line.resize(len);
        }
    }

    /// Current lookahead time in milliseconds.
    pub fn lookahead_ms(&self) -> f32 {
        self.lookahead_ms
    }

    /// Current gain reduction in dB, averaged across channels (≤ 0; 0 means
    /// no reduction is being applied).
    pub fn gain_reduction_db(&self) -> f32 {
        if self.lines.is_empty() {
            return 0.0;
        }
        let sum: f32 = self
            .lines
            .iter()
            .map(|l| wavecore_core::linear_to_db(l.smoothed_gain))
            .sum();
        sum / self.lines.len() as f32
    }

    /// True when any channel currently has gain reduction engaged.
    pub fn is_limiting(&self) -> bool {
        self.lines.iter().any(|l| l.smoothed_gain < 0.999)
    }
}

impl DspEffect for Limiter {
    type Config = LimiterConfig;

    fn initialize(&mut self, config: LimiterConfig) {
        self.sample_rate = config.sample_rate;
        let channels = config.channels.max(1);
        let len = lookahead_samples(self.lookahead_ms, self.sample_rate);
        self.lines = (0..channels).map(|_| ChannelLine::new(len)).collect();
    }

    fn process(&mut self, buffer: &mut [f32], frame_count: usize) {
        if !self.is_active() {
            return;
        }
        let channels = self.lines.len();
        let frames = frame_count.min(buffer.len() / channels.max(1));
        let threshold_linear = db_to_linear(self.threshold_db);
        let ceiling_linear = db_to_linear(self.ceiling_db);
        let release_coeff = release_coeff(self.release_ms, self.sample_rate);

        for frame in 0..frames {
            for (ch, line) in self.lines.iter_mut().enumerate() {
                let idx = frame * channels + ch;
                let input = buffer[idx];
                let limited = line.process(input, threshold_linear, ceiling_linear, release_coeff);
                buffer[idx] = input * (1.0 - self.mix) + limited * self.mix;
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
            line.delay.clear();
            line.envelope.clear();
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

impl ParameterInfo for Limiter {
    fn param_count(&self) -> usize {
        4
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        match index {
            0 => Some(
                ParamDescriptor::gain_db("Threshold", "Thresh", -20.0, 0.0, -6.0)
                    .with_id(ParamId(1200), "lim_threshold"),
            ),
            1 => Some(
                ParamDescriptor::gain_db("Ceiling", "Ceiling", -2.0, 0.0, -0.1)
                    .with_id(ParamId(1201), "lim_ceiling"),
            ),
            2 => Some(
                ParamDescriptor::time_ms("Release", "Release", 1.0, 1000.0, 50.0)
                    .with_id(ParamId(1202), "lim_release"),
            ),
            3 => Some(
                ParamDescriptor::time_ms("Lookahead", "Look", 1.0, 20.0, 5.0)
                    .with_id(ParamId(1203), "lim_lookahead"),
            ),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        match index {
            0 => self.threshold_db,
            1 => self.ceiling_db,
            2 => self.release_ms,
            3 => self.lookahead_ms,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        match index {
            0 => self.set_threshold_db(value),
            1 => self.set_ceiling_db(value),
            2 => self.set_release_ms(value),
            3 => self.set_lookahead_ms(value),
            _ => {}
        }
    }
}
