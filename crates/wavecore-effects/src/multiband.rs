//! Multiband compressor/EQ: crossover into bands, peaking EQ + compressor per
//! band, sum, then a broadband dynamic amplifier stage (§4.I).
//!
//! Pipeline: `split into bands -> per band (peaking biquad, then compressor)
//! -> sum bands -> dynamic amp`. Band boundaries follow the ISO 10-band
//! graphic-EQ center frequencies (31, 62, 125, 250, 500, 1k, 2k, 4k, 8k,
//! 16k Hz); the nine crossover cuts sit at the geometric mean between
//! adjacent centers, and each band's peaking filter is centered on that
//! band's own center frequency.

#[cfg(not(feature = "std"))]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;

use libm::{log10f, powf, sqrtf};
use wavecore_core::{
    Biquad, DspEffect, EffectId, EnvelopeFollower, MultibandCrossover, ParamDescriptor, ParamId,
    ParamUnit, ParameterInfo,
};

/// ISO 10-band graphic-EQ center frequencies.
pub const BAND_CENTERS_HZ: [f32; 10] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Number of bands in the fixed 10-band layout.
pub const BAND_COUNT: usize = BAND_CENTERS_HZ.len();

fn crossover_cuts(sample_rate: f32) -> Vec<f32> {
    let nyquist_margin = sample_rate * 0.49;
    BAND_CENTERS_HZ
        .windows(2)
        .map(|pair| sqrtf(pair[0] * pair[1]).min(nyquist_margin))
        .collect()
}

#[inline]
fn linear_to_db(linear: f32) -> f32 {
    20.0 * log10f(linear.max(1e-9))
}

#[inline]
fn db_to_linear(db: f32) -> f32 {
    powf(10.0, db / 20.0)
}

/// Peaking biquad with a center frequency and gain, guarded against
/// degenerate parameters (frequency ≤ 0 or Q ≤ 0 neutralise to passthrough
/// rather than producing NaN/Inf coefficients).
#[derive(Debug, Clone)]
struct PeakingBand {
    biquad: Biquad,
    frequency: f32,
    q: f32,
    gain_db: f32,
    sample_rate: f32,
}

impl PeakingBand {
    fn new(frequency: f32, sample_rate: f32) -> Self {
        let mut band = Self {
            biquad: Biquad::new(),
            frequency,
            q: 1.0,
            gain_db: 0.0,
            sample_rate,
        };
        band.update();
        band
    }

    fn set_gain_db(&mut self, gain_db: f32) {
        self.gain_db = gain_db.clamp(-12.0, 12.0);
        self.update();
    }

    fn update(&mut self) {
        if self.frequency <= 0.0 || self.q <= 0.0 {
            self.biquad.set_coefficients(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
            return;
        }
        let (b0, b1, b2, a0, a1, a2) = wavecore_core::peaking_eq_coefficients(
            self.frequency,
            self.q,
            self.gain_db,
            self.sample_rate,
        );
        self.biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        self.biquad.process(input)
    }

    fn reset(&mut self) {
        self.biquad.clear();
    }
}

/// Static per-band compressor: log-domain envelope, no-knee gain curve
/// `gain_dB = -max(0, input_dB - threshold_dB) * (1 - 1/ratio)`.
#[derive(Debug, Clone)]
struct BandCompressor {
    envelope: EnvelopeFollower,
    threshold_db: f32,
    ratio: f32,
    makeup_db: f32,
}

impl BandCompressor {
    fn new(sample_rate: f32) -> Self {
        Self {
            envelope: EnvelopeFollower::new(sample_rate),
            threshold_db: -18.0,
            ratio: 3.0,
            makeup_db: 0.0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let envelope_linear = self.envelope.process(input);
        let input_db = linear_to_db(envelope_linear);
        let gain_db = -(input_db - self.threshold_db).max(0.0) * (1.0 - 1.0 / self.ratio);
        input * db_to_linear(gain_db + self.makeup_db)
    }

    fn reset(&mut self) {
        self.envelope.reset();
    }
}

/// Broadband final stage: pushes output RMS toward `target_db`, clamped by
/// `max_gain_db`.
#[derive(Debug, Clone)]
struct DynamicAmp {
    target_db: f32,
    attack_coeff: f32,
    release_coeff: f32,
    max_gain_db: f32,
    rms_smoothed: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

fn one_pole_coeff(time_ms: f32, sample_rate: f32) -> f32 {
    let tau = time_ms * sample_rate / 1000.0;
    if tau < 1.0 {
        0.0
    } else {
        libm::expf(-1.0 / tau)
    }
}

impl DynamicAmp {
    fn new(sample_rate: f32) -> Self {
        let attack_ms = 20.0;
        let release_ms = 200.0;
        Self {
            target_db: -12.0,
            attack_coeff: one_pole_coeff(attack_ms, sample_rate),
            release_coeff: one_pole_coeff(release_ms, sample_rate),
            max_gain_db: 12.0,
            rms_smoothed: 0.0,
            sample_rate,
            attack_ms,
            release_ms,
        }
    }

    fn set_attack_ms(&mut self, ms: f32) {
        self.attack_ms = ms.clamp(1.0, 1000.0);
        self.attack_coeff = one_pole_coeff(self.attack_ms, self.sample_rate);
    }

    fn set_release_ms(&mut self, ms: f32) {
        self.release_ms = ms.clamp(1.0, 1000.0);
        self.release_coeff = one_pole_coeff(self.release_ms, self.sample_rate);
    }

    fn set_target_db(&mut self, db: f32) {
        self.target_db = db.clamp(-40.0, 0.0);
    }

    fn set_max_gain_db(&mut self, db: f32) {
        self.max_gain_db = db.clamp(0.0, 24.0);
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let power = input * input;
        let coeff = if power > self.rms_smoothed {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.rms_smoothed = coeff * self.rms_smoothed + (1.0 - coeff) * power;
        let rms_db = linear_to_db(sqrtf(self.rms_smoothed));

        let gain_db = (self.target_db - rms_db).clamp(-self.max_gain_db, self.max_gain_db);
        input * db_to_linear(gain_db)
    }

    fn reset(&mut self) {
        self.rms_smoothed = 0.0;
    }
}

struct ChannelProcessor {
    crossover: MultibandCrossover,
    eq_bands: Vec<PeakingBand>,
    compressors: Vec<BandCompressor>,
    dynamic_amp: DynamicAmp,
    bands: Vec<Vec<f32>>,
}

impl ChannelProcessor {
    fn new(sample_rate: f32) -> Self {
        let cuts = crossover_cuts(sample_rate);
        Self {
            crossover: MultibandCrossover::new(&cuts, sample_rate),
            eq_bands: BAND_CENTERS_HZ
                .iter()
                .map(|&f| PeakingBand::new(f, sample_rate))
                .collect(),
            compressors: (0..BAND_COUNT).map(|_| BandCompressor::new(sample_rate)).collect(),
            dynamic_amp: DynamicAmp::new(sample_rate),
            bands: (0..BAND_COUNT).map(|_| Vec::new()).collect(),
        }
    }

    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        let n = input.len();
        for band in &mut self.bands {
            band.resize(n, 0.0);
        }
        self.crossover.process_to_bands(input, &mut self.bands);

        for (i, band) in self.bands.iter_mut().enumerate() {
            let eq = &mut self.eq_bands[i];
            let comp = &mut self.compressors[i];
            for sample in band.iter_mut() {
                *sample = comp.process(eq.process(*sample));
            }
        }

        self.crossover.combine_bands(&self.bands, output);
        for sample in output.iter_mut() {
            *sample = self.dynamic_amp.process(*sample);
        }
    }

    fn reset(&mut self) {
        self.crossover.reset();
        for eq in &mut self.eq_bands {
            eq.reset();
        }
        for comp in &mut self.compressors {
            comp.reset();
        }
        self.dynamic_amp.reset();
    }
}

/// Configuration consumed by [`Multiband::initialize`].
#[derive(Debug, Clone, Copy)]
pub struct MultibandConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: f32,
    /// Number of interleaved channels `process` will receive.
    pub channels: usize,
}

/// Composite multiband compressor/EQ implementing the [`DspEffect`] contract.
pub struct Multiband {
    id: EffectId,
    name: String,
    enabled: bool,
    mix: f32,
    sample_rate: f32,
    channels: Vec<ChannelProcessor>,
    eq_gains_db: [f32; BAND_COUNT],
    comp_threshold_db: f32,
    comp_ratio: f32,
    comp_attack_ms: f32,
    comp_release_ms: f32,
    comp_makeup_db: f32,
    amp_target_db: f32,
    amp_attack_ms: f32,
    amp_release_ms: f32,
    amp_max_gain_db: f32,
    scratch_in: Vec<f32>,
    scratch_out: Vec<f32>,
}

impl Multiband {
    /// Create a flat (0 dB everywhere), default-compression multiband effect.
    pub fn new(id: EffectId, sample_rate: f32, channels: usize) -> Self {
        let channels = channels.max(1);
        Self {
            id,
            name: String::from("Multiband"),
            enabled: true,
            mix: 1.0,
            sample_rate,
            channels: (0..channels).map(|_| ChannelProcessor::new(sample_rate)).collect(),
            eq_gains_db: [0.0; BAND_COUNT],
            comp_threshold_db: -18.0,
            comp_ratio: 3.0,
            comp_attack_ms: 10.0,
            comp_release_ms: 100.0,
            comp_makeup_db: 0.0,
            amp_target_db: -12.0,
            amp_attack_ms: 20.0,
            amp_release_ms: 200.0,
            amp_max_gain_db: 12.0,
            scratch_in: Vec::new(),
            scratch_out: Vec::new(),
        }
    }

    /// Set the 10-band EQ gain vector (dB, clamped to `[-12, 12]` per band).
    pub fn set_eq_gains_db(&mut self, gains: &[f32; BAND_COUNT]) {
        self.eq_gains_db = *gains;
        for channel in &mut self.channels {
            for (band, &gain) in channel.eq_bands.iter_mut().zip(gains.iter()) {
                band.set_gain_db(gain);
            }
        }
    }

    /// Current 10-band EQ gain vector.
    pub fn eq_gains_db(&self) -> [f32; BAND_COUNT] {
        self.eq_gains_db
    }

    /// Set per-band compressor parameters uniformly across all bands.
    pub fn set_compressor_params(
        &mut self,
        threshold_db: f32,
        ratio: f32,
        attack_ms: f32,
        release_ms: f32,
        makeup_db: f32,
    ) {
        self.comp_threshold_db = threshold_db.clamp(-60.0, 0.0);
        self.comp_ratio = ratio.clamp(1.0, 20.0);
        self.comp_attack_ms = attack_ms.clamp(0.1, 500.0);
        self.comp_release_ms = release_ms.clamp(1.0, 2000.0);
        self.comp_makeup_db = makeup_db.clamp(-24.0, 24.0);
        for channel in &mut self.channels {
            for comp in &mut channel.compressors {
                comp.threshold_db = self.comp_threshold_db;
                comp.ratio = self.comp_ratio;
                comp.envelope.set_attack_ms(self.comp_attack_ms);
                comp.envelope.set_release_ms(self.comp_release_ms);
                comp.makeup_db = self.comp_makeup_db;
            }
        }
    }

    /// Set the final dynamic-amplifier stage's parameters.
    pub fn set_dynamic_amp_params(
        &mut self,
        target_db: f32,
        attack_ms: f32,
        release_ms: f32,
        max_gain_db: f32,
    ) {
        self.amp_target_db = target_db.clamp(-40.0, 0.0);
        self.amp_attack_ms = attack_ms.clamp(1.0, 1000.0);
        self.amp_release_ms = release_ms.clamp(1.0, 1000.0);
        self.amp_max_gain_db = max_gain_db.clamp(0.0, 24.0);
        for channel in &mut self.channels {
            channel.dynamic_amp.set_target_db(self.amp_target_db);
            channel.dynamic_amp.set_attack_ms(self.amp_attack_ms);
            channel.dynamic_amp.set_release_ms(self.amp_release_ms);
            channel.dynamic_amp.set_max_gain_db(self.amp_max_gain_db);
        }
    }
}

impl DspEffect for Multiband {
    type Config = MultibandConfig;

    fn initialize(&mut self, config: MultibandConfig) {
        self.sample_rate = config.sample_rate;
        let channels = config.channels.max(1);
        self.channels = (0..channels)
            .map(|_| ChannelProcessor::new(self.sample_rate))
            .collect();
        self.set_eq_gains_db(&self.eq_gains_db.clone());
        self.set_compressor_params(
            self.comp_threshold_db,
            self.comp_ratio,
            self.comp_attack_ms,
            self.comp_release_ms,
            self.comp_makeup_db,
        );
        self.set_dynamic_amp_params(
            self.amp_target_db,
            self.amp_attack_ms,
            self.amp_release_ms,
            self.amp_max_gain_db,
        );
    }

    fn process(&mut self, buffer: &mut [f32], frame_count: usize) {
        if !self.is_active() {
            return;
        }
        let channel_count = self.channels.len();
        let frames = frame_count.min(buffer.len() / channel_count.max(1));

        if self.scratch_in.len() != frames {
            self.scratch_in.resize(frames, 0.0);
            self.scratch_out.resize(frames, 0.0);
        }

        for (ch, channel) in self.channels.iter_mut().enumerate() {
            for frame in 0..frames {
                self.scratch_in[frame] = buffer[frame * channel_count + ch];
            }
            channel.process_block(&self.scratch_in, &mut self.scratch_out);
            for frame in 0..frames {
                let idx = frame * channel_count + ch;
                let dry = buffer[idx];
                buffer[idx] = dry * (1.0 - self.mix) + self.scratch_out[frame] * self.mix;
            }
        }
    }

    fn reset(&mut self) {
        for channel in &mut self.channels {
            channel.reset();
        }
    }

    fn dispose(&mut self) {
        self.channels.clear();
        self.scratch_in.clear();
        self.scratch_out.clear();
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

impl ParameterInfo for Multiband {
    fn param_count(&self) -> usize {
        BAND_COUNT + 5 + 4 + 1
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        if index < BAND_COUNT {
            let hz = BAND_CENTERS_HZ[index];
            return Some(
                ParamDescriptor::gain_db(
                    Self::EQ_BAND_NAMES[index],
                    Self::EQ_BAND_NAMES[index],
                    -12.0,
                    12.0,
                    0.0,
                )
                .with_id(ParamId(1400 + index as u32), "mb_eq_band")
                .with_group("eq"),
            );
        }
        match index - BAND_COUNT {
            0 => Some(
                ParamDescriptor::gain_db("Comp Threshold", "CThresh", -60.0, 0.0, -18.0)
                    .with_id(ParamId(1410), "mb_comp_threshold")
                    .with_group("compressor"),
            ),
            1 => Some(
                ParamDescriptor {
                    name: "Comp Ratio",
                    short_name: "Ratio",
                    unit: ParamUnit::Ratio,
                    min: 1.0,
                    max: 20.0,
                    default: 3.0,
                    step: 0.1,
                    ..ParamDescriptor::mix()
                }
                .with_id(ParamId(1411), "mb_comp_ratio")
                .with_group("compressor"),
            ),
            2 => Some(
                ParamDescriptor::time_ms("Comp Attack", "CAtk", 0.1, 500.0, 10.0)
                    .with_id(ParamId(1412), "mb_comp_attack")
                    .with_group("compressor"),
            ),
            3 => Some(
                ParamDescriptor::time_ms("Comp Release", "CRel", 1.0, 2000.0, 100.0)
                    .with_id(ParamId(1413), "mb_comp_release")
                    .with_group("compressor"),
            ),
            4 => Some(
                ParamDescriptor::gain_db("Comp Makeup", "CMkup", -24.0, 24.0, 0.0)
                    .with_id(ParamId(1414), "mb_comp_makeup")
                    .with_group("compressor"),
            ),
            5 => Some(
                ParamDescriptor::gain_db("Amp Target", "ATarget", -40.0, 0.0, -12.0)
                    .with_id(ParamId(1420), "mb_amp_target")
                    .with_group("amp"),
            ),
            6 => Some(
                ParamDescriptor::time_ms("Amp Attack", "AAtk", 1.0, 1000.0, 20.0)
                    .with_id(ParamId(1421), "mb_amp_attack")
                    .with_group("amp"),
            ),
            7 => Some(
                ParamDescriptor::time_ms("Amp Release", "ARel", 1.0, 1000.0, 200.0)
                    .with_id(ParamId(1422), "mb_amp_release")
                    .with_group("amp"),
            ),
            8 => Some(
                ParamDescriptor::gain_db("Amp Max Gain", "AMax", 0.0, 24.0, 12.0)
                    .with_id(ParamId(1423), "mb_amp_max_gain")
                    .with_group("amp"),
            ),
            9 => Some(ParamDescriptor::mix().with_id(ParamId(1430), "mb_mix")),
            _ => None,
        }
    }

    fn get_param(&self, index: usize) -> f32 {
        if index < BAND_COUNT {
            return self.eq_gains_db[index];
        }
        match index - BAND_COUNT {
            0 => self.comp_threshold_db,
            1 => self.comp_ratio,
            2 => self.comp_attack_ms,
            3 => self.comp_release_ms,
            4 => self.comp_makeup_db,
            5 => self.amp_target_db,
            6 => self.amp_attack_ms,
            7 => self.amp_release_ms,
            8 => self.amp_max_gain_db,
            9 => self.mix * 100.0,
            _ => 0.0,
        }
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if index < BAND_COUNT {
            let mut gains = self.eq_gains_db;
            gains[index] = value.clamp(-12.0, 12.0);
            self.set_eq_gains_db(&gains);
            return;
        }
        match index - BAND_COUNT {
            0 => self.set_compressor_params(
                value,
                self.comp_ratio,
                self.comp_attack_ms,
                self.comp_release_ms,
                self.comp_makeup_db,
            ),
            1 => self.set_compressor_params(
                self.comp_threshold_db,
                value,
                self.comp_attack_ms,
                self.comp_release_ms,
                self.comp_makeup_db,
            ),
            2 => self.set_compressor_params(
                self.comp_threshold_db,
                self.comp_ratio,
                value,
                self.comp_release_ms,
                self.comp_makeup_db,
            ),
            3 => self.set_compressor_params(
                self.comp_threshold_db,
                self.comp_ratio,
                self.comp_attack_ms,
                value,
                self.comp_makeup_db,
            ),
            4 => self.set_compressor_params(
                self.comp_threshold_db,
                self.comp_ratio,
                self.comp_attack_ms,
                self.comp_release_ms,
                value,
            ),
            5 => self.set_dynamic_amp_params(
                value,
                self.amp_attack_ms,
                self.amp_release_ms,
                self.amp_max_gain_db,
            ),
            6 => self.set_dynamic_amp_params(
                self.amp_target_db,
                value,
                self.amp_release_ms,
                self.amp_max_gain_db,
            ),
            7 => self.set_dynamic_amp_params(
                self.amp_target_db,
                self.amp_attack_ms,
                value,
                self.amp_max_gain_db,
            ),
            8 => self.set_dynamic_amp_params(
                self.amp_target_db,
                self.amp_attack_ms,
                self.amp_release_ms,
                value,
            ),
            9 => self.set_mix(value / 100.0),
            _ => {}
        }
    }
}

impl Multiband {
    /// Display names for the 10 EQ-band parameters, in band order.
    const EQ_BAND_NAMES: [&'static str; BAND_COUNT] = [
        "Band 31", "Band 62", "Band 125", "Band 250", "Band 500", "Band 1k", "Band 2k",
        "Band 4k", "Band 8k", "Band 16k",
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_peaking_band_stays_passthrough() {
        let mut band = PeakingBand::new(-10.0, 48_000.0);
        band.set_gain_db(6.0);
        for i in 0..10 {
            let out = band.process(i as f32 * 0.1);
            assert!(out.is_finite());
        }
    }

    #[test]
    fn ten_band_layout_has_nine_cuts() {
        let cuts = crossover_cuts(44_100.0);
        assert_eq!(cuts.len(), BAND_COUNT - 1);
        for pair in cuts.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn flat_eq_and_unity_compression_roughly_preserves_signal() {
        let sample_rate = 44_100.0;
        let mut mb = Multiband::new(EffectId(1), sample_rate, 1);
        mb.set_mix(1.0);
        mb.set_compressor_params(0.0, 1.0, 5.0, 50.0, 0.0);
        mb.set_dynamic_amp_params(0.0, 10_000.0, 10_000.0, 0.0);

        let n = sample_rate as usize;
        let mut buf: Vec<f32> = (0..n)
            .map(|i| {
                let t = i as f32 / sample_rate;
                libm::sinf(core::f32::consts::TAU * 440.0 * t) * 0.2
            })
            .collect();
        mb.process(&mut buf, n);
        assert!(buf.iter().all(|s| s.is_finite()));
    }

    #[test]
    fn disabled_multiband_is_a_no_op() {
        let mut mb = Multiband::new(EffectId(2), 44_100.0, 1);
        mb.set_enabled(false);
        let mut buf = vec![0.3_f32, -0.6, 0.9];
        let original = buf.clone();
        mb.process(&mut buf, 3);
        assert_eq!(buf, original);
    }

    #[test]
    fn reset_clears_filter_and_envelope_history() {
        let mut mb = Multiband::new(EffectId(3), 44_100.0, 1);
        let mut buf = vec![1.0_f32; 2048];
        mb.process(&mut buf, 2048);
        mb.reset();
        // A silent block right after reset should stay silent.
        let mut silence = vec![0.0_f32; 64];
        mb.process(&mut silence, 64);
        assert!(silence.iter().all(|&s| s.abs() < 1e-3));
    }

    #[test]
    fn parameter_info_covers_bands_compressor_amp_and_mix() {
        let mb = Multiband::new(EffectId(4), 44_100.0, 1);
        assert_eq!(mb.param_count(), BAND_COUNT + 5 + 4 + 1);
        for i in 0..mb.param_count() {
            assert!(mb.param_info(i).is_some());
        }
        assert!(mb.param_info(mb.param_count()).is_none());
    }

    #[test]
    fn parameter_info_eq_band_round_trips() {
        let mut mb = Multiband::new(EffectId(5), 44_100.0, 1);
        mb.set_param(3, 6.0);
        assert_eq!(mb.get_param(3), 6.0);
        assert_eq!(mb.eq_gains_db()[3], 6.0);
    }

    #[test]
    fn parameter_info_compressor_and_amp_round_trip() {
        let mut mb = Multiband::new(EffectId(6), 44_100.0, 1);
        let comp_threshold_idx = BAND_COUNT;
        mb.set_param(comp_threshold_idx, -24.0);
        assert_eq!(mb.get_param(comp_threshold_idx), -24.0);

        let amp_target_idx = BAND_COUNT + 5;
        mb.set_param(amp_target_idx, -20.0);
        assert_eq!(mb.get_param(amp_target_idx), -20.0);
    }
}
