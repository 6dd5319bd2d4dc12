//! EQ matching: derive and apply a static EQ/amplitude correction that
//! moves a source signal's [`SpectrumRecord`] toward a target one (§4.J
//! "Direct EQ derivation" and "Dynamic-amp derivation").
//!
//! [`process_eq_matching`] is the file-to-file pipeline: analyse both
//! inputs, derive per-band gains and an amplitude target, apply them
//! through [`wavecore_core::biquad`] peaking filters and an
//! [`wavecore_core::envelope`] follower, and write the result next to a
//! report of what was derived.

use std::path::Path;

use wavecore_core::biquad::{Biquad, peaking_eq_coefficients};
use wavecore_core::envelope::EnvelopeFollower;
use wavecore_core::math::{db_to_linear, soft_limit};
use wavecore_io::{Result, StereoSamples, WavSpec, read_wav_stereo, write_wav_stereo};

use crate::bands::{BAND_CENTERS_HZ, BAND_COUNT, MIN_ANALYSIS_SECS, SpectrumRecord, analyse};

/// Neutral constant in the direct EQ derivation formula: how many dB of
/// correction one decade of target/source ratio produces before clamping.
pub const NEUTRAL_EQ_K: f32 = 3.0;

/// Per-band gain clamp, in dB, applied symmetrically.
pub const MAX_BAND_GAIN_DB: f32 = 12.0;

/// Q factor used for every per-band peaking filter.
const BAND_Q: f32 = 1.4;

/// Floor added to band energies before taking their ratio, avoiding
/// `log10(0)` for silent bands.
const EPSILON: f32 = 1e-6;

/// Derive per-band gains (dB) that push `source` toward `target`.
///
/// `gain_i = clamp(K * log10((target_i + eps) / (source_i + eps)), -12, 12)`
/// per §4.J. `K` defaults to [`NEUTRAL_EQ_K`] but callers needing a more or
/// less aggressive match can pass their own.
pub fn derive_eq_gains(source: &SpectrumRecord, target: &SpectrumRecord, k: f32) -> [f32; BAND_COUNT] {
    let mut gains = [0.0f32; BAND_COUNT];
    for i in 0..BAND_COUNT {
        let ratio = (target.bands[i] + EPSILON) / (source.bands[i] + EPSILON);
        let gain_db = k * ratio.log10();
        gains[i] = gain_db.clamp(-MAX_BAND_GAIN_DB, MAX_BAND_GAIN_DB);
    }
    gains
}

/// Target loudness and limiter ceiling for the dynamic-amp stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicAmpTarget {
    /// Desired RMS loudness, dBFS, clamped to `[-20, -5]`.
    pub target_level_db: f32,
    /// Maximum applied makeup gain, dB, clamped to `(0, 10]`.
    pub max_gain_db: f32,
}

/// Derive a [`DynamicAmpTarget`] that moves `source`'s loudness toward
/// `target`'s, bounded per §4.J so matching never produces an unusably
/// quiet or unsafely hot result.
pub fn derive_dynamic_amp(source: &SpectrumRecord, target: &SpectrumRecord) -> DynamicAmpTarget {
    let target_level_db = target.loudness_dbfs.clamp(-20.0, -5.0);
    let needed_gain_db = (target_level_db - source.loudness_dbfs).max(0.0);
    DynamicAmpTarget {
        target_level_db,
        max_gain_db: needed_gain_db.clamp(f32::MIN_POSITIVE, 10.0),
    }
}

/// Per-channel filter bank plus makeup-gain follower applying one set of
/// derived gains to a stream of samples.
struct Matcher {
    bands: [Biquad; BAND_COUNT],
    envelope: EnvelopeFollower,
    amp: DynamicAmpTarget,
}

impl Matcher {
    fn new(gains_db: &[f32; BAND_COUNT], amp: DynamicAmpTarget, sample_rate: f32) -> Self {
        let mut bands: [Biquad; BAND_COUNT] = core::array::from_fn(|_| Biquad::new());
        for i in 0..BAND_COUNT {
            let (b0, b1, b2, a0, a1, a2) =
                peaking_eq_coefficients(BAND_CENTERS_HZ[i], BAND_Q, gains_db[i], sample_rate);
            bands[i].set_coefficients(b0, b1, b2, a0, a1, a2);
        }
        Self {
            bands,
            envelope: EnvelopeFollower::with_times(sample_rate, 10.0, 200.0),
            amp,
        }
    }

    fn process(&mut self, input: f32) -> f32 {
        let mut x = input;
        for band in &mut self.bands {
            x = band.process(x);
        }
        let level = self.envelope.process(x.abs());
        let level_db = if level > 1e-9 {
            20.0 * level.log10()
        } else {
            -120.0
        };
        let gain_db = (self.amp.target_level_db - level_db).clamp(0.0, self.amp.max_gain_db);
        soft_limit(x * db_to_linear(gain_db), 1.0)
    }
}

/// Apply derived gains to a mono signal.
pub fn apply_eq_and_amp(
    samples: &[f32],
    sample_rate: f32,
    gains_db: &[f32; BAND_COUNT],
    amp: DynamicAmpTarget,
) -> Vec<f32> {
    let mut matcher = Matcher::new(gains_db, amp, sample_rate);
    samples.iter().map(|&s| matcher.process(s)).collect()
}

/// Apply derived gains to a stereo signal, one independent matcher per
/// channel so stereo image is preserved (no cross-channel gain linking).
pub fn apply_eq_and_amp_stereo(
    samples: &StereoSamples,
    sample_rate: f32,
    gains_db: &[f32; BAND_COUNT],
    amp: DynamicAmpTarget,
) -> StereoSamples {
    let mut left_matcher = Matcher::new(gains_db, amp, sample_rate);
    let mut right_matcher = Matcher::new(gains_db, amp, sample_rate);
    StereoSamples::new(
        samples.left.iter().map(|&s| left_matcher.process(s)).collect(),
        samples.right.iter().map(|&s| right_matcher.process(s)).collect(),
    )
}

/// Summary of one EQ-matching run: what was derived and measured.
#[derive(Debug, Clone, Copy)]
pub struct EqMatchReport {
    /// Spectrum of the unmodified source.
    pub source: SpectrumRecord,
    /// Spectrum of the target (or preset).
    pub target: SpectrumRecord,
    /// Per-band gains applied, dB.
    pub gains_db: [f32; BAND_COUNT],
    /// Dynamic-amp target applied.
    pub amp: DynamicAmpTarget,
    /// Spectrum of the matched output, before and after — used by the
    /// round-trip non-worsening property (§8): `band_l2_distance(output,
    /// target)` should not exceed `band_l2_distance(source, target)`.
    pub output: SpectrumRecord,
}

/// Run the full file-to-file EQ-matching pipeline (§4.J).
///
/// Reads `source_path` and `target_path`, analyses both (mono downmix;
/// both must be at least [`MIN_ANALYSIS_SECS`] long), derives per-band
/// gains and a dynamic-amp target, applies them to the source's own
/// channel layout (mono or stereo preserved), writes the result to
/// `out_path`, and returns an [`EqMatchReport`].
pub fn process_eq_matching(
    source_path: impl AsRef<Path>,
    target_path: impl AsRef<Path>,
    out_path: impl AsRef<Path>,
) -> Result<EqMatchReport> {
    let (source_stereo, source_spec) = read_wav_stereo(&source_path)?;
    let (target_stereo, _target_spec) = read_wav_stereo(&target_path)?;

    let source_mono = source_stereo.to_mono();
    let target_mono = target_stereo.to_mono();

    let source_record = analyse(&source_mono, source_spec.sample_rate)?;
    let target_record = analyse(&target_mono, source_spec.sample_rate)?;

    let gains_db = derive_eq_gains(&source_record, &target_record, NEUTRAL_EQ_K);
    let amp = derive_dynamic_amp(&source_record, &target_record);

    let sample_rate = source_spec.sample_rate as f32;
    let matched = apply_eq_and_amp_stereo(&source_stereo, sample_rate, &gains_db, amp);

    let out_spec = WavSpec {
        channels: source_spec.channels,
        sample_rate: source_spec.sample_rate,
        bits_per_sample: 16,
    };
    write_wav_stereo(&out_path, &matched, out_spec)?;

    let output_mono = matched.to_mono();
    let output_record = analyse(&output_mono, source_spec.sample_rate)?;

    Ok(EqMatchReport {
        source: source_record,
        target: target_record,
        gains_db,
        amp,
        output: output_record,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_record(level: f32) -> SpectrumRecord {
        SpectrumRecord {
            bands: [level; BAND_COUNT],
            rms: 0.1,
            peak: 0.5,
            dynamic_range_db: 12.0,
            loudness_dbfs: -18.0,
        }
    }

    #[test]
    fn identical_spectra_need_no_gain() {
        let record = flat_record(0.5);
        let gains = derive_eq_gains(&record, &record, NEUTRAL_EQ_K);
        for g in gains {
            assert!(g.abs() < 1e-4);
        }
    }

    #[test]
    fn boosted_target_band_yields_positive_gain() {
        let mut source = flat_record(0.3);
        let mut target = flat_record(0.3);
        target.bands[5] = 1.0;
        source.bands[5] = 0.1;
        let gains = derive_eq_gains(&source, &target, NEUTRAL_EQ_K);
        assert!(gains[5] > 0.0);
    }

    #[test]
    fn gains_never_exceed_clamp() {
        let source = flat_record(0.001);
        let target = flat_record(1.0);
        let gains = derive_eq_gains(&source, &target, NEUTRAL_EQ_K);
        for g in gains {
            assert!(g <= MAX_BAND_GAIN_DB + 1e-3);
        }
    }

    #[test]
    fn dynamic_amp_target_is_bounded() {
        let source = SpectrumRecord {
            loudness_dbfs: -40.0,
            ..flat_record(0.5)
        };
        let target = SpectrumRecord {
            loudness_dbfs: -3.0,
            ..flat_record(0.5)
        };
        let amp = derive_dynamic_amp(&source, &target);
        assert!((-20.0..=-5.0).contains(&amp.target_level_db));
        assert!(amp.max_gain_db > 0.0 && amp.max_gain_db <= 10.0);
    }

    #[test]
    fn apply_eq_and_amp_stays_within_unity() {
        let samples: Vec<f32> = (0..4800)
            .map(|i| (2.0 * std::f32::consts::PI * 440.0 * i as f32 / 48000.0).sin())
            .collect();
        let gains = [6.0; BAND_COUNT];
        let amp = DynamicAmpTarget {
            target_level_db: -6.0,
            max_gain_db: 10.0,
        };
        let out = apply_eq_and_amp(&samples, 48000.0, &gains, amp);
        for s in out {
            assert!(s.abs() <= 1.0 + 1e-4);
        }
    }
}
