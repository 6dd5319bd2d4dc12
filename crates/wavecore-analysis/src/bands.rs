//! Segmented 10-band spectrum analysis (§4.J).
//!
//! [`SpectrumRecord`] is the unit of measurement EQ matching compares:
//! per-band energies, RMS, peak, dynamic range, and loudness. [`analyse`]
//! computes one from a mono float signal, splitting audio ≥ 10s into
//! overlapping segments and trimmed-mean-averaging band energies and
//! dynamics across them so a single loud or silent segment doesn't skew
//! the result.

use wavecore_io::{Error, Result};

use crate::dynamics;
use crate::fft::{Fft, Window};

/// ISO-ish 10-band log-spaced centers, per §4.J.
pub const BAND_CENTERS_HZ: [f32; 10] = [
    31.25, 62.5, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Number of analysis bands.
pub const BAND_COUNT: usize = BAND_CENTERS_HZ.len();

/// Minimum audio duration analysis accepts; shorter fails with [`Error::TooShort`].
pub const MIN_ANALYSIS_SECS: f32 = 10.0;

const SEGMENT_SECS: f32 = 2.0;
const SEGMENT_OVERLAP: f32 = 0.5;
const TRIM_FRACTION: f32 = 0.1;
const SILENCE_FLOOR_DB: f32 = -50.0;

/// Per-band and broadband measurements for a stream (§4.J "Spectrum record").
///
/// All fields are non-negative and finite except `loudness_dbfs`, which is
/// never positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumRecord {
    /// Per-band energies, normalised to `[0, 1]` over the analysed segment.
    pub bands: [f32; BAND_COUNT],
    /// RMS level, linear.
    pub rms: f32,
    /// Peak level, linear.
    pub peak: f32,
    /// Dynamic range in dB: peak minus the RMS noise floor.
    pub dynamic_range_db: f32,
    /// Loudness in dBFS, mean-square based. Never positive.
    pub loudness_dbfs: f32,
}

/// Band boundary (Hz) between band `i` and `i+1`: the geometric mean of
/// their centers. Band 0 starts at 0 Hz; the last band runs to Nyquist.
fn band_boundaries(nyquist: f32) -> [f32; BAND_COUNT - 1] {
    let mut boundaries = [0.0; BAND_COUNT - 1];
    for i in 0..BAND_COUNT - 1 {
        boundaries[i] = (BAND_CENTERS_HZ[i] * BAND_CENTERS_HZ[i + 1])
            .sqrt()
            .min(nyquist);
    }
    boundaries
}

/// Sum squared-magnitude energy into 10 log-spaced bands, normalised so the
/// loudest band is 1.0 (or all zero if the segment is silent).
fn band_energies(segment: &[f32], sample_rate: f32) -> [f32; BAND_COUNT] {
    let fft_size = segment.len().next_power_of_two().clamp(1024, 8192);
    let fft = Fft::new(fft_size);
    let mut windowed = segment.to_vec();
    windowed.resize(fft_size, 0.0);
    Window::Hann.apply(&mut windowed);

    let spectrum = fft.forward(&windowed);
    let bin_width = sample_rate / fft_size as f32;
    let nyquist = sample_rate / 2.0;
    let boundaries = band_boundaries(nyquist);

    let mut energies = [0.0f32; BAND_COUNT];
    for (bin, c) in spectrum.iter().enumerate() {
        let freq = bin as f32 * bin_width;
        let mag_sq = c.norm_sqr();
        let band = boundaries
            .iter()
            .position(|&edge| freq <= edge)
            .unwrap_or(BAND_COUNT - 1);
        energies[band] += mag_sq;
    }

    let max = energies.iter().cloned().fold(0.0f32, f32::max);
    if max > 1e-12 {
        for e in &mut energies {
            *e /= max;
        }
    }
    energies
}

/// RMS noise floor within a segment: the quietest 50ms window whose level
/// is above a fixed silence threshold, falling back to the segment's
/// overall RMS if every window is at or below that threshold.
fn segment_floor_db(segment: &[f32], sample_rate: f32) -> f32 {
    let window = ((0.05 * sample_rate) as usize).max(64);
    if segment.len() < window {
        return dynamics::rms_db(segment);
    }
    let env_db = dynamics::envelope_db(segment, window, (window / 2).max(1));
    env_db
        .into_iter()
        .filter(|&db| db > SILENCE_FLOOR_DB)
        .fold(f32::MAX, f32::min)
        .min(dynamics::rms_db(segment))
        .max(SILENCE_FLOOR_DB)
}

/// Trimmed mean: drop the top and bottom `fraction` of sorted values, then
/// average what remains. Robust against one outlier segment dominating.
fn trimmed_mean(values: &[f32], fraction: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = sorted.len();
    let trim = (((n as f32) * fraction) as usize).min(n.saturating_sub(1) / 2);
    let kept = &sorted[trim..n - trim];
    kept.iter().sum::<f32>() / kept.len() as f32
}

/// Analyse a mono float signal into a [`SpectrumRecord`].
///
/// Splits audio into overlapping 2s segments and trimmed-mean-averages
/// per-band energies and dynamics across them (§4.J "Segmented analysis").
/// Fails with [`Error::TooShort`] for audio under [`MIN_ANALYSIS_SECS`].
pub fn analyse(samples: &[f32], sample_rate: u32) -> Result<SpectrumRecord> {
    let sr = sample_rate as f32;
    let duration = samples.len() as f32 / sr;
    if duration < MIN_ANALYSIS_SECS {
        return Err(Error::TooShort);
    }

    let segment_len = ((SEGMENT_SECS * sr) as usize).max(1).min(samples.len());
    let hop = ((segment_len as f32 * (1.0 - SEGMENT_OVERLAP)) as usize).max(1);

    let mut band_segments: Vec<[f32; BAND_COUNT]> = Vec::new();
    let mut rms_db_segments: Vec<f32> = Vec::new();
    let mut floor_db_segments: Vec<f32> = Vec::new();

    let mut offset = 0;
    while offset + segment_len <= samples.len() {
        let segment = &samples[offset..offset + segment_len];
        band_segments.push(band_energies(segment, sr));
        rms_db_segments.push(dynamics::rms_db(segment));
        floor_db_segments.push(segment_floor_db(segment, sr));
        offset += hop;
    }
    if band_segments.is_empty() {
        band_segments.push(band_energies(samples, sr));
        rms_db_segments.push(dynamics::rms_db(samples));
        floor_db_segments.push(segment_floor_db(samples, sr));
    }

    let mut bands = [0.0f32; BAND_COUNT];
    for (i, band) in bands.iter_mut().enumerate() {
        let column: Vec<f32> = band_segments.iter().map(|b| b[i]).collect();
        *band = trimmed_mean(&column, TRIM_FRACTION);
    }
    let max_band = bands.iter().cloned().fold(0.0f32, f32::max).max(1e-9);
    for b in &mut bands {
        *b /= max_band;
    }

    let rms_db_avg = trimmed_mean(&rms_db_segments, TRIM_FRACTION);
    let floor_db_avg = trimmed_mean(&floor_db_segments, TRIM_FRACTION);
    let peak_db = dynamics::peak_db(samples);

    Ok(SpectrumRecord {
        bands,
        rms: dynamics::rms(samples),
        peak: dynamics::peak(samples),
        dynamic_range_db: (peak_db - floor_db_avg).max(0.0),
        loudness_dbfs: rms_db_avg.min(0.0),
    })
}

/// Euclidean (L2) distance between two band vectors, used by the
/// non-worsening property test (§8).
pub fn band_l2_distance(a: &SpectrumRecord, b: &SpectrumRecord) -> f32 {
    a.bands
        .iter()
        .zip(b.bands.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn sine(freq: f32, sample_rate: f32, secs: f32) -> Vec<f32> {
        let n = (sample_rate * secs) as usize;
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn too_short_fails() {
        let samples = sine(1000.0, 44100.0, 2.0);
        assert!(matches!(
            analyse(&samples, 44100),
            Err(Error::TooShort)
        ));
    }

    #[test]
    fn long_enough_succeeds_and_is_well_formed() {
        let samples = sine(1000.0, 44100.0, 12.0);
        let record = analyse(&samples, 44100).unwrap();

        for &b in &record.bands {
            assert!(b.is_finite() && b >= 0.0 && b <= 1.0 + 1e-6);
        }
        assert!(record.rms.is_finite() && record.rms >= 0.0);
        assert!(record.peak.is_finite() && record.peak >= 0.0);
        assert!(record.dynamic_range_db.is_finite() && record.dynamic_range_db >= 0.0);
        assert!(record.loudness_dbfs.is_finite() && record.loudness_dbfs <= 0.0);
    }

    #[test]
    fn pure_tone_energy_concentrates_in_its_band() {
        // 1 kHz sine should land mostly in the 1k band (index 5).
        let samples = sine(1000.0, 44100.0, 12.0);
        let record = analyse(&samples, 44100).unwrap();
        let max_band = record
            .bands
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert_eq!(max_band, 5);
    }

    #[test]
    fn band_l2_distance_zero_for_identical_records() {
        let samples = sine(2000.0, 44100.0, 12.0);
        let record = analyse(&samples, 44100).unwrap();
        assert!(band_l2_distance(&record, &record) < 1e-6);
    }
}
