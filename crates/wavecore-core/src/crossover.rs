//! Linkwitz–Riley crossover filters.
//!
//! A Linkwitz–Riley crossover splits a signal into complementary
//! lowpass/highpass bands whose magnitudes sum back to (approximately)
//! the original signal. Each 2-way split is built from two cascaded RBJ
//! Butterworth sections per side (giving the canonical 4th-order,
//! -24 dB/octave LR4 slope); cascading two matched-phase Butterworth
//! stages is what makes the LP+HP sum reconstruct the input without
//! needing to invert either band's polarity.
//!
//! [`MultibandCrossover`] chains 2-way splits into an N-cut, (N+1)-band
//! tree: cutting at `[f1, f2, f3]` yields bands `[0,f1], (f1,f2], (f2,f3],
//! (f3,inf)`.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::biquad::{Biquad, lowpass_coefficients, highpass_coefficients};

/// One 2-way Linkwitz–Riley split: lowpass below `frequency`, highpass
/// above it, 4th-order (two cascaded 2nd-order Butterworth sections per
/// side).
#[derive(Debug, Clone)]
pub struct LinkwitzRiley2Way {
    lp_a: Biquad,
    lp_b: Biquad,
    hp_a: Biquad,
    hp_b: Biquad,
    frequency: f32,
    sample_rate: f32,
}

/// Butterworth Q for a single RBJ section cascaded into an LR4 stage.
const BUTTERWORTH_Q: f32 = core::f32::consts::FRAC_1_SQRT_2;

impl LinkwitzRiley2Way {
    /// Create a crossover splitting at `frequency` Hz.
    pub fn new(frequency: f32, sample_rate: f32) -> Self {
        let mut xover = Self {
            lp_a: Biquad::new(),
            lp_b: Biquad::new(),
            hp_a: Biquad::new(),
            hp_b: Biquad::new(),
            frequency,
            sample_rate,
        };
        xover.update_coefficients();
        xover
    }

    /// Change the split frequency, recomputing coefficients and
    /// preserving filter history (no click-free guarantee is made;
    /// callers that need smoothing should ramp and call this per block).
    pub fn set_frequency(&mut self, frequency: f32) {
        self.frequency = frequency;
        self.update_coefficients();
    }

    /// Change the sample rate; recomputes coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.update_coefficients();
    }

    fn update_coefficients(&mut self) {
        // Guard against a degenerate frequency: neutralise to a
        // passthrough/silent split rather than feeding NaN/Inf into the
        // biquads (mirrors the per-band biquad's f <= 0 safety rule).
        let freq = self
            .frequency
            .clamp(1.0, self.sample_rate * 0.49 - 1.0);

        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(freq, BUTTERWORTH_Q, self.sample_rate);
        self.lp_a.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.lp_b.set_coefficients(b0, b1, b2, a0, a1, a2);

        let (b0, b1, b2, a0, a1, a2) =
            highpass_coefficients(freq, BUTTERWORTH_Q, self.sample_rate);
        self.hp_a.set_coefficients(b0, b1, b2, a0, a1, a2);
        self.hp_b.set_coefficients(b0, b1, b2, a0, a1, a2);
    }

    /// Split one sample into `(low, high)`.
    #[inline]
    pub fn split(&mut self, input: f32) -> (f32, f32) {
        let low = self.lp_b.process(self.lp_a.process(input));
        let high = self.hp_b.process(self.hp_a.process(input));
        (low, high)
    }

    /// Split a whole block into pre-sized `low`/`high` buffers.
    pub fn split_block(&mut self, input: &[f32], low: &mut [f32], high: &mut [f32]) {
        debug_assert_eq!(input.len(), low.len());
        debug_assert_eq!(input.len(), high.len());
        for i in 0..input.len() {
            let (l, h) = self.split(input[i]);
            low[i] = l;
            high[i] = h;
        }
    }

    /// Clear all filter history.
    pub fn reset(&mut self) {
        self.lp_a.clear();
        self.lp_b.clear();
        self.hp_a.clear();
        self.hp_b.clear();
    }
}

/// N-cut Linkwitz–Riley crossover producing N+1 bands from low to high.
#[derive(Debug, Clone)]
pub struct MultibandCrossover {
    splits: Vec<LinkwitzRiley2Way>,
    band_count: usize,
}

impl MultibandCrossover {
    /// Create a crossover with cut frequencies `cuts` (must be strictly
    /// ascending). Produces `cuts.len() + 1` bands.
    pub fn new(cuts: &[f32], sample_rate: f32) -> Self {
        let splits = cuts
            .iter()
            .map(|&f| LinkwitzRiley2Way::new(f, sample_rate))
            .collect::<Vec<_>>();
        let band_count = splits.len() + 1;
        Self { splits, band_count }
    }

    /// Number of bands this crossover produces.
    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// Split `input` into `bands`, low to high. `bands.len()` must equal
    /// [`band_count`](Self::band_count), and each band buffer must be the
    /// same length as `input`.
    pub fn process_to_bands(&mut self, input: &[f32], bands: &mut [Vec<f32>]) {
        debug_assert_eq!(bands.len(), self.band_count);
        let n = input.len();

        // Tree decomposition: at each cut, split the current "remainder"
        // into a settled low band and a new remainder carrying everything
        // above that cut, until the last split leaves the top band.
        let mut remainder = input.to_vec();
        for (i, split) in self.splits.iter_mut().enumerate() {
            let mut low = vec![0.0; n];
            let mut high = vec![0.0; n];
            split.split_block(&remainder, &mut low, &mut high);
            bands[i].clear();
            bands[i].extend_from_slice(&low);
            remainder = high;
        }
        let last = self.band_count - 1;
        bands[last].clear();
        bands[last].extend_from_slice(&remainder);
    }

    /// Sum `bands` back into `out`. Energy is preserved to within the LR
    /// crossover's inherent tolerance (roughly 0.5 dB at each cut).
    pub fn combine_bands(&self, bands: &[Vec<f32>], out: &mut [f32]) {
        out.fill(0.0);
        for band in bands {
            for (o, &s) in out.iter_mut().zip(band.iter()) {
                *o += s;
            }
        }
    }

    /// Clear all filter history across every split.
    pub fn reset(&mut self) {
        for split in &mut self.splits {
            split.reset();
        }
    }
}
