//! Wavecore Analysis - Spectral analysis and EQ matching
//!
//! This crate measures a signal's spectral and dynamic profile and derives
//! a static correction that moves one signal's profile toward another's:
//!
//! - [`fft`] - FFT wrapper with windowing functions
//! - [`spectrum`] - Spectral analysis utilities (centroid, flux, flatness, rolloff)
//! - [`dynamics`] - Level and dynamics utilities (RMS, peak, crest factor, transients)
//! - [`bands`] - 10-band segmented spectrum analysis (§4.J "Spectrum record")
//! - [`eq_match`] - Direct EQ and dynamic-amp derivation, file-to-file matching
//! - [`presets`] - Built-in playback-system targets for preset-based matching
//! - [`compare`] - A/B comparison tools (correlation, MSE/RMSE, SNR)
//!
//! ## Example workflow
//!
//! ```rust,ignore
//! use wavecore_analysis::process_eq_matching;
//!
//! let report = process_eq_matching("source.wav", "target.wav", "matched.wav")?;
//! println!("applied gains: {:?}", report.gains_db);
//! ```

pub mod bands;
pub mod compare;
pub mod dynamics;
pub mod eq_match;
pub mod fft;
pub mod presets;
pub mod spectrum;

pub use bands::{BAND_CENTERS_HZ, BAND_COUNT, MIN_ANALYSIS_SECS, SpectrumRecord, analyse, band_l2_distance};
pub use compare::{envelope_correlation, mse, rmse, snr_db, spectral_correlation, spectral_difference};
pub use eq_match::{
    DynamicAmpTarget, EqMatchReport, MAX_BAND_GAIN_DB, NEUTRAL_EQ_K, apply_eq_and_amp,
    apply_eq_and_amp_stereo, derive_dynamic_amp, derive_eq_gains, process_eq_matching,
};
pub use fft::{Fft, Window};
pub use presets::{PresentationSystem, PresentationTarget, presentation_target};
pub use spectrum::{magnitude_spectrum, phase_spectrum, spectral_centroid};
