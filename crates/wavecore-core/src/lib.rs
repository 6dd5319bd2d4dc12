//! Wavecore Core - DSP and real-time transport primitives
//!
//! This crate provides the foundational building blocks shared by the
//! transport (ring buffer, buffer pool) and the DSP effects built on top of
//! it (biquads, Linkwitz–Riley crossovers, envelope followers, the
//! [`DspEffect`] contract, and parameter introspection).
//!
//! # Core Abstractions
//!
//! ## Transport (§4.A/§4.B)
//!
//! - [`RingBuffer`] - Lock-free SPSC interleaved-float queue (`std` only)
//! - [`BufferPool`] - Bounded reuse of fixed-size scratch buffers
//!
//! ## Effect contract (§4.H)
//!
//! - [`DspEffect`] - Block-based contract for transport-facing effects
//!   (identity, enabled flag, wet/dry mix, initialize/process/reset/dispose)
//! - [`ParameterInfo`] - Runtime parameter introspection (presets/automation)
//!
//! ## Filters (§4.I)
//!
//! - [`Biquad`] - Second-order IIR filter (direct form I, RBJ cookbook coefficients)
//! - [`LinkwitzRiley2Way`] / [`MultibandCrossover`] - Linkwitz–Riley crossover filters
//!
//! ## Dynamics
//!
//! - [`EnvelopeFollower`] - Log-domain amplitude envelope detection for compressors
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`soft_clip`], [`fast_tanh`], etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! wavecore-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Zero-cost abstractions**: Block-based processing, no dynamic dispatch required

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod buffer_pool;
pub mod crossover;
pub mod dsp_effect;
pub mod envelope;
pub mod math;
pub mod param_info;

#[cfg(feature = "std")]
pub mod ring_buffer;

// Re-export main types at crate root
pub use biquad::{
    Biquad, bandpass_coefficients, highpass_coefficients, lowpass_coefficients, notch_coefficients,
    peaking_eq_coefficients,
};
pub use buffer_pool::BufferPool;
pub use crossover::{LinkwitzRiley2Way, MultibandCrossover};
pub use dsp_effect::{DspEffect, EffectId, MIX_EPSILON};
pub use envelope::EnvelopeFollower;
pub use math::{
    asymmetric_clip, clamp, db_to_linear, fast_tanh, flush_denormal, foldback, hard_clip,
    hz_to_omega, linear_to_db, lerp, mono_sum, ms_to_samples, samples_to_ms, soft_clip, soft_limit,
    soft_limit_stereo, wet_dry_mix, wet_dry_mix_stereo,
};
pub use param_info::{ParamDescriptor, ParamUnit, ParameterInfo};
#[cfg(feature = "std")]
pub use ring_buffer::RingBuffer;
