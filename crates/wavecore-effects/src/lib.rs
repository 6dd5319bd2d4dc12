//! Wavecore Effects - real-time DSP effect pipeline
//!
//! Transport-facing effects implementing the [`DspEffect`](wavecore_core::DspEffect)
//! contract (§4.H/§4.I): block-based `process`, an identity, an enabled flag,
//! and a wet/dry mix factor.
//!
//! - [`Delay`] - Feedback delay with per-channel damping and a soft-clip
//!   saturator in the feedback path, plus a named preset table
//! - [`Limiter`] - Lookahead peak limiter with a brickwall ceiling
//! - [`Enhancer`] - High-frequency harmonic exciter
//! - [`Multiband`] - Crossover-split compressor/EQ with a final dynamic amp stage
//! - [`Volume`] - Scalar gain stage
//!
//! ## Example
//!
//! ```rust,ignore
//! use wavecore_core::{DspEffect, EffectId};
//! use wavecore_effects::{Delay, DelayConfig};
//!
//! let mut delay = Delay::new(EffectId(1), 48000.0, 2);
//! delay.initialize(DelayConfig { sample_rate: 48000.0, channels: 2 });
//! delay.set_mix(0.35);
//!
//! let mut buffer = vec![0.0_f32; 1024];
//! delay.process(&mut buffer, 512);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod delay;
pub mod enhancer;
pub mod limiter;
pub mod multiband;
pub mod volume;

// Re-export main types at crate root
pub use delay::{Delay, DelayConfig, DelayPreset};
pub use enhancer::{Enhancer, EnhancerConfig};
pub use limiter::{Limiter, LimiterConfig};
pub use multiband::{Multiband, MultibandConfig};
pub use volume::{Volume, VolumeConfig};
