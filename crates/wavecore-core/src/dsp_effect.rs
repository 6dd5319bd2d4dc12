//! Shared contract for real-time DSP effects (§4.H).
//!
//! Models the block-based, identity-bearing, enable/mix-gated contract that
//! the transport-facing effects (delay, limiter, enhancer, multiband
//! compressor/EQ, volume) all implement, with a per-effect `Config` type
//! for `initialize`.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::string::String;

/// Opaque effect identity. Stable for the lifetime of the effect instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EffectId(pub u64);

/// Minimum wet/dry mix above which an effect actually processes.
///
/// Below this, §4.H treats the effect as a no-op to avoid paying for
/// near-silent processing and to give bypass a bit-exact escape hatch.
pub const MIX_EPSILON: f32 = 0.001;

/// Every real-time effect implements this contract.
///
/// `process` mutates `buffer` in place and must be a no-op (buffer
/// untouched) when `!self.is_enabled()` or `self.mix() < MIX_EPSILON`.
/// Implementors get that behavior for free by calling
/// [`DspEffect::process_gated`] from their public `process` method, or by
/// checking the gate themselves if they need the dry path's latency to
/// match the wet path's.
pub trait DspEffect {
    /// Effect-specific configuration consumed by `initialize`.
    type Config;

    /// Negotiate/apply configuration (sample rate, channel count, etc.).
    /// May resize internal buffers and resets state as a side effect.
    fn initialize(&mut self, config: Self::Config);

    /// Process `frame_count` frames (i.e. `frame_count * channels`
    /// samples) of interleaved audio in place. Must not allocate or
    /// block when called from the real-time signal path.
    fn process(&mut self, buffer: &mut [f32], frame_count: usize);

    /// Clear internal state (delay lines, filter history, envelopes)
    /// without changing parameters.
    fn reset(&mut self);

    /// Release any resources. After `dispose`, further `process` calls
    /// are unspecified; effects are expected to be dropped afterward.
    fn dispose(&mut self);

    /// Opaque, stable identity.
    fn id(&self) -> EffectId;

    /// Human-readable, mutable display name.
    fn name(&self) -> &str;

    /// Rename the effect. Purely cosmetic; does not affect processing.
    fn set_name(&mut self, name: String);

    /// Whether this effect currently processes audio.
    fn is_enabled(&self) -> bool;

    /// Enable or disable processing. Disabled effects are a no-op in
    /// `process` (the buffer passes through untouched).
    fn set_enabled(&mut self, enabled: bool);

    /// Wet/dry mix in `[0, 1]`.
    fn mix(&self) -> f32;

    /// Set the wet/dry mix. Silently clamped to `[0, 1]`.
    fn set_mix(&mut self, mix: f32);

    /// True when `process` would actually do anything: enabled and
    /// `mix >= MIX_EPSILON`.
    fn is_active(&self) -> bool {
        self.is_enabled() && self.mix() >= MIX_EPSILON
    }
}
