//! Property-based tests for wavecore-core DSP primitives.
//!
//! Filter stability (no NaN/Inf for any valid coefficient set) and the ring
//! buffer's write/read invariants from §8.

use proptest::prelude::*;
use wavecore_core::{
    Biquad, EnvelopeFollower, RingBuffer, bandpass_coefficients, highpass_coefficients,
    lowpass_coefficients, notch_coefficients,
};

fn configure_biquad(biquad: &mut Biquad, variant: usize, freq: f32, q: f32, sr: f32) {
    let (b0, b1, b2, a0, a1, a2) = match variant % 4 {
        0 => lowpass_coefficients(freq, q, sr),
        1 => highpass_coefficients(freq, q, sr),
        2 => bandpass_coefficients(freq, q, sr),
        _ => notch_coefficients(freq, q, sr),
    };
    biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// For any valid cutoff and Q, biquad filters stay finite over a
    /// buffer of random finite input.
    #[test]
    fn biquad_finite_for_any_valid_coefficients(
        variant in 0usize..4,
        freq in 20.0f32..20_000.0,
        q in 0.1f32..10.0,
        input in prop::collection::vec(-1.0f32..=1.0, 256..1024),
    ) {
        let mut biquad = Biquad::new();
        configure_biquad(&mut biquad, variant, freq, q, 48_000.0);
        for &sample in &input {
            let out = biquad.process(sample);
            prop_assert!(out.is_finite());
        }
    }

    /// Biquad coefficient computation neutralises degenerate frequency/Q
    /// (§4.I: "coefficient computation must reject f <= 0 or Q <= 0 by
    /// neutralising the filter").
    #[test]
    fn biquad_neutralises_degenerate_params(
        freq in -1000.0f32..=0.0,
        q in -10.0f32..=0.0,
        input in -1.0f32..=1.0,
    ) {
        let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(freq, q, 48_000.0);
        let mut biquad = Biquad::new();
        biquad.set_coefficients(b0, b1, b2, a0, a1, a2);
        let out = biquad.process(input);
        prop_assert!(out.is_finite());
    }

    /// Envelope follower output is always finite and non-negative for any
    /// finite input and any valid attack/release time.
    #[test]
    fn envelope_follower_finite_and_nonnegative(
        attack_ms in 0.1f32..200.0,
        release_ms in 0.1f32..2000.0,
        input in prop::collection::vec(-2.0f32..=2.0, 64..256),
    ) {
        let mut env = EnvelopeFollower::with_times(48_000.0, attack_ms, release_ms);
        for &sample in &input {
            let level = env.process(sample);
            prop_assert!(level.is_finite());
            prop_assert!(level >= 0.0);
        }
    }

    /// §8: `Available + FreeSpace = Capacity` at any observable instant,
    /// and a write of `n` samples to `k` free returns `min(n, k)`.
    #[test]
    fn ring_buffer_capacity_invariant(
        capacity in 1usize..256,
        write_len in 0usize..512,
        read_len in 0usize..512,
    ) {
        let rb = RingBuffer::new(capacity);
        prop_assert_eq!(rb.available() + rb.free_space(), rb.capacity());

        let samples = vec![1.0_f32; write_len];
        let free_before = rb.free_space();
        let written = rb.write(&samples);
        prop_assert_eq!(written as u64, (write_len as u64).min(free_before));
        prop_assert_eq!(rb.available() + rb.free_space(), rb.capacity());

        let mut dst = vec![0.0_f32; read_len];
        let available_before = rb.available();
        let read = rb.read(&mut dst);
        prop_assert_eq!(read as u64, (read_len as u64).min(available_before));
        prop_assert_eq!(rb.available() + rb.free_space(), rb.capacity());
    }
}
