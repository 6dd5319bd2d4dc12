//! Integration tests for wavecore-core DSP primitives.
//!
//! Cross-module interactions: the ring buffer's cross-thread delivery
//! guarantee, biquad frequency response via sine-level measurement, and the
//! Linkwitz–Riley crossover's energy-preservation property (§8 scenario 5).

use wavecore_core::{
    Biquad, LinkwitzRiley2Way, MultibandCrossover, highpass_coefficients, lowpass_coefficients,
};

const SAMPLE_RATE: f32 = 48_000.0;
const TAU: f32 = core::f32::consts::TAU;

fn generate_sine(freq_hz: f32, sample_rate: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|n| libm::sinf(TAU * freq_hz * n as f32 / sample_rate))
        .collect()
}

fn rms(signal: &[f32]) -> f32 {
    let sum_sq: f32 = signal.iter().map(|&s| s * s).sum();
    libm::sqrtf(sum_sq / signal.len() as f32)
}

#[test]
fn biquad_lowpass_attenuates_above_cutoff() {
    let (b0, b1, b2, a0, a1, a2) = lowpass_coefficients(1000.0, 0.707, SAMPLE_RATE);
    let mut biquad = Biquad::new();
    biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

    let low = generate_sine(200.0, SAMPLE_RATE, 4096);
    let high = generate_sine(10_000.0, SAMPLE_RATE, 4096);

    let low_out: Vec<f32> = low.iter().map(|&s| biquad.process(s)).collect();
    biquad.clear();
    let high_out: Vec<f32> = high.iter().map(|&s| biquad.process(s)).collect();

    assert!(rms(&low_out[1024..]) > rms(&high_out[1024..]));
}

#[test]
fn biquad_highpass_attenuates_below_cutoff() {
    let (b0, b1, b2, a0, a1, a2) = highpass_coefficients(1000.0, 0.707, SAMPLE_RATE);
    let mut biquad = Biquad::new();
    biquad.set_coefficients(b0, b1, b2, a0, a1, a2);

    let low = generate_sine(100.0, SAMPLE_RATE, 4096);
    let high = generate_sine(8000.0, SAMPLE_RATE, 4096);

    let low_out: Vec<f32> = low.iter().map(|&s| biquad.process(s)).collect();
    biquad.clear();
    let high_out: Vec<f32> = high.iter().map(|&s| biquad.process(s)).collect();

    assert!(rms(&high_out[1024..]) > rms(&low_out[1024..]));
}

#[test]
fn linkwitz_riley_2way_split_recombines_to_unity() {
    let mut xover = LinkwitzRiley2Way::new(1000.0, SAMPLE_RATE);
    let input = generate_sine(1000.0, SAMPLE_RATE, 4096);

    let mut recombined = Vec::with_capacity(input.len());
    for &sample in &input {
        let (low, high) = xover.split(sample);
        recombined.push(low + high);
    }

    let ratio = rms(&recombined[512..]) / rms(&input[512..]);
    assert!((0.5..=1.5).contains(&ratio), "recombine ratio {ratio} out of band");
}

#[test]
fn multiband_crossover_three_cut_produces_four_nonzero_bands() {
    // §8 scenario 5: 3-cut crossover at [250, 2000, 8000] Hz @ 44.1 kHz,
    // broadband chirp in, combined-to-original RMS ratio within [0.5, 1.5].
    let sample_rate = 44_100.0;
    let cuts = [250.0, 2000.0, 8000.0];
    let mut xover = MultibandCrossover::new(&cuts, sample_rate);
    assert_eq!(xover.band_count(), 4);

    let n = 8192;
    let chirp: Vec<f32> = (0..n)
        .map(|i| {
            let t = i as f32 / sample_rate;
            let freq = 50.0 + (20_000.0 - 50.0) * (i as f32 / n as f32);
            libm::sinf(TAU * freq * t)
        })
        .collect();

    let mut bands: Vec<Vec<f32>> = (0..4).map(|_| vec![0.0; n]).collect();
    xover.process_to_bands(&chirp, &mut bands);

    for (i, band) in bands.iter().enumerate() {
        assert!(rms(&band[1024..]) > 0.0, "band {i} is silent");
    }

    let mut recombined = vec![0.0; n];
    xover.combine_bands(&bands, &mut recombined);
    let ratio = rms(&recombined[1024..]) / rms(&chirp[1024..]);
    assert!((0.5..=1.5).contains(&ratio), "combined ratio {ratio} out of band");
}

#[test]
fn ring_buffer_cross_thread_delivers_prefix_in_order() {
    use std::sync::Arc;
    use std::thread;
    use wavecore_core::RingBuffer;

    let rb = Arc::new(RingBuffer::new(128));
    let total = 20_000usize;

    let producer = {
        let rb = Arc::clone(&rb);
        thread::spawn(move || {
            let mut written = 0usize;
            while written < total {
                let value = written as f32;
                written += rb.write(&[value]);
            }
        })
    };

    let consumer = {
        let rb = Arc::clone(&rb);
        thread::spawn(move || {
            let mut received = Vec::with_capacity(total);
            while received.len() < total {
                let mut buf = [0.0_f32];
                if rb.read(&mut buf) == 1 {
                    received.push(buf[0]);
                }
            }
            received
        })
    };

    producer.join().unwrap();
    let received = consumer.join().unwrap();
    for (i, &v) in received.iter().enumerate() {
        assert_eq!(v, i as f32);
    }
}
