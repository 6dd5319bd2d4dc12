//! Criterion benchmarks for the transport-facing effects.
//!
//! Run with: cargo bench
#![allow(missing_docs)]

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use wavecore_core::{DspEffect, EffectId};
use wavecore_effects::{Delay, Enhancer, Limiter, Multiband, Volume};

const SAMPLE_RATE: f32 = 48_000.0;
const CHANNELS: usize = 2;
const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512, 1024];

fn generate_test_signal(frames: usize) -> Vec<f32> {
    (0..frames * CHANNELS)
        .map(|i| {
            let t = (i / CHANNELS) as f32 / SAMPLE_RATE;
            (2.0 * std::f32::consts::PI * 440.0 * t).sin() * 0.5
        })
        .collect()
}

fn bench_effect<E: DspEffect>(c: &mut Criterion, name: &str, mut effect: E) {
    let mut group = c.benchmark_group(name);

    for &frames in BLOCK_SIZES {
        let input = generate_test_signal(frames);

        group.bench_with_input(BenchmarkId::from_parameter(frames), &frames, |b, &frames| {
            b.iter_batched(
                || input.clone(),
                |mut buffer| {
                    effect.process(black_box(&mut buffer), frames);
                    black_box(buffer[0])
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_delay(c: &mut Criterion) {
    let mut delay = Delay::new(EffectId(1), SAMPLE_RATE, CHANNELS);
    delay.set_mix(0.5);
    delay.set_feedback(0.4);
    delay.set_damping(0.3);
    bench_effect(c, "Delay", delay);
}

fn bench_limiter(c: &mut Criterion) {
    let mut limiter = Limiter::new(EffectId(2), SAMPLE_RATE, CHANNELS);
    limiter.set_threshold_db(-6.0);
    limiter.set_ceiling_db(-0.1);
    bench_effect(c, "Limiter", limiter);
}

fn bench_enhancer(c: &mut Criterion) {
    let mut enhancer = Enhancer::new(EffectId(3), SAMPLE_RATE, CHANNELS);
    enhancer.set_mix(0.5);
    bench_effect(c, "Enhancer", enhancer);
}

fn bench_multiband(c: &mut Criterion) {
    let mut multiband = Multiband::new(EffectId(4), SAMPLE_RATE, CHANNELS);
    multiband.set_mix(1.0);
    bench_effect(c, "Multiband", multiband);
}

fn bench_volume(c: &mut Criterion) {
    let mut volume = Volume::new(EffectId(5), CHANNELS);
    volume.set_factor(0.8);
    bench_effect(c, "Volume", volume);
}

criterion_group!(
    benches,
    bench_delay,
    bench_limiter,
    bench_enhancer,
    bench_multiband,
    bench_volume
);
criterion_main!(benches);
