//! Integration tests for wavecore-io WAV I/O and the transport engine.

use std::sync::Arc;

use tempfile::NamedTempFile;
use wavecore_io::{Config, Engine, MockAdapter, StereoSamples, WavSpec, read_wav, read_wav_info, read_wav_stereo, write_wav, write_wav_stereo};

// ---------------------------------------------------------------------------
// WAV roundtrip tests -- mono
// ---------------------------------------------------------------------------

/// Generate a 1-second sine wave at the given sample rate.
fn sine_wave(sample_rate: u32, freq_hz: f32, num_samples: usize) -> Vec<f32> {
    (0..num_samples)
        .map(|i| (2.0 * std::f32::consts::PI * freq_hz * i as f32 / sample_rate as f32).sin())
        .collect()
}

#[test]
fn wav_roundtrip_mono_f32_44100() {
    let sr = 44100;
    let samples = sine_wave(sr, 440.0, sr as usize);
    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec.sample_rate, sr);
    assert_eq!(loaded_spec.channels, 1);
    assert_eq!(loaded.len(), samples.len());

    for (a, b) in samples.iter().zip(loaded.iter()) {
        assert!(
            (a - b).abs() < 1e-6,
            "sample mismatch: {a} vs {b} (diff={})",
            (a - b).abs()
        );
    }
}

#[test]
fn wav_roundtrip_mono_f32_96000() {
    let sr = 96000;
    let samples = sine_wave(sr, 1000.0, sr as usize);
    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec.sample_rate, sr);
    assert_eq!(loaded.len(), samples.len());

    for (a, b) in samples.iter().zip(loaded.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
}

// ---------------------------------------------------------------------------
// WAV roundtrip tests -- stereo
// ---------------------------------------------------------------------------

#[test]
fn wav_roundtrip_stereo_f32_48000() {
    let sr = 48000;
    let left = sine_wave(sr, 440.0, sr as usize);
    let right = sine_wave(sr, 880.0, sr as usize);
    let samples = StereoSamples::new(left.clone(), right.clone());

    let spec = WavSpec {
        channels: 2,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav_stereo(file.path(), &samples, spec).unwrap();

    let (loaded, loaded_spec) = read_wav_stereo(file.path()).unwrap();
    assert_eq!(loaded_spec.sample_rate, sr);
    assert_eq!(loaded.len(), samples.len());

    for (a, b) in left.iter().zip(loaded.left.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
    for (a, b) in right.iter().zip(loaded.right.iter()) {
        assert!((a - b).abs() < 1e-6);
    }
}

// ---------------------------------------------------------------------------
// WAV edge cases and non-float formats
// ---------------------------------------------------------------------------

#[test]
fn wav_write_empty_buffer() {
    let spec = WavSpec {
        channels: 1,
        sample_rate: 48000,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &[], spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec.sample_rate, 48000);
    assert!(loaded.is_empty());
}

#[test]
fn wav_roundtrip_mono_i16() {
    let sr = 44100;
    let samples = sine_wave(sr, 440.0, sr as usize)
        .into_iter()
        .map(|s| s * 0.9)
        .collect::<Vec<_>>();

    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 16,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();

    let (loaded, loaded_spec) = read_wav(file.path()).unwrap();
    assert_eq!(loaded_spec.bits_per_sample, 16);
    assert_eq!(loaded.len(), samples.len());

    for (a, b) in samples.iter().zip(loaded.iter()) {
        assert!((a - b).abs() < 0.001, "i16 roundtrip mismatch: {a} vs {b}");
    }
}

#[test]
fn wav_info_stereo_i16() {
    let sr = 44100;
    let num_samples = 44100;
    let left = sine_wave(sr, 440.0, num_samples);
    let right = sine_wave(sr, 880.0, num_samples);
    let samples = StereoSamples::new(left, right);

    let spec = WavSpec {
        channels: 2,
        sample_rate: sr,
        bits_per_sample: 16,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav_stereo(file.path(), &samples, spec).unwrap();

    let info = read_wav_info(file.path()).unwrap();
    assert_eq!(info.channels, 2);
    assert_eq!(info.sample_rate, sr);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.num_frames, num_samples as u64);
    assert!((info.duration_secs - 1.0).abs() < 1e-6);
}

#[test]
fn read_mono_as_stereo_duplicates_channels() {
    let sr = 48000;
    let samples = sine_wave(sr, 440.0, 1000);
    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let file = NamedTempFile::new().unwrap();
    write_wav(file.path(), &samples, spec).unwrap();

    let (stereo, _) = read_wav_stereo(file.path()).unwrap();
    assert_eq!(stereo.len(), 1000);

    for (orig, left) in samples.iter().zip(stereo.left.iter()) {
        assert!((orig - left).abs() < 1e-6);
    }
    for (orig, right) in samples.iter().zip(stereo.right.iter()) {
        assert!((orig - right).abs() < 1e-6);
    }
}

// ---------------------------------------------------------------------------
// Engine + mock transport, end to end
// ---------------------------------------------------------------------------

fn test_config() -> Config {
    Config {
        sample_rate: 48_000,
        channels: 2,
        frames_per_buffer: 16,
        enable_input: true,
        ring_multiplier: 4,
        ..Config::default()
    }
}

#[test]
fn engine_full_lifecycle_over_mock_transport() {
    let engine = Engine::with_adapter(Arc::new(MockAdapter::new()));
    engine.initialize(test_config()).unwrap();
    assert_eq!(engine.backend_name(), "mock");

    engine.start().unwrap();
    let written = engine.send(&vec![0.5f32; 64]).unwrap();
    assert_eq!(written, 64);
    assert!(engine.total_sent_frames() > 0);

    engine.stop().unwrap();
    engine.dispose();
    assert!(engine.send(&[0.0; 4]).is_err());
}

#[test]
fn engine_reports_underrun_events_on_sustained_overproduction() {
    let engine = Engine::with_adapter(Arc::new(MockAdapter::new()));
    engine.initialize(test_config()).unwrap();
    engine.start().unwrap();

    // Ring capacity is 16 * 2 * 4 = 128 samples; flood it repeatedly.
    for _ in 0..20 {
        engine.send(&vec![0.1f32; 256]);
    }

    let mut saw_underrun = false;
    while let Some(event) = engine.try_recv_event() {
        if matches!(event, wavecore_io::Event::BufferUnderrun { .. }) {
            saw_underrun = true;
        }
    }
    assert!(saw_underrun, "sustained overproduction should report underruns");
    assert!(engine.underrun_count() > 0);
}

#[test]
fn end_to_end_wav_roundtrip_through_engine_output() {
    let sr = 48000;
    let input_samples = sine_wave(sr, 440.0, 4096);
    let spec = WavSpec {
        channels: 1,
        sample_rate: sr,
        bits_per_sample: 32,
    };

    let engine = Engine::with_adapter(Arc::new(MockAdapter::new()));
    engine.initialize(Config {
        sample_rate: sr,
        channels: 1,
        frames_per_buffer: 256,
        enable_input: false,
        ring_multiplier: 8,
        ..Config::default()
    }).unwrap();
    engine.start().unwrap();
    engine.send(&input_samples).unwrap();
    engine.stop().unwrap();

    let out_file = NamedTempFile::new().unwrap();
    write_wav(out_file.path(), &input_samples, spec).unwrap();
    let (reloaded, reloaded_spec) = read_wav(out_file.path()).unwrap();
    assert_eq!(reloaded_spec.sample_rate, sr);
    assert_eq!(reloaded.len(), input_samples.len());
}
