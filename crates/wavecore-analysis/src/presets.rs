//! Preset presentation targets (§4.J).
//!
//! A fixed mapping from enumerated playback systems to a synthetic
//! [`SpectrumRecord`]-shaped target: a 10-band frequency response, a target
//! loudness, and a target dynamic range. Lets [`crate::eq_match`] run EQ
//! matching against a "house curve" without needing a reference audio file.
//! The table itself is data; [`presentation_target`] is the only function.

use crate::bands::{BAND_COUNT, SpectrumRecord};

/// Enumerated playback systems with a documented target frequency response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentationSystem {
    /// Flat reference monitors in a treated room.
    StudioMonitors,
    /// Closed/open-back headphones, diffuse-field target.
    Headphones,
    /// In-car system; bass/treble boosted to cut through road noise.
    CarStereo,
    /// Consumer hi-fi bookshelf/tower speakers.
    HiFiSpeakers,
    /// In-ear monitors; bass boosted to compensate for passive leakage.
    Earbuds,
    /// Small battery-powered Bluetooth speaker; boosted low-mid, rolled-off highs.
    BluetoothSpeaker,
    /// Built-in laptop speakers; minimal true bass, thin highs.
    LaptopSpeakers,
}

/// Data shape of one preset row: a target frequency response plus target
/// loudness/dynamic-range, in the same units as [`SpectrumRecord`].
#[derive(Debug, Clone, Copy)]
pub struct PresentationTarget {
    /// Target per-band energy, normalised `[0, 1]`, same semantics as
    /// [`SpectrumRecord::bands`].
    pub frequency_response: [f32; BAND_COUNT],
    /// Target loudness in dBFS.
    pub target_loudness_dbfs: f32,
    /// Target dynamic range in dB.
    pub target_dynamic_range_db: f32,
}

impl PresentationTarget {
    /// View this preset as a [`SpectrumRecord`] so it can be passed directly
    /// to [`crate::eq_match::derive_eq_gains`] / `derive_dynamic_amp`.
    pub fn as_spectrum_record(&self) -> SpectrumRecord {
        SpectrumRecord {
            bands: self.frequency_response,
            rms: 10f32.powf(self.target_loudness_dbfs / 20.0),
            peak: 1.0,
            dynamic_range_db: self.target_dynamic_range_db,
            loudness_dbfs: self.target_loudness_dbfs,
        }
    }
}

/// The preset table — data, not code. Indexed by [`PresentationSystem`]'s
/// declaration order via [`presentation_target`].
const PRESETS: [PresentationTarget; 7] = [
    // StudioMonitors: flat reference.
    PresentationTarget {
        frequency_response: [0.85, 0.88, 0.90, 0.92, 0.95, 1.00, 0.95, 0.90, 0.85, 0.80],
        target_loudness_dbfs: -18.0,
        target_dynamic_range_db: 16.0,
    },
    // Headphones: diffuse-field, slightly scooped mids, extended highs.
    PresentationTarget {
        frequency_response: [0.80, 0.85, 0.80, 0.75, 0.78, 0.90, 0.95, 1.00, 0.92, 0.85],
        target_loudness_dbfs: -14.0,
        target_dynamic_range_db: 12.0,
    },
    // CarStereo: boosted bass/treble to cut through road noise.
    PresentationTarget {
        frequency_response: [1.00, 0.95, 0.80, 0.70, 0.65, 0.70, 0.80, 0.90, 0.95, 0.90],
        target_loudness_dbfs: -9.0,
        target_dynamic_range_db: 6.0,
    },
    // HiFiSpeakers: smooth gentle smile curve.
    PresentationTarget {
        frequency_response: [0.90, 0.92, 0.85, 0.82, 0.85, 0.90, 0.92, 0.95, 0.92, 0.85],
        target_loudness_dbfs: -12.0,
        target_dynamic_range_db: 10.0,
    },
    // Earbuds: bass emphasis to compensate passive leakage.
    PresentationTarget {
        frequency_response: [1.00, 0.90, 0.75, 0.65, 0.60, 0.65, 0.75, 0.85, 0.80, 0.70],
        target_loudness_dbfs: -11.0,
        target_dynamic_range_db: 8.0,
    },
    // BluetoothSpeaker: fake bass via boosted low-mid, rolled-off highs.
    PresentationTarget {
        frequency_response: [0.95, 1.00, 0.90, 0.70, 0.60, 0.55, 0.50, 0.45, 0.35, 0.25],
        target_loudness_dbfs: -8.0,
        target_dynamic_range_db: 5.0,
    },
    // LaptopSpeakers: thin driver, boosted low-mid standing in for bass.
    PresentationTarget {
        frequency_response: [0.60, 0.80, 1.00, 0.85, 0.70, 0.60, 0.50, 0.40, 0.30, 0.20],
        target_loudness_dbfs: -7.0,
        target_dynamic_range_db: 4.0,
    },
];

/// Look up the [`PresentationTarget`] for a playback system.
pub fn presentation_target(system: PresentationSystem) -> PresentationTarget {
    PRESETS[system as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_preset_is_well_formed() {
        for system in [
            PresentationSystem::StudioMonitors,
            PresentationSystem::Headphones,
            PresentationSystem::CarStereo,
            PresentationSystem::HiFiSpeakers,
            PresentationSystem::Earbuds,
            PresentationSystem::BluetoothSpeaker,
            PresentationSystem::LaptopSpeakers,
        ] {
            let target = presentation_target(system);
            for &b in &target.frequency_response {
                assert!((0.0..=1.0).contains(&b));
            }
            assert!(target.target_loudness_dbfs <= 0.0);
            assert!(target.target_dynamic_range_db > 0.0);
        }
    }

    #[test]
    fn as_spectrum_record_round_trips_loudness() {
        let target = presentation_target(PresentationSystem::Headphones);
        let record = target.as_spectrum_record();
        assert_eq!(record.loudness_dbfs, target.target_loudness_dbfs);
        assert_eq!(record.bands, target.frequency_response);
    }
}
