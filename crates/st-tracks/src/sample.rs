// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Reproducible sample catalog used by demos, benches and tests.
//!
//! Thirty tracks across five moods, each described by a 16-dimensional vector:
//! MFCC 1–5, tempo, beat strength, energy, loudness, spectral centroid,
//! rolloff, bandwidth and four mood flags (happy, sad, energetic, calm).

use std::collections::HashSet;

use rand::Rng;
use spiral_config::determinism;

use crate::store::{Dataset, InteractionRow, TrackRecord, UserRecord};

/// Length of every sample feature vector.
pub const FEATURE_DIM: usize = 16;

const TRACK_DURATION_MS: u32 = 180_000;

/// `(uuid, title, artist, features)` of the sample catalog, in id order.
#[rustfmt::skip]
pub const SAMPLE_TRACKS: [(&str, &str, &str, [f32; FEATURE_DIM]); 30] = [
    (
        "H1",
        "Happy Song 1",
        "Artist Pop A",
        [
            -210.2, 98.4, -12.3, 45.1,
            -8.2, 125.4, 0.82, 0.91,
            -7.8, 2700.2, 0.66, 0.48,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H2",
        "Happy Song 2",
        "Artist Pop B",
        [
            -205.1, 103.2, -15.0, 50.7,
            -10.1, 130.0, 0.79, 0.87,
            -8.5, 2600.5, 0.61, 0.42,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H3",
        "Happy Song 3",
        "Artist Pop C",
        [
            -220.8, 110.5, -18.1, 48.3,
            -9.2, 118.9, 0.83, 0.89,
            -7.2, 2850.0, 0.70, 0.52,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H4",
        "Happy Song 4",
        "Artist Pop D",
        [
            -230.4, 92.1, -10.7, 40.5,
            -11.4, 135.6, 0.76, 0.85,
            -9.0, 2550.7, 0.60, 0.40,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H5",
        "Happy Song 5",
        "Artist Pop E",
        [
            -215.1, 105.5, -22.3, 55.1,
            -13.0, 128.9, 0.80, 0.90,
            -6.7, 2900.4, 0.72, 0.53,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H6",
        "Happy Song 6",
        "Artist Pop F",
        [
            -225.3, 88.6, -9.4, 39.8,
            -7.9, 140.2, 0.78, 0.88,
            -8.3, 2450.1, 0.55, 0.39,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H7",
        "Happy Song 7",
        "Artist Pop G",
        [
            -210.0, 100.3, -12.2, 47.0,
            -10.0, 122.0, 0.81, 0.92,
            -7.0, 2750.4, 0.68, 0.50,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "H8",
        "Happy Song 8",
        "Artist Pop H",
        [
            -217.3, 102.1, -17.4, 52.1,
            -12.5, 119.4, 0.84, 0.91,
            -6.9, 2950.9, 0.73, 0.55,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "S1",
        "Sad Song 1",
        "Artist Ballad A",
        [
            -310.4, 80.1, -40.2, 25.1,
            -20.5, 75.2, 0.42, 0.36,
            -14.2, 1800.3, 0.55, 0.28,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "S2",
        "Sad Song 2",
        "Artist Ballad B",
        [
            -295.0, 78.0, -38.1, 28.5,
            -18.3, 72.0, 0.40, 0.34,
            -15.0, 1700.1, 0.52, 0.25,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "S3",
        "Sad Song 3",
        "Artist Ballad C",
        [
            -305.9, 82.7, -42.6, 30.3,
            -22.1, 70.4, 0.45, 0.38,
            -13.8, 1850.9, 0.56, 0.29,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "S4",
        "Sad Song 4",
        "Artist Ballad D",
        [
            -290.2, 76.4, -36.5, 27.5,
            -19.8, 78.0, 0.39, 0.35,
            -14.8, 1600.3, 0.50, 0.23,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "S5",
        "Sad Song 5",
        "Artist Ballad E",
        [
            -300.7, 84.1, -44.0, 32.7,
            -21.4, 68.9, 0.43, 0.37,
            -13.5, 1750.7, 0.53, 0.27,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "C1",
        "Calm Song 1",
        "Artist Acoustic A",
        [
            -260.1, 95.0, -20.4, 35.0,
            -15.0, 85.0, 0.50, 0.25,
            -12.0, 2100.5, 0.48, 0.30,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "C2",
        "Calm Song 2",
        "Artist Acoustic B",
        [
            -270.3, 90.2, -18.0, 32.1,
            -14.1, 90.0, 0.48, 0.22,
            -13.0, 2000.2, 0.45, 0.28,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "C3",
        "Calm Song 3",
        "Artist Acoustic C",
        [
            -255.9, 92.5, -21.5, 36.4,
            -13.7, 88.2, 0.53, 0.26,
            -11.8, 2150.3, 0.49, 0.31,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "C4",
        "Calm Song 4",
        "Artist Acoustic D",
        [
            -265.0, 88.7, -19.0, 33.7,
            -16.2, 82.0, 0.47, 0.20,
            -14.0, 2050.0, 0.44, 0.27,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "C5",
        "Calm Song 5",
        "Artist Acoustic E",
        [
            -258.4, 94.1, -22.1, 34.9,
            -17.0, 87.6, 0.52, 0.27,
            -12.5, 2200.7, 0.50, 0.32,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "C6",
        "Calm Song 6",
        "Artist Acoustic F",
        [
            -275.6, 89.3, -19.8, 31.0,
            -15.5, 80.4, 0.46, 0.24,
            -15.0, 1950.4, 0.43, 0.26,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "C7",
        "Calm Song 7",
        "Artist Acoustic G",
        [
            -262.7, 93.9, -23.7, 37.1,
            -14.8, 92.1, 0.51, 0.28,
            -11.5, 2250.2, 0.51, 0.33,
            0.0, 0.0, 0.0, 1.0,
        ],
    ),
    (
        "E1",
        "EDM Song 1",
        "Artist EDM A",
        [
            -180.2, 120.4, -5.1, 60.3,
            -3.8, 138.0, 0.95, 0.96,
            -5.0, 3000.0, 0.80, 0.60,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "E2",
        "EDM Song 2",
        "Artist EDM B",
        [
            -175.0, 130.2, -6.7, 62.8,
            -4.5, 142.5, 0.97, 0.98,
            -4.5, 3100.4, 0.82, 0.62,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "E3",
        "EDM Song 3",
        "Artist EDM C",
        [
            -185.1, 118.0, -4.0, 58.9,
            -3.0, 145.6, 0.93, 0.95,
            -6.0, 2950.7, 0.78, 0.58,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "E4",
        "EDM Song 4",
        "Artist EDM D",
        [
            -190.5, 125.9, -7.2, 63.5,
            -5.0, 150.2, 0.96, 0.97,
            -4.8, 3200.3, 0.84, 0.65,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "E5",
        "EDM Song 5",
        "Artist EDM E",
        [
            -178.3, 135.1, -3.5, 64.9,
            -2.8, 155.1, 0.98, 0.99,
            -3.9, 3300.8, 0.85, 0.67,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "E6",
        "EDM Song 6",
        "Artist EDM F",
        [
            -192.1, 140.2, -8.1, 66.3,
            -6.0, 148.4, 0.94, 0.96,
            -5.2, 2850.2, 0.75, 0.55,
            1.0, 0.0, 1.0, 0.0,
        ],
    ),
    (
        "D1",
        "Dark Song 1",
        "Artist Dark A",
        [
            -320.5, 70.3, -50.1, 20.0,
            -25.0, 60.0, 0.30, 0.20,
            -18.0, 1500.0, 0.40, 0.22,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "D2",
        "Dark Song 2",
        "Artist Dark B",
        [
            -330.1, 68.0, -52.2, 19.3,
            -26.1, 58.6, 0.28, 0.18,
            -19.0, 1400.3, 0.38, 0.20,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "D3",
        "Dark Song 3",
        "Artist Dark C",
        [
            -315.4, 72.7, -48.8, 22.5,
            -23.9, 63.4, 0.32, 0.21,
            -17.5, 1550.1, 0.41, 0.23,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
    (
        "D4",
        "Dark Song 4",
        "Artist Dark D",
        [
            -325.7, 69.9, -51.3, 21.0,
            -24.5, 61.1, 0.29, 0.19,
            -18.5, 1450.9, 0.39, 0.21,
            0.0, 1.0, 0.0, 0.0,
        ],
    ),
];

/// Shape of a generated dataset.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleConfig {
    /// Users named `user-1` .. `user-N`.
    pub users: usize,
    /// Interaction draws; repeated `(user, track)` pairs keep the first draw.
    pub interactions: usize,
    pub seed: Option<u64>,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            users: 50,
            interactions: 2000,
            seed: None,
        }
    }
}

/// The sample tracks with ids `1..=30`, no users, no interactions.
pub fn sample_catalog() -> Dataset {
    let tracks = SAMPLE_TRACKS
        .iter()
        .zip(1u64..)
        .map(|((uuid, title, artist, features), id)| TrackRecord {
            id,
            track_uuid: (*uuid).to_string(),
            title: Some((*title).to_string()),
            artist: Some((*artist).to_string()),
            duration_ms: Some(TRACK_DURATION_MS),
            features: Some(features.to_vec()),
        })
        .collect();
    Dataset {
        tracks,
        ..Dataset::default()
    }
}

/// Sample catalog plus generated users and random play statistics.
///
/// Play counts are drawn from `1..15`; skip and completion flags are fair coins.
pub fn sample_dataset(config: &SampleConfig) -> Dataset {
    let mut dataset = sample_catalog();
    dataset.users = (1..=config.users as u64)
        .map(|id| UserRecord {
            id,
            user_uuid: format!("user-{id}"),
        })
        .collect();

    if config.users == 0 {
        return dataset;
    }
    let track_count = dataset.tracks.len() as u64;
    let mut rng = determinism::rng_from_optional(config.seed, "st-tracks/sample/interactions");
    let mut seen = HashSet::new();
    for _ in 0..config.interactions {
        let user_id = rng.gen_range(1..=config.users as u64);
        let track_id = rng.gen_range(1..=track_count);
        let play_count = rng.gen_range(1..15);
        let skipped = rng.gen_bool(0.5);
        let completed = rng.gen_bool(0.5);
        if seen.insert((user_id, track_id)) {
            dataset.interactions.push(InteractionRow {
                user_id,
                track_id,
                play_count,
                skipped,
                completed,
            });
        }
    }
    dataset
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_complete_and_valid() {
        let catalog = sample_catalog();
        let summary = catalog.validate().unwrap();
        assert_eq!(summary.tracks, 30);
        assert_eq!(summary.tracks_with_features, 30);
        assert_eq!(catalog.tracks[0].track_uuid, "H1");
        assert_eq!(catalog.tracks[29].track_uuid, "D4");
    }

    #[test]
    fn generated_dataset_is_valid_and_seeded() {
        let config = SampleConfig {
            users: 10,
            interactions: 200,
            seed: Some(4),
        };
        let first = sample_dataset(&config);
        let summary = first.validate().unwrap();
        assert_eq!(summary.users, 10);
        assert!(summary.interactions > 0 && summary.interactions <= 200);
        assert!(first
            .interactions
            .iter()
            .all(|row| (1..15).contains(&row.play_count)));
        assert_eq!(first, sample_dataset(&config));
    }

    #[test]
    fn zero_users_means_no_interactions() {
        let dataset = sample_dataset(&SampleConfig {
            users: 0,
            interactions: 50,
            seed: Some(1),
        });
        assert!(dataset.interactions.is_empty());
    }
}
