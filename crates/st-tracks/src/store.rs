// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Store seams consumed by the recommenders, plus an in-memory adapter.
//!
//! The core never reaches for a database itself: every service call receives
//! its stores by reference, so tests and tools can plug in [`MemoryStore`].

use std::collections::{HashMap, HashSet};
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::{EntityKind, RecError, RecResult};
use crate::matrix::InteractionRecord;

/// Dense integer key assigned by the backing store (e.g. a serial column).
pub type InternalId = u64;

/// Source of per-item feature vectors.
pub trait FeatureStore {
    /// Returns every `(external item id, vector)` pair with stored features.
    fn fetch_all_features(&self) -> RecResult<Vec<(String, Vec<f32>)>>;
}

/// Source of implicit interactions and identifier mappings.
pub trait InteractionStore {
    fn fetch_all_interactions(&self) -> RecResult<Vec<InteractionRecord<InternalId, InternalId>>>;

    /// Maps an external user id to its internal key, or `NotFound`.
    fn resolve_user(&self, external_user_id: &str) -> RecResult<InternalId>;

    /// Maps internal item keys to external ids. Unknown keys are omitted.
    fn resolve_item_ids(
        &self,
        internal_item_ids: &[InternalId],
    ) -> RecResult<HashMap<InternalId, String>>;
}

/// Track row of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackRecord {
    pub id: InternalId,
    pub track_uuid: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u32>,
    /// Tracks without features are invisible to the content recommender.
    #[serde(default)]
    pub features: Option<Vec<f32>>,
}

/// User row of a dataset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: InternalId,
    pub user_uuid: String,
}

/// Play statistics of one user on one track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRow {
    pub user_id: InternalId,
    pub track_id: InternalId,
    pub play_count: u32,
    #[serde(default)]
    pub skipped: bool,
    #[serde(default)]
    pub completed: bool,
}

/// Serializable snapshot of tracks, users and their interactions.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub tracks: Vec<TrackRecord>,
    #[serde(default)]
    pub users: Vec<UserRecord>,
    #[serde(default)]
    pub interactions: Vec<InteractionRow>,
}

/// Counts reported by [`Dataset::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatasetSummary {
    pub tracks: usize,
    pub tracks_with_features: usize,
    pub users: usize,
    pub interactions: usize,
}

impl Dataset {
    pub fn from_json_str(raw: &str) -> RecResult<Self> {
        serde_json::from_str(raw).map_err(|err| RecError::store(format!("invalid dataset: {err}")))
    }

    pub fn from_reader<R: Read>(reader: R) -> RecResult<Self> {
        serde_json::from_reader(reader)
            .map_err(|err| RecError::store(format!("invalid dataset: {err}")))
    }

    pub fn to_json_pretty(&self) -> RecResult<String> {
        serde_json::to_string_pretty(self).map_err(RecError::store)
    }

    /// Checks key uniqueness and referential integrity.
    pub fn validate(&self) -> RecResult<DatasetSummary> {
        let mut track_ids = HashSet::new();
        let mut track_uuids = HashSet::new();
        for track in &self.tracks {
            if !track_ids.insert(track.id) || !track_uuids.insert(track.track_uuid.as_str()) {
                return Err(RecError::invalid(
                    "dataset",
                    format!("duplicate track {} ({})", track.id, track.track_uuid),
                ));
            }
        }
        let mut user_ids = HashSet::new();
        let mut user_uuids = HashSet::new();
        for user in &self.users {
            if !user_ids.insert(user.id) || !user_uuids.insert(user.user_uuid.as_str()) {
                return Err(RecError::invalid(
                    "dataset",
                    format!("duplicate user {} ({})", user.id, user.user_uuid),
                ));
            }
        }
        let mut pairs = HashSet::new();
        for row in &self.interactions {
            if !user_ids.contains(&row.user_id) {
                return Err(RecError::invalid(
                    "dataset",
                    format!("interaction references unknown user {}", row.user_id),
                ));
            }
            if !track_ids.contains(&row.track_id) {
                return Err(RecError::invalid(
                    "dataset",
                    format!("interaction references unknown track {}", row.track_id),
                ));
            }
            if !pairs.insert((row.user_id, row.track_id)) {
                return Err(RecError::invalid(
                    "dataset",
                    format!(
                        "duplicate interaction for user {} and track {}",
                        row.user_id, row.track_id
                    ),
                ));
            }
        }
        Ok(DatasetSummary {
            tracks: self.tracks.len(),
            tracks_with_features: self.tracks.iter().filter(|t| t.features.is_some()).count(),
            users: self.users.len(),
            interactions: self.interactions.len(),
        })
    }
}

/// Store adapter over an in-memory [`Dataset`].
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    dataset: Dataset,
    users_by_uuid: HashMap<String, InternalId>,
    track_uuids: HashMap<InternalId, String>,
}

impl MemoryStore {
    pub fn new(dataset: Dataset) -> Self {
        let users_by_uuid = dataset
            .users
            .iter()
            .map(|user| (user.user_uuid.clone(), user.id))
            .collect();
        let track_uuids = dataset
            .tracks
            .iter()
            .map(|track| (track.id, track.track_uuid.clone()))
            .collect();
        Self {
            dataset,
            users_by_uuid,
            track_uuids,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }
}

impl FeatureStore for MemoryStore {
    fn fetch_all_features(&self) -> RecResult<Vec<(String, Vec<f32>)>> {
        Ok(self
            .dataset
            .tracks
            .iter()
            .filter_map(|track| {
                track
                    .features
                    .as_ref()
                    .map(|features| (track.track_uuid.clone(), features.clone()))
            })
            .collect())
    }
}

impl InteractionStore for MemoryStore {
    fn fetch_all_interactions(&self) -> RecResult<Vec<InteractionRecord<InternalId, InternalId>>> {
        Ok(self
            .dataset
            .interactions
            .iter()
            .map(|row| InteractionRecord::new(row.user_id, row.track_id, row.play_count))
            .collect())
    }

    fn resolve_user(&self, external_user_id: &str) -> RecResult<InternalId> {
        self.users_by_uuid
            .get(external_user_id)
            .copied()
            .ok_or_else(|| RecError::not_found(EntityKind::User, external_user_id))
    }

    fn resolve_item_ids(
        &self,
        internal_item_ids: &[InternalId],
    ) -> RecResult<HashMap<InternalId, String>> {
        Ok(internal_item_ids
            .iter()
            .filter_map(|id| self.track_uuids.get(id).map(|uuid| (*id, uuid.clone())))
            .collect())
    }
}
