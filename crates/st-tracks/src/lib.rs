// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Track recommendations from audio features and implicit play history.
//!
//! Two engines live here. [`content`] ranks the catalog by cosine similarity
//! to a seed track. [`als`] factorises a confidence-weighted interaction
//! matrix with implicit alternating least squares and [`generator`] turns the
//! resulting factors into per-user rankings. [`service`] wires both engines to
//! the store seams declared in [`store`].

use serde::{Deserialize, Serialize};

pub mod als;
pub mod content;
pub mod error;
pub mod feature;
pub mod generator;
pub(crate) mod linalg;
pub mod matrix;
pub mod sample;
pub mod service;
pub mod store;

pub use als::{AlsConfig, AlsReport, LatentFactorModel, TrainedModel};
pub use error::{EntityKind, Phase, RecError, RecResult};
pub use feature::{FeatureCatalog, FeatureVector};
pub use matrix::{ConfidenceMatrix, ConfidenceMode, InteractionMatrix, InteractionRecord};
pub use service::{
    recommend_collaborative, recommend_content_based, CollaborativeParams, EmptyReason, Outcome,
};
pub use store::{Dataset, FeatureStore, InteractionStore, InternalId, MemoryStore};

/// Dense item index paired with its predicted preference.
#[derive(Clone, Debug, PartialEq)]
pub struct Recommendation {
    pub item: usize,
    pub score: f32,
}

/// External item id paired with a score, as returned to callers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: String,
    pub score: f32,
}
