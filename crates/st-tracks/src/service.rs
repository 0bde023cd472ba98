// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Caller-facing entry points that wire stores, engines and id remapping.

use spiral_config::RecommenderSettings;
use tracing::{info, warn};

use crate::als::{self, AlsConfig};
use crate::content::similar_items;
use crate::error::{RecError, RecResult};
use crate::feature::FeatureCatalog;
use crate::generator;
use crate::matrix::{ConfidenceMode, InteractionMatrixBuilder};
use crate::store::{FeatureStore, InteractionStore, InternalId};
use crate::ScoredItem;

/// Why a successful call produced no recommendations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EmptyReason {
    /// The store holds no interactions at all.
    NoInteractions,
    /// The user exists but has not interacted with anything.
    UserHasNoInteractions,
    /// Nothing was left to rank after excluding the target or seen items.
    AllCandidatesFiltered,
}

/// Result of a recommendation call that did not fail.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Ranked(Vec<ScoredItem>),
    Empty(EmptyReason),
}

impl Outcome {
    fn from_ranked(items: Vec<ScoredItem>) -> Self {
        if items.is_empty() {
            Outcome::Empty(EmptyReason::AllCandidatesFiltered)
        } else {
            Outcome::Ranked(items)
        }
    }

    pub fn items(&self) -> &[ScoredItem] {
        match self {
            Outcome::Ranked(items) => items,
            Outcome::Empty(_) => &[],
        }
    }

    /// The ranked sequence, empty for [`Outcome::Empty`].
    pub fn into_items(self) -> Vec<ScoredItem> {
        match self {
            Outcome::Ranked(items) => items,
            Outcome::Empty(_) => Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Outcome::Empty(_))
    }

    pub fn empty_reason(&self) -> Option<EmptyReason> {
        match self {
            Outcome::Ranked(_) => None,
            Outcome::Empty(reason) => Some(*reason),
        }
    }
}

/// Knobs of [`recommend_collaborative`].
#[derive(Clone, Debug, PartialEq)]
pub struct CollaborativeParams {
    pub factors: usize,
    pub iterations: usize,
    pub alpha: f32,
    pub regularization: f32,
    pub use_confidence: bool,
    pub filter_seen: bool,
    pub seed: Option<u64>,
}

impl Default for CollaborativeParams {
    fn default() -> Self {
        Self::from(&RecommenderSettings::default())
    }
}

impl From<&RecommenderSettings> for CollaborativeParams {
    fn from(settings: &RecommenderSettings) -> Self {
        Self {
            factors: settings.factors,
            iterations: settings.iterations,
            alpha: settings.alpha,
            regularization: settings.regularization,
            use_confidence: true,
            filter_seen: true,
            seed: None,
        }
    }
}

impl CollaborativeParams {
    fn als_config(&self) -> AlsConfig {
        AlsConfig {
            seed: self.seed,
            ..AlsConfig::new(self.factors, self.regularization, self.iterations)
        }
    }
}

fn ensure_top_k(top_k: usize) -> RecResult<()> {
    if top_k == 0 {
        return Err(RecError::invalid("top_k", "must be at least 1"));
    }
    Ok(())
}

/// Ranks the catalog by feature similarity to `item_external_id`.
///
/// Fails with `NotFound` when the item has no stored features.
pub fn recommend_content_based<S>(
    store: &S,
    item_external_id: &str,
    top_k: usize,
) -> RecResult<Outcome>
where
    S: FeatureStore + ?Sized,
{
    ensure_top_k(top_k)?;
    let catalog = FeatureCatalog::from_records(store.fetch_all_features()?)?;
    let ranked = similar_items(item_external_id, &catalog, top_k)?;
    info!(
        item = item_external_id,
        catalog = catalog.len(),
        returned = ranked.len(),
        "content-based recommendations"
    );
    Ok(Outcome::from_ranked(ranked))
}

/// Trains a fresh implicit ALS model on the current interactions and
/// recommends unseen items for `user_external_id`.
///
/// Fails with `NotFound` when the user cannot be resolved. A user without
/// interactions, or a store without any, is an empty outcome.
pub fn recommend_collaborative<S>(
    store: &S,
    user_external_id: &str,
    top_k: usize,
    params: &CollaborativeParams,
) -> RecResult<Outcome>
where
    S: InteractionStore + ?Sized,
{
    ensure_top_k(top_k)?;
    let config = params.als_config();
    config.validate()?;
    let mode = ConfidenceMode::from_flag(params.use_confidence, params.alpha);

    let user_id = store.resolve_user(user_external_id)?;
    let interactions = store.fetch_all_interactions()?;
    if interactions.is_empty() {
        info!(user = user_external_id, "no interactions in store");
        return Ok(Outcome::Empty(EmptyReason::NoInteractions));
    }

    let built = InteractionMatrixBuilder::new()
        .confidence(mode)
        .build(&interactions)?;
    let Some(user_index) = built.users.index_of(&user_id) else {
        info!(user = user_external_id, "user has no interactions");
        return Ok(Outcome::Empty(EmptyReason::UserHasNoInteractions));
    };

    let trained = als::train(&built.matrix, &config)?;
    let recs = generator::recommend(
        &trained.model,
        &built.matrix,
        user_index,
        top_k,
        params.filter_seen,
    );

    let keyed: Vec<(InternalId, f32)> = recs
        .iter()
        .filter_map(|rec| built.items.key(rec.item).map(|id| (*id, rec.score)))
        .collect();
    let internal: Vec<InternalId> = keyed.iter().map(|(id, _)| *id).collect();
    let external = store.resolve_item_ids(&internal)?;

    let ranked: Vec<ScoredItem> = keyed
        .into_iter()
        .map(|(id, score)| {
            let item_id = external.get(&id).cloned().unwrap_or_else(|| {
                warn!(internal_id = id, "item id did not resolve; using placeholder");
                format!("id:{id}")
            });
            ScoredItem { item_id, score }
        })
        .collect();

    info!(
        user = user_external_id,
        users = built.users.len(),
        items = built.items.len(),
        returned = ranked.len(),
        "collaborative recommendations"
    );
    Ok(Outcome::from_ranked(ranked))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::error::EntityKind;
    use crate::matrix::InteractionRecord;
    use crate::store::{Dataset, MemoryStore, TrackRecord, UserRecord};

    struct FailingStore;

    impl InteractionStore for FailingStore {
        fn fetch_all_interactions(
            &self,
        ) -> RecResult<Vec<InteractionRecord<InternalId, InternalId>>> {
            Err(RecError::store("connection refused"))
        }

        fn resolve_user(&self, _external_user_id: &str) -> RecResult<InternalId> {
            Ok(1)
        }

        fn resolve_item_ids(&self, _ids: &[InternalId]) -> RecResult<HashMap<InternalId, String>> {
            Ok(HashMap::new())
        }
    }

    fn two_users() -> MemoryStore {
        MemoryStore::new(Dataset {
            tracks: vec![TrackRecord {
                id: 1,
                track_uuid: "A".into(),
                title: None,
                artist: None,
                duration_ms: None,
                features: Some(vec![1.0, 0.0]),
            }],
            users: vec![
                UserRecord {
                    id: 1,
                    user_uuid: "user-1".into(),
                },
                UserRecord {
                    id: 2,
                    user_uuid: "user-2".into(),
                },
            ],
            interactions: Vec::new(),
        })
    }

    #[test]
    fn zero_top_k_fails_fast() {
        let err = recommend_content_based(&two_users(), "A", 0).unwrap_err();
        assert!(matches!(err, RecError::InvalidConfig { param: "top_k", .. }));
    }

    #[test]
    fn lone_item_has_no_candidates() {
        let outcome = recommend_content_based(&two_users(), "A", 3).unwrap();
        assert_eq!(outcome, Outcome::Empty(EmptyReason::AllCandidatesFiltered));
        assert!(outcome.into_items().is_empty());
    }

    #[test]
    fn empty_store_is_an_empty_outcome() {
        let outcome =
            recommend_collaborative(&two_users(), "user-1", 5, &CollaborativeParams::default())
                .unwrap();
        assert_eq!(outcome.empty_reason(), Some(EmptyReason::NoInteractions));
    }

    #[test]
    fn zero_regularization_fails_before_touching_the_store() {
        let params = CollaborativeParams {
            regularization: 0.0,
            ..CollaborativeParams::default()
        };
        let err = recommend_collaborative(&FailingStore, "user-1", 5, &params).unwrap_err();
        assert!(matches!(
            err,
            RecError::InvalidConfig {
                param: "regularization",
                ..
            }
        ));
    }

    #[test]
    fn unknown_item_is_not_found() {
        let err = recommend_content_based(&two_users(), "missing", 3).unwrap_err();
        assert_eq!(err, RecError::not_found(EntityKind::Item, "missing"));
    }

    #[test]
    fn invalid_rank_fails_before_touching_the_store() {
        let params = CollaborativeParams {
            factors: 0,
            ..CollaborativeParams::default()
        };
        let err = recommend_collaborative(&FailingStore, "user-1", 5, &params).unwrap_err();
        assert!(matches!(err, RecError::InvalidConfig { param: "factors", .. }));
    }

    #[test]
    fn store_failures_propagate() {
        let err =
            recommend_collaborative(&FailingStore, "user-1", 5, &CollaborativeParams::default())
                .unwrap_err();
        assert_eq!(err, RecError::store("connection refused"));
    }

    #[test]
    fn params_follow_settings() {
        let settings = RecommenderSettings {
            factors: 8,
            iterations: 3,
            ..RecommenderSettings::default()
        };
        let params = CollaborativeParams::from(&settings);
        assert_eq!(params.als_config().factors, 8);
        assert_eq!(params.als_config().iterations, 3);
        assert!(params.filter_seen);
    }
}
