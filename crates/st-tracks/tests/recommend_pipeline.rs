use st_tracks::sample::{sample_catalog, sample_dataset, SampleConfig};
use st_tracks::store::{InteractionRow, UserRecord};
use st_tracks::{
    recommend_collaborative, recommend_content_based, CollaborativeParams, Dataset, EmptyReason,
    EntityKind, MemoryStore, RecError,
};

fn small_params(seed: u64) -> CollaborativeParams {
    CollaborativeParams {
        factors: 8,
        iterations: 5,
        seed: Some(seed),
        ..CollaborativeParams::default()
    }
}

fn sample_store(seed: u64) -> MemoryStore {
    MemoryStore::new(sample_dataset(&SampleConfig {
        users: 20,
        interactions: 300,
        seed: Some(seed),
    }))
}

#[test]
fn content_ranking_prefers_tracks_of_the_same_mood() {
    let store = MemoryStore::new(sample_catalog());
    let outcome = recommend_content_based(&store, "H1", 5).unwrap();
    let items = outcome.items();
    assert_eq!(items.len(), 5);
    assert!(items.iter().all(|item| item.item_id != "H1"));
    assert!(items.windows(2).all(|pair| pair[0].score >= pair[1].score));
    // Happy tracks share both mood flags with the seed.
    assert_eq!(items[0].item_id, "H7");
    assert!(items.iter().all(|item| item.item_id.starts_with('H')));
}

#[test]
fn content_ranking_is_idempotent() {
    let store = MemoryStore::new(sample_catalog());
    let first = recommend_content_based(&store, "C3", 10).unwrap();
    let second = recommend_content_based(&store, "C3", 10).unwrap();
    assert_eq!(first, second);
}

#[test]
fn content_ranking_rejects_unknown_track() {
    let store = MemoryStore::new(sample_catalog());
    let err = recommend_content_based(&store, "missing", 5).unwrap_err();
    assert!(matches!(
        err,
        RecError::NotFound {
            kind: EntityKind::Item,
            ..
        }
    ));
}

#[test]
fn content_ranking_caps_at_catalog_size() {
    let store = MemoryStore::new(sample_catalog());
    let outcome = recommend_content_based(&store, "D4", 100).unwrap();
    assert_eq!(outcome.items().len(), 29);
}

#[test]
fn collaborative_results_skip_seen_tracks() {
    let store = sample_store(11);
    let dataset = store.dataset().clone();
    let user = &dataset.users[0];
    let seen: Vec<String> = dataset
        .interactions
        .iter()
        .filter(|row| row.user_id == user.id)
        .filter_map(|row| {
            dataset
                .tracks
                .iter()
                .find(|track| track.id == row.track_id)
                .map(|track| track.track_uuid.clone())
        })
        .collect();
    assert!(!seen.is_empty());

    let outcome = recommend_collaborative(&store, &user.user_uuid, 10, &small_params(2)).unwrap();
    assert!(!outcome.is_empty());
    assert!(outcome.items().len() <= 10);
    for item in outcome.items() {
        assert!(!seen.contains(&item.item_id), "{} was already played", item.item_id);
        assert!(item.score.is_finite());
    }
    assert!(outcome
        .items()
        .windows(2)
        .all(|pair| pair[0].score >= pair[1].score));
}

#[test]
fn collaborative_results_are_reproducible_with_a_seed() {
    let store = sample_store(5);
    let first = recommend_collaborative(&store, "user-3", 5, &small_params(9)).unwrap();
    let second = recommend_collaborative(&store, "user-3", 5, &small_params(9)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn collaborative_unknown_user_is_not_found() {
    let store = sample_store(1);
    let err = recommend_collaborative(&store, "nobody", 5, &small_params(1)).unwrap_err();
    assert!(matches!(
        err,
        RecError::NotFound {
            kind: EntityKind::User,
            ..
        }
    ));
}

#[test]
fn collaborative_user_without_history_gets_empty_outcome() {
    let mut dataset = sample_catalog();
    dataset.users = vec![
        UserRecord {
            id: 1,
            user_uuid: "listener".into(),
        },
        UserRecord {
            id: 2,
            user_uuid: "newcomer".into(),
        },
    ];
    dataset.interactions = vec![InteractionRow {
        user_id: 1,
        track_id: 4,
        play_count: 3,
        skipped: false,
        completed: true,
    }];
    let store = MemoryStore::new(dataset);
    let outcome = recommend_collaborative(&store, "newcomer", 5, &small_params(1)).unwrap();
    assert_eq!(outcome.empty_reason(), Some(EmptyReason::UserHasNoInteractions));
    assert!(outcome.items().is_empty());
}

#[test]
fn collaborative_empty_store_gets_empty_outcome() {
    let mut dataset = Dataset::default();
    dataset.users.push(UserRecord {
        id: 1,
        user_uuid: "solo".into(),
    });
    let store = MemoryStore::new(dataset);
    let outcome = recommend_collaborative(&store, "solo", 5, &small_params(1)).unwrap();
    assert_eq!(outcome.empty_reason(), Some(EmptyReason::NoInteractions));
}

#[test]
fn dataset_survives_a_json_round_trip() {
    let dataset = sample_dataset(&SampleConfig {
        users: 5,
        interactions: 40,
        seed: Some(8),
    });
    let restored = Dataset::from_json_str(&dataset.to_json_pretty().unwrap()).unwrap();
    assert_eq!(restored, dataset);
}
