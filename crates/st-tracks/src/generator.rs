// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Top-K item selection from trained latent factors.

use std::cmp::Ordering;

use crate::als::LatentFactorModel;
use crate::linalg::dot;
use crate::matrix::ConfidenceMatrix;
use crate::Recommendation;

/// Descending score, then ascending item index.
fn rank(a: &Recommendation, b: &Recommendation) -> Ordering {
    b.score.total_cmp(&a.score).then(a.item.cmp(&b.item))
}

/// Scores every item for `user_index` and returns the best `top_k`.
///
/// With `filter_seen`, items holding a nonzero weight in the user's row of
/// `matrix` are dropped before ranking. A user missing from either the model
/// or `matrix`, a fully filtered candidate set or `top_k == 0` all yield an
/// empty vector.
pub fn recommend(
    model: &LatentFactorModel,
    matrix: &ConfidenceMatrix,
    user_index: usize,
    top_k: usize,
    filter_seen: bool,
) -> Vec<Recommendation> {
    let Some(user) = model.user_vector(user_index) else {
        return Vec::new();
    };
    if top_k == 0 || user_index >= matrix.rows() {
        return Vec::new();
    }

    let (seen, _) = matrix.row(user_index);
    let item_factors = model.item_factors();
    let mut candidates: Vec<Recommendation> = (0..model.items())
        .filter(|item| !filter_seen || seen.binary_search(item).is_err())
        .map(|item| Recommendation {
            item,
            score: dot(user, item_factors.row(item)) as f32,
        })
        .collect();

    if candidates.len() > top_k {
        candidates.select_nth_unstable_by(top_k - 1, rank);
        candidates.truncate(top_k);
    }
    candidates.sort_unstable_by(rank);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::als::{train, AlsConfig};
    use crate::matrix::{build, InteractionRecord};

    fn fixture() -> (LatentFactorModel, ConfidenceMatrix) {
        let records: Vec<_> = [
            (0u32, 0u32, 5u32),
            (0, 1, 3),
            (1, 1, 4),
            (1, 2, 2),
            (2, 0, 1),
            (2, 3, 6),
            (3, 2, 2),
            (3, 4, 1),
        ]
        .into_iter()
        .map(|(u, i, c)| InteractionRecord::new(u, i, c))
        .collect();
        let matrix = build(&records, true, 40.0).unwrap().matrix;
        let model = train(&matrix, &AlsConfig::new(3, 0.05, 6).with_seed(11))
            .unwrap()
            .model;
        (model, matrix)
    }

    #[test]
    fn filtered_results_skip_seen_items() {
        let (model, matrix) = fixture();
        let recs = recommend(&model, &matrix, 0, 10, true);
        let items: Vec<_> = recs.iter().map(|r| r.item).collect();
        assert_eq!(items.len(), 3);
        assert!(!items.contains(&0) && !items.contains(&1));
    }

    #[test]
    fn unfiltered_results_cover_every_item() {
        let (model, matrix) = fixture();
        assert_eq!(recommend(&model, &matrix, 0, 10, false).len(), 5);
    }

    #[test]
    fn results_are_sorted_and_bounded() {
        let (model, matrix) = fixture();
        let recs = recommend(&model, &matrix, 1, 2, false);
        assert_eq!(recs.len(), 2);
        assert!(recs[0].score >= recs[1].score);
        let full = recommend(&model, &matrix, 1, 5, false);
        assert_eq!(&full[..2], &recs[..]);
        assert!(full.windows(2).all(|w| rank(&w[0], &w[1]) != Ordering::Greater));
    }

    #[test]
    fn scores_match_model_predictions() {
        let (model, matrix) = fixture();
        for rec in recommend(&model, &matrix, 2, 5, false) {
            let expected = model.score(2, rec.item).unwrap();
            assert!((rec.score - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn unknown_user_yields_nothing() {
        let (model, matrix) = fixture();
        assert!(recommend(&model, &matrix, 42, 3, true).is_empty());
    }

    #[test]
    fn empty_interaction_matrix_yields_nothing() {
        let (model, _) = fixture();
        let empty = build::<u32, u32>(&[], true, 40.0).unwrap();
        assert_eq!(empty.matrix.rows(), 0);
        assert!(recommend(&model, &empty.matrix, 0, 5, true).is_empty());
        assert!(recommend(&model, &empty.matrix, 0, 5, false).is_empty());
    }

    #[test]
    fn zero_top_k_yields_nothing() {
        let (model, matrix) = fixture();
        assert!(recommend(&model, &matrix, 0, 0, false).is_empty());
    }

    #[test]
    fn ties_break_on_ascending_item_index() {
        let mut recs = vec![
            Recommendation { item: 3, score: 0.5 },
            Recommendation { item: 1, score: 0.5 },
            Recommendation { item: 2, score: 0.9 },
        ];
        recs.sort_unstable_by(rank);
        let items: Vec<_> = recs.iter().map(|r| r.item).collect();
        assert_eq!(items, [2, 1, 3]);
    }
}
