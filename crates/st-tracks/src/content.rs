// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Cosine-similarity ranking over item feature vectors.

use tracing::debug;

use crate::error::{EntityKind, RecError, RecResult};
use crate::feature::FeatureCatalog;
use crate::ScoredItem;

/// Cosine similarity of two equally sized vectors.
///
/// Returns 0 when either vector has zero norm. Components are accumulated in
/// `f64` and the result is clamped to `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "cosine operands must share a length");
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0) as f32
}

/// Ranks every other catalog item by cosine similarity to `target_id`.
///
/// Results are sorted by descending score; equal scores keep catalog order.
/// At most `top_k` entries are returned and the target never appears in its
/// own results.
pub fn similar_items(
    target_id: &str,
    catalog: &FeatureCatalog,
    top_k: usize,
) -> RecResult<Vec<ScoredItem>> {
    let target = catalog
        .get(target_id)
        .ok_or_else(|| RecError::not_found(EntityKind::Item, target_id))?;

    let mut scored: Vec<ScoredItem> = catalog
        .iter()
        .filter(|candidate| candidate.item_id() != target_id)
        .map(|candidate| ScoredItem {
            item_id: candidate.item_id().to_string(),
            score: cosine_similarity(target.values(), candidate.values()),
        })
        .collect();

    // `sort_by` is stable, which keeps catalog order for ties.
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);

    debug!(
        target = target_id,
        candidates = catalog.len().saturating_sub(1),
        returned = scored.len(),
        "ranked content neighbours"
    );
    Ok(scored)
}
