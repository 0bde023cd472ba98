// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Confidence-weighted user × item matrix built from implicit interactions.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::error::{RecError, RecResult};

/// Raw `(user, item, count)` observation supplied by an interaction store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionRecord<U, I> {
    pub user_id: U,
    pub item_id: I,
    pub raw_count: u32,
}

impl<U, I> InteractionRecord<U, I> {
    pub fn new(user_id: U, item_id: I, raw_count: u32) -> Self {
        Self {
            user_id,
            item_id,
            raw_count,
        }
    }
}

/// How raw interaction counts turn into confidence weights.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConfidenceMode {
    /// `1 + alpha * count`.
    Linear { alpha: f32 },
    /// The count itself.
    Raw,
}

impl ConfidenceMode {
    /// Mirrors the `use_confidence` / `alpha` flag pair of the pipeline.
    pub fn from_flag(use_confidence: bool, alpha: f32) -> Self {
        if use_confidence {
            ConfidenceMode::Linear { alpha }
        } else {
            ConfidenceMode::Raw
        }
    }

    fn validate(&self) -> RecResult<()> {
        match *self {
            ConfidenceMode::Linear { alpha } if !alpha.is_finite() || alpha < 0.0 => Err(
                RecError::invalid("alpha", format!("must be finite and >= 0, got {alpha}")),
            ),
            _ => Ok(()),
        }
    }

    /// Confidence weight for an aggregated raw count.
    pub fn weight(&self, count: u64) -> f32 {
        match *self {
            ConfidenceMode::Linear { alpha } => (1.0 + f64::from(alpha) * count as f64) as f32,
            ConfidenceMode::Raw => count as f32,
        }
    }
}

impl Default for ConfidenceMode {
    fn default() -> Self {
        ConfidenceMode::Linear { alpha: 40.0 }
    }
}

/// Bijection between external keys and dense `0..len` indices.
#[derive(Clone, Debug)]
pub struct DenseIndex<K> {
    keys: Vec<K>,
    lookup: HashMap<K, usize>,
}

impl<K> Default for DenseIndex<K> {
    fn default() -> Self {
        Self {
            keys: Vec::new(),
            lookup: HashMap::new(),
        }
    }
}

impl<K: Ord + Hash + Clone> DenseIndex<K> {
    /// Enumerates the distinct keys in ascending order.
    pub fn from_keys<T>(keys: T) -> Self
    where
        T: IntoIterator<Item = K>,
    {
        let mut keys: Vec<K> = keys.into_iter().collect();
        keys.sort();
        keys.dedup();
        let lookup = keys
            .iter()
            .enumerate()
            .map(|(index, key)| (key.clone(), index))
            .collect();
        Self { keys, lookup }
    }

    pub fn index_of(&self, key: &K) -> Option<usize> {
        self.lookup.get(key).copied()
    }
}

impl<K> DenseIndex<K> {
    pub fn key(&self, index: usize) -> Option<&K> {
        self.keys.get(index)
    }

    pub fn keys(&self) -> &[K] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Sparse row-compressed matrix of confidence weights.
///
/// Column indices inside a row are strictly increasing. Absent cells carry an
/// implicit weight of zero.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfidenceMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    weights: Vec<f32>,
}

impl ConfidenceMatrix {
    /// Matrix with the given shape and no stored entries.
    pub fn empty(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            indptr: vec![0; rows + 1],
            indices: Vec::new(),
            weights: Vec::new(),
        }
    }

    /// Builds a matrix from `(row, col, weight)` triplets sorted by `(row, col)`
    /// without duplicates. Zero weights are skipped.
    pub(crate) fn from_sorted_triplets<T>(rows: usize, cols: usize, triplets: T) -> Self
    where
        T: IntoIterator<Item = (usize, usize, f32)>,
    {
        let mut indptr = vec![0usize; rows + 1];
        let mut indices = Vec::new();
        let mut weights = Vec::new();
        for (row, col, weight) in triplets {
            debug_assert!(row < rows && col < cols);
            if weight == 0.0 {
                continue;
            }
            indptr[row + 1] += 1;
            indices.push(col);
            weights.push(weight);
        }
        for row in 0..rows {
            indptr[row + 1] += indptr[row];
        }
        Self {
            rows,
            cols,
            indptr,
            indices,
            weights,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of stored (nonzero) cells.
    pub fn nnz(&self) -> usize {
        self.weights.len()
    }

    /// Column indices and weights stored for `row`; empty when out of range.
    pub fn row(&self, row: usize) -> (&[usize], &[f32]) {
        if row >= self.rows {
            return (&[], &[]);
        }
        let span = self.indptr[row]..self.indptr[row + 1];
        (&self.indices[span.clone()], &self.weights[span])
    }

    /// Iterates `(col, weight)` pairs of `row`.
    pub fn row_entries(&self, row: usize) -> impl Iterator<Item = (usize, f32)> + '_ {
        let (cols, weights) = self.row(row);
        cols.iter().copied().zip(weights.iter().copied())
    }

    /// Weight stored at `(row, col)`, or 0.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        let (cols, weights) = self.row(row);
        cols.binary_search(&col).map(|at| weights[at]).unwrap_or(0.0)
    }

    /// Column-major view of the same cells (items × users).
    pub fn transpose(&self) -> ConfidenceMatrix {
        let mut counts = vec![0usize; self.cols + 1];
        for &col in &self.indices {
            counts[col + 1] += 1;
        }
        for col in 0..self.cols {
            counts[col + 1] += counts[col];
        }
        let indptr = counts.clone();
        let mut cursor = counts;
        let mut indices = vec![0usize; self.nnz()];
        let mut weights = vec![0.0f32; self.nnz()];
        for row in 0..self.rows {
            for (col, weight) in self.row_entries(row) {
                let slot = cursor[col];
                indices[slot] = row;
                weights[slot] = weight;
                cursor[col] += 1;
            }
        }
        ConfidenceMatrix {
            rows: self.cols,
            cols: self.rows,
            indptr,
            indices,
            weights,
        }
    }
}

/// Output of a build: the matrix plus the dense index bijections of this run.
#[derive(Clone, Debug)]
pub struct InteractionMatrix<U, I> {
    pub matrix: ConfidenceMatrix,
    pub users: DenseIndex<U>,
    pub items: DenseIndex<I>,
}

impl<U, I> InteractionMatrix<U, I> {
    /// True when no interactions were observed.
    pub fn is_empty(&self) -> bool {
        self.matrix.rows() == 0
    }
}

/// Configurable form of [`build`].
#[derive(Clone, Debug)]
pub struct InteractionMatrixBuilder<I> {
    mode: ConfidenceMode,
    universe: Vec<I>,
}

impl<I> Default for InteractionMatrixBuilder<I> {
    fn default() -> Self {
        Self {
            mode: ConfidenceMode::default(),
            universe: Vec::new(),
        }
    }
}

impl<I: Ord + Hash + Clone> InteractionMatrixBuilder<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn confidence(mut self, mode: ConfidenceMode) -> Self {
        self.mode = mode;
        self
    }

    /// Registers items that must receive a column even without interactions.
    pub fn item_universe<T>(mut self, items: T) -> Self
    where
        T: IntoIterator<Item = I>,
    {
        self.universe.extend(items);
        self
    }

    /// Builds the matrix. Duplicate `(user, item)` records have their raw
    /// counts summed before weighting.
    pub fn build<U: Ord + Hash + Clone>(
        &self,
        interactions: &[InteractionRecord<U, I>],
    ) -> RecResult<InteractionMatrix<U, I>> {
        self.mode.validate()?;

        let users = DenseIndex::from_keys(interactions.iter().map(|r| r.user_id.clone()));
        let items = DenseIndex::from_keys(
            self.universe
                .iter()
                .cloned()
                .chain(interactions.iter().map(|r| r.item_id.clone())),
        );

        let mut counts: BTreeMap<(usize, usize), u64> = BTreeMap::new();
        for record in interactions {
            // Both lookups succeed: the indices were built from these records.
            let (Some(user), Some(item)) = (
                users.index_of(&record.user_id),
                items.index_of(&record.item_id),
            ) else {
                continue;
            };
            *counts.entry((user, item)).or_insert(0) += u64::from(record.raw_count);
        }

        let mode = self.mode;
        let matrix = ConfidenceMatrix::from_sorted_triplets(
            users.len(),
            items.len(),
            counts
                .into_iter()
                .map(|((user, item), count)| (user, item, mode.weight(count))),
        );

        Ok(InteractionMatrix {
            matrix,
            users,
            items,
        })
    }
}

/// Builds the confidence matrix for an interaction batch.
///
/// An empty batch yields a matrix with zero rows, which callers treat as
/// "no recommendations" rather than a failure.
pub fn build<U, I>(
    interactions: &[InteractionRecord<U, I>],
    use_confidence: bool,
    alpha: f32,
) -> RecResult<InteractionMatrix<U, I>>
where
    U: Ord + Hash + Clone,
    I: Ord + Hash + Clone,
{
    InteractionMatrixBuilder::new()
        .confidence(ConfidenceMode::from_flag(use_confidence, alpha))
        .build(interactions)
}
