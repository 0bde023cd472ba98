// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Fixed-length item feature vectors and the catalog that owns them.

use std::collections::HashMap;

use crate::error::{RecError, RecResult};

/// Feature vector of a single catalog item.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureVector {
    item_id: String,
    values: Vec<f32>,
}

impl FeatureVector {
    /// Builds a vector after rejecting non-finite components.
    pub fn new(item_id: impl Into<String>, values: Vec<f32>) -> RecResult<Self> {
        let item_id = item_id.into();
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(RecError::invalid(
                "feature vector",
                format!("{item_id:?} has a non-finite value at position {position}"),
            ));
        }
        Ok(Self { item_id, values })
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Immutable set of feature vectors sharing one dimensionality.
///
/// Iteration follows the order in which the store produced the records, which
/// is also the tie-break order of the content ranker.
#[derive(Clone, Debug, Default)]
pub struct FeatureCatalog {
    dim: usize,
    entries: Vec<FeatureVector>,
    lookup: HashMap<String, usize>,
}

impl FeatureCatalog {
    /// Validates raw `(item_id, values)` pairs into a catalog.
    ///
    /// The first record fixes the dimensionality; later records with a
    /// different length fail with [`RecError::DimensionMismatch`]. Duplicate
    /// identifiers are rejected as well.
    pub fn from_records<I, S>(records: I) -> RecResult<Self>
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut catalog = Self::default();
        for (item_id, values) in records {
            catalog.push(FeatureVector::new(item_id, values)?)?;
        }
        Ok(catalog)
    }

    fn push(&mut self, vector: FeatureVector) -> RecResult<()> {
        if self.entries.is_empty() {
            self.dim = vector.len();
        } else if vector.len() != self.dim {
            let got = vector.len();
            return Err(RecError::DimensionMismatch {
                id: vector.item_id,
                expected: self.dim,
                got,
            });
        }
        if self.lookup.contains_key(vector.item_id()) {
            return Err(RecError::invalid(
                "feature catalog",
                format!("duplicate item id {:?}", vector.item_id()),
            ));
        }
        self.lookup.insert(vector.item_id.clone(), self.entries.len());
        self.entries.push(vector);
        Ok(())
    }

    /// Shared vector length, or 0 for an empty catalog.
    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, item_id: &str) -> Option<&FeatureVector> {
        self.lookup.get(item_id).map(|&index| &self.entries[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &FeatureVector> {
        self.entries.iter()
    }
}
