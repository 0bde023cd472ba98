// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Implicit-feedback alternating least squares.
//!
//! Minimises `Σ c_ui (p_ui − x_uᵀ y_i)² + λ (‖X‖² + ‖Y‖²)` where observed cells
//! take their confidence from the [`ConfidenceMatrix`] with `p_ui = 1`, and
//! unobserved cells take [`AlsConfig::unobserved_confidence`] with `p_ui = 0`.
//! Each half-sweep solves one `F × F` normal-equation system per row:
//!
//! ```text
//! (b₀·YᵀY + λI + Σ_obs (c_ui − b₀) y_i y_iᵀ) x_u = Σ_obs c_ui y_i
//! ```
//!
//! `YᵀY` is shared by every row of a phase, so the per-row cost only depends
//! on that row's observed entries.

use std::sync::atomic::{AtomicBool, Ordering};

use rand::distributions::{Distribution, Uniform};
use rayon::prelude::*;
use spiral_config::determinism;
use tracing::{debug, info, info_span};

use crate::error::{Phase, RecError, RecResult};
use crate::linalg::{cholesky_solve, dot, quadratic_form};
use crate::matrix::ConfidenceMatrix;

/// Hyperparameters of an ALS training run.
#[derive(Clone, Debug, PartialEq)]
pub struct AlsConfig {
    /// Latent dimensionality `F`.
    pub factors: usize,
    /// Ridge weight `λ` applied to both factor matrices.
    pub regularization: f32,
    /// Number of full user+item sweeps. There is no early stopping.
    pub iterations: usize,
    /// Confidence `b₀` of unobserved cells.
    pub unobserved_confidence: f32,
    /// Half-width of the uniform initialisation interval.
    pub init_scale: f32,
    /// Explicit RNG seed; `None` defers to `spiral_config::determinism`.
    pub seed: Option<u64>,
}

impl Default for AlsConfig {
    fn default() -> Self {
        Self {
            factors: 64,
            regularization: 0.01,
            iterations: 15,
            unobserved_confidence: 1.0,
            init_scale: 0.01,
            seed: None,
        }
    }
}

impl AlsConfig {
    pub fn new(factors: usize, regularization: f32, iterations: usize) -> Self {
        Self {
            factors,
            regularization,
            iterations,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_unobserved_confidence(mut self, confidence: f32) -> Self {
        self.unobserved_confidence = confidence;
        self
    }

    /// Checks the hyperparameters without touching any data.
    pub fn validate(&self) -> RecResult<()> {
        if self.factors == 0 {
            return Err(RecError::invalid("factors", "must be at least 1"));
        }
        if self.iterations == 0 {
            return Err(RecError::invalid("iterations", "must be at least 1"));
        }
        // λ > 0 keeps every row system positive definite, whatever the rank.
        if !self.regularization.is_finite() || self.regularization <= 0.0 {
            return Err(RecError::invalid(
                "regularization",
                format!("must be finite and > 0, got {}", self.regularization),
            ));
        }
        if !self.unobserved_confidence.is_finite() || self.unobserved_confidence < 0.0 {
            return Err(RecError::invalid(
                "unobserved_confidence",
                format!("must be finite and >= 0, got {}", self.unobserved_confidence),
            ));
        }
        if !self.init_scale.is_finite() || self.init_scale <= 0.0 {
            return Err(RecError::invalid(
                "init_scale",
                format!("must be finite and > 0, got {}", self.init_scale),
            ));
        }
        Ok(())
    }
}

/// Row-major matrix with one factor vector per row.
#[derive(Clone, Debug, PartialEq)]
pub struct FactorMatrix {
    rows: usize,
    dim: usize,
    data: Vec<f32>,
}

impl FactorMatrix {
    fn random<D: Distribution<f32>, R: rand::Rng>(
        rows: usize,
        dim: usize,
        dist: &D,
        rng: &mut R,
    ) -> Self {
        let data = (0..rows * dim).map(|_| dist.sample(&mut *rng)).collect();
        Self { rows, dim, data }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn row(&self, index: usize) -> &[f32] {
        &self.data[index * self.dim..(index + 1) * self.dim]
    }

    fn squared_norm(&self) -> f64 {
        self.data.iter().map(|&v| f64::from(v) * f64::from(v)).sum()
    }

    /// `scale · MᵀM` as a row-major `dim × dim` buffer.
    fn gramian(&self, scale: f64) -> Vec<f64> {
        let f = self.dim;
        let mut gram = vec![0.0f64; f * f];
        if scale == 0.0 {
            return gram;
        }
        for row in self.data.chunks_exact(f) {
            for i in 0..f {
                let ri = f64::from(row[i]);
                for j in 0..=i {
                    gram[i * f + j] += ri * f64::from(row[j]);
                }
            }
        }
        for i in 0..f {
            for j in 0..=i {
                let value = gram[i * f + j] * scale;
                gram[i * f + j] = value;
                gram[j * f + i] = value;
            }
        }
        gram
    }
}

/// User and item latent factors learned by [`train`].
#[derive(Clone, Debug, PartialEq)]
pub struct LatentFactorModel {
    user_factors: FactorMatrix,
    item_factors: FactorMatrix,
}

impl LatentFactorModel {
    pub fn users(&self) -> usize {
        self.user_factors.rows()
    }

    pub fn items(&self) -> usize {
        self.item_factors.rows()
    }

    pub fn factors(&self) -> usize {
        self.user_factors.dim()
    }

    pub fn user_factors(&self) -> &FactorMatrix {
        &self.user_factors
    }

    pub fn item_factors(&self) -> &FactorMatrix {
        &self.item_factors
    }

    pub fn user_vector(&self, user: usize) -> Option<&[f32]> {
        (user < self.users()).then(|| self.user_factors.row(user))
    }

    pub fn item_vector(&self, item: usize) -> Option<&[f32]> {
        (item < self.items()).then(|| self.item_factors.row(item))
    }

    /// Predicted affinity `x_uᵀ y_i`.
    pub fn score(&self, user: usize, item: usize) -> Option<f32> {
        let x = self.user_vector(user)?;
        let y = self.item_vector(item)?;
        Some(dot(x, y) as f32)
    }
}

/// Summary of a finished training run.
#[derive(Clone, Debug, PartialEq)]
pub struct AlsReport {
    pub users: usize,
    pub items: usize,
    pub nnz: usize,
    /// Objective value after each sweep.
    pub losses: Vec<f64>,
}

impl AlsReport {
    pub fn iterations(&self) -> usize {
        self.losses.len()
    }

    pub fn final_loss(&self) -> Option<f64> {
        self.losses.last().copied()
    }
}

/// Model and report returned by a completed run.
#[derive(Clone, Debug)]
pub struct TrainedModel {
    pub model: LatentFactorModel,
    pub report: AlsReport,
}

/// Trains user/item factors for `matrix` (users × items).
pub fn train(matrix: &ConfidenceMatrix, config: &AlsConfig) -> RecResult<TrainedModel> {
    let never = AtomicBool::new(false);
    train_with_cancel(matrix, config, &never)
}

/// Like [`train`], but checks `cancel` before every half-sweep.
///
/// A cancelled run returns [`RecError::Cancelled`] and the partially updated
/// factors are dropped.
pub fn train_with_cancel(
    matrix: &ConfidenceMatrix,
    config: &AlsConfig,
    cancel: &AtomicBool,
) -> RecResult<TrainedModel> {
    config.validate()?;
    if matrix.rows() == 0 || matrix.cols() == 0 {
        return Err(RecError::invalid(
            "matrix",
            format!(
                "needs at least one row and one column, got {}x{}",
                matrix.rows(),
                matrix.cols()
            ),
        ));
    }

    let (users, items, factors) = (matrix.rows(), matrix.cols(), config.factors);
    let _span = info_span!("als_train", users, items, factors).entered();

    let mut rng = determinism::rng_from_optional(config.seed, "st-tracks/als/init");
    let dist = Uniform::new(-config.init_scale, config.init_scale);
    let mut user_factors = FactorMatrix::random(users, factors, &dist, &mut rng);
    let mut item_factors = FactorMatrix::random(items, factors, &dist, &mut rng);

    let item_user = matrix.transpose();
    let solver = RowSolver {
        regularization: f64::from(config.regularization),
        baseline: f64::from(config.unobserved_confidence),
    };

    let mut losses = Vec::with_capacity(config.iterations);
    for iteration in 0..config.iterations {
        if cancel.load(Ordering::Relaxed) {
            return Err(RecError::Cancelled { iteration });
        }
        solver.solve_phase(Phase::Users, matrix, &item_factors, &mut user_factors)?;

        if cancel.load(Ordering::Relaxed) {
            return Err(RecError::Cancelled { iteration });
        }
        solver.solve_phase(Phase::Items, &item_user, &user_factors, &mut item_factors)?;

        let loss = solver.objective(matrix, &user_factors, &item_factors);
        debug!(iteration = iteration + 1, loss, "als sweep complete");
        losses.push(loss);
    }

    let report = AlsReport {
        users,
        items,
        nnz: matrix.nnz(),
        losses,
    };
    info!(
        nnz = report.nnz,
        iterations = report.iterations(),
        final_loss = ?report.final_loss(),
        "trained implicit ALS model"
    );

    Ok(TrainedModel {
        model: LatentFactorModel {
            user_factors,
            item_factors,
        },
        report,
    })
}

struct RowSolver {
    regularization: f64,
    baseline: f64,
}

impl RowSolver {
    /// Re-solves every row of `target` against the fixed opposite factors.
    ///
    /// `confidence` must have one row per `target` row and one column per
    /// `fixed` row. Rows are independent, so they are solved in parallel unless
    /// deterministic reduction order is requested.
    fn solve_phase(
        &self,
        phase: Phase,
        confidence: &ConfidenceMatrix,
        fixed: &FactorMatrix,
        target: &mut FactorMatrix,
    ) -> RecResult<()> {
        debug_assert_eq!(confidence.rows(), target.rows());
        debug_assert_eq!(confidence.cols(), fixed.rows());

        let f = fixed.dim();
        let gram = fixed.gramian(self.baseline);
        let solve_row = |(row, out): (usize, &mut [f32])| -> RecResult<()> {
            let mut a = gram.clone();
            let mut b = vec![0.0f64; f];
            for d in 0..f {
                a[d * f + d] += self.regularization;
            }
            for (col, weight) in confidence.row_entries(row) {
                let y = fixed.row(col);
                let c = f64::from(weight);
                let extra = c - self.baseline;
                for i in 0..f {
                    let yi = f64::from(y[i]);
                    b[i] += c * yi;
                    if extra != 0.0 {
                        let scaled = extra * yi;
                        for j in 0..=i {
                            a[i * f + j] += scaled * f64::from(y[j]);
                        }
                    }
                }
            }
            cholesky_solve(&mut a, &mut b, f)
                .map_err(|_| RecError::SingularSystem { phase, row })?;
            for (dst, &src) in out.iter_mut().zip(b.iter()) {
                *dst = src as f32;
            }
            Ok(())
        };

        if determinism::lock_reduction_order() {
            target.data.chunks_mut(f).enumerate().try_for_each(solve_row)
        } else {
            target
                .data
                .par_chunks_mut(f)
                .enumerate()
                .try_for_each(solve_row)
        }
    }

    /// Full objective, evaluated without materialising the dense matrix.
    fn objective(
        &self,
        matrix: &ConfidenceMatrix,
        user_factors: &FactorMatrix,
        item_factors: &FactorMatrix,
    ) -> f64 {
        let mut loss = 0.0f64;
        if self.baseline != 0.0 {
            let gram = item_factors.gramian(self.baseline);
            for user in 0..user_factors.rows() {
                loss += quadratic_form(&gram, user_factors.row(user));
            }
        }
        for user in 0..matrix.rows() {
            let x = user_factors.row(user);
            for (item, weight) in matrix.row_entries(user) {
                let prediction = dot(x, item_factors.row(item));
                let residual = 1.0 - prediction;
                loss += f64::from(weight) * residual * residual
                    - self.baseline * prediction * prediction;
            }
        }
        loss + self.regularization * (user_factors.squared_norm() + item_factors.squared_norm())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{build, InteractionRecord};

    fn toy_matrix() -> ConfidenceMatrix {
        // Two taste clusters: users 0-2 share items 0-2, users 3-5 share items 3-5.
        let mut records = Vec::new();
        for user in 0u32..3 {
            for item in 0u32..3 {
                if user != item {
                    records.push(InteractionRecord::new(user, item, 3));
                }
            }
        }
        for user in 3u32..6 {
            for item in 3u32..6 {
                if user != item {
                    records.push(InteractionRecord::new(user, item, 3));
                }
            }
        }
        build(&records, true, 10.0).unwrap().matrix
    }

    #[test]
    fn zero_factors_is_invalid() {
        let err = train(&toy_matrix(), &AlsConfig::new(0, 0.01, 5)).unwrap_err();
        assert!(matches!(err, RecError::InvalidConfig { param: "factors", .. }));
    }

    #[test]
    fn zero_iterations_is_invalid() {
        let err = train(&toy_matrix(), &AlsConfig::new(4, 0.01, 0)).unwrap_err();
        assert!(matches!(err, RecError::InvalidConfig { param: "iterations", .. }));
    }

    #[test]
    fn empty_matrix_is_invalid() {
        let err = train(&ConfidenceMatrix::empty(0, 0), &AlsConfig::new(4, 0.01, 5)).unwrap_err();
        assert!(matches!(err, RecError::InvalidConfig { param: "matrix", .. }));
    }

    #[test]
    fn negative_regularization_is_invalid() {
        let err = train(&toy_matrix(), &AlsConfig::new(4, -0.5, 5)).unwrap_err();
        assert!(matches!(
            err,
            RecError::InvalidConfig {
                param: "regularization",
                ..
            }
        ));
    }

    #[test]
    fn model_shape_follows_matrix_and_rank() {
        let trained = train(&toy_matrix(), &AlsConfig::new(3, 0.1, 2).with_seed(1)).unwrap();
        assert_eq!(trained.model.users(), 6);
        assert_eq!(trained.model.items(), 6);
        assert_eq!(trained.model.factors(), 3);
        assert_eq!(trained.report.iterations(), 2);
        assert_eq!(trained.report.nnz, 12);
    }

    #[test]
    fn objective_never_increases() {
        let trained = train(&toy_matrix(), &AlsConfig::new(4, 0.1, 8).with_seed(7)).unwrap();
        let losses = &trained.report.losses;
        for pair in losses.windows(2) {
            assert!(
                pair[1] <= pair[0] * (1.0 + 1e-4) + 1e-6,
                "objective rose from {} to {}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let config = AlsConfig::new(4, 0.1, 4).with_seed(99);
        let first = train(&toy_matrix(), &config).unwrap();
        let second = train(&toy_matrix(), &config).unwrap();
        assert_eq!(first.model, second.model);
    }

    #[test]
    fn cluster_members_score_higher_than_strangers() {
        let trained = train(&toy_matrix(), &AlsConfig::new(4, 0.1, 15).with_seed(3)).unwrap();
        let model = &trained.model;
        // User 0 never saw item 0 but its neighbours did.
        let inside = model.score(0, 0).unwrap();
        let outside = model.score(0, 4).unwrap();
        assert!(inside > outside, "inside {inside} <= outside {outside}");
    }

    #[test]
    fn cancelled_runs_discard_the_model() {
        let cancel = AtomicBool::new(true);
        let err =
            train_with_cancel(&toy_matrix(), &AlsConfig::new(2, 0.1, 3), &cancel).unwrap_err();
        assert_eq!(err, RecError::Cancelled { iteration: 0 });
    }

    #[test]
    fn zero_regularization_is_invalid() {
        let err = train(&toy_matrix(), &AlsConfig::new(4, 0.0, 5)).unwrap_err();
        assert!(matches!(
            err,
            RecError::InvalidConfig {
                param: "regularization",
                ..
            }
        ));
    }

    #[test]
    fn rank_above_item_count_still_trains() {
        // Six items, sixteen factors: only the ridge term keeps the systems solvable.
        let trained = train(&toy_matrix(), &AlsConfig::new(16, 0.01, 3).with_seed(4)).unwrap();
        assert!(trained.report.losses.iter().all(|loss| loss.is_finite()));
    }

    #[test]
    fn observed_only_objective_trains() {
        let config = AlsConfig::new(4, 0.1, 4)
            .with_unobserved_confidence(0.0)
            .with_seed(8);
        let trained = train(&toy_matrix(), &config).unwrap();
        let losses = &trained.report.losses;
        assert!(losses.windows(2).all(|w| w[1] <= w[0] * (1.0 + 1e-4) + 1e-6));
    }

    #[test]
    fn non_finite_confidence_is_reported_as_singular() {
        let matrix = ConfidenceMatrix::from_sorted_triplets(1, 1, [(0, 0, f32::INFINITY)]);
        let err = train(&matrix, &AlsConfig::new(1, 0.1, 1).with_seed(5)).unwrap_err();
        assert_eq!(
            err,
            RecError::SingularSystem {
                phase: Phase::Users,
                row: 0
            }
        );
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let trained = train(&toy_matrix(), &AlsConfig::new(2, 0.1, 1).with_seed(2)).unwrap();
        assert!(trained.model.user_vector(6).is_none());
        assert!(trained.model.score(0, 99).is_none());
    }
}
