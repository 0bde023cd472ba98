//! Recommender defaults resolved from `SPIRAL_REC_*` environment variables.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading recommender settings.
#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{var} must be {expected}, got {value:?}")]
    Malformed {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Default hyperparameters for the track recommenders.
///
/// Values mirror the production pipeline: 64 latent factors, 15 ALS sweeps,
/// confidence scaling of 40 and a light 0.01 ridge term.
#[derive(Clone, Debug, PartialEq)]
pub struct RecommenderSettings {
    pub top_k: usize,
    pub factors: usize,
    pub iterations: usize,
    pub alpha: f32,
    pub regularization: f32,
    /// Dataset consumed by the JSON store adapter, if configured.
    pub dataset: Option<PathBuf>,
}

impl Default for RecommenderSettings {
    fn default() -> Self {
        Self {
            top_k: 10,
            factors: 64,
            iterations: 15,
            alpha: 40.0,
            regularization: 0.01,
            dataset: None,
        }
    }
}

impl RecommenderSettings {
    /// Reads settings from the environment, falling back to defaults for
    /// unset variables. Present but unparsable values are errors.
    pub fn from_env() -> Result<Self, SettingsError> {
        let defaults = Self::default();
        Ok(Self {
            top_k: read_positive("SPIRAL_REC_TOP_K")?.unwrap_or(defaults.top_k),
            factors: read_positive("SPIRAL_REC_FACTORS")?.unwrap_or(defaults.factors),
            iterations: read_positive("SPIRAL_REC_ITERATIONS")?.unwrap_or(defaults.iterations),
            alpha: read_non_negative("SPIRAL_REC_ALPHA")?.unwrap_or(defaults.alpha),
            regularization: read_positive_float("SPIRAL_REC_REGULARIZATION")?
                .unwrap_or(defaults.regularization),
            dataset: std::env::var_os("SPIRAL_REC_DATASET")
                .filter(|raw| !raw.is_empty())
                .map(PathBuf::from),
        })
    }
}

fn read_var(var: &'static str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn read_positive(var: &'static str) -> Result<Option<usize>, SettingsError> {
    let Some(raw) = read_var(var) else {
        return Ok(None);
    };
    match raw.parse::<usize>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(SettingsError::Malformed {
            var,
            value: raw,
            expected: "a positive integer",
        }),
    }
}

fn read_float(
    var: &'static str,
    accept: impl Fn(f32) -> bool,
    expected: &'static str,
) -> Result<Option<f32>, SettingsError> {
    let Some(raw) = read_var(var) else {
        return Ok(None);
    };
    match raw.parse::<f32>() {
        Ok(value) if value.is_finite() && accept(value) => Ok(Some(value)),
        _ => Err(SettingsError::Malformed {
            var,
            value: raw,
            expected,
        }),
    }
}

fn read_non_negative(var: &'static str) -> Result<Option<f32>, SettingsError> {
    read_float(var, |value| value >= 0.0, "a finite non-negative number")
}

fn read_positive_float(var: &'static str) -> Result<Option<f32>, SettingsError> {
    read_float(var, |value| value > 0.0, "a finite positive number")
}
