// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::fmt;

use thiserror::Error;

/// Kind of identifier that failed to resolve.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntityKind {
    Item,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Item => write!(f, "item"),
            EntityKind::User => write!(f, "user"),
        }
    }
}

/// Half of an ALS sweep.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    Users,
    Items,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Users => write!(f, "user"),
            Phase::Items => write!(f, "item"),
        }
    }
}

/// Errors surfaced by the track recommenders.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecError {
    /// The requested identifier is absent from the relevant store.
    #[error("{kind} {id:?} not found")]
    NotFound { kind: EntityKind, id: String },
    /// A hyperparameter or input violated its contract before any work ran.
    #[error("invalid {param}: {reason}")]
    InvalidConfig { param: &'static str, reason: String },
    /// A feature vector did not match the catalog dimensionality.
    #[error("feature vector for {id:?} has length {got}, catalog expects {expected}")]
    DimensionMismatch {
        id: String,
        expected: usize,
        got: usize,
    },
    /// A normal-equation system was not positive definite.
    #[error("{phase} row {row} produced a singular normal-equation system")]
    SingularSystem { phase: Phase, row: usize },
    /// Training was aborted; the partial model was discarded.
    #[error("training cancelled before iteration {iteration} completed")]
    Cancelled { iteration: usize },
    /// Failure reported by a store adapter.
    #[error("store error: {message}")]
    Store { message: String },
}

impl RecError {
    pub(crate) fn invalid(param: &'static str, reason: impl Into<String>) -> Self {
        RecError::InvalidConfig {
            param,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl fmt::Display) -> Self {
        RecError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// Wraps an adapter failure.
    pub fn store(message: impl fmt::Display) -> Self {
        RecError::Store {
            message: message.to_string(),
        }
    }
}

/// Convenient result alias for recommendation helpers.
pub type RecResult<T> = Result<T, RecError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_names_the_identifier() {
        let err = RecError::not_found(EntityKind::User, "user-404");
        assert_eq!(err.to_string(), "user \"user-404\" not found");
    }

    #[test]
    fn singular_system_reports_phase_and_row() {
        let err = RecError::SingularSystem {
            phase: Phase::Items,
            row: 3,
        };
        assert!(err.to_string().contains("item row 3"));
    }
}
