//! Runtime configuration shared by the SpiralTorch recommendation crates.
//!
//! Everything here is read from the process environment once and exposed as
//! immutable snapshots, so library code never consults `std::env` directly.

pub mod determinism;
pub mod recommend;
pub mod tracing;

pub use recommend::{RecommenderSettings, SettingsError};
