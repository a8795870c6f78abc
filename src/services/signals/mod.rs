//! Market signal analysis.
//!
//! Pure computations over a price snapshot: technical indicators,
//! divergence and manipulation screens, the confluence vote, the
//! forecast and risk levels. Nothing here holds state.

pub mod anomaly;
pub mod confluence;
pub mod divergence;
pub mod indicators;
pub mod prediction;
pub mod risk;

pub use confluence::{ConfluenceInput, LevelSet};
pub use indicators::Indicator;
