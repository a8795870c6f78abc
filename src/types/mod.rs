pub mod market;
pub mod signals;
pub mod snapshot;

pub use market::*;
pub use signals::*;
pub use snapshot::*;

/// Clamp a confidence-like value into [0, 1]. NaN collapses to 0.
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
