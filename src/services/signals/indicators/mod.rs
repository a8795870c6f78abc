//! Technical indicator implementations.
//!
//! Every indicator is a pure function of an ordered price sequence and
//! returns `None` when its own minimum sample count is not met, so one
//! missing indicator never blocks the others.

pub mod atr;
pub mod bollinger;
pub mod ema;
pub mod fibonacci;
pub mod levels;
pub mod macd;
pub mod rsi;
pub mod sma;

pub use atr::{Atr, RangeBar};
pub use bollinger::Bollinger;
pub use ema::{ema_series, Ema};
pub use fibonacci::Fibonacci;
pub use levels::{resistances, supports, LEVEL_WINDOW, MAX_LEVELS};
pub use macd::Macd;
pub use rsi::{rsi_series, Rsi};
pub use sma::Sma;

use crate::types::{IndicatorSet, MacdSignalMode};

/// Trait for implementing technical indicators.
pub trait Indicator {
    type Output;

    /// Human-readable name.
    fn name(&self) -> &str;

    /// Minimum number of samples required for calculation.
    fn min_periods(&self) -> usize;

    /// Calculate the indicator from prices, oldest first.
    /// Returns None if there is not enough data.
    fn calculate(&self, prices: &[f64]) -> Option<Self::Output>;
}

/// Compute the full indicator set for a price snapshot.
pub fn compute(prices: &[f64], macd_mode: MacdSignalMode) -> IndicatorSet {
    IndicatorSet {
        sma20: Sma::new(20).calculate(prices),
        rsi: Rsi::default().calculate(prices),
        macd: Macd::with_mode(macd_mode).calculate(prices),
        bollinger: Bollinger::default().calculate(prices),
        atr: Atr::default().calculate(prices),
        supports: supports(prices, LEVEL_WINDOW),
        resistances: resistances(prices, LEVEL_WINDOW),
        fibonacci: Fibonacci.calculate(prices),
    }
}
