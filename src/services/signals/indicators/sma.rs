//! Simple Moving Average (SMA) indicator.

use super::Indicator;

/// SMA (Simple Moving Average) indicator.
///
/// Mean of the last `period` prices.
pub struct Sma {
    period: usize,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

impl Indicator for Sma {
    type Output = f64;

    fn name(&self) -> &str {
        match self.period {
            20 => "SMA (20)",
            50 => "SMA (50)",
            _ => "SMA",
        }
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, prices: &[f64]) -> Option<f64> {
        if self.period == 0 || prices.len() < self.period {
            return None;
        }

        let sum: f64 = prices.iter().rev().take(self.period).sum();
        Some(sum / self.period as f64)
    }
}
