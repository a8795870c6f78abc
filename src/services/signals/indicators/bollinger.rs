//! Bollinger Bands indicator.

use super::Indicator;
use crate::types::BollingerBands;

/// Bollinger Bands indicator.
///
/// Consists of:
/// - Middle band: SMA(20)
/// - Upper band: SMA + 2 * StdDev
/// - Lower band: SMA - 2 * StdDev
///
/// StdDev is the population standard deviation of the same window.
pub struct Bollinger {
    period: usize,
    std_dev_multiplier: f64,
}

impl Default for Bollinger {
    fn default() -> Self {
        Self {
            period: 20,
            std_dev_multiplier: 2.0,
        }
    }
}

impl Bollinger {
    pub fn new(period: usize, std_dev_multiplier: f64) -> Self {
        Self {
            period,
            std_dev_multiplier,
        }
    }

    /// Calculate standard deviation.
    fn std_dev(values: &[f64], mean: f64) -> f64 {
        if values.is_empty() {
            return 0.0;
        }
        let variance: f64 =
            values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        variance.sqrt()
    }
}

impl Indicator for Bollinger {
    type Output = BollingerBands;

    fn name(&self) -> &str {
        "Bollinger Bands"
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, prices: &[f64]) -> Option<BollingerBands> {
        if self.period == 0 || prices.len() < self.period {
            return None;
        }

        let window = &prices[prices.len() - self.period..];
        let middle = window.iter().sum::<f64>() / self.period as f64;
        let std_dev = Self::std_dev(window, middle);

        Some(BollingerBands {
            upper: middle + self.std_dev_multiplier * std_dev,
            middle,
            lower: middle - self.std_dev_multiplier * std_dev,
        })
    }
}
