//! Exponential Moving Average (EMA) indicator.

use super::Indicator;

/// EMA (Exponential Moving Average) indicator.
///
/// Seeded with the SMA of the first `period` values, then
/// `ema = price * k + ema * (1 - k)` with `k = 2 / (period + 1)`.
pub struct Ema {
    period: usize,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        Self { period }
    }
}

/// EMA values from the seed onwards: element 0 is the SMA seed (aligned with
/// input index `period - 1`), the last element is the current EMA.
pub fn ema_series(values: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || values.len() < period {
        return Vec::new();
    }

    let k = 2.0 / (period as f64 + 1.0);
    let seed = values.iter().take(period).sum::<f64>() / period as f64;

    let mut series = Vec::with_capacity(values.len() - period + 1);
    series.push(seed);

    let mut ema = seed;
    for value in &values[period..] {
        ema = value * k + ema * (1.0 - k);
        series.push(ema);
    }

    series
}

impl Indicator for Ema {
    type Output = f64;

    fn name(&self) -> &str {
        match self.period {
            9 => "EMA (9)",
            12 => "EMA (12)",
            26 => "EMA (26)",
            _ => "EMA",
        }
    }

    fn min_periods(&self) -> usize {
        self.period
    }

    fn calculate(&self, prices: &[f64]) -> Option<f64> {
        ema_series(prices, self.period).last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ema_seed_is_sma() {
        let prices = [2.0, 4.0, 6.0];
        assert_eq!(Ema::new(3).calculate(&prices), Some(4.0));
    }

    #[test]
    fn test_ema_recurrence() {
        // k = 0.5 for period 3: seed 4, then 10 * 0.5 + 4 * 0.5 = 7
        let prices = [2.0, 4.0, 6.0, 10.0];
        let series = ema_series(&prices, 3);
        assert_eq!(series, vec![4.0, 7.0]);
        assert_eq!(Ema::new(3).calculate(&prices), Some(7.0));
    }

    #[test]
    fn test_ema_insufficient_data() {
        assert_eq!(Ema::new(12).calculate(&[1.0; 11]), None);
        assert!(ema_series(&[1.0; 4], 0).is_empty());
    }

    #[test]
    fn test_ema_constant_series() {
        let ema = Ema::new(12).calculate(&[42.0; 40]).unwrap();
        assert!((ema - 42.0).abs() < 1e-9);
    }
}
