//! Relative Strength Index (RSI) indicator.

use super::Indicator;

/// RSI (Relative Strength Index) indicator.
///
/// Averages gains and losses over the first `period` price changes of the
/// window it is given (no Wilder smoothing over the rest of the series).
/// Values range from 0-100:
/// - Below 30: Oversold (potential buy signal)
/// - Above 70: Overbought (potential sell signal)
pub struct Rsi {
    period: usize,
}

impl Default for Rsi {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    fn calculate_rsi(prices: &[f64], period: usize) -> Option<f64> {
        if period == 0 || prices.len() < period + 1 {
            return None;
        }

        let mut gains = 0.0;
        let mut losses = 0.0;
        for pair in prices[..=period].windows(2) {
            let change = pair[1] - pair[0];
            if change >= 0.0 {
                gains += change;
            } else {
                losses -= change;
            }
        }

        let avg_gain = gains / period as f64;
        let avg_loss = losses / period as f64;

        if avg_loss == 0.0 {
            return Some(100.0);
        }

        let rs = avg_gain / avg_loss;
        Some(100.0 - (100.0 / (1.0 + rs)))
    }
}

impl Indicator for Rsi {
    type Output = f64;

    fn name(&self) -> &str {
        "RSI (14)"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, prices: &[f64]) -> Option<f64> {
        Self::calculate_rsi(prices, self.period)
    }
}

/// RSI aligned with `prices`: entry `i` is the RSI of the trailing
/// `period + 1` prices ending at `i`, `None` until that window exists.
pub fn rsi_series(prices: &[f64], period: usize) -> Vec<Option<f64>> {
    (0..prices.len())
        .map(|i| {
            if period == 0 || i < period {
                None
            } else {
                Rsi::calculate_rsi(&prices[i - period..=i], period)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    fn downtrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 200.0 - i as f64 * 1.5).collect()
    }

    #[test]
    fn test_rsi_min_periods() {
        assert_eq!(Rsi::default().min_periods(), 15);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        assert!(Rsi::default().calculate(&uptrend(14)).is_none());
        assert!(Rsi::default().calculate(&uptrend(15)).is_some());
    }

    #[test]
    fn test_rsi_no_losses_is_100() {
        assert_eq!(Rsi::default().calculate(&uptrend(30)), Some(100.0));
        assert_eq!(Rsi::default().calculate(&[250.0; 30]), Some(100.0));
    }

    #[test]
    fn test_rsi_no_gains_is_0() {
        assert_eq!(Rsi::default().calculate(&downtrend(30)), Some(0.0));
    }

    #[test]
    fn test_rsi_only_first_period_changes_count() {
        // First 14 changes are gains; the crash afterwards is ignored.
        let mut prices = uptrend(15);
        prices.extend([10.0, 5.0, 1.0]);
        assert_eq!(Rsi::default().calculate(&prices), Some(100.0));
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // Alternating +1 / -1 changes: equal gains and losses.
        let prices: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let rsi = Rsi::default().calculate(&prices).unwrap();
        assert!((rsi - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_rsi_value_range() {
        let prices: Vec<f64> = (0..40).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let rsi = Rsi::default().calculate(&prices).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }

    #[test]
    fn test_rsi_series_alignment() {
        let prices = uptrend(20);
        let series = rsi_series(&prices, 14);
        assert_eq!(series.len(), 20);
        assert!(series[..14].iter().all(Option::is_none));
        assert!(series[14..].iter().all(|v| *v == Some(100.0)));
    }

    #[test]
    fn test_rsi_custom_period() {
        let rsi = Rsi::new(7);
        assert_eq!(rsi.min_periods(), 8);
        assert!(rsi.calculate(&uptrend(8)).is_some());
    }
}
