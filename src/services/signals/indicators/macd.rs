//! MACD (Moving Average Convergence Divergence) indicator.

use super::ema::ema_series;
use super::Indicator;
use crate::types::{MacdSignalMode, MacdValue};

/// MACD indicator.
///
/// - MACD Line = EMA(12) - EMA(26)
/// - Signal Line = EMA(9), built according to [`MacdSignalMode`]
/// - Histogram = MACD Line - Signal Line
pub struct Macd {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    mode: MacdSignalMode,
}

impl Default for Macd {
    fn default() -> Self {
        Self::with_mode(MacdSignalMode::default())
    }
}

impl Macd {
    pub fn with_mode(mode: MacdSignalMode) -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
            mode,
        }
    }

    /// EMA(9) over the prices with the trailing nine samples replaced by the
    /// single MACD value.
    fn legacy_signal(&self, prices: &[f64], macd: f64) -> Option<f64> {
        let keep = prices.len().checked_sub(self.signal_period)?;
        let mut sequence = prices[..keep].to_vec();
        sequence.push(macd);
        ema_series(&sequence, self.signal_period).last().copied()
    }

    /// EMA(9) over the MACD line history.
    fn textbook_signal(&self, fast: &[f64], slow: &[f64]) -> Option<f64> {
        // The fast EMA starts earlier; align both on the slow seed.
        let offset = self.slow_period - self.fast_period;
        let macd_line: Vec<f64> = fast
            .iter()
            .skip(offset)
            .zip(slow.iter())
            .map(|(f, s)| f - s)
            .collect();

        ema_series(&macd_line, self.signal_period).last().copied()
    }
}

impl Indicator for Macd {
    type Output = MacdValue;

    fn name(&self) -> &str {
        "MACD"
    }

    fn min_periods(&self) -> usize {
        match self.mode {
            MacdSignalMode::Legacy => self.slow_period,
            MacdSignalMode::Textbook => self.slow_period + self.signal_period - 1,
        }
    }

    fn calculate(&self, prices: &[f64]) -> Option<MacdValue> {
        let fast = ema_series(prices, self.fast_period);
        let slow = ema_series(prices, self.slow_period);

        let macd = fast.last()? - slow.last()?;

        let signal = match self.mode {
            MacdSignalMode::Legacy => self.legacy_signal(prices, macd)?,
            MacdSignalMode::Textbook => self.textbook_signal(&fast, &slow)?,
        };

        Some(MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uptrend(count: usize) -> Vec<f64> {
        (0..count).map(|i| 100.0 + i as f64 * 1.5).collect()
    }

    #[test]
    fn test_macd_insufficient_data() {
        assert!(Macd::default().calculate(&uptrend(25)).is_none());
        assert!(Macd::default().calculate(&uptrend(26)).is_some());
    }

    #[test]
    fn test_macd_uptrend_line_positive() {
        let value = Macd::default().calculate(&uptrend(60)).unwrap();
        assert!(value.macd > 0.0, "fast EMA should lead in an uptrend");
        assert!((value.histogram - (value.macd - value.signal)).abs() < 1e-12);
    }

    #[test]
    fn test_legacy_signal_construction() {
        let prices = uptrend(40);
        let value = Macd::default().calculate(&prices).unwrap();

        let mut sequence = prices[..31].to_vec();
        sequence.push(value.macd);
        let expected = *ema_series(&sequence, 9).last().unwrap();

        assert!((value.signal - expected).abs() < 1e-12);
    }

    #[test]
    fn test_textbook_needs_signal_history() {
        let macd = Macd::with_mode(MacdSignalMode::Textbook);
        assert_eq!(macd.min_periods(), 34);
        assert!(macd.calculate(&uptrend(33)).is_none());
        assert!(macd.calculate(&uptrend(34)).is_some());
    }

    #[test]
    fn test_textbook_linear_trend_converges() {
        // On a linear trend the MACD line settles to a constant, so its EMA
        // converges to the line itself.
        let value = Macd::with_mode(MacdSignalMode::Textbook)
            .calculate(&uptrend(400))
            .unwrap();
        assert!(value.histogram.abs() < 1e-6);
    }

    #[test]
    fn test_modes_disagree_on_legacy_quirk() {
        let prices = uptrend(60);
        let legacy = Macd::with_mode(MacdSignalMode::Legacy).calculate(&prices).unwrap();
        let textbook = Macd::with_mode(MacdSignalMode::Textbook).calculate(&prices).unwrap();
        assert_eq!(legacy.macd, textbook.macd);
        assert!((legacy.signal - textbook.signal).abs() > 1.0);
    }
}
