//! Average True Range (ATR) indicator.

use super::Indicator;

/// High/low/close of one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeBar {
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl RangeBar {
    /// Proxy bars from a close-only series: each step spans from the previous
    /// close to the current one.
    pub fn from_closes(prices: &[f64]) -> Vec<RangeBar> {
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| {
                let previous = if i == 0 { close } else { prices[i - 1] };
                RangeBar {
                    high: close,
                    low: previous,
                    close,
                }
            })
            .collect()
    }
}

/// ATR (Average True Range) indicator.
///
/// TR = max(|High-Low|, |High-PrevClose|, |Low-PrevClose|), averaged over the
/// last `period` steps.
pub struct Atr {
    period: usize,
}

impl Default for Atr {
    fn default() -> Self {
        Self { period: 14 }
    }
}

impl Atr {
    pub fn new(period: usize) -> Self {
        Self { period }
    }

    /// Calculate True Range.
    fn true_range(current: &RangeBar, previous: &RangeBar) -> f64 {
        let hl = (current.high - current.low).abs();
        let hc = (current.high - previous.close).abs();
        let lc = (current.low - previous.close).abs();
        hl.max(hc).max(lc)
    }

    /// ATR over true OHLC bars.
    pub fn calculate_bars(&self, bars: &[RangeBar]) -> Option<f64> {
        if self.period == 0 || bars.len() < self.period + 1 {
            return None;
        }

        let total: f64 = bars
            .windows(2)
            .rev()
            .take(self.period)
            .map(|pair| Self::true_range(&pair[1], &pair[0]))
            .sum();

        Some(total / self.period as f64)
    }
}

impl Indicator for Atr {
    type Output = f64;

    fn name(&self) -> &str {
        "ATR (14)"
    }

    fn min_periods(&self) -> usize {
        self.period + 1
    }

    fn calculate(&self, prices: &[f64]) -> Option<f64> {
        self.calculate_bars(&RangeBar::from_closes(prices))
    }
}
