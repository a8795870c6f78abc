//! RSI / price divergence detection.

use tracing::debug;

use crate::types::Divergence;

/// Default minimum series length.
pub const DEFAULT_LOOKBACK: usize = 14;

/// One local extremum paired with the RSI at the same index.
#[derive(Debug, Clone, Copy)]
struct Extremum {
    price: f64,
    rsi: f64,
}

/// Compare the two most recent price extrema against their RSI values.
///
/// - Bearish: higher price high with a lower RSI high.
/// - Bullish: lower price low with a higher RSI low.
///
/// Extrema whose aligned RSI is unavailable are skipped, so a flag is never
/// raised from fewer than two comparable pairs.
pub fn detect(prices: &[f64], rsi: &[Option<f64>], lookback: usize) -> Divergence {
    if prices.len() < lookback || rsi.len() < lookback || prices.len() < 3 {
        debug!(
            prices = prices.len(),
            rsi = rsi.len(),
            lookback,
            "not enough data for divergence detection"
        );
        return Divergence::default();
    }

    let mut highs = Vec::new();
    let mut lows = Vec::new();

    for i in 1..prices.len() - 1 {
        let (prev, current, next) = (prices[i - 1], prices[i], prices[i + 1]);
        let Some(rsi_value) = rsi.get(i).copied().flatten() else {
            continue;
        };
        let point = Extremum {
            price: current,
            rsi: rsi_value,
        };

        if current > prev && current > next {
            highs.push(point);
        }
        if current < prev && current < next {
            lows.push(point);
        }
    }

    let bearish = match highs.as_slice() {
        [.., previous, latest] => latest.price > previous.price && latest.rsi < previous.rsi,
        _ => false,
    };
    let bullish = match lows.as_slice() {
        [.., previous, latest] => latest.price < previous.price && latest.rsi > previous.rsi,
        _ => false,
    };

    Divergence { bullish, bearish }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aligned(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_short_input_is_neutral() {
        let prices = [1.0, 2.0, 1.0];
        assert_eq!(
            detect(&prices, &aligned(&[50.0, 60.0, 50.0]), DEFAULT_LOOKBACK),
            Divergence::default()
        );
    }

    #[test]
    fn test_missing_rsi_is_neutral() {
        let prices: Vec<f64> = (0..20).map(|i| i as f64).collect();
        assert_eq!(detect(&prices, &[], DEFAULT_LOOKBACK), Divergence::default());
    }

    #[test]
    fn test_bearish_divergence() {
        // Highs at 2 and 6: price 10 -> 12, RSI 70 -> 60.
        let prices = [5.0, 7.0, 10.0, 6.0, 7.0, 9.0, 12.0, 8.0];
        let rsi = [50.0, 55.0, 70.0, 45.0, 50.0, 55.0, 60.0, 40.0];
        let result = detect(&prices, &aligned(&rsi), 8);
        assert!(result.bearish);
        assert!(!result.bullish);
    }

    #[test]
    fn test_bullish_divergence() {
        // Lows at 2 and 6: price 5 -> 3, RSI 25 -> 35.
        let prices = [9.0, 7.0, 5.0, 8.0, 7.0, 6.0, 3.0, 6.0];
        let rsi = [50.0, 40.0, 25.0, 55.0, 45.0, 40.0, 35.0, 50.0];
        let result = detect(&prices, &aligned(&rsi), 8);
        assert!(result.bullish);
        assert!(!result.bearish);
    }

    #[test]
    fn test_only_latest_two_extrema_compared() {
        // Older high at index 1 would create a divergence with index 3;
        // the latest pair (3, 5) moves in step.
        let prices = [1.0, 20.0, 2.0, 10.0, 3.0, 11.0, 4.0];
        let rsi = [50.0, 90.0, 40.0, 60.0, 40.0, 65.0, 40.0];
        let result = detect(&prices, &aligned(&rsi), 7);
        assert!(!result.bearish);
    }

    #[test]
    fn test_extrema_without_rsi_are_ignored() {
        let prices = [5.0, 7.0, 10.0, 6.0, 7.0, 9.0, 12.0, 8.0];
        let mut rsi = aligned(&[50.0, 55.0, 70.0, 45.0, 50.0, 55.0, 60.0, 40.0]);
        rsi[2] = None;
        assert!(!detect(&prices, &rsi, 8).bearish);
    }
}
