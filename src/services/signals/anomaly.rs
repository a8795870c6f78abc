//! Pump-and-dump and fake-out screening.

use tracing::debug;

use crate::types::{clamp01, ManipulationAssessment};

/// Chunk size used for the baseline volatility.
pub const DEFAULT_TIMEFRAME: usize = 60;

const MIN_SAMPLES: usize = 5;
const FAKEOUT_WINDOW: usize = 5;
const VOLUME_SPIKE_FACTOR: f64 = 3.0;
const PRICE_SPIKE_DEVIATION: f64 = 0.1;
const FAKEOUT_PRICE_MOVE: f64 = 0.05;

/// Root-mean-square of simple returns; returns after a zero price are skipped.
pub fn volatility(prices: &[f64]) -> f64 {
    let returns: Vec<f64> = prices
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect();

    if returns.is_empty() {
        return 0.0;
    }

    (returns.iter().map(|r| r * r).sum::<f64>() / returns.len() as f64).sqrt()
}

/// Mean volatility over consecutive `timeframe`-sized chunks ending strictly
/// before the end of the series. Zero when the series is shorter than one chunk.
pub fn baseline_volatility(prices: &[f64], timeframe: usize) -> f64 {
    if timeframe == 0 || prices.len() < timeframe {
        return 0.0;
    }

    let chunks: Vec<f64> = (timeframe..prices.len())
        .step_by(timeframe)
        .map(|end| volatility(&prices[end - timeframe..end]))
        .collect();

    if chunks.is_empty() {
        return 0.0;
    }

    chunks.iter().sum::<f64>() / chunks.len() as f64
}

/// Confidence that the market is being pushed around.
pub fn manipulation_confidence(
    volatility: f64,
    normal_volatility: f64,
    volume_spikes: usize,
    price_spikes: usize,
) -> f64 {
    let mut confidence = 0.0;

    if volatility > normal_volatility * 2.0 {
        confidence += 0.3;
    }
    if volatility > normal_volatility * 3.0 {
        confidence += 0.2;
    }

    confidence += (volume_spikes as f64 * 0.1).min(0.3);
    confidence += (price_spikes as f64 * 0.1).min(0.2);

    clamp01(confidence)
}

/// Screen a price/volume series for manipulation patterns.
pub fn detect(prices: &[f64], volumes: &[f64], timeframe: usize) -> ManipulationAssessment {
    if prices.len() < MIN_SAMPLES || volumes.len() < MIN_SAMPLES {
        debug!(
            prices = prices.len(),
            volumes = volumes.len(),
            "not enough data for manipulation detection"
        );
        return ManipulationAssessment::default();
    }

    let mut result = ManipulationAssessment::default();

    let avg_volume = volumes.iter().sum::<f64>() / volumes.len() as f64;
    let avg_price = prices.iter().sum::<f64>() / prices.len() as f64;

    let current_volatility = volatility(prices);
    let normal_volatility = baseline_volatility(prices, timeframe);

    let volume_spikes = volumes
        .iter()
        .filter(|v| **v > avg_volume * VOLUME_SPIKE_FACTOR)
        .count();
    let price_spikes = prices
        .iter()
        .filter(|p| (**p - avg_price).abs() > avg_price * PRICE_SPIKE_DEVIATION)
        .count();

    if volume_spikes > 0 && price_spikes > 0 {
        result.is_pump_and_dump = true;
        result
            .details
            .push("Abnormal volume and price spikes detected".to_string());
    }

    let recent_prices = &prices[prices.len() - FAKEOUT_WINDOW..];
    let recent_volumes = &volumes[volumes.len() - FAKEOUT_WINDOW..];
    let price_change = relative_change(recent_prices);
    let volume_change = relative_change(recent_volumes);

    if let (Some(price_change), Some(volume_change)) = (price_change, volume_change) {
        if price_change.abs() > FAKEOUT_PRICE_MOVE && volume_change < 0.0 {
            result.is_fakeout = true;
            result
                .details
                .push("Price move without volume support".to_string());
        }
    }

    result.is_manipulated = result.is_pump_and_dump || result.is_fakeout;
    result.confidence = manipulation_confidence(
        current_volatility,
        normal_volatility,
        volume_spikes,
        price_spikes,
    );

    result
}

/// (last - first) / first, undefined when the window starts at zero.
fn relative_change(window: &[f64]) -> Option<f64> {
    let first = *window.first()?;
    let last = *window.last()?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_input_is_neutral() {
        let result = detect(&[1.0, 2.0, 3.0, 4.0], &[1.0; 4], DEFAULT_TIMEFRAME);
        assert_eq!(result, ManipulationAssessment::default());
    }

    #[test]
    fn test_constant_series_not_manipulated() {
        let result = detect(&[40_000.0; 30], &[10.0; 30], DEFAULT_TIMEFRAME);
        assert!(!result.is_manipulated);
        assert_eq!(result.confidence, 0.0);
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_pump_and_dump() {
        let mut prices = vec![100.0; 10];
        prices[6] = 120.0;
        let mut volumes = vec![1.0; 10];
        volumes[5] = 9.0; // 5x the mean of 1.8

        let result = detect(&prices, &volumes, DEFAULT_TIMEFRAME);
        assert!(result.is_pump_and_dump);
        assert!(result.is_manipulated);
        assert!(result.confidence > 0.0);
        assert_eq!(result.details.len(), 1);
    }

    #[test]
    fn test_fakeout_price_up_volume_down() {
        let prices = [100.0, 100.0, 100.0, 100.0, 101.0, 102.0, 104.0, 107.0];
        let volumes = [10.0, 10.0, 10.0, 10.0, 10.0, 9.0, 8.0, 5.0];
        let result = detect(&prices, &volumes, DEFAULT_TIMEFRAME);
        assert!(result.is_fakeout);
        assert!(!result.is_pump_and_dump);
        assert!(result.is_manipulated);
    }

    #[test]
    fn test_move_with_rising_volume_is_not_fakeout() {
        let prices = [100.0, 100.0, 100.0, 100.0, 101.0, 102.0, 104.0, 107.0];
        let volumes = [10.0, 10.0, 10.0, 10.0, 10.0, 11.0, 12.0, 14.0];
        assert!(!detect(&prices, &volumes, DEFAULT_TIMEFRAME).is_fakeout);
    }

    #[test]
    fn test_baseline_volatility_chunks() {
        assert_eq!(baseline_volatility(&[1.0; 59], 60), 0.0);
        // Exactly one chunk length: the chunk ending at the series end is excluded.
        assert_eq!(baseline_volatility(&[1.0; 60], 60), 0.0);

        let prices: Vec<f64> = (0..9).map(|i| if i % 2 == 0 { 100.0 } else { 110.0 }).collect();
        assert!(baseline_volatility(&prices, 4) > 0.0);
    }

    #[test]
    fn test_volatility_rms_of_returns() {
        let vol = volatility(&[100.0, 110.0, 99.0]);
        // Returns: +0.1, -0.1
        assert!((vol - 0.1).abs() < 1e-12);
        assert_eq!(volatility(&[5.0]), 0.0);
    }

    #[test]
    fn test_confidence_monotonic_and_bounded() {
        let low = manipulation_confidence(0.01, 0.01, 0, 0);
        let mid = manipulation_confidence(0.025, 0.01, 1, 1);
        let high = manipulation_confidence(0.05, 0.01, 10, 10);
        assert_eq!(low, 0.0);
        assert!(mid > low);
        assert!(high >= mid);
        assert!((high - 1.0).abs() < 1e-12);
        for spikes in 0..20 {
            let c = manipulation_confidence(1.0, 0.0, spikes, spikes);
            assert!((0.0..=1.0).contains(&c));
        }
    }
}
