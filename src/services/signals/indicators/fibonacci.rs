//! Fibonacci retracement levels.

use super::Indicator;
use crate::types::FibonacciLevels;

/// Retracement levels between the global low and high of the window.
pub struct Fibonacci;

impl Fibonacci {
    const MIN_SAMPLES: usize = 10;
}

impl Indicator for Fibonacci {
    type Output = FibonacciLevels;

    fn name(&self) -> &str {
        "Fibonacci"
    }

    fn min_periods(&self) -> usize {
        Self::MIN_SAMPLES
    }

    fn calculate(&self, prices: &[f64]) -> Option<FibonacciLevels> {
        if prices.len() < Self::MIN_SAMPLES {
            return None;
        }

        let high = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let diff = high - low;

        Some(FibonacciLevels {
            level0: low,
            level236: low + diff * 0.236,
            level382: low + diff * 0.382,
            level50: low + diff * 0.5,
            level618: low + diff * 0.618,
            level786: low + diff * 0.786,
            level100: high,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fibonacci_insufficient_data() {
        assert!(Fibonacci.calculate(&[1.0; 9]).is_none());
    }

    #[test]
    fn test_fibonacci_levels() {
        let mut prices = vec![150.0; 10];
        prices[2] = 100.0;
        prices[7] = 200.0;
        let levels = Fibonacci.calculate(&prices).unwrap();
        assert_eq!(levels.level0, 100.0);
        assert_eq!(levels.level50, 150.0);
        assert!((levels.level618 - 161.8).abs() < 1e-9);
        assert_eq!(levels.level100, 200.0);
    }
}
