//! ATR-based stop-loss and take-profit levels.

use crate::types::RiskParameters;

const STOP_MULTIPLIER: f64 = 2.0;
/// Wider stop while the market looks manipulated.
const MANIPULATED_STOP_MULTIPLIER: f64 = 3.0;
const REWARD_MULTIPLE: f64 = 2.0;

/// Risk parameters for a position in the given direction; `None` without ATR.
pub fn risk_params(
    current_price: f64,
    atr: Option<f64>,
    manipulated: bool,
    long_bias: bool,
) -> Option<RiskParameters> {
    let atr = atr?;
    let multiplier = if manipulated {
        MANIPULATED_STOP_MULTIPLIER
    } else {
        STOP_MULTIPLIER
    };

    let stop_loss = if long_bias {
        current_price - atr * multiplier
    } else {
        current_price + atr * multiplier
    };
    let risk_distance = (current_price - stop_loss).abs();
    let take_profit = if long_bias {
        current_price + risk_distance * REWARD_MULTIPLE
    } else {
        current_price - risk_distance * REWARD_MULTIPLE
    };

    Some(RiskParameters {
        stop_loss,
        take_profit,
        risk_reward_ratio: REWARD_MULTIPLE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_position() {
        let params = risk_params(50_000.0, Some(100.0), false, true).unwrap();
        assert_eq!(params.stop_loss, 49_800.0);
        assert_eq!(params.take_profit, 50_400.0);
        assert_eq!(params.risk_reward_ratio, 2.0);
    }

    #[test]
    fn test_short_position() {
        let params = risk_params(50_000.0, Some(100.0), false, false).unwrap();
        assert_eq!(params.stop_loss, 50_200.0);
        assert_eq!(params.take_profit, 49_600.0);
    }

    #[test]
    fn test_manipulation_widens_stop() {
        let params = risk_params(50_000.0, Some(100.0), true, true).unwrap();
        assert_eq!(params.stop_loss, 49_700.0);
        assert_eq!(params.take_profit, 50_600.0);
    }

    #[test]
    fn test_missing_atr() {
        assert!(risk_params(50_000.0, None, false, true).is_none());
    }
}
