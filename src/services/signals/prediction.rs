//! Short-horizon direction forecast with price ranges and targets.
//!
//! Independent of the confluence vote; the two may disagree.

use crate::types::{
    clamp01, IndicatorSet, KeyLevels, Prediction, PredictionDirection, PriceRange, PriceRanges,
    PriceTarget, Sentiment, TargetKind,
};

/// Relative SMA20 deviation that counts as a trend.
const TREND_THRESHOLD: f64 = 0.02;
const TARGET_CONFIDENCE: f64 = 0.6;
const ONE_HOUR_SPREAD: f64 = 0.3;
const ONE_HOUR_CONFIDENCE: f64 = 0.7;
const FOUR_HOURS_SPREAD: f64 = 0.6;
const FOUR_HOURS_CONFIDENCE: f64 = 0.5;

fn sma_deviation(current_price: f64, indicators: &IndicatorSet) -> Option<f64> {
    indicators
        .sma20
        .filter(|sma| *sma != 0.0)
        .map(|sma| (current_price - sma) / sma)
}

/// Forecast the next move from the current indicators.
pub fn predict(
    current_price: f64,
    indicators: &IndicatorSet,
    sentiment: Option<&Sentiment>,
) -> Prediction {
    let mut direction = PredictionDirection::Neutral;
    let mut reasons = Vec::new();
    let mut risks = Vec::new();

    if let Some(deviation) = sma_deviation(current_price, indicators) {
        if deviation.abs() > TREND_THRESHOLD {
            direction = PredictionDirection::from_sign(deviation);
            let trend = if deviation > 0.0 { "Bullish" } else { "Bearish" };
            reasons.push(format!("{} trend against the SMA20", trend));
        }
    }

    if let Some(rsi) = indicators.rsi {
        if rsi > 70.0 {
            direction = PredictionDirection::Bearish;
            reasons.push("RSI in overbought territory".to_string());
            risks.push("Risk of a bearish reversal".to_string());
        } else if rsi < 30.0 {
            direction = PredictionDirection::Bullish;
            reasons.push("RSI in oversold territory".to_string());
            risks.push("Risk of a bullish reversal".to_string());
        }
    }

    if let Some(macd) = indicators.macd {
        let momentum = PredictionDirection::from_sign(macd.histogram);
        if momentum != PredictionDirection::Neutral {
            let label = if momentum == PredictionDirection::Bullish {
                "Bullish"
            } else {
                "Bearish"
            };
            reasons.push(format!("{} momentum on the MACD", label));
            if direction == PredictionDirection::Neutral {
                direction = momentum;
            }
        }
    }

    let mut price_ranges = PriceRanges::default();
    if let Some(bands) = indicators.bollinger {
        if current_price > bands.upper {
            risks.push("Price above the upper Bollinger band".to_string());
            direction = PredictionDirection::Bearish;
        } else if current_price < bands.lower {
            risks.push("Price below the lower Bollinger band".to_string());
            direction = PredictionDirection::Bullish;
        }

        let volatility = bands.bandwidth() * current_price;
        price_ranges = PriceRanges {
            one_hour: PriceRange {
                min: current_price - volatility * ONE_HOUR_SPREAD,
                max: current_price + volatility * ONE_HOUR_SPREAD,
                confidence: ONE_HOUR_CONFIDENCE,
            },
            four_hours: PriceRange {
                min: current_price - volatility * FOUR_HOURS_SPREAD,
                max: current_price + volatility * FOUR_HOURS_SPREAD,
                confidence: FOUR_HOURS_CONFIDENCE,
            },
        };
    }

    let key_levels = KeyLevels {
        support: indicators.supports.clone(),
        resistance: indicators.resistances.clone(),
        targets: next_target(current_price, direction, indicators)
            .into_iter()
            .collect(),
    };

    if let Some(sentiment) = sentiment {
        if sentiment.is_greedy() {
            risks.push("Market potentially overbought (sentiment)".to_string());
        } else if sentiment.is_fearful() {
            risks.push("Market potentially oversold (sentiment)".to_string());
        }
    }

    let confidence = confidence(
        current_price,
        direction,
        risks.len(),
        indicators,
        sentiment,
    );

    Prediction {
        direction,
        confidence,
        price_ranges,
        key_levels,
        reasons,
        risks,
    }
}

/// Nearest level in the predicted direction, if any.
fn next_target(
    current_price: f64,
    direction: PredictionDirection,
    indicators: &IndicatorSet,
) -> Option<PriceTarget> {
    match direction {
        PredictionDirection::Bullish => indicators
            .resistances
            .iter()
            .copied()
            .filter(|r| *r > current_price)
            .min_by(|a, b| a.total_cmp(b))
            .map(|price| PriceTarget {
                price,
                kind: TargetKind::Resistance,
                confidence: TARGET_CONFIDENCE,
            }),
        PredictionDirection::Bearish => indicators
            .supports
            .iter()
            .copied()
            .filter(|s| *s < current_price)
            .max_by(|a, b| a.total_cmp(b))
            .map(|price| PriceTarget {
                price,
                kind: TargetKind::Support,
                confidence: TARGET_CONFIDENCE,
            }),
        PredictionDirection::Neutral => None,
    }
}

/// Base 0.5 plus agreement bonuses, averaged over the evaluated factors.
fn confidence(
    current_price: f64,
    direction: PredictionDirection,
    risk_count: usize,
    indicators: &IndicatorSet,
    sentiment: Option<&Sentiment>,
) -> f64 {
    let mut score = 0.5;
    let mut factors = 0u32;

    if let Some(deviation) = sma_deviation(current_price, indicators) {
        score += deviation.abs() * 0.3;
        factors += 1;
    }

    if let Some(rsi) = indicators.rsi {
        let agrees = (rsi > 70.0 && direction == PredictionDirection::Bearish)
            || (rsi < 30.0 && direction == PredictionDirection::Bullish);
        if agrees {
            score += 0.2;
        }
        factors += 1;
    }

    if let Some(macd) = indicators.macd {
        let momentum = PredictionDirection::from_sign(macd.histogram);
        if momentum != PredictionDirection::Neutral && momentum == direction {
            score += 0.15;
        }
        factors += 1;
    }

    if let Some(sentiment) = sentiment {
        let agrees = (sentiment.is_greedy() && direction == PredictionDirection::Bearish)
            || (sentiment.is_fearful() && direction == PredictionDirection::Bullish);
        if agrees {
            score += 0.15;
        }
        factors += 1;
    }

    score /= (factors + 1) as f64;

    if risk_count > 2 {
        score *= 0.8;
    }

    clamp01(score)
}
