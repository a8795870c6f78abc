//! Vote-based agreement across indicators.

use crate::types::{clamp01, Confluence, IndicatorSet, ManipulationAssessment, SignalAction};

/// Share of votes one side needs to produce BUY or SELL.
const AGREEMENT_THRESHOLD: f64 = 0.7;
/// A level counts as "near" when it is within this fraction of the other side's distance.
const PROXIMITY_RATIO: f64 = 0.2;

/// Indicators plus the price they are judged against.
#[derive(Debug, Clone, Copy)]
pub struct ConfluenceInput<'a> {
    pub indicators: &'a IndicatorSet,
    pub current_price: f64,
}

/// Candidate support and resistance levels.
#[derive(Debug, Clone, Copy)]
pub struct LevelSet<'a> {
    pub supports: &'a [f64],
    pub resistances: &'a [f64],
}

impl<'a> LevelSet<'a> {
    pub fn from_indicators(indicators: &'a IndicatorSet) -> Self {
        Self {
            supports: &indicators.supports,
            resistances: &indicators.resistances,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vote {
    Bullish,
    Bearish,
}

#[derive(Default)]
struct Tally {
    bullish: u32,
    bearish: u32,
    reasons: Vec<String>,
}

impl Tally {
    fn cast(&mut self, vote: Vote, reason: &str) {
        match vote {
            Vote::Bullish => self.bullish += 1,
            Vote::Bearish => self.bearish += 1,
        }
        self.reasons.push(reason.to_string());
    }
}

fn level_vote(price: f64, levels: &LevelSet<'_>) -> Option<(Vote, &'static str)> {
    let nearest_support = levels
        .supports
        .iter()
        .copied()
        .filter(|s| *s < price)
        .fold(None, |best: Option<f64>, s| Some(best.map_or(s, |b| b.max(s))));
    let nearest_resistance = levels
        .resistances
        .iter()
        .copied()
        .filter(|r| *r > price)
        .fold(None, |best: Option<f64>, r| Some(best.map_or(r, |b| b.min(r))));

    let (support, resistance) = (nearest_support?, nearest_resistance?);
    let to_support = price - support;
    let to_resistance = resistance - price;

    if to_support < to_resistance * PROXIMITY_RATIO {
        Some((Vote::Bullish, "Near a major support"))
    } else if to_resistance < to_support * PROXIMITY_RATIO {
        Some((Vote::Bearish, "Near a major resistance"))
    } else {
        None
    }
}

/// Tally directional votes into one signal.
///
/// Pure function of its inputs; a manipulated market always yields WAIT.
pub fn score(
    input: &ConfluenceInput<'_>,
    manipulation: &ManipulationAssessment,
    levels: &LevelSet<'_>,
) -> Confluence {
    if manipulation.is_manipulated {
        return Confluence {
            signal: SignalAction::Wait,
            strength: 0.0,
            reasons: vec!["Market manipulation detected".to_string()],
        };
    }

    let indicators = input.indicators;
    let price = input.current_price;
    let mut tally = Tally::default();

    if let Some(rsi) = indicators.rsi {
        if rsi < 30.0 {
            tally.cast(Vote::Bullish, "RSI oversold");
        } else if rsi > 70.0 {
            tally.cast(Vote::Bearish, "RSI overbought");
        }
    }

    if let Some(macd) = indicators.macd {
        if macd.histogram > 0.0 {
            tally.cast(Vote::Bullish, "MACD histogram positive");
        } else if macd.histogram < 0.0 {
            tally.cast(Vote::Bearish, "MACD histogram negative");
        }
    }

    if let Some(bands) = indicators.bollinger {
        if price < bands.lower {
            tally.cast(Vote::Bullish, "Price below the lower Bollinger band");
        } else if price > bands.upper {
            tally.cast(Vote::Bearish, "Price above the upper Bollinger band");
        }
    }

    if let Some((vote, reason)) = level_vote(price, levels) {
        tally.cast(vote, reason);
    }

    let total = tally.bullish + tally.bearish;
    if total == 0 {
        return Confluence {
            signal: SignalAction::Wait,
            strength: 0.0,
            reasons: tally.reasons,
        };
    }

    let bullish_ratio = tally.bullish as f64 / total as f64;
    let bearish_ratio = tally.bearish as f64 / total as f64;

    let (signal, strength) = if bullish_ratio > AGREEMENT_THRESHOLD {
        (SignalAction::Buy, bullish_ratio)
    } else if bearish_ratio > AGREEMENT_THRESHOLD {
        (SignalAction::Sell, bearish_ratio)
    } else {
        (SignalAction::Wait, bullish_ratio.max(bearish_ratio))
    };

    Confluence {
        signal,
        strength: clamp01(strength),
        reasons: tally.reasons,
    }
}
