use std::future::Future;
use std::pin::Pin;

use super::{Narrative, NarrativeAnalyzer, NarrativeContext};
use crate::error::AppError;
use crate::types::SignalAction;

/// Rule-based analysis from the same thresholds the rest of the engine uses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalNarrativeAnalyzer;

impl LocalNarrativeAnalyzer {
    /// Decide the action and confidence.
    pub fn decide(ctx: &NarrativeContext) -> (SignalAction, f64) {
        let indicators = &ctx.indicators;
        let histogram = indicators.macd.map(|m| m.histogram);

        let (mut signal, mut confidence) = match (indicators.rsi, histogram) {
            (Some(rsi), _) if rsi > 70.0 => (SignalAction::Sell, 0.7),
            (Some(rsi), _) if rsi < 30.0 => (SignalAction::Buy, 0.7),
            (_, Some(h)) if h > 0.0 => (SignalAction::Buy, 0.6),
            (_, Some(h)) if h < 0.0 => (SignalAction::Sell, 0.6),
            _ => (SignalAction::Wait, 0.5),
        };

        if ctx.divergence.bullish {
            signal = SignalAction::Buy;
            confidence = f64::max(confidence, 0.75);
        } else if ctx.divergence.bearish {
            signal = SignalAction::Sell;
            confidence = f64::max(confidence, 0.75);
        }

        if ctx.manipulation.is_manipulated {
            signal = SignalAction::Wait;
            confidence = 0.8;
        }

        (signal, confidence)
    }

    /// Full narrative, formatted like the remote analyzer's sections.
    pub fn narrate(ctx: &NarrativeContext) -> Narrative {
        let (signal, confidence) = Self::decide(ctx);
        Narrative {
            signal,
            confidence,
            reason: render(ctx, signal, confidence),
        }
    }
}

impl NarrativeAnalyzer for LocalNarrativeAnalyzer {
    fn name(&self) -> &str {
        "local"
    }

    fn analyze<'a>(
        &'a self,
        ctx: &'a NarrativeContext,
    ) -> Pin<Box<dyn Future<Output = Result<Narrative, AppError>> + Send + 'a>> {
        Box::pin(async move { Ok(Self::narrate(ctx)) })
    }
}

fn fear_greed_label(index: u8) -> &'static str {
    match index {
        71..=u8::MAX => "Extreme greed",
        51..=70 => "Greed",
        31..=50 => "Neutral",
        11..=30 => "Fear",
        _ => "Extreme fear",
    }
}

fn render(ctx: &NarrativeContext, signal: SignalAction, confidence: f64) -> String {
    let indicators = &ctx.indicators;
    let price = ctx.price;
    let percent = (confidence * 100.0).round();
    let mut out = String::new();

    out.push_str(&format!("**Signal**: {}\n", signal));
    out.push_str(&format!("**Confidence**: {}%\n\n", percent));

    out.push_str("**Analysis**:\n");
    out.push_str(&format!("- Current price: ${:.2}\n", price));
    match indicators.sma20 {
        Some(sma) => {
            let side = if price > sma { "above" } else { "below" };
            out.push_str(&format!("- SMA20: {:.2} (price {})\n", sma, side));
        }
        None => out.push_str("- SMA20: N/A\n"),
    }
    match indicators.rsi {
        Some(rsi) => {
            let zone = if rsi > 70.0 {
                "overbought"
            } else if rsi < 30.0 {
                "oversold"
            } else {
                "neutral"
            };
            out.push_str(&format!("- RSI: {:.2} ({})\n", rsi, zone));
        }
        None => out.push_str("- RSI: N/A\n"),
    }
    if let Some(macd) = indicators.macd {
        let sign = if macd.histogram > 0.0 { "positive" } else { "negative" };
        out.push_str(&format!("- MACD: {} ({:.2})\n", sign, macd.histogram));
    }
    if ctx.divergence.bullish {
        out.push_str("- Bullish RSI divergence detected\n");
    } else if ctx.divergence.bearish {
        out.push_str("- Bearish RSI divergence detected\n");
    }
    if ctx.manipulation.is_manipulated {
        out.push_str(&format!(
            "- Market manipulation detected: {}\n",
            ctx.manipulation.details.join(", "),
        ));
    }

    out.push_str("\n**Key Levels**:\n");
    if indicators.supports.is_empty() {
        out.push_str("- Supports: unavailable\n");
    }
    for (i, support) in indicators.supports.iter().enumerate() {
        out.push_str(&format!("- Support {}: ${:.0}\n", i + 1, support));
    }
    if indicators.resistances.is_empty() {
        out.push_str("- Resistances: unavailable\n");
    }
    for (i, resistance) in indicators.resistances.iter().enumerate() {
        out.push_str(&format!("- Resistance {}: ${:.0}\n", i + 1, resistance));
    }

    out.push_str("\n**Risk Management**:\n");
    match indicators.atr {
        Some(atr) => {
            let (stop_loss, take_profit) = if signal == SignalAction::Buy {
                (price - atr * 2.0, price + atr * 4.0)
            } else {
                (price + atr * 2.0, price - atr * 4.0)
            };
            out.push_str(&format!("- Stop-Loss: ${:.0}\n", stop_loss));
            out.push_str(&format!("- Take-Profit: ${:.0}\n", take_profit));
            out.push_str("- Risk/Reward: 1:2\n");
        }
        None => out.push_str("- ATR unavailable for the calculation\n"),
    }

    out.push_str("\n**Sentiment**:\n");
    let index = ctx.sentiment.fear_greed_index;
    out.push_str(&format!(
        "- Fear & Greed Index: {}/100 ({})\n",
        index,
        fear_greed_label(index),
    ));
    out.push_str(&format!("- Social sentiment: {:?}\n", ctx.sentiment.social_sentiment));

    out.push_str("\n**Horizon**:\n- Short term (1-3 days)\n");

    let basis = match signal {
        SignalAction::Buy => "favourable technical conditions",
        SignalAction::Sell => "signs of market weakness",
        SignalAction::Wait => "mixed signals that need more confirmation",
    };
    out.push_str(&format!(
        "\n**Conclusion**:\nThe current signal is {} with {}% confidence, based on {}.",
        signal, percent, basis,
    ));

    out
}
