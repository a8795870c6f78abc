use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

use super::{Narrative, NarrativeAnalyzer, NarrativeContext};
use crate::config::NarrativeConfig;
use crate::error::AppError;
use crate::types::{clamp01, SignalAction};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONFIDENCE: f64 = 0.5;

const SYSTEM_PROMPT: &str = "You are a Bitcoin market analyst. Analyse the technical and \
fundamental data to give precise trading recommendations. Structure the analysis as short \
dash-prefixed points and highlight the important information.";

static SIGNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Signal\*\*:\s*\[?\s*(BUY|SELL|WAIT|HOLD)\b").expect("valid signal pattern")
});
static CONFIDENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\*\*Confidence\*\*:\s*\[?\s*(\d+(?:\.\d+)?)").expect("valid confidence pattern")
});
static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*([A-Za-z][A-Za-z &]*)\*\*:").expect("valid header pattern"));

/// Sections copied into the reason, with the label used there.
const SECTIONS: &[(&str, Option<&str>)] = &[
    ("Analysis", None),
    ("Key Levels", Some("Key levels")),
    ("Risk Management", Some("Risk management")),
    ("Sentiment", Some("Sentiment")),
    ("Horizon", Some("Horizon")),
    ("Conclusion", Some("Conclusion")),
];

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    messages: Vec<ChatMessage<'a>>,
    model: &'a str,
    stream: bool,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: String,
}

/// Chat-completion backed analyzer.
pub struct RemoteNarrativeAnalyzer {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl RemoteNarrativeAnalyzer {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            api_key,
            api_url,
            model,
        }
    }

    /// `None` when no API key is configured.
    pub fn from_config(config: &NarrativeConfig) -> Option<Self> {
        let api_key = config.api_key.clone().filter(|k| !k.trim().is_empty())?;
        Some(Self::new(api_key, config.api_url.clone(), config.model.clone()))
    }

    async fn request(&self, ctx: &NarrativeContext) -> Result<Narrative, AppError> {
        let prompt = build_prompt(ctx);
        let body = ChatRequest {
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            model: &self.model,
            stream: false,
            temperature: 0.0,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::NarrativeParse(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::NarrativeParse(format!(
                "analyzer returned {}",
                response.status()
            )));
        }

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::NarrativeParse(format!("malformed response: {}", e)))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::NarrativeParse("response has no choices".to_string()))?;

        debug!("Narrative reply: {} chars", content.len());
        parse_reply(&content)
    }
}

impl NarrativeAnalyzer for RemoteNarrativeAnalyzer {
    fn name(&self) -> &str {
        "remote"
    }

    fn analyze<'a>(
        &'a self,
        ctx: &'a NarrativeContext,
    ) -> Pin<Box<dyn Future<Output = Result<Narrative, AppError>> + Send + 'a>> {
        Box::pin(self.request(ctx))
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

fn fmt_levels(levels: &[f64]) -> String {
    if levels.is_empty() {
        return "N/A".to_string();
    }
    levels
        .iter()
        .map(|l| format!("{:.2}", l))
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_prompt(ctx: &NarrativeContext) -> String {
    let indicators = &ctx.indicators;
    let mut prompt = String::from("Full Bitcoin analysis:\n\n");

    prompt.push_str("1. Price and trend:\n");
    prompt.push_str(&format!("- Current price: ${:.2}\n", ctx.price));
    prompt.push_str(&format!("- SMA20: {}\n", fmt_opt(indicators.sma20)));
    if let Some(sma) = indicators.sma20 {
        let side = if ctx.price > sma { "Above" } else { "Below" };
        prompt.push_str(&format!("- Position relative to the SMA20: {}\n", side));
    }

    prompt.push_str("\n2. Momentum:\n");
    prompt.push_str(&format!(
        "- RSI: {} (overbought > 70, oversold < 30)\n",
        fmt_opt(indicators.rsi),
    ));
    match indicators.macd {
        Some(m) => {
            prompt.push_str(&format!(
                "- MACD: line {:.2}, signal {:.2}, histogram {:.2}\n",
                m.macd, m.signal, m.histogram,
            ));
        }
        None => prompt.push_str("- MACD: N/A\n"),
    }

    prompt.push_str("\n3. Volatility and levels:\n");
    prompt.push_str(&format!("- ATR: {}\n", fmt_opt(indicators.atr)));
    match indicators.bollinger {
        Some(b) => {
            prompt.push_str(&format!(
                "- Bollinger bands: upper {:.2}, middle {:.2}, lower {:.2}\n",
                b.upper, b.middle, b.lower,
            ));
        }
        None => prompt.push_str("- Bollinger bands: N/A\n"),
    }
    prompt.push_str(&format!("- Recent supports: {}\n", fmt_levels(&indicators.supports)));
    prompt.push_str(&format!(
        "- Recent resistances: {}\n",
        fmt_levels(&indicators.resistances),
    ));

    prompt.push_str("\n4. Fibonacci levels:\n");
    match indicators.fibonacci {
        Some(f) => {
            for (label, value) in [
                ("0%", f.level0),
                ("23.6%", f.level236),
                ("38.2%", f.level382),
                ("50%", f.level50),
                ("61.8%", f.level618),
                ("78.6%", f.level786),
                ("100%", f.level100),
            ] {
                prompt.push_str(&format!("- {}: {:.2}\n", label, value));
            }
        }
        None => prompt.push_str("- N/A\n"),
    }

    prompt.push_str("\n5. Sentiment:\n");
    prompt.push_str(&format!(
        "- Fear & Greed Index: {}/100 (0 = extreme fear, 100 = extreme greed)\n",
        ctx.sentiment.fear_greed_index,
    ));
    prompt.push_str(&format!("- Social sentiment: {:?}\n", ctx.sentiment.social_sentiment));
    prompt.push_str(&format!("- Trend strength: {:.1}/10\n", ctx.sentiment.trend_strength));

    let recent = serde_json::to_string(&ctx.recent).unwrap_or_default();
    prompt.push_str(&format!("\n6. Recent history: {}\n", recent));

    prompt.push_str(
        "\nBased on these indicators, give a detailed analysis and a clear recommendation:\n\
         1. Identify converging and diverging signals\n\
         2. Assess the strength of the current trend\n\
         3. Name the critical levels to watch\n\
         4. Give a recommendation (BUY, SELL or WAIT) with a confidence level\n\n\
         Required response format:\n\
         1. **Signal**: [BUY/SELL/WAIT]\n\
         2. **Confidence**: [0-100%]\n\
         3. **Analysis**:\n   - Point 1\n   - Point 2\n   - Point 3\n\
         4. **Key Levels**:\n   - Support 1: [value]\n   - Resistance 1: [value]\n\
         5. **Risk Management**:\n   - Stop-Loss: [value]\n   - Take-Profit: [value]\n   - Risk/Reward: [value]\n\
         6. **Sentiment**:\n   - Reading of the Fear & Greed Index\n\
         7. **Horizon**: [Short/Medium/Long term]\n\
         8. **Conclusion**: One-sentence summary\n",
    );

    prompt
}

/// Drop a dangling list number such as "4." left before the next header.
fn strip_list_marker(body: &str) -> &str {
    let body = body.trim_end();
    match body.rsplit_once('\n') {
        Some((head, last)) if is_list_marker(last) => head.trim_end(),
        None if is_list_marker(body) => "",
        _ => body,
    }
}

fn is_list_marker(line: &str) -> bool {
    let line = line.trim();
    match line.strip_suffix('.') {
        Some(digits) => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}

fn section<'a>(content: &'a str, name: &str) -> Option<&'a str> {
    let headers: Vec<_> = HEADER_RE.captures_iter(content).collect();
    headers.iter().enumerate().find_map(|(i, caps)| {
        let whole = caps.get(0)?;
        let label = caps.get(1)?;
        if !label.as_str().trim().eq_ignore_ascii_case(name) {
            return None;
        }
        let end = headers
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(content.len(), |m| m.start());
        let body = strip_list_marker(content[whole.end()..end].trim());
        (!body.is_empty()).then_some(body)
    })
}

/// Extract the action, confidence and sections of a model reply.
fn parse_reply(content: &str) -> Result<Narrative, AppError> {
    let signal = SIGNAL_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| SignalAction::from_str(m.as_str()))
        .ok_or_else(|| AppError::NarrativeParse("reply has no **Signal** line".to_string()))?;

    let confidence = CONFIDENCE_RE
        .captures(content)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|pct| clamp01(pct / 100.0))
        .unwrap_or(DEFAULT_CONFIDENCE);

    let mut reason = String::new();
    for (name, label) in SECTIONS {
        if let Some(body) = section(content, name) {
            if !reason.is_empty() {
                reason.push_str("\n\n");
            }
            if let Some(label) = label {
                reason.push_str(&format!("{}:\n", label));
            }
            reason.push_str(body);
        }
    }
    if reason.is_empty() {
        reason = content.trim().to_string();
    }

    Ok(Narrative {
        signal,
        confidence,
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = "1. **Signal**: BUY\n\
2. **Confidence**: 72%\n\
3. **Analysis**:\n   - Price above the SMA20\n   - MACD turning up\n\
4. **Key Levels**:\n   - Support 1: 49500\n   - Resistance 1: 52000\n\
5. **Risk Management**:\n   - Stop-Loss: 49000\n   - Take-Profit: 53000\n\
6. **Sentiment**:\n   - Mild greed\n\
7. **Horizon**: Short term\n\
8. **Conclusion**: Momentum favours buyers.";

    #[test]
    fn test_parse_full_reply() {
        let narrative = parse_reply(REPLY).unwrap();
        assert_eq!(narrative.signal, SignalAction::Buy);
        assert!((narrative.confidence - 0.72).abs() < 1e-12);
        assert!(narrative.reason.starts_with("- Price above the SMA20"));
        assert!(narrative.reason.contains("Key levels:\n- Support 1: 49500"));
        assert!(narrative.reason.contains("Take-Profit: 53000"));
        assert!(narrative.reason.contains("Horizon:\nShort term"));
        assert!(narrative.reason.ends_with("Conclusion:\nMomentum favours buyers."));
        // Numbering of the following header is not part of a section.
        assert!(!narrative.reason.contains("\n4."));
    }

    #[test]
    fn test_missing_confidence_defaults() {
        let narrative = parse_reply("**Signal**: [sell]\nMarket looks weak.").unwrap();
        assert_eq!(narrative.signal, SignalAction::Sell);
        assert_eq!(narrative.confidence, DEFAULT_CONFIDENCE);
        // No known section: the raw reply is kept.
        assert!(narrative.reason.contains("Market looks weak."));
    }

    #[test]
    fn test_hold_maps_to_wait() {
        let narrative = parse_reply("**Signal**: HOLD\n**Confidence**: 150").unwrap();
        assert_eq!(narrative.signal, SignalAction::Wait);
        assert_eq!(narrative.confidence, 1.0);
    }

    #[test]
    fn test_reply_without_signal_is_parse_error() {
        assert!(matches!(
            parse_reply("I cannot help with that."),
            Err(AppError::NarrativeParse(_))
        ));
    }

    #[test]
    fn test_prompt_mentions_missing_indicators() {
        let prompt = build_prompt(&NarrativeContext::default());
        assert!(prompt.contains("- RSI: N/A"));
        assert!(prompt.contains("**Signal**: [BUY/SELL/WAIT]"));
        assert!(prompt.contains(
            "1. Price and trend:\n- Current price: $0.00\n- SMA20: N/A\n\n2. Momentum:\n"
        ));
        assert!(prompt.contains("- Trend strength: 5.0/10\n\n6. Recent history: []\n"));
    }

    #[test]
    fn test_from_config_requires_key() {
        assert!(RemoteNarrativeAnalyzer::from_config(&NarrativeConfig::default()).is_none());
        let config = NarrativeConfig {
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        assert!(RemoteNarrativeAnalyzer::from_config(&config).is_some());
    }
}
