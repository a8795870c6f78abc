use serde::{Deserialize, Deserializer, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// How the MACD signal line is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MacdSignalMode {
    /// EMA(9) over the price series with its last nine samples swapped for
    /// the scalar MACD value. Kept for output compatibility with earlier
    /// releases; it is probably not what was intended.
    #[default]
    Legacy,
    /// EMA(9) over the MACD line history.
    Textbook,
}

impl MacdSignalMode {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "legacy" => Some(Self::Legacy),
            "textbook" | "standard" => Some(Self::Textbook),
            _ => None,
        }
    }
}

/// MACD line, signal line and histogram.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

/// Bollinger band levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BollingerBands {
    /// Relative band width, (upper - lower) / middle.
    pub fn bandwidth(&self) -> f64 {
        if self.middle == 0.0 {
            0.0
        } else {
            (self.upper - self.lower) / self.middle
        }
    }
}

/// Fibonacci retracement levels between the window low (0%) and high (100%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FibonacciLevels {
    pub level0: f64,
    pub level236: f64,
    pub level382: f64,
    pub level50: f64,
    pub level618: f64,
    pub level786: f64,
    pub level100: f64,
}

/// Technical indicators for one price snapshot.
///
/// Each field is computed independently; a field is `None` when its own
/// minimum sample count is not met.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorSet {
    pub sma20: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<MacdValue>,
    pub bollinger: Option<BollingerBands>,
    pub atr: Option<f64>,
    /// At most three, in series order.
    pub supports: Vec<f64>,
    /// At most three, in series order.
    pub resistances: Vec<f64>,
    pub fibonacci: Option<FibonacciLevels>,
}

/// RSI/price divergence flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Divergence {
    pub bullish: bool,
    pub bearish: bool,
}

/// Result of the pump-and-dump / fake-out screen.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManipulationAssessment {
    pub is_pump_and_dump: bool,
    pub is_fakeout: bool,
    pub is_manipulated: bool,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub details: Vec<String>,
}

/// Advisory action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalAction {
    Buy,
    Sell,
    #[default]
    Wait,
}

impl SignalAction {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "BUY" => Some(Self::Buy),
            "SELL" => Some(Self::Sell),
            "WAIT" | "HOLD" => Some(Self::Wait),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Wait => "WAIT",
        }
    }
}

impl fmt::Display for SignalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Vote tally across indicators.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Confluence {
    pub signal: SignalAction,
    /// 0.0 - 1.0
    pub strength: f64,
    pub reasons: Vec<String>,
}

/// Analysis derived from the indicators in a cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketAnalysis {
    pub divergence: Divergence,
    pub manipulation: ManipulationAssessment,
    pub confluence: Confluence,
}

/// Expected price direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredictionDirection {
    Bullish,
    Bearish,
    #[default]
    Neutral,
}

impl PredictionDirection {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Bullish => "BULLISH",
            Self::Bearish => "BEARISH",
            Self::Neutral => "NEUTRAL",
        }
    }

    /// Direction from the sign of a value; zero is neutral.
    pub fn from_sign(value: f64) -> Self {
        if value > 0.0 {
            Self::Bullish
        } else if value < 0.0 {
            Self::Bearish
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for PredictionDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Projected price band for a horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
    pub confidence: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRanges {
    pub one_hour: PriceRange,
    pub four_hours: PriceRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TargetKind {
    Support,
    Resistance,
}

/// A level price is expected to travel to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceTarget {
    pub price: f64,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeyLevels {
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
    pub targets: Vec<PriceTarget>,
}

/// Short-horizon forecast.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub direction: PredictionDirection,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub price_ranges: PriceRanges,
    pub key_levels: KeyLevels,
    pub reasons: Vec<String>,
    pub risks: Vec<String>,
}

/// Stop-loss / take-profit derived from ATR.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskParameters {
    pub stop_loss: f64,
    pub take_profit: f64,
    pub risk_reward_ratio: f64,
}

/// Signal with confidence and explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub signal: SignalAction,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub reason: String,
}

impl Default for TradingSignal {
    fn default() -> Self {
        Self {
            signal: SignalAction::Wait,
            confidence: 0.0,
            reason: "Initializing...".to_string(),
        }
    }
}

/// A past change of the emitted signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalHistoryEntry {
    /// Timestamp (milliseconds since epoch).
    pub time: i64,
    pub signal: SignalAction,
    pub price: f64,
    pub confidence: f64,
}

/// Bounded FIFO of emitted signal changes, oldest first.
///
/// Serialized as a plain array. Deserializing goes through [`push`], so an
/// oversized array keeps only its newest entries.
///
/// [`push`]: SignalHistory::push
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SignalHistory {
    entries: VecDeque<SignalHistoryEntry>,
}

impl SignalHistory {
    pub const CAPACITY: usize = 10;

    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(Self::CAPACITY),
        }
    }

    /// Append an entry, evicting the oldest ones beyond capacity.
    pub fn push(&mut self, entry: SignalHistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > Self::CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SignalHistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&SignalHistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SignalHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<SignalHistoryEntry> for SignalHistory {
    fn from_iter<I: IntoIterator<Item = SignalHistoryEntry>>(iter: I) -> Self {
        let mut history = Self::new();
        for entry in iter {
            history.push(entry);
        }
        history
    }
}

impl<'de> Deserialize<'de> for SignalHistory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<SignalHistoryEntry>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(time: i64, signal: SignalAction) -> SignalHistoryEntry {
        SignalHistoryEntry {
            time,
            signal,
            price: 100.0,
            confidence: 0.5,
        }
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = SignalHistory::new();
        for i in 0..15 {
            history.push(entry(i, SignalAction::Buy));
        }
        assert_eq!(history.len(), SignalHistory::CAPACITY);
        assert_eq!(history.iter().next().map(|e| e.time), Some(5));
        assert_eq!(history.latest().map(|e| e.time), Some(14));
    }

    #[test]
    fn test_signal_action_parse() {
        assert_eq!(SignalAction::from_str(" buy "), Some(SignalAction::Buy));
        assert_eq!(SignalAction::from_str("SELL"), Some(SignalAction::Sell));
        assert_eq!(SignalAction::from_str("hold"), Some(SignalAction::Wait));
        assert_eq!(SignalAction::from_str("moon"), None);
    }

    #[test]
    fn test_enum_serialization() {
        assert_eq!(serde_json::to_string(&SignalAction::Wait).unwrap(), "\"WAIT\"");
        assert_eq!(
            serde_json::to_string(&PredictionDirection::Bullish).unwrap(),
            "\"BULLISH\""
        );
        let target = PriceTarget {
            price: 1.0,
            kind: TargetKind::Resistance,
            confidence: 0.6,
        };
        let json = serde_json::to_string(&target).unwrap();
        assert!(json.contains("\"type\":\"RESISTANCE\""));
    }

    #[test]
    fn test_bandwidth_zero_middle() {
        let bands = BollingerBands {
            upper: 1.0,
            middle: 0.0,
            lower: -1.0,
        };
        assert_eq!(bands.bandwidth(), 0.0);
    }

    #[test]
    fn test_history_serializes_as_array() {
        let mut history = SignalHistory::new();
        history.push(entry(1, SignalAction::Sell));
        let json = serde_json::to_string(&history).unwrap();
        assert!(json.starts_with('['));
    }

    #[test]
    fn test_history_deserialize_applies_capacity() {
        let entries: Vec<SignalHistoryEntry> = (0..13)
            .map(|i| entry(i, SignalAction::Buy))
            .collect();
        let json = serde_json::to_string(&entries).unwrap();

        let history: SignalHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(history.len(), SignalHistory::CAPACITY);
        assert_eq!(history.iter().next().unwrap().time, 3);
        assert_eq!(history.latest().unwrap().time, 12);

        let short: SignalHistory = serde_json::from_str("[]").unwrap();
        assert!(short.is_empty());
    }

    #[test]
    fn test_macd_mode_parse() {
        assert_eq!(MacdSignalMode::from_str("TEXTBOOK"), Some(MacdSignalMode::Textbook));
        assert_eq!(MacdSignalMode::from_str("legacy"), Some(MacdSignalMode::Legacy));
        assert_eq!(MacdSignalMode::from_str("other"), None);
    }
}
