use serde::{Deserialize, Serialize};

use super::{
    IndicatorSet, MarketAnalysis, Prediction, RiskParameters, Sentiment, SignalHistory,
    TradingSignal,
};

/// Read-only view of the latest published cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketSnapshot {
    pub current_price: f64,
    pub price_change_24h: f64,
    pub indicators: IndicatorSet,
    pub analysis: MarketAnalysis,
    pub sentiment: Sentiment,
    pub risk_parameters: Option<RiskParameters>,
    pub trading_signal: TradingSignal,
    pub prediction: Prediction,
    pub signal_history: SignalHistory,
    pub last_error: Option<String>,
    /// Timestamp of the last successful cycle (milliseconds since epoch).
    pub updated_at: Option<i64>,
}
