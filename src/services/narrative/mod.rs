//! Written market commentary with a recommended action.
//!
//! A remote language model is asked first when configured; the local rule
//! set produces the same shape of output and is always available.

pub mod local;
pub mod remote;

pub use local::LocalNarrativeAnalyzer;
pub use remote::RemoteNarrativeAnalyzer;

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;

use crate::error::AppError;
use crate::types::{
    Divergence, IndicatorSet, ManipulationAssessment, PriceSample, Sentiment, SignalAction,
};

/// Samples of recent history included in the context.
pub const RECENT_SAMPLES: usize = 5;

/// Everything an analyzer gets to look at.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NarrativeContext {
    pub price: f64,
    /// The last few samples, oldest first.
    pub recent: Vec<PriceSample>,
    pub indicators: IndicatorSet,
    pub divergence: Divergence,
    pub manipulation: ManipulationAssessment,
    pub sentiment: Sentiment,
}

impl NarrativeContext {
    pub fn new(
        price: f64,
        history: &[PriceSample],
        indicators: &IndicatorSet,
        divergence: Divergence,
        manipulation: &ManipulationAssessment,
        sentiment: Sentiment,
    ) -> Self {
        let start = history.len().saturating_sub(RECENT_SAMPLES);
        Self {
            price,
            recent: history[start..].to_vec(),
            indicators: indicators.clone(),
            divergence,
            manipulation: manipulation.clone(),
            sentiment,
        }
    }
}

/// An analyzer's verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Narrative {
    pub signal: SignalAction,
    /// 0.0 - 1.0
    pub confidence: f64,
    pub reason: String,
}

/// Produces a [`Narrative`] for a market context.
pub trait NarrativeAnalyzer: Send + Sync {
    fn name(&self) -> &str;

    fn analyze<'a>(
        &'a self,
        ctx: &'a NarrativeContext,
    ) -> Pin<Box<dyn Future<Output = Result<Narrative, AppError>> + Send + 'a>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_keeps_last_samples() {
        let history: Vec<PriceSample> = (0..8)
            .map(|i| PriceSample::new(i, 100.0 + i as f64, 1.0))
            .collect();
        let ctx = NarrativeContext::new(
            107.0,
            &history,
            &IndicatorSet::default(),
            Divergence::default(),
            &ManipulationAssessment::default(),
            Sentiment::default(),
        );
        assert_eq!(ctx.recent.len(), RECENT_SAMPLES);
        assert_eq!(ctx.recent[0].timestamp, 3);

        let short = NarrativeContext::new(
            100.0,
            &history[..2],
            &IndicatorSet::default(),
            Divergence::default(),
            &ManipulationAssessment::default(),
            Sentiment::default(),
        );
        assert_eq!(short.recent.len(), 2);
    }
}
