//! Runs the analysis pipeline and publishes snapshots.

use std::sync::{Arc, Mutex};
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::cycle::{CycleGate, CycleStatus, GatePhase, Trigger};
use super::narrative::{LocalNarrativeAnalyzer, Narrative, NarrativeAnalyzer, NarrativeContext};
use super::retry::RetryPolicy;
use super::signals::{anomaly, confluence, divergence, indicators, prediction, risk};
use crate::config::CycleConfig;
use crate::error::{AppError, Result};
use crate::sources::{PriceFeed, SentimentFeed};
use crate::types::{
    clamp01, Confluence, IndicatorSet, MacdSignalMode, ManipulationAssessment, MarketAnalysis,
    MarketSnapshot, Prediction, PriceQuote, RiskParameters, Sentiment, SignalAction,
    SignalHistory, SignalHistoryEntry, TimeSeries, TradingSignal,
};

/// Published state. Only the orchestrator writes it.
#[derive(Debug, Default)]
struct EngineState {
    snapshot: MarketSnapshot,
    /// Action emitted by the last successful cycle.
    last_signal: SignalAction,
}

/// Feeds and analyzers a [`SignalOrchestrator`] is built from.
pub struct Collaborators {
    pub price_feed: Arc<dyn PriceFeed>,
    pub sentiment_feed: Option<Arc<dyn SentimentFeed>>,
    /// Asked first; the local rules answer when absent or failing.
    pub narrative: Option<Arc<dyn NarrativeAnalyzer>>,
}

/// Drives one analysis cycle at a time and owns the published snapshot.
pub struct SignalOrchestrator {
    price_feed: Arc<dyn PriceFeed>,
    sentiment_feed: Option<Arc<dyn SentimentFeed>>,
    narrative: Option<Arc<dyn NarrativeAnalyzer>>,
    retry: RetryPolicy,
    macd_mode: MacdSignalMode,
    gate: Mutex<CycleGate>,
    state: RwLock<EngineState>,
}

/// Returns the gate to idle even if the cycle future is dropped mid-flight.
struct RunningGuard<'a> {
    gate: &'a Mutex<CycleGate>,
    success: bool,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
        gate.finish(Instant::now(), self.success);
    }
}

/// Everything a cycle computes before it is published.
struct CycleOutput {
    quote: PriceQuote,
    indicators: IndicatorSet,
    analysis: MarketAnalysis,
    sentiment: Sentiment,
    risk_parameters: Option<RiskParameters>,
    narrative: Narrative,
    prediction: Prediction,
}

impl SignalOrchestrator {
    pub fn new(collaborators: Collaborators, config: &CycleConfig) -> Arc<Self> {
        Arc::new(Self {
            price_feed: collaborators.price_feed,
            sentiment_feed: collaborators.sentiment_feed,
            narrative: collaborators.narrative,
            retry: RetryPolicy::from_config(config),
            macd_mode: config.macd_mode,
            gate: Mutex::new(CycleGate::new(config.min_gap)),
            state: RwLock::new(EngineState::default()),
        })
    }

    /// Whether a cycle is in flight right now.
    pub fn phase(&self) -> GatePhase {
        self.gate.lock().unwrap_or_else(|e| e.into_inner()).phase()
    }

    /// Current published snapshot.
    pub async fn snapshot(&self) -> MarketSnapshot {
        self.state.read().await.snapshot.clone()
    }

    pub async fn history(&self) -> SignalHistory {
        self.state.read().await.snapshot.signal_history.clone()
    }

    /// Run a cycle now, bypassing the minimum gap.
    pub async fn refresh(&self) -> Result<CycleStatus> {
        self.trigger(Trigger::Manual).await
    }

    pub async fn clear_error(&self) {
        self.state.write().await.snapshot.last_error = None;
    }

    /// Run a cycle unless one is in flight or the gap has not elapsed.
    ///
    /// On failure the previous snapshot stays published with `last_error`
    /// set, and the error is returned.
    pub async fn trigger(&self, trigger: Trigger) -> Result<CycleStatus> {
        {
            let mut gate = self.gate.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(reason) = gate.try_enter(Instant::now(), trigger) {
                debug!("Skipping {:?} cycle: {:?}", trigger, reason);
                return Ok(CycleStatus::Skipped(reason));
            }
        }

        let mut guard = RunningGuard {
            gate: &self.gate,
            success: false,
        };

        let started = Instant::now();
        match self.run_cycle().await {
            Ok(output) => {
                let signal = self.publish(output).await;
                guard.success = true;
                info!(
                    "Cycle completed in {:?}: {} ({:.0}% confidence)",
                    started.elapsed(),
                    signal.signal,
                    signal.confidence * 100.0
                );
                Ok(CycleStatus::Completed)
            }
            Err(e) => {
                error!("Cycle failed: {}", e);
                self.state.write().await.snapshot.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn fetch_inputs(&self) -> Result<(PriceQuote, TimeSeries)> {
        let quote = self
            .retry
            .run(
                "price",
                || self.price_feed.current_price(),
                |quote: &PriceQuote| quote.validate().map(|_| ()),
            )
            .await?;

        let history = self
            .retry
            .run(
                "history",
                || self.price_feed.history(),
                |history: &TimeSeries| {
                    if history.is_empty() {
                        Err(AppError::InvalidInput("empty price history".to_string()))
                    } else {
                        Ok(())
                    }
                },
            )
            .await?;

        Ok((quote, history))
    }

    async fn current_sentiment(&self) -> Sentiment {
        let previous = self.state.read().await.snapshot.sentiment;
        let Some(feed) = &self.sentiment_feed else {
            return previous;
        };

        match feed.sentiment().await {
            Ok(sentiment) => sentiment,
            Err(e) => {
                warn!("Sentiment unavailable, keeping previous reading: {}", e);
                previous
            }
        }
    }

    async fn narrate(&self, ctx: &NarrativeContext) -> Narrative {
        let narrative = match &self.narrative {
            Some(analyzer) => match analyzer.analyze(ctx).await {
                Ok(narrative) => narrative,
                Err(e) => {
                    warn!(
                        "{} narrative failed, using local analysis: {}",
                        analyzer.name(),
                        e
                    );
                    LocalNarrativeAnalyzer::narrate(ctx)
                }
            },
            None => LocalNarrativeAnalyzer::narrate(ctx),
        };

        Narrative {
            confidence: clamp01(narrative.confidence),
            ..narrative
        }
    }

    async fn run_cycle(&self) -> Result<CycleOutput> {
        let (quote, history) = self.fetch_inputs().await?;
        let prices = history.prices();
        let volumes = history.volumes();
        debug!("Analysing {} samples at ${:.2}", prices.len(), quote.price);

        let indicator_set = indicators::compute(&prices, self.macd_mode);
        let rsi_series = indicators::rsi_series(&prices, indicators::Rsi::default().period());
        let divergence_found =
            divergence::detect(&prices, &rsi_series, divergence::DEFAULT_LOOKBACK);
        let manipulation = anomaly::detect(&prices, &volumes, anomaly::DEFAULT_TIMEFRAME);
        if manipulation.is_manipulated {
            warn!("Manipulation suspected: {}", manipulation.details.join(", "));
        }

        let vote = confluence::score(
            &confluence::ConfluenceInput {
                indicators: &indicator_set,
                current_price: quote.price,
            },
            &manipulation,
            &confluence::LevelSet::from_indicators(&indicator_set),
        );

        let sentiment = self.current_sentiment().await;

        let risk_parameters = risk::risk_params(
            quote.price,
            indicator_set.atr,
            manipulation.is_manipulated,
            vote.signal == SignalAction::Buy,
        );

        let ctx = NarrativeContext::new(
            quote.price,
            history.samples(),
            &indicator_set,
            divergence_found,
            &manipulation,
            sentiment,
        );
        let narrative = self.narrate(&ctx).await;

        let forecast = prediction::predict(quote.price, &indicator_set, Some(&sentiment));

        Ok(CycleOutput {
            quote,
            indicators: indicator_set,
            analysis: MarketAnalysis {
                divergence: divergence_found,
                manipulation,
                confluence: vote,
            },
            sentiment,
            risk_parameters,
            narrative,
            prediction: forecast,
        })
    }

    /// Swap in the new snapshot; returns the emitted signal.
    async fn publish(&self, output: CycleOutput) -> TradingSignal {
        let manipulation = &output.analysis.manipulation;
        let trading_signal = TradingSignal {
            signal: output.narrative.signal,
            confidence: final_confidence(
                &output.narrative,
                &output.analysis.confluence,
                &output.prediction,
                manipulation,
            ),
            reason: compose_reason(
                &output.narrative,
                &output.analysis.confluence,
                &output.prediction,
                manipulation,
            ),
        };

        let mut state = self.state.write().await;
        let mut signal_history = state.snapshot.signal_history.clone();
        if trading_signal.signal != state.last_signal && !manipulation.is_manipulated {
            signal_history.push(SignalHistoryEntry {
                time: chrono::Utc::now().timestamp_millis(),
                signal: trading_signal.signal,
                price: output.quote.price,
                confidence: output.narrative.confidence,
            });
        }
        state.last_signal = trading_signal.signal;

        state.snapshot = MarketSnapshot {
            current_price: output.quote.price,
            price_change_24h: output.quote.change_24h,
            indicators: output.indicators,
            analysis: output.analysis,
            sentiment: output.sentiment,
            risk_parameters: output.risk_parameters,
            trading_signal: trading_signal.clone(),
            prediction: output.prediction,
            signal_history,
            last_error: None,
            updated_at: Some(chrono::Utc::now().timestamp_millis()),
        };

        trading_signal
    }
}

/// Mean of the three confidences, zero under manipulation.
pub fn final_confidence(
    narrative: &Narrative,
    confluence: &Confluence,
    prediction: &Prediction,
    manipulation: &ManipulationAssessment,
) -> f64 {
    if manipulation.is_manipulated {
        return 0.0;
    }
    clamp01((narrative.confidence + confluence.strength + prediction.confidence) / 3.0)
}

/// Narrative text, then the manipulation warning or confluence reasons,
/// then the forecast.
pub fn compose_reason(
    narrative: &Narrative,
    confluence: &Confluence,
    prediction: &Prediction,
    manipulation: &ManipulationAssessment,
) -> String {
    let middle = if manipulation.is_manipulated {
        format!(
            "WARNING: market manipulation detected - {}",
            manipulation.details.join(", ")
        )
    } else {
        confluence.reasons.join(", ")
    };

    format!(
        "{}\n\n{}\n\nPrediction: {} ({:.1}% confidence)",
        narrative.reason,
        middle,
        prediction.direction,
        prediction.confidence * 100.0
    )
}
