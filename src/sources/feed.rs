use std::sync::Arc;
use tracing::{debug, warn};

use super::{BinanceClient, CoinGeckoClient, FeedFuture, PriceFeed};
use crate::config::{FeedConfig, PriceSourceKind};
use crate::error::{AppError, Result};
use crate::services::Cache;
use crate::types::{PriceQuote, TimeSeries};

const QUOTE_KEY: &str = "quote";
const HISTORY_KEY: &str = "history";

/// One upstream provider of quotes and history.
pub trait MarketSource: Send + Sync {
    fn name(&self) -> &str;
    fn quote(&self) -> FeedFuture<'_, PriceQuote>;
    fn history(&self) -> FeedFuture<'_, TimeSeries>;
}

/// Price feed that asks each source in order and caches the first answer.
pub struct MarketFeed {
    sources: Vec<Arc<dyn MarketSource>>,
    quotes: Cache<PriceQuote>,
    histories: Cache<TimeSeries>,
}

impl MarketFeed {
    /// Sources are tried in the given order.
    pub fn new(sources: Vec<Arc<dyn MarketSource>>, config: &FeedConfig) -> Self {
        let feed = Self {
            sources,
            quotes: Cache::new(config.price_ttl),
            histories: Cache::new(config.history_ttl),
        };
        debug!(
            "Market feed over [{}], quote ttl {:?}, history ttl {:?}",
            feed.source_names().join(", "),
            feed.quotes.ttl(),
            feed.histories.ttl()
        );
        feed
    }

    fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// Binance and CoinGecko, preferred provider first.
    pub fn from_config(config: &FeedConfig) -> Self {
        let binance: Arc<dyn MarketSource> = Arc::new(BinanceClient::new(
            config.binance_pair.clone(),
            config.binance_api_key.clone(),
        ));
        let coingecko: Arc<dyn MarketSource> = Arc::new(CoinGeckoClient::new(
            config.coingecko_id.clone(),
            config.coingecko_api_key.clone(),
        ));

        let sources = match config.preferred_source {
            PriceSourceKind::Binance => vec![binance, coingecko],
            PriceSourceKind::CoinGecko => vec![coingecko, binance],
        };
        Self::new(sources, config)
    }

    async fn fetch_quote(&self) -> Result<PriceQuote> {
        if let Some(quote) = self.quotes.get(QUOTE_KEY) {
            debug!("Serving cached quote");
            return Ok(quote);
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            match source.quote().await.and_then(PriceQuote::validate) {
                Ok(quote) => {
                    self.quotes.put(QUOTE_KEY, quote);
                    return Ok(quote);
                }
                Err(e) => {
                    warn!("{} quote failed, trying next source: {}", source.name(), e);
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(all_failed("price", failures))
    }

    async fn fetch_history(&self) -> Result<TimeSeries> {
        if let Some(history) = self.histories.get(HISTORY_KEY) {
            debug!("Serving cached history ({} samples)", history.len());
            return Ok(history);
        }

        let mut failures = Vec::new();
        for source in &self.sources {
            match source.history().await {
                Ok(history) if !history.is_empty() => {
                    self.histories.put(HISTORY_KEY, history.clone());
                    return Ok(history);
                }
                Ok(_) => {
                    warn!("{} returned an empty history", source.name());
                    failures.push(format!("{}: empty history", source.name()));
                }
                Err(e) => {
                    warn!("{} history failed, trying next source: {}", source.name(), e);
                    failures.push(format!("{}: {}", source.name(), e));
                }
            }
        }

        Err(all_failed("history", failures))
    }
}

fn all_failed(what: &str, failures: Vec<String>) -> AppError {
    if failures.is_empty() {
        AppError::ExternalApi(format!("no {} source configured", what))
    } else {
        AppError::ExternalApi(format!("all {} sources failed ({})", what, failures.join("; ")))
    }
}

impl PriceFeed for MarketFeed {
    fn current_price(&self) -> FeedFuture<'_, PriceQuote> {
        Box::pin(self.fetch_quote())
    }

    fn history(&self) -> FeedFuture<'_, TimeSeries> {
        Box::pin(self.fetch_history())
    }
}
