//! Upstream market data.
//!
//! The orchestrator only sees the [`PriceFeed`] and [`SentimentFeed`]
//! traits; the concrete clients below are one way to satisfy them.

pub mod binance;
pub mod coingecko;
pub mod feed;
pub mod orderbook;

pub use binance::{BinanceClient, OrderBook};
pub use coingecko::CoinGeckoClient;
pub use feed::{MarketFeed, MarketSource};
pub use orderbook::OrderBookSentiment;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use reqwest::Client;

use crate::error::Result;
use crate::types::{PriceQuote, Sentiment, TimeSeries};

/// Boxed future returned by the feed traits.
pub type FeedFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Current price and recent history for one asset.
pub trait PriceFeed: Send + Sync {
    /// Latest price with its 24h change.
    fn current_price(&self) -> FeedFuture<'_, PriceQuote>;

    /// Ordered price history, oldest first.
    fn history(&self) -> FeedFuture<'_, TimeSeries>;
}

/// Market mood reading.
pub trait SentimentFeed: Send + Sync {
    fn sentiment(&self) -> FeedFuture<'_, Sentiment>;
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared HTTP client for the REST sources.
pub(crate) fn http_client() -> Client {
    Client::builder()
        .user_agent(concat!("Augur/", env!("CARGO_PKG_VERSION")))
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Error out on a non-success status, logging a short body excerpt.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let excerpt: String = text.chars().take(200).collect();
    tracing::warn!("{} API returned {}: {}", provider, status, excerpt);
    Err(crate::error::AppError::ExternalApi(format!(
        "{} API error: {}",
        provider, status
    )))
}
