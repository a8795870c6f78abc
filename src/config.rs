use std::env;
use std::time::Duration;

use crate::types::MacdSignalMode;

/// Which upstream provider the market feed asks first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSourceKind {
    Binance,
    CoinGecko,
}

impl PriceSourceKind {
    /// Parse from string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "binance" => Some(Self::Binance),
            "coingecko" | "gecko" => Some(Self::CoinGecko),
            _ => None,
        }
    }
}

/// Upstream market data configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Binance trading pair (e.g. BTCUSDT).
    pub binance_pair: String,
    /// CoinGecko coin id (e.g. bitcoin).
    pub coingecko_id: String,
    /// Provider tried first; the other one is the fallback.
    pub preferred_source: PriceSourceKind,
    /// Binance API key (optional, public endpoints work without).
    pub binance_api_key: Option<String>,
    /// CoinGecko API key (optional, for pro tier).
    pub coingecko_api_key: Option<String>,
    /// Lifetime of a cached price quote.
    pub price_ttl: Duration,
    /// Lifetime of a cached price history.
    pub history_ttl: Duration,
    /// Lifetime of a cached sentiment reading.
    pub sentiment_ttl: Duration,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            binance_pair: "BTCUSDT".to_string(),
            coingecko_id: "bitcoin".to_string(),
            preferred_source: PriceSourceKind::Binance,
            binance_api_key: None,
            coingecko_api_key: None,
            price_ttl: Duration::from_secs(30),
            history_ttl: Duration::from_secs(5 * 60),
            sentiment_ttl: Duration::from_secs(10 * 60),
        }
    }
}

/// Orchestration cycle configuration.
#[derive(Debug, Clone)]
pub struct CycleConfig {
    /// Period of the automatic refresh task.
    pub interval: Duration,
    /// Minimum gap after a successful cycle before a periodic trigger runs again.
    pub min_gap: Duration,
    /// Attempts per upstream fetch (price, history).
    pub fetch_max_attempts: u32,
    /// Fixed delay between fetch attempts.
    pub fetch_retry_delay: Duration,
    /// Signal line construction for MACD.
    pub macd_mode: MacdSignalMode,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60),
            min_gap: Duration::from_secs(5),
            fetch_max_attempts: 3,
            fetch_retry_delay: Duration::from_millis(5000),
            macd_mode: MacdSignalMode::Legacy,
        }
    }
}

/// Remote narrative analyzer configuration.
#[derive(Debug, Clone)]
pub struct NarrativeConfig {
    /// API key; without one only the local analysis runs.
    pub api_key: Option<String>,
    /// Chat completion endpoint.
    pub api_url: String,
    /// Model name sent with each request.
    pub model: String,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: "https://api.x.ai/v1/chat/completions".to_string(),
            model: "grok-3-latest".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Symbol shown in logs and the snapshot (e.g. btc).
    pub symbol: String,
    pub feed: FeedConfig,
    pub cycle: CycleConfig,
    pub narrative: NarrativeConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let feed_defaults = FeedConfig::default();
        let cycle_defaults = CycleConfig::default();
        let narrative_defaults = NarrativeConfig::default();

        let feed = FeedConfig {
            binance_pair: env::var("BINANCE_PAIR").unwrap_or(feed_defaults.binance_pair),
            coingecko_id: env::var("COINGECKO_ID").unwrap_or(feed_defaults.coingecko_id),
            preferred_source: env::var("PREFERRED_SOURCE")
                .ok()
                .and_then(|s| PriceSourceKind::from_str(&s))
                .unwrap_or(feed_defaults.preferred_source),
            binance_api_key: env::var("BINANCE_API_KEY").ok(),
            coingecko_api_key: env::var("COINGECKO_API_KEY").ok(),
            price_ttl: env_parse("PRICE_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(feed_defaults.price_ttl),
            history_ttl: env_parse("HISTORY_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(feed_defaults.history_ttl),
            sentiment_ttl: env_parse("SENTIMENT_CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(feed_defaults.sentiment_ttl),
        };

        let cycle = CycleConfig {
            interval: env_parse("CYCLE_INTERVAL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(cycle_defaults.interval),
            min_gap: env_parse("MIN_CYCLE_GAP_SECS")
                .map(Duration::from_secs)
                .unwrap_or(cycle_defaults.min_gap),
            fetch_max_attempts: env_parse("FETCH_MAX_ATTEMPTS")
                .filter(|n: &u32| *n > 0)
                .unwrap_or(cycle_defaults.fetch_max_attempts),
            fetch_retry_delay: env_parse("FETCH_RETRY_DELAY_MS")
                .map(Duration::from_millis)
                .unwrap_or(cycle_defaults.fetch_retry_delay),
            macd_mode: env::var("MACD_SIGNAL_MODE")
                .ok()
                .and_then(|s| MacdSignalMode::from_str(&s))
                .unwrap_or(cycle_defaults.macd_mode),
        };

        let narrative = NarrativeConfig {
            api_key: env::var("NARRATIVE_API_KEY").ok().filter(|k| !k.is_empty()),
            api_url: env::var("NARRATIVE_API_URL").unwrap_or(narrative_defaults.api_url),
            model: env::var("NARRATIVE_MODEL").unwrap_or(narrative_defaults.model),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORT").unwrap_or(3001),
            symbol: env::var("AUGUR_SYMBOL").unwrap_or_else(|_| "btc".to_string()),
            feed,
            cycle,
            narrative,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
