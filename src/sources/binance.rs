use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use super::{check_status, http_client, FeedFuture, MarketSource};
use crate::error::{AppError, Result};
use crate::types::{PriceQuote, PriceSample, TimeSeries};

const BINANCE_API_URL: &str = "https://api.binance.com/api/v3";
/// One day of 1-minute candles.
const KLINE_LIMIT: u32 = 1440;
const DEPTH_LIMIT: u32 = 10;

/// Binance 24hr ticker response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker {
    last_price: String,
    open_price: String,
}

#[derive(Debug, Deserialize)]
struct BinanceDepth {
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

/// One resting order level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BookLevel {
    pub price: f64,
    pub quantity: f64,
}

/// Top of the order book.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBook {
    pub bids: Vec<BookLevel>,
    pub asks: Vec<BookLevel>,
}

impl OrderBook {
    /// Share of resting quantity on the bid side; `None` for an empty book.
    pub fn buy_ratio(&self) -> Option<f64> {
        let bid: f64 = self.bids.iter().map(|l| l.quantity).sum();
        let ask: f64 = self.asks.iter().map(|l| l.quantity).sum();
        let total = bid + ask;
        if total > 0.0 && total.is_finite() {
            Some(bid / total)
        } else {
            None
        }
    }
}

/// Binance REST client for one trading pair.
#[derive(Clone)]
pub struct BinanceClient {
    client: Client,
    pair: String,
    api_key: Option<String>,
}

impl BinanceClient {
    pub fn new(pair: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: http_client(),
            pair: pair.into(),
            api_key,
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = format!("{}/{}", BINANCE_API_URL, path);
        let mut request = self.client.get(&url).query(query);
        if let Some(ref key) = self.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }
        check_status("Binance", request.send().await?).await
    }

    /// Last price and percent change from the 24h open.
    pub async fn ticker(&self) -> Result<PriceQuote> {
        let response = self
            .get("ticker/24hr", &[("symbol", self.pair.clone())])
            .await?;
        let ticker: BinanceTicker = response.json().await?;
        let quote = parse_ticker(&ticker)?;
        debug!("Binance price update: {} = ${}", self.pair, quote.price);
        Ok(quote)
    }

    /// One day of 1-minute closes with their volumes.
    pub async fn klines(&self) -> Result<TimeSeries> {
        let response = self
            .get(
                "klines",
                &[
                    ("symbol", self.pair.clone()),
                    ("interval", "1m".to_string()),
                    ("limit", KLINE_LIMIT.to_string()),
                ],
            )
            .await?;
        let rows: Vec<Vec<Value>> = response.json().await?;
        parse_klines(&rows)
    }

    pub async fn order_book(&self) -> Result<OrderBook> {
        let response = self
            .get(
                "depth",
                &[
                    ("symbol", self.pair.clone()),
                    ("limit", DEPTH_LIMIT.to_string()),
                ],
            )
            .await?;
        let depth: BinanceDepth = response.json().await?;
        Ok(OrderBook {
            bids: parse_levels(&depth.bids),
            asks: parse_levels(&depth.asks),
        })
    }
}

impl MarketSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    fn quote(&self) -> FeedFuture<'_, PriceQuote> {
        Box::pin(self.ticker())
    }

    fn history(&self) -> FeedFuture<'_, TimeSeries> {
        Box::pin(self.klines())
    }
}

fn parse_number(raw: &str, field: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| AppError::ExternalApi(format!("Binance returned a non-numeric {}: {}", field, raw)))
}

fn parse_ticker(ticker: &BinanceTicker) -> Result<PriceQuote> {
    let last = parse_number(&ticker.last_price, "lastPrice")?;
    let open = parse_number(&ticker.open_price, "openPrice")?;
    let change_24h = if open != 0.0 {
        (last - open) / open * 100.0
    } else {
        0.0
    };
    PriceQuote {
        price: last,
        change_24h,
    }
    .validate()
}

/// Kline rows are `[openTime, open, high, low, close, volume, ...]`.
fn parse_klines(rows: &[Vec<Value>]) -> Result<TimeSeries> {
    let samples = rows
        .iter()
        .map(|row| {
            let timestamp = row.first().and_then(Value::as_i64);
            let close = row.get(4).and_then(value_as_f64);
            let volume = row.get(5).and_then(value_as_f64).unwrap_or(0.0);
            match (timestamp, close) {
                (Some(timestamp), Some(close)) => Ok(PriceSample::new(timestamp, close, volume)),
                _ => Err(AppError::ExternalApi(format!(
                    "malformed Binance kline: {:?}",
                    row
                ))),
            }
        })
        .collect::<Result<Vec<_>>>()?;
    TimeSeries::from_samples(samples)
}

fn parse_levels(levels: &[[String; 2]]) -> Vec<BookLevel> {
    levels
        .iter()
        .filter_map(|[price, quantity]| {
            Some(BookLevel {
                price: price.parse().ok()?,
                quantity: quantity.parse().ok()?,
            })
        })
        .collect()
}

/// Binance encodes decimals as strings.
fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::String(s) => s.parse().ok(),
        other => other.as_f64(),
    }
}
