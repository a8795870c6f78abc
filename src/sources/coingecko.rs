use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use super::{check_status, http_client, FeedFuture, MarketSource};
use crate::error::{AppError, Result};
use crate::types::{PriceQuote, PriceSample, TimeSeries};

const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";
const COINGECKO_PRO_API_URL: &str = "https://pro-api.coingecko.com/api/v3";

#[derive(Debug, Deserialize)]
struct CoinGeckoPrice {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

/// `market_chart` response; each entry is `[timestamp_ms, value]`.
#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<[f64; 2]>,
    #[serde(default)]
    total_volumes: Vec<[f64; 2]>,
}

/// CoinGecko REST client for one coin.
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    coin_id: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    pub fn new(coin_id: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: http_client(),
            coin_id: coin_id.into(),
            api_key,
        }
    }

    fn base_url(&self) -> &str {
        if self.api_key.is_some() {
            COINGECKO_PRO_API_URL
        } else {
            COINGECKO_API_URL
        }
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<reqwest::Response> {
        let url = format!("{}/{}", self.base_url(), path);
        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(query);
        if let Some(ref key) = self.api_key {
            request = request.query(&[("x_cg_pro_api_key", key.as_str())]);
        }
        check_status("CoinGecko", request.send().await?).await
    }

    /// USD price with the 24h percent change.
    pub async fn simple_price(&self) -> Result<PriceQuote> {
        let response = self
            .get(
                "simple/price",
                &[
                    ("ids", self.coin_id.clone()),
                    ("vs_currencies", "usd".to_string()),
                    ("include_24hr_change", "true".to_string()),
                ],
            )
            .await?;
        let prices: HashMap<String, CoinGeckoPrice> = response.json().await?;
        let quote = parse_simple_price(&prices, &self.coin_id)?;
        debug!("CoinGecko price update: {} = ${}", self.coin_id, quote.price);
        Ok(quote)
    }

    /// Last 24 hours of prices zipped with total volumes.
    pub async fn market_chart(&self) -> Result<TimeSeries> {
        let path = format!("coins/{}/market_chart", self.coin_id);
        let response = self
            .get(
                &path,
                &[
                    ("vs_currency", "usd".to_string()),
                    ("days", "1".to_string()),
                ],
            )
            .await?;
        let chart: MarketChart = response.json().await?;
        parse_market_chart(&chart)
    }
}

impl MarketSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "coingecko"
    }

    fn quote(&self) -> FeedFuture<'_, PriceQuote> {
        Box::pin(self.simple_price())
    }

    fn history(&self) -> FeedFuture<'_, TimeSeries> {
        Box::pin(self.market_chart())
    }
}

fn parse_simple_price(prices: &HashMap<String, CoinGeckoPrice>, coin_id: &str) -> Result<PriceQuote> {
    let price = prices
        .get(coin_id)
        .and_then(|p| p.usd.map(|usd| (usd, p.usd_24h_change.unwrap_or(0.0))))
        .ok_or_else(|| AppError::ExternalApi(format!("CoinGecko returned no USD price for {}", coin_id)))?;

    PriceQuote {
        price: price.0,
        change_24h: price.1,
    }
    .validate()
}

/// Volumes are matched by position; missing entries default to zero.
fn parse_market_chart(chart: &MarketChart) -> Result<TimeSeries> {
    let samples = chart
        .prices
        .iter()
        .enumerate()
        .map(|(i, [timestamp, price])| {
            let volume = chart.total_volumes.get(i).map(|v| v[1]).unwrap_or(0.0);
            PriceSample::new(*timestamp as i64, *price, volume)
        })
        .collect();
    TimeSeries::from_samples(samples)
}
