use tracing::debug;

use super::{BinanceClient, FeedFuture, OrderBook, SentimentFeed};
use crate::config::FeedConfig;
use crate::error::{AppError, Result};
use crate::services::Cache;
use crate::types::Sentiment;

const SENTIMENT_KEY: &str = "sentiment";

/// Sentiment derived from the bid/ask balance of the Binance order book.
pub struct OrderBookSentiment {
    client: BinanceClient,
    cache: Cache<Sentiment>,
}

impl OrderBookSentiment {
    pub fn new(client: BinanceClient, config: &FeedConfig) -> Self {
        let cache = Cache::new(config.sentiment_ttl);
        debug!("Order book sentiment cached for {:?}", cache.ttl());
        Self { client, cache }
    }

    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new(
            BinanceClient::new(config.binance_pair.clone(), config.binance_api_key.clone()),
            config,
        )
    }

    async fn fetch(&self) -> Result<Sentiment> {
        if let Some(sentiment) = self.cache.get(SENTIMENT_KEY) {
            return Ok(sentiment);
        }

        let book = self
            .client
            .order_book()
            .await
            .map_err(|e| AppError::Sentiment(e.to_string()))?;
        let sentiment = sentiment_from_book(&book)?;
        debug!(
            "Order book sentiment: fear/greed {} ({:?})",
            sentiment.fear_greed_index, sentiment.social_sentiment
        );
        self.cache.put(SENTIMENT_KEY, sentiment);
        Ok(sentiment)
    }
}

impl SentimentFeed for OrderBookSentiment {
    fn sentiment(&self) -> FeedFuture<'_, Sentiment> {
        Box::pin(self.fetch())
    }
}

fn sentiment_from_book(book: &OrderBook) -> Result<Sentiment> {
    book.buy_ratio()
        .map(Sentiment::from_buy_ratio)
        .ok_or_else(|| AppError::Sentiment("order book is empty".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::binance::BookLevel;
    use crate::types::SocialSentiment;

    fn level(quantity: f64) -> BookLevel {
        BookLevel {
            price: 100.0,
            quantity,
        }
    }

    #[test]
    fn test_bid_heavy_book_is_greedy() {
        let book = OrderBook {
            bids: vec![level(8.0), level(1.0)],
            asks: vec![level(1.0)],
        };
        let sentiment = sentiment_from_book(&book).unwrap();
        assert_eq!(sentiment.fear_greed_index, 90);
        assert_eq!(sentiment.social_sentiment, SocialSentiment::Positive);
        assert_eq!(sentiment.trend_strength, 9.0);
    }

    #[test]
    fn test_balanced_book_is_neutral() {
        let book = OrderBook {
            bids: vec![level(5.0)],
            asks: vec![level(5.0)],
        };
        let sentiment = sentiment_from_book(&book).unwrap();
        assert_eq!(sentiment.fear_greed_index, 50);
        assert_eq!(sentiment.social_sentiment, SocialSentiment::Neutral);
    }

    #[test]
    fn test_empty_book_is_an_error() {
        assert!(matches!(
            sentiment_from_book(&OrderBook::default()),
            Err(AppError::Sentiment(_))
        ));
    }
}
