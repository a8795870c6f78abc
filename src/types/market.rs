use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, Result};

/// A single observation of the market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceSample {
    /// Timestamp (milliseconds since epoch).
    pub timestamp: i64,
    pub price: f64,
    /// Traded volume; 0 when the provider does not report it.
    #[serde(default)]
    pub volume: f64,
}

impl PriceSample {
    pub fn new(timestamp: i64, price: f64, volume: f64) -> Self {
        Self {
            timestamp,
            price,
            volume: if volume.is_finite() && volume > 0.0 { volume } else { 0.0 },
        }
    }
}

/// Append-only, chronologically ordered price history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    samples: Vec<PriceSample>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a series from provider output, validating every sample.
    pub fn from_samples(samples: Vec<PriceSample>) -> Result<Self> {
        let mut series = Self::new();
        for sample in samples {
            series.push(sample)?;
        }
        Ok(series)
    }

    /// Append a sample. Out-of-order or non-finite samples are rejected.
    pub fn push(&mut self, sample: PriceSample) -> Result<()> {
        if !sample.price.is_finite() {
            return Err(AppError::InvalidInput(format!(
                "non-finite price at {}",
                sample.timestamp
            )));
        }
        if let Some(last) = self.samples.last() {
            if sample.timestamp < last.timestamp {
                return Err(AppError::InvalidInput(format!(
                    "sample at {} precedes last sample at {}",
                    sample.timestamp, last.timestamp
                )));
            }
        }
        self.samples.push(PriceSample::new(sample.timestamp, sample.price, sample.volume));
        Ok(())
    }

    pub fn samples(&self) -> &[PriceSample] {
        &self.samples
    }

    pub fn prices(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.price).collect()
    }

    pub fn volumes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.volume).collect()
    }

    pub fn last(&self) -> Option<&PriceSample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Current price with its 24h change (percent).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    pub price: f64,
    pub change_24h: f64,
}

impl PriceQuote {
    /// Reject quotes a cycle cannot work with.
    pub fn validate(self) -> Result<Self> {
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(AppError::InvalidInput(format!("invalid price {}", self.price)));
        }
        if !self.change_24h.is_finite() {
            return Err(AppError::InvalidInput(format!(
                "invalid 24h change {}",
                self.change_24h
            )));
        }
        Ok(self)
    }
}

/// Crowd mood bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SocialSentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl SocialSentiment {
    /// Bucket a fear & greed reading.
    pub fn from_fear_greed(index: u8) -> Self {
        if index > 70 {
            Self::Positive
        } else if index < 30 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// Market sentiment reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sentiment {
    /// 0 = extreme fear, 100 = extreme greed. Out-of-range input is clamped.
    #[serde(deserialize_with = "clamped_fear_greed")]
    pub fear_greed_index: u8,
    pub social_sentiment: SocialSentiment,
    /// 0-10.
    pub trend_strength: f64,
}

impl Default for Sentiment {
    fn default() -> Self {
        Self {
            fear_greed_index: 50,
            social_sentiment: SocialSentiment::Neutral,
            trend_strength: 5.0,
        }
    }
}

impl Sentiment {
    pub const MAX_FEAR_GREED: u8 = 100;

    /// Index above 100 is clamped, trend strength is kept within 0-10.
    pub fn new(
        fear_greed_index: u8,
        social_sentiment: SocialSentiment,
        trend_strength: f64,
    ) -> Self {
        let trend_strength = if trend_strength.is_nan() {
            0.0
        } else {
            trend_strength.clamp(0.0, 10.0)
        };
        Self {
            fear_greed_index: fear_greed_index.min(Self::MAX_FEAR_GREED),
            social_sentiment,
            trend_strength,
        }
    }

    /// Derive a reading from the share of resting bid volume in the book.
    pub fn from_buy_ratio(buy_ratio: f64) -> Self {
        let fear_greed_index = (buy_ratio.clamp(0.0, 1.0) * 100.0).floor() as u8;
        Self::new(
            fear_greed_index,
            SocialSentiment::from_fear_greed(fear_greed_index),
            fear_greed_index as f64 / 10.0,
        )
    }

    pub fn is_greedy(&self) -> bool {
        self.fear_greed_index > 70
    }

    pub fn is_fearful(&self) -> bool {
        self.fear_greed_index < 30
    }
}

fn clamped_fear_greed<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(u8::deserialize(deserializer)?.min(Sentiment::MAX_FEAR_GREED))
}
