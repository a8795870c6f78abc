use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

use crate::config::CycleConfig;
use crate::error::{AppError, Result};

/// Bounded retry with a fixed delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn from_config(config: &CycleConfig) -> Self {
        Self::new(config.fetch_max_attempts, config.fetch_retry_delay)
    }

    /// Run `operation` until it yields a value accepted by `validate`.
    ///
    /// Both a failed call and a rejected value count as one attempt. After
    /// the last attempt the most recent failure is wrapped in
    /// [`AppError::UpstreamFetch`].
    pub async fn run<T, F, Fut, V>(&self, label: &str, mut operation: F, validate: V) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
        V: Fn(&T) -> Result<()>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.max_attempts {
            let outcome = match operation().await {
                Ok(value) => validate(&value).map(|_| value),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        "Fetching {} failed (attempt {} of {}): {}",
                        label, attempt, self.max_attempts, e
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < self.max_attempts {
                sleep(self.delay).await;
            }
        }

        Err(AppError::UpstreamFetch {
            what: label.to_string(),
            attempts: self.max_attempts,
            message: last_error,
        })
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CycleConfig::default())
    }
}
