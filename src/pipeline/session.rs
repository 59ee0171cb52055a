// Marketplace session lifecycle with a bounded reconnection guard
use crate::config::RetryPolicy;
use crate::model::ScraperError;
use crate::scraper::{ListingSource, MarketplaceSource};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("marketplace home did not load after {attempts} attempt(s): {last}")]
    Exhausted { attempts: u32, last: String },
}

/// The providers one run owns exclusively. Opening and closing is up to the caller.
pub struct ScrapeSession {
    pub listing: Box<dyn ListingSource>,
    pub marketplace: Box<dyn MarketplaceSource>,
}

impl ScrapeSession {
    pub fn new(listing: Box<dyn ListingSource>, marketplace: Box<dyn MarketplaceSource>) -> Self {
        Self { listing, marketplace }
    }

    /// Loads the marketplace home view, retrying with backoff up to the policy's limit.
    pub async fn open(&self, retry: &RetryPolicy, wait: Duration) -> Result<(), SessionError> {
        let mut attempt = 1;
        loop {
            let last = match timeout(wait, self.marketplace.open_home()).await {
                Ok(Ok(())) => {
                    info!("✅ Marketplace session ready (attempt {})", attempt);
                    return Ok(());
                }
                Ok(Err(e)) => e.to_string(),
                Err(_) => ScraperError::Timeout.to_string(),
            };

            if attempt >= retry.max_attempts {
                return Err(SessionError::Exhausted { attempts: attempt, last });
            }

            let delay = backoff_delay(retry, attempt);
            let jitter = rand::rng().random_range(0..=delay.as_millis() as u64 / 4);
            let delay = delay + Duration::from_millis(jitter);
            warn!(
                "⏳ Marketplace home failed (attempt {}/{}): {}. Retrying in {:?}",
                attempt, retry.max_attempts, last, delay
            );
            sleep(delay).await;
            attempt += 1;
        }
    }

    pub async fn close(&self) {
        self.marketplace.close().await;
    }
}

/// `base * 2^(attempt - 1)`, capped at `max_delay_ms`.
pub fn backoff_delay(retry: &RetryPolicy, attempt: u32) -> Duration {
    let factor = 1u64.checked_shl(attempt.saturating_sub(1)).unwrap_or(u64::MAX);
    let millis = retry.base_delay_ms.saturating_mul(factor).min(retry.max_delay_ms);
    Duration::from_millis(millis)
}
