use crate::model::ScraperError;

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Shared HTTP client for every provider.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) ResellSniper/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }

    pub async fn get_html(&self, url: &str, query: &[(&str, String)]) -> Result<String, ScraperError> {
        debug!("GET {} {:?}", url, query);
        let response = self.client.get(url).query(query).send().await?;

        if !response.status().is_success() {
            return Err(ScraperError::InvalidResponse(format!("{} returned {}", url, response.status())));
        }

        Ok(response.text().await?)
    }
}
