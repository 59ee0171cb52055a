use crate::model::{ListingBatch, ScraperError, SearchOutcome};

/// Deal aggregator page provider. Yields the three parallel text arrays as
/// scraped, one batch per result page so each page can be gated on its own.
#[async_trait::async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self, url: &str, scroll_amount: u32) -> Result<Vec<ListingBatch>, ScraperError>;
}

/// Resale marketplace provider. Result order is the marketplace's own ranking.
#[async_trait::async_trait]
pub trait MarketplaceSource: Send + Sync {
    /// Loads the marketplace landing view; used to check the session is alive.
    async fn open_home(&self) -> Result<(), ScraperError>;

    async fn search(&self, query: &str) -> Result<SearchOutcome, ScraperError>;

    async fn close(&self) {}
}
