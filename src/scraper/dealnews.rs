use super::fetcher::HttpFetcher;
use super::traits::ListingSource;
use crate::model::{ListingBatch, ScraperError};
use crate::parser::parse_listing_page;
use tracing::{debug, info};

/// Scroll units that reveal roughly one more page of deals.
const SCROLL_PER_PAGE: u32 = 2500;
const DEALS_PER_PAGE: u32 = 20;

pub struct DealNewsSource {
    fetcher: HttpFetcher,
}

impl DealNewsSource {
    pub fn new(fetcher: HttpFetcher) -> Self {
        Self { fetcher }
    }

    /// Number of result pages a scroll depth stands for; always at least one.
    pub fn pages_for_scroll(scroll_amount: u32) -> u32 {
        1 + scroll_amount / SCROLL_PER_PAGE
    }
}

#[async_trait::async_trait]
impl ListingSource for DealNewsSource {
    async fn fetch(&self, url: &str, scroll_amount: u32) -> Result<Vec<ListingBatch>, ScraperError> {
        let pages = Self::pages_for_scroll(scroll_amount);
        info!("Fetching {} ({} page(s))", url, pages);

        let mut batches = Vec::with_capacity(pages as usize);
        for page in 0..pages {
            let query = if page == 0 {
                Vec::new()
            } else {
                vec![("start", (page * DEALS_PER_PAGE).to_string())]
            };
            let html = self.fetcher.get_html(url, &query).await?;
            let page_batch = parse_listing_page(&html)?;
            debug!(
                "page {}: {} names, {} prices, {} sites",
                page,
                page_batch.names.len(),
                page_batch.prices.len(),
                page_batch.sites.len()
            );
            batches.push(page_batch);
        }

        Ok(batches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_depth_maps_to_pages() {
        assert_eq!(DealNewsSource::pages_for_scroll(0), 1);
        assert_eq!(DealNewsSource::pages_for_scroll(2499), 1);
        assert_eq!(DealNewsSource::pages_for_scroll(5000), 3);
    }
}
