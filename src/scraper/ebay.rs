use super::fetcher::HttpFetcher;
use super::traits::MarketplaceSource;
use crate::config::MarketplaceConfig;
use crate::model::{ScraperError, SearchOutcome};
use crate::parser::parse_search_page;
use tracing::info;

pub struct EbaySource {
    fetcher: HttpFetcher,
    config: MarketplaceConfig,
}

impl EbaySource {
    pub fn new(fetcher: HttpFetcher, config: MarketplaceConfig) -> Self {
        Self { fetcher, config }
    }

    fn search_url(&self) -> String {
        format!("{}/sch/i.html", self.config.base_url.trim_end_matches('/'))
    }

    /// Query string for a search with the configured refinements applied.
    pub fn search_params(&self, query: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("_nkw", query.to_string())];
        if self.config.buy_it_now {
            params.push(("LH_BIN", "1".into()));
        }
        if self.config.free_shipping {
            params.push(("LH_FS", "1".into()));
        }
        if self.config.new_only {
            params.push(("LH_ItemCondition", "1000".into()));
        }
        params
    }
}

#[async_trait::async_trait]
impl MarketplaceSource for EbaySource {
    async fn open_home(&self) -> Result<(), ScraperError> {
        self.fetcher.get_html(&self.config.base_url, &[]).await?;
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<SearchOutcome, ScraperError> {
        let html = self.fetcher.get_html(&self.search_url(), &self.search_params(query)).await?;
        Ok(parse_search_page(&html)?)
    }

    async fn close(&self) {
        info!("Marketplace session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn source(config: MarketplaceConfig) -> EbaySource {
        EbaySource::new(HttpFetcher::new(Duration::from_secs(1)).unwrap(), config)
    }

    #[test]
    fn search_applies_refinements() {
        let ebay = source(MarketplaceConfig::default());
        let params = ebay.search_params("Widget Pro");
        assert_eq!(params[0], ("_nkw", "Widget Pro".to_string()));
        assert!(params.contains(&("LH_BIN", "1".to_string())));
        assert!(params.contains(&("LH_FS", "1".to_string())));
        assert!(params.contains(&("LH_ItemCondition", "1000".to_string())));
        assert_eq!(ebay.search_url(), "https://www.ebay.com/sch/i.html");
    }

    #[test]
    fn disabled_refinements_are_omitted() {
        let ebay = source(MarketplaceConfig {
            base_url: "http://localhost:8080/".into(),
            new_only: false,
            buy_it_now: false,
            free_shipping: false,
        });
        assert_eq!(ebay.search_params("x").len(), 1);
        assert_eq!(ebay.search_url(), "http://localhost:8080/sch/i.html");
    }
}
