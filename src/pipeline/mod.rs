// Batch pipeline: listings -> gate -> normalizer -> marketplace lookup
pub mod collector;
pub mod lookup;
pub mod report;
pub mod session;

pub use collector::ErrorLedger;
pub use lookup::MarketplaceLookup;
pub use session::ScrapeSession;

use crate::config::{AppConfig, ListingMode};
use crate::gate::ConsistencyGate;
use crate::model::{Phase, Product};
use crate::normalizer::{ListingNormalizer, NormalizeError};
use crate::operator::Operator;
use tracing::{debug, info, warn};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    pub sources: usize,
    pub sources_aborted: usize,
    /// Aligned rows that passed the gate.
    pub rows: usize,
    /// Rows that were not two-price deals.
    pub rejected: usize,
    pub normalized: usize,
    pub kept: usize,
}

pub struct RunReport {
    pub products: Vec<Product>,
    pub ledger: ErrorLedger,
    pub stats: RunStats,
}

/// Scrapes every configured listing page and returns the normalized products.
/// A page that fails to load or fails the gate is skipped; the others go on.
pub async fn collect_listings(
    config: &AppConfig,
    session: &ScrapeSession,
    operator: &mut dyn Operator,
    ledger: &mut ErrorLedger,
    stats: &mut RunStats,
) -> Vec<Product> {
    let listing = &config.listing;
    let gate = ConsistencyGate::new(listing.name_price_offset, listing.spot_check);
    let normalizer = ListingNormalizer::new(listing.currency_symbol.as_str());
    let mut products = Vec::new();

    for url in listing.urls() {
        stats.sources += 1;

        let pages = match session.listing.fetch(&url, listing.scroll()).await {
            Ok(pages) => pages,
            Err(e) => {
                stats.sources_aborted += 1;
                ledger.record(Phase::ListingFetch, format!("{}: {}", url, e), None);
                continue;
            }
        };

        // Every page carries its own trailing promo tiles, so each one is gated alone.
        let page_count = pages.len();
        let mut rows = Vec::new();
        let mut failed_pages = 0;
        for (page, batch) in pages.into_iter().enumerate() {
            let gated = match listing.mode {
                ListingMode::Single => gate.check_interactive(batch, operator),
                ListingMode::Extended => gate.check_extended(batch),
            };
            match gated {
                Ok(page_rows) => rows.extend(page_rows),
                Err(e) => {
                    failed_pages += 1;
                    ledger.record(
                        Phase::StructuralGate,
                        format!("{} (page {} of {}): {}", url, page + 1, page_count, e),
                        None,
                    );
                }
            }
        }
        if failed_pages == page_count {
            stats.sources_aborted += 1;
            continue;
        }
        stats.rows += rows.len();

        for raw in &rows {
            match normalizer.normalize(raw) {
                Ok(product) => products.push(product),
                Err(NormalizeError::NotADeal(text)) => {
                    stats.rejected += 1;
                    debug!("Skipping '{}': price field {:?}", raw.name, text);
                }
                Err(e) => ledger.record(Phase::Normalization, e.to_string(), Some(raw.name.as_str())),
            }
        }
    }

    stats.normalized = products.len();
    info!(
        "Collected {} products from {} source(s) ({} aborted, {} rows not deals)",
        products.len(),
        stats.sources,
        stats.sources_aborted,
        stats.rejected
    );
    products
}

/// Runs the scrape and lookup phases. Nothing is raised to the caller;
/// every failure ends up in the returned ledger.
pub async fn run(config: &AppConfig, session: &ScrapeSession, operator: &mut dyn Operator) -> RunReport {
    let mut ledger = ErrorLedger::default();
    let mut stats = RunStats::default();

    let listed = collect_listings(config, session, operator, &mut ledger, &mut stats).await;

    let products = if listed.is_empty() {
        warn!("No products to look up");
        Vec::new()
    } else {
        let policy = &config.policy;
        match session.open(&policy.session_retry, policy.wait_timeout()).await {
            Ok(()) => {
                MarketplaceLookup::new(policy, &config.listing.currency_symbol)
                    .run_batch(session.marketplace.as_ref(), &listed, &mut ledger)
                    .await
            }
            Err(e) => {
                ledger.record(Phase::Lookup, e.to_string(), None);
                Vec::new()
            }
        }
    };
    stats.kept = products.len();

    report::show_results(&products);
    info!("There were {} errors during this run", ledger.len());

    RunReport { products, ledger, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ListingConfig;
    use crate::model::{ListingBatch, ScraperError, SearchOutcome, SearchResults};
    use crate::operator::ScriptedOperator;
    use crate::scraper::{ListingSource, MarketplaceSource};
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct FakeListings {
        pages: HashMap<String, Vec<ListingBatch>>,
    }

    #[async_trait::async_trait]
    impl ListingSource for FakeListings {
        async fn fetch(&self, url: &str, _scroll: u32) -> Result<Vec<ListingBatch>, ScraperError> {
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| ScraperError::InvalidResponse(format!("{} returned 503", url)))
        }
    }

    struct EchoMarketplace {
        home_up: bool,
    }

    #[async_trait::async_trait]
    impl MarketplaceSource for EchoMarketplace {
        async fn open_home(&self) -> Result<(), ScraperError> {
            if self.home_up {
                Ok(())
            } else {
                Err(ScraperError::HttpError("invalid session id".into()))
            }
        }

        // Lists the query itself at a fixed resale price of $200.
        async fn search(&self, query: &str) -> Result<SearchOutcome, ScraperError> {
            if query.starts_with("Unknown") {
                return Ok(SearchOutcome::ZeroResults);
            }
            Ok(SearchOutcome::Results(SearchResults {
                titles: vec![query.to_string()],
                prices: vec!["$200.00".into()],
                category_labels: vec!["All".into(), "Electronics".into()],
            }))
        }
    }

    fn page(rows: &[(&str, &str, &str)], promo_rows: usize) -> ListingBatch {
        let mut batch = ListingBatch::default();
        for (name, price, site) in rows {
            batch.names.push(name.to_string());
            batch.prices.push(price.to_string());
            batch.sites.push(site.to_string());
        }
        for i in 0..promo_rows {
            batch.names.push(format!("Promo {i}"));
            batch.sites.push("dealnews".into());
        }
        batch
    }

    fn config(mode: ListingMode, urls: &[&str]) -> AppConfig {
        let mut config = AppConfig::default();
        config.listing = ListingConfig {
            mode,
            home_url: urls[0].to_string(),
            category_urls: urls.iter().map(|u| u.to_string()).collect(),
            spot_check: false,
            ..ListingConfig::default()
        };
        config.policy.session_retry.base_delay_ms = 1;
        config.policy.session_retry.max_delay_ms = 2;
        config
    }

    fn session(pages: Vec<(&str, ListingBatch)>, home_up: bool) -> ScrapeSession {
        paged_session(pages.into_iter().map(|(u, b)| (u, vec![b])).collect(), home_up)
    }

    fn paged_session(pages: Vec<(&str, Vec<ListingBatch>)>, home_up: bool) -> ScrapeSession {
        ScrapeSession::new(
            Box::new(FakeListings {
                pages: pages.into_iter().map(|(u, b)| (u.to_string(), b)).collect(),
            }),
            Box::new(EchoMarketplace { home_up }),
        )
    }

    #[tokio::test]
    async fn single_page_run_end_to_end() {
        let rows = [
            ("Widget Pro", "$100 $150", "Amazon · 1 hr ago"),
            ("Gift card", "$25", "Target"),
            ("Bad Price", "$1O $20", "Walmart"),
            ("Unknown Gizmo", "$10 $20", "Woot"),
            ("Speaker", "$160 $199", "Best Buy"),
        ];
        let session = session(vec![("home", page(&rows, 6))], true);
        let mut op = ScriptedOperator::new(&[]);
        let report = run(&config(ListingMode::Single, &["home"]), &session, &mut op).await;

        assert_eq!(report.stats.rows, 5);
        assert_eq!(report.stats.rejected, 1);
        assert_eq!(report.stats.normalized, 3);
        assert_eq!(report.stats.kept, 2);
        assert_eq!(report.ledger.count(Phase::Normalization), 1);
        assert_eq!(report.ledger.count(Phase::Lookup), 1);

        let widget = &report.products[0];
        assert_eq!(widget.site, "Amazon");
        assert_eq!(widget.marketplace_price, dec!(200));
        assert_eq!(widget.category, "Electronics");
        assert_eq!(widget.margin, 74);
        assert!(widget.pursue);
        assert!(!report.products[1].pursue);
    }

    #[tokio::test]
    async fn extended_mode_skips_misaligned_and_missing_pages() {
        let good = page(&[("Widget Pro", "$100 $150", "Amazon")], 0);
        let mut misaligned = good.clone();
        misaligned.names.push("Orphan".into());
        let session = session(vec![("c1", good), ("c2", misaligned)], true);
        let mut op = ScriptedOperator::new(&[]);

        let report = run(&config(ListingMode::Extended, &["c1", "c2", "c3"]), &session, &mut op).await;

        assert!(op.prompts.is_empty());
        assert_eq!(report.stats.sources, 3);
        assert_eq!(report.stats.sources_aborted, 2);
        assert_eq!(report.ledger.count(Phase::StructuralGate), 1);
        assert_eq!(report.ledger.count(Phase::ListingFetch), 1);
        assert_eq!(report.products.len(), 1);
    }

    #[tokio::test]
    async fn aborted_gate_stops_only_that_source() {
        let rows = [("Widget Pro", "$100 $150", "Amazon")];
        let session = session(vec![("home", page(&rows, 3))], true);
        let mut op = ScriptedOperator::new(&["N"]);

        let report = run(&config(ListingMode::Single, &["home"]), &session, &mut op).await;

        assert!(report.products.is_empty());
        assert_eq!(report.stats.sources_aborted, 1);
        assert_eq!(report.ledger.count(Phase::StructuralGate), 1);
    }

    #[tokio::test]
    async fn dead_marketplace_session_is_a_single_batch_error() {
        let rows = [("Widget Pro", "$100 $150", "Amazon"), ("Speaker", "$160 $199", "Best Buy")];
        let session = session(vec![("home", page(&rows, 6))], false);
        let mut op = ScriptedOperator::new(&[]);

        let report = run(&config(ListingMode::Single, &["home"]), &session, &mut op).await;

        assert!(report.products.is_empty());
        assert_eq!(report.ledger.len(), 1);
        assert!(report.ledger.records()[0].item.is_none());
        assert_eq!(report.ledger.records()[0].phase, Phase::Lookup);
    }

    #[tokio::test]
    async fn scrolled_single_page_gates_each_page_with_its_own_promos() {
        let first = page(&[("Widget Pro", "$100 $150", "Amazon"), ("Speaker", "$160 $199", "Best Buy")], 6);
        let second = page(&[("Drone", "$10 $20", "Woot"), ("Lamp", "$30 $45", "Target")], 6);
        let session = paged_session(vec![("home", vec![first, second])], true);
        let mut op = ScriptedOperator::new(&[]);
        let mut config = config(ListingMode::Single, &["home"]);
        config.listing.scroll_amount = Some(6000);

        let report = run(&config, &session, &mut op).await;

        assert!(op.prompts.is_empty());
        assert_eq!(report.stats.rows, 4);
        assert_eq!(report.stats.sources_aborted, 0);
        assert!(report.ledger.is_empty());
        let names: Vec<&str> = report.products.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Widget Pro", "Speaker", "Drone", "Lamp"]);
        assert!(report.products.iter().all(|p| !p.name.starts_with("Promo")));
        assert_eq!(report.products[2].price, dec!(10));
    }

    #[tokio::test]
    async fn failed_page_gate_keeps_the_other_pages() {
        let good = page(&[("Widget Pro", "$100 $150", "Amazon")], 6);
        let bad = page(&[("Drone", "$10 $20", "Woot")], 3);
        let session = paged_session(vec![("home", vec![good, bad])], true);
        let mut op = ScriptedOperator::new(&["N"]);

        let report = run(&config(ListingMode::Single, &["home"]), &session, &mut op).await;

        assert_eq!(report.stats.sources_aborted, 0);
        assert_eq!(report.ledger.count(Phase::StructuralGate), 1);
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].name, "Widget Pro");
    }
}
