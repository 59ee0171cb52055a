// Marketplace lookup phase: search, category, match, evaluate per item
use super::collector::{ErrorLedger, ItemFailure};
use crate::analyzer::{CandidateMatcher, MatchOutcome, ProfitabilityEvaluator};
use crate::config::{CategoryFailurePolicy, EnginePolicy};
use crate::model::{Product, SearchOutcome};
use crate::scraper::MarketplaceSource;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

pub struct MarketplaceLookup {
    matcher: CandidateMatcher,
    evaluator: ProfitabilityEvaluator,
    category_failure: CategoryFailurePolicy,
    wait: Duration,
}

impl MarketplaceLookup {
    pub fn new(policy: &EnginePolicy, currency_symbol: &str) -> Self {
        Self {
            matcher: CandidateMatcher::new(policy, currency_symbol),
            evaluator: ProfitabilityEvaluator::new(policy),
            category_failure: policy.category_failure,
            wait: policy.wait_timeout(),
        }
    }

    /// Looks up every product in order. Failed items are left out of the
    /// returned batch and recorded in the ledger; the input is never mutated.
    pub async fn run_batch(
        &self,
        marketplace: &dyn MarketplaceSource,
        products: &[Product],
        ledger: &mut ErrorLedger,
    ) -> Vec<Product> {
        let total = products.len();
        let mut kept = Vec::with_capacity(total);

        for (i, product) in products.iter().enumerate() {
            info!("{}/{} {}", i + 1, total, product.name);
            let result = self.lookup_item(marketplace, product, ledger).await;
            if let Some(done) = ledger.collect(&product.name, result) {
                kept.push(done);
            }
        }

        info!("Lookup finished: {} of {} items kept", kept.len(), total);
        kept
    }

    async fn lookup_item(
        &self,
        marketplace: &dyn MarketplaceSource,
        product: &Product,
        ledger: &mut ErrorLedger,
    ) -> Result<Product, ItemFailure> {
        let outcome = timeout(self.wait, marketplace.search(&product.name))
            .await
            .map_err(|_| ItemFailure::Timeout(self.wait))??;

        let results = match outcome {
            SearchOutcome::ZeroResults => return Err(ItemFailure::NoResults),
            SearchOutcome::Results(results) => results,
        };

        let mut product = product.clone();
        match extract_category(&results.category_labels) {
            Some(category) => product.category = category,
            None => {
                let failure = ItemFailure::Category(format!("{} label(s) found", results.category_labels.len()));
                match self.category_failure {
                    CategoryFailurePolicy::Drop => return Err(failure),
                    CategoryFailurePolicy::KeepEmpty => ledger.record_failure(&product.name, &failure),
                }
            }
        }

        let matched = self.matcher.match_results(&product.name, &results)?;
        if let MatchOutcome::Matched { rank, similarity, .. } = &matched {
            debug!("'{}' matched rank {} (sim {:.2})", product.name, rank, similarity);
        }
        product.marketplace_price = matched.price();
        self.evaluator.evaluate(&mut product);

        Ok(product)
    }
}

/// The first label is the catch-all parent; the second names the item's own
/// category. Only the first line of that label counts.
pub fn extract_category(labels: &[String]) -> Option<String> {
    labels
        .get(1)
        .and_then(|label| label.lines().next())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
