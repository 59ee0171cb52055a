use crate::config::{EnginePolicy, SimilarityMetric};
use crate::model::{MatchCandidate, SearchResults};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("marketplace returned no listings to compare")]
    NoCandidates,
    #[error("unparsable price {text:?} at rank {rank}")]
    UnparsablePrice { rank: usize, text: String },
}

/// Result of picking a marketplace price for one product.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched {
        price: Decimal,
        rank: usize,
        similarity: f64,
    },
    /// No candidate cleared its threshold.
    Unknown,
}

impl MatchOutcome {
    /// Price to store on the product; unknown maps to zero.
    pub fn price(&self) -> Decimal {
        match self {
            MatchOutcome::Matched { price, .. } => *price,
            MatchOutcome::Unknown => Decimal::ZERO,
        }
    }
}

/// Selects the cheapest plausible match among the top ranked results.
///
/// The rank-1 result is accepted on a lenient similarity bar and seeds the
/// running minimum. Ranks 2..=`max_ranked` must clear the stricter bar *and*
/// undercut the running minimum.
pub struct CandidateMatcher {
    rank1_threshold: f64,
    ranked_threshold: f64,
    max_ranked: usize,
    metric: SimilarityMetric,
    currency_symbol: String,
}

impl CandidateMatcher {
    pub fn new(policy: &EnginePolicy, currency_symbol: impl Into<String>) -> Self {
        Self {
            rank1_threshold: policy.rank1_threshold,
            ranked_threshold: policy.ranked_threshold,
            max_ranked: policy.max_ranked_results,
            metric: policy.similarity,
            currency_symbol: currency_symbol.into(),
        }
    }

    /// Pairs titles with prices for the inspected ranks only; deeper results are never parsed.
    pub fn candidates(&self, results: &SearchResults) -> Result<Vec<MatchCandidate>, MatchError> {
        let candidates = results
            .titles
            .iter()
            .zip(&results.prices)
            .take(self.max_ranked)
            .enumerate()
            .map(|(i, (title, price_text))| {
                let rank = i + 1;
                self.parse_listed_price(price_text)
                    .map(|price| MatchCandidate {
                        title: title.clone(),
                        price,
                        rank,
                    })
                    .ok_or_else(|| MatchError::UnparsablePrice {
                        rank,
                        text: price_text.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if candidates.is_empty() {
            return Err(MatchError::NoCandidates);
        }
        Ok(candidates)
    }

    /// Marketplace prices may be ranges (`"$20.00 to $30.00"`); the first amount counts.
    fn parse_listed_price(&self, text: &str) -> Option<Decimal> {
        let token = text.split_whitespace().next()?;
        let cleaned = token.replace(self.currency_symbol.as_str(), "").replace(',', "");
        Decimal::from_str(&cleaned).ok()
    }

    pub fn best_match(&self, name: &str, candidates: &[MatchCandidate]) -> MatchOutcome {
        let mut best = MatchOutcome::Unknown;

        for candidate in candidates.iter().take(self.max_ranked) {
            let similarity = self.metric.ratio(name, &candidate.title);
            let accepted = if candidate.rank == 1 {
                similarity > self.rank1_threshold
            } else {
                similarity > self.ranked_threshold
                    && match best {
                        MatchOutcome::Matched { price, .. } => candidate.price < price,
                        MatchOutcome::Unknown => true,
                    }
            };
            debug!(
                "rank {} '{}' {} sim={:.3} accepted={}",
                candidate.rank, candidate.title, candidate.price, similarity, accepted
            );
            if accepted {
                best = MatchOutcome::Matched {
                    price: candidate.price,
                    rank: candidate.rank,
                    similarity,
                };
            }
        }

        best
    }

    pub fn match_results(&self, name: &str, results: &SearchResults) -> Result<MatchOutcome, MatchError> {
        let candidates = self.candidates(results)?;
        Ok(self.best_match(name, &candidates))
    }
}
