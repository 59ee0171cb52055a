// Core structs: RawListing, Product, MatchCandidate, ErrorRecord
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// One scraped deal row before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawListing {
    pub name: String,
    /// Holds both the current and the previous price tokens, e.g. `"$19.99 $39.99"`.
    pub price_text: String,
    pub site: String,
}

/// The parallel arrays a listing page yields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingBatch {
    pub names: Vec<String>,
    pub prices: Vec<String>,
    pub sites: Vec<String>,
}

/// Raw marketplace search results, rank order as returned by the marketplace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchResults {
    pub titles: Vec<String>,
    pub prices: Vec<String>,
    pub category_labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Results(SearchResults),
    ZeroResults,
}

/// One ranked marketplace result, consumed by the matcher.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    pub title: String,
    pub price: Decimal,
    /// 1-based rank position.
    pub rank: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    pub name: String,
    pub price: Decimal,
    pub previous_price: Decimal,
    pub site: String,
    /// Zero means "unknown", never "free".
    pub marketplace_price: Decimal,
    /// Empty means "unknown".
    pub category: String,
    pub margin: i64,
    pub pursue: bool,
    /// Human-only: was the automated match/price right.
    pub review_correct: bool,
    /// Human-only: would a person act on this deal.
    pub feasible: bool,
}

impl Product {
    pub fn new(name: String, price: Decimal, previous_price: Decimal, site: String) -> Self {
        Self {
            name,
            price,
            previous_price,
            site,
            marketplace_price: Decimal::ZERO,
            category: String::new(),
            margin: 0,
            pursue: false,
            review_correct: false,
            feasible: false,
        }
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            name: self.name.clone(),
            price: self.price.normalize(),
            pursue: self.pursue,
        }
    }

    /// Rows without a marketplace price or a category carry no decision.
    pub fn is_actionable(&self) -> bool {
        !self.category.is_empty() && !self.marketplace_price.is_zero()
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} (was {}) @ {} | market {} | {} | margin {}",
            self.name,
            self.price,
            self.previous_price,
            self.site,
            self.marketplace_price,
            if self.category.is_empty() { "-" } else { self.category.as_str() },
            self.margin
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub name: String,
    pub price: Decimal,
    pub pursue: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ListingFetch,
    Normalization,
    StructuralGate,
    Lookup,
    Matching,
    CategoryExtraction,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::ListingFetch => "listing-fetch",
            Phase::Normalization => "normalization",
            Phase::StructuralGate => "structural-gate",
            Phase::Lookup => "lookup",
            Phase::Matching => "matching",
            Phase::CategoryExtraction => "category-extraction",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub phase: Phase,
    pub message: String,
    /// Absent for batch-level faults.
    pub item: Option<String>,
}

#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("http error: {0}")]
    HttpError(String),
    #[error("timed out waiting for content")]
    Timeout,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Parse(#[from] ParserError),
}

impl From<reqwest::Error> for ScraperError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ScraperError::Timeout
        } else {
            ScraperError::HttpError(e.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("invalid selector: {0}")]
    Selector(String),
    #[error("missing field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}
