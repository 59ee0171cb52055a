// Analyzer module: matching and decision logic for marketplace lookups.

pub mod matcher;
pub mod profitability;
pub mod similarity;

// Re-export the main entry points for ease of use.
pub use matcher::{CandidateMatcher, MatchError, MatchOutcome};
pub use profitability::ProfitabilityEvaluator;
