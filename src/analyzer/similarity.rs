use crate::config::SimilarityMetric;
use rapidfuzz::distance::indel;
use strsim::normalized_levenshtein;

impl SimilarityMetric {
    /// Similarity ratio in `[0, 1]`; identical strings score 1.0.
    pub fn ratio(&self, a: &str, b: &str) -> f64 {
        match self {
            SimilarityMetric::Indel => indel_ratio(a, b),
            SimilarityMetric::Levenshtein => normalized_levenshtein(a, b),
        }
    }
}

/// `(|a| + |b| - indel distance) / (|a| + |b|)`, where the indel distance
/// only counts insertions and deletions. Two empty strings score 1.0.
pub fn indel_ratio(a: &str, b: &str) -> f64 {
    indel::normalized_similarity(a.chars(), b.chars())
}
