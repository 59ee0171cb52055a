// Per-item failure isolation and the session error ledger
use crate::analyzer::MatchError;
use crate::model::{ErrorRecord, Phase, ScraperError};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Why a single item left the working batch.
#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error("no marketplace results")]
    NoResults,
    #[error("timed out after {0:?} waiting for results")]
    Timeout(Duration),
    #[error("marketplace error: {0}")]
    Source(#[from] ScraperError),
    #[error("category unavailable: {0}")]
    Category(String),
    #[error(transparent)]
    Match(#[from] MatchError),
}

impl ItemFailure {
    pub fn phase(&self) -> Phase {
        match self {
            ItemFailure::NoResults | ItemFailure::Timeout(_) | ItemFailure::Source(_) => Phase::Lookup,
            ItemFailure::Category(_) => Phase::CategoryExtraction,
            ItemFailure::Match(_) => Phase::Matching,
        }
    }
}

/// Append-only record of everything that went wrong during one run.
#[derive(Debug, Default)]
pub struct ErrorLedger {
    records: Vec<ErrorRecord>,
}

impl ErrorLedger {
    pub fn record(&mut self, phase: Phase, message: impl Into<String>, item: Option<&str>) {
        let record = ErrorRecord {
            phase,
            message: message.into(),
            item: item.map(str::to_string),
        };
        match &record.item {
            Some(item) => warn!("[{}] {}: {}", record.phase, item, record.message),
            None => warn!("[{}] {}", record.phase, record.message),
        }
        self.records.push(record);
    }

    pub fn record_failure(&mut self, item: &str, failure: &ItemFailure) {
        self.record(failure.phase(), failure.to_string(), Some(item));
    }

    /// Unwraps a per-item result, logging the failure instead of propagating it.
    pub fn collect<T>(&mut self, item: &str, result: Result<T, ItemFailure>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(failure) => {
                self.record_failure(item, &failure);
                None
            }
        }
    }

    pub fn records(&self) -> &[ErrorRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[cfg(test)]
    pub fn count(&self, phase: Phase) -> usize {
        self.records.iter().filter(|r| r.phase == phase).count()
    }
}
