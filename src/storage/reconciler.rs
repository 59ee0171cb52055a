// Dedup merge into the persisted dataset and the manual review workflow
use super::sqlite::SqliteStorage;
use crate::model::{DedupKey, Product, StorageError};
use crate::operator::{is_stop, Operator, OperatorError};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OverrideError {
    #[error("no product named {0:?}")]
    NotFound(String),
    #[error("{0:?} is not flagged for pursuit")]
    NotPursued(String),
}

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    pub rows: Vec<Product>,
    /// Rows from the new batch whose key was not seen before.
    pub added: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub added: usize,
    pub pruned: usize,
    pub total: usize,
}

/// Which human flags to raise on a pursued row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideDecision {
    pub review_correct: bool,
    pub feasible: bool,
}

/// Appends `batch` after `existing` and keeps the first row per
/// (name, price, pursue) key, so persisted rows and their review flags win.
pub fn merge(existing: Vec<Product>, batch: Vec<Product>) -> MergeOutcome {
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut rows = Vec::with_capacity(existing.len() + batch.len());

    for product in existing {
        if seen.insert(product.dedup_key()) {
            rows.push(product);
        }
    }
    let before = rows.len();
    for product in batch {
        if seen.insert(product.dedup_key()) {
            rows.push(product);
        }
    }

    let added = rows.len() - before;
    MergeOutcome { rows, added }
}

/// Drops rows with an empty category or an unknown marketplace price.
pub fn prune(rows: Vec<Product>) -> (Vec<Product>, usize) {
    let before = rows.len();
    let kept: Vec<Product> = rows.into_iter().filter(Product::is_actionable).collect();
    let pruned = before - kept.len();
    (kept, pruned)
}

/// Indices of rows named `name` that may be overridden.
pub fn eligible_rows(rows: &[Product], name: &str) -> Result<Vec<usize>, OverrideError> {
    let named: Vec<usize> = rows
        .iter()
        .enumerate()
        .filter(|(_, p)| p.name == name)
        .map(|(i, _)| i)
        .collect();
    if named.is_empty() {
        return Err(OverrideError::NotFound(name.to_string()));
    }

    let pursued: Vec<usize> = named.into_iter().filter(|&i| rows[i].pursue).collect();
    if pursued.is_empty() {
        return Err(OverrideError::NotPursued(name.to_string()));
    }
    Ok(pursued)
}

/// Raises the chosen flags on one row. Rows without the pursue flag are refused.
pub fn apply_decision(row: &mut Product, decision: OverrideDecision) -> Result<(), OverrideError> {
    if !row.pursue {
        return Err(OverrideError::NotPursued(row.name.clone()));
    }
    if decision.review_correct {
        row.review_correct = true;
    }
    if decision.feasible {
        row.feasible = true;
    }
    Ok(())
}

/// Merges a batch into the stored dataset, prunes it and writes it back.
pub fn export(storage: &mut SqliteStorage, batch: Vec<Product>) -> Result<ExportSummary, StorageError> {
    let existing = storage.load_products()?;
    if existing.is_empty() {
        info!("No previous dataset found, starting a new one");
    }

    let merged = merge(existing, batch);
    info!("{} New Products Added", merged.added);

    let (rows, pruned) = prune(merged.rows);
    if pruned > 0 {
        info!("Pruned {} rows without a category or marketplace price", pruned);
    }

    storage.replace_products(&rows)?;
    Ok(ExportSummary {
        added: merged.added,
        pruned,
        total: rows.len(),
    })
}

/// Load, prune, persist.
pub fn prune_dataset(storage: &mut SqliteStorage) -> Result<usize, StorageError> {
    let (rows, pruned) = prune(storage.load_products()?);
    storage.replace_products(&rows)?;
    Ok(pruned)
}

/// Interactive review: the operator names products and raises the review
/// flags on their pursued rows. The dataset is saved when the session ends,
/// including when the input closes mid-row.
pub fn review_session(storage: &mut SqliteStorage, operator: &mut dyn Operator) -> Result<usize, ReviewError> {
    let mut rows = storage.load_products()?;
    let mut changed = 0;

    'session: loop {
        let name = match operator.ask("Enter product or N to stop: ") {
            Ok(answer) if is_stop(&answer) => break,
            Ok(answer) => answer,
            Err(OperatorError::Closed) => break,
            Err(e) => return Err(e.into()),
        };

        let indices = match eligible_rows(&rows, &name) {
            Ok(indices) => indices,
            Err(e) => {
                warn!("{}", e);
                continue;
            }
        };

        for i in indices {
            info!("{}", rows[i]);
            let mut decision = OverrideDecision::default();
            let mut closed = false;
            for (prompt, flag) in [
                ("Would you like to mark the match as correct?", &mut decision.review_correct),
                ("Would you like to mark it as feasible?", &mut decision.feasible),
            ] {
                match operator.confirm(prompt) {
                    Ok(answer) => *flag = answer,
                    Err(OperatorError::Closed) => {
                        closed = true;
                        break;
                    }
                    Err(e) => return Err(e.into()),
                }
            }

            if decision != OverrideDecision::default() {
                match apply_decision(&mut rows[i], decision) {
                    Ok(()) => {
                        changed += 1;
                        info!("Updated review flags for {}", name);
                    }
                    Err(e) => warn!("{}", e),
                }
            }
            if closed {
                break 'session;
            }
        }
    }

    storage.replace_products(&rows)?;
    info!("Review finished: {} row(s) updated", changed);
    Ok(changed)
}
