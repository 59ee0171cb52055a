// Structural checks on a scraped listing batch before any matching
use crate::model::{ListingBatch, RawListing};
use crate::operator::{is_stop, Operator, OperatorError};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum GateError {
    #[error("operator stopped repair with {names} names and {prices} prices")]
    Aborted { names: usize, prices: usize },
    #[error("operator rejected the alignment spot-check")]
    SpotCheckRejected,
    #[error("batch has no aligned rows")]
    EmptyBatch,
    #[error("array lengths differ: {names} names, {prices} prices, {sites} sites")]
    LengthMismatch { names: usize, prices: usize, sites: usize },
    #[error(transparent)]
    Operator(#[from] OperatorError),
}

pub struct ConsistencyGate {
    /// Expected `names.len() - prices.len()` on a front page.
    name_price_offset: usize,
    spot_check: bool,
}

impl ConsistencyGate {
    pub fn new(name_price_offset: usize, spot_check: bool) -> Self {
        Self {
            name_price_offset,
            spot_check,
        }
    }

    fn offset_holds(&self, batch: &ListingBatch) -> bool {
        batch.names.len() as isize - batch.prices.len() as isize == self.name_price_offset as isize
    }

    /// Front-page check: the operator removes stray names until the offset
    /// holds, then confirms the last aligned row.
    pub fn check_interactive(
        &self,
        mut batch: ListingBatch,
        operator: &mut dyn Operator,
    ) -> Result<Vec<RawListing>, GateError> {
        info!(
            "Names: {} | Prices: {} | Sites: {}",
            batch.names.len(),
            batch.prices.len(),
            batch.sites.len()
        );

        if !self.offset_holds(&batch) {
            warn!("There appear to be products without a price or a misaligned scrape");
        }
        while !self.offset_holds(&batch) {
            let answer = operator.ask("Enter a product to remove or N to stop: ")?;
            if is_stop(&answer) {
                return Err(GateError::Aborted {
                    names: batch.names.len(),
                    prices: batch.prices.len(),
                });
            }
            match batch.names.iter().position(|n| *n == answer) {
                Some(index) => {
                    batch.names.remove(index);
                    if index < batch.sites.len() {
                        batch.sites.remove(index);
                    }
                    info!("Removed '{}'", answer);
                }
                None => warn!("An incorrect product was entered: '{}'", answer),
            }
        }

        let boundary = aligned_len(&batch);
        if boundary == 0 {
            return Err(GateError::EmptyBatch);
        }
        if self.spot_check {
            let last = boundary - 1;
            let prompt = format!(
                "Is this correct?\n{}\n{}\n{}\n",
                batch.names[last], batch.prices[last], batch.sites[last]
            );
            if !operator.confirm(&prompt)? {
                return Err(GateError::SpotCheckRejected);
            }
        }

        Ok(zip_rows(batch))
    }

    /// Category-page check: any length disagreement skips the page.
    pub fn check_extended(&self, batch: ListingBatch) -> Result<Vec<RawListing>, GateError> {
        let (names, prices, sites) = (batch.names.len(), batch.prices.len(), batch.sites.len());
        if names != prices || prices != sites {
            return Err(GateError::LengthMismatch { names, prices, sites });
        }
        Ok(zip_rows(batch))
    }
}

fn aligned_len(batch: &ListingBatch) -> usize {
    batch.names.len().min(batch.prices.len()).min(batch.sites.len())
}

fn zip_rows(batch: ListingBatch) -> Vec<RawListing> {
    batch
        .names
        .into_iter()
        .zip(batch.prices)
        .zip(batch.sites)
        .map(|((name, price_text), site)| RawListing { name, price_text, site })
        .collect()
}
