// Deal aggregator listing page parsing
use super::select_texts;
use crate::model::{ListingBatch, ParserError};
use scraper::Html;

const NAME_SELECTOR: &str = ".title.limit-height.limit-height-large-2.limit-height-small-2";
const PRICE_SELECTOR: &str = ".callout.limit-height.limit-height-large-1.limit-height-small-1";
const SITE_SELECTOR: &str = ".key-attribute.limit-height.limit-height-large-1.limit-height-small-1";

/// Extracts the name, price and site arrays independently. They are *not*
/// aligned here; promo tiles carry a title but no price, which the gate checks.
pub fn parse_listing_page(html: &str) -> Result<ListingBatch, ParserError> {
    let document = Html::parse_document(html);

    let batch = ListingBatch {
        names: select_texts(&document, NAME_SELECTOR)?,
        prices: select_texts(&document, PRICE_SELECTOR)?,
        sites: select_texts(&document, SITE_SELECTOR)?,
    };

    if batch.names.is_empty() {
        return Err(ParserError::MissingField("deal titles".into()));
    }
    if batch.prices.is_empty() {
        return Err(ParserError::MissingField("deal prices".into()));
    }

    Ok(batch)
}
