// HTML extraction for the deal aggregator and the marketplace search page

pub mod deal_parser;
pub mod market_parser;

pub use deal_parser::parse_listing_page;
pub use market_parser::parse_search_page;

use crate::model::ParserError;
use scraper::{ElementRef, Html, Selector};

fn selector(css: &str) -> Result<Selector, ParserError> {
    Selector::parse(css).map_err(|e| ParserError::Selector(format!("{}: {}", css, e)))
}

/// Whitespace-collapsed text of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" ")
}

fn select_texts(document: &Html, css: &str) -> Result<Vec<String>, ParserError> {
    let sel = selector(css)?;
    Ok(document.select(&sel).map(element_text).collect())
}
