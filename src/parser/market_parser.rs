// Marketplace search result page parsing
use super::{select_texts, selector};
use crate::model::{ParserError, SearchOutcome, SearchResults};
use scraper::Html;

const NO_RESULTS_SELECTOR: &str = ".srp-save-null-search__heading";
const TITLE_SELECTOR: &str = ".s-item__title";
const PRICE_SELECTOR: &str = ".s-item__price";
const CATEGORY_SELECTOR: &str = ".srp-refine__category__item";

/// Hidden template card the marketplace renders ahead of the real results.
const PLACEHOLDER_TITLE: &str = "Shop on eBay";
const NEW_LISTING_BADGE: &str = "New Listing ";

pub fn parse_search_page(html: &str) -> Result<SearchOutcome, ParserError> {
    let document = Html::parse_document(html);

    if document.select(&selector(NO_RESULTS_SELECTOR)?).next().is_some() {
        return Ok(SearchOutcome::ZeroResults);
    }

    let mut titles: Vec<String> = select_texts(&document, TITLE_SELECTOR)?
        .into_iter()
        .map(|t| t.strip_prefix(NEW_LISTING_BADGE).map(str::trim).unwrap_or(t.as_str()).to_string())
        .collect();
    let mut prices = select_texts(&document, PRICE_SELECTOR)?;

    // The placeholder card does not always carry a price node.
    if titles.first().is_some_and(|t| t.eq_ignore_ascii_case(PLACEHOLDER_TITLE)) {
        titles.remove(0);
        if prices.len() > titles.len() {
            prices.remove(0);
        }
    }

    // Category labels keep one text node per line; the label name is the first line.
    let category_sel = selector(CATEGORY_SELECTOR)?;
    let category_labels = document
        .select(&category_sel)
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .collect();

    if titles.is_empty() || prices.is_empty() {
        return Err(ParserError::MissingField("search result listings".into()));
    }

    Ok(SearchOutcome::Results(SearchResults {
        titles,
        prices,
        category_labels,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <ul class="srp-refine__category__list">
            <li class="srp-refine__category__item"><span>All</span></li>
            <li class="srp-refine__category__item"><a><span>Video Game Consoles</span></a><span>(1,204)</span></li>
          </ul>
          <ul>
            <li class="s-item"><div class="s-item__title">Shop on eBay</div><span class="s-item__price">$20.00</span></li>
            <li class="s-item"><div class="s-item__title"><span>New Listing</span>Nintendo Switch OLED</div>
                <span class="s-item__price">$289.99</span></li>
            <li class="s-item"><div class="s-item__title">Nintendo Switch OLED White</div>
                <span class="s-item__price">$250.00 to $310.00</span></li>
          </ul>
        </body></html>"#;

    #[test]
    fn extracts_ranked_results_without_placeholder() {
        let SearchOutcome::Results(results) = parse_search_page(PAGE).unwrap() else {
            panic!("expected results");
        };
        assert_eq!(results.titles, vec!["Nintendo Switch OLED", "Nintendo Switch OLED White"]);
        assert_eq!(results.prices, vec!["$289.99", "$250.00 to $310.00"]);
        assert_eq!(results.category_labels, vec!["All", "Video Game Consoles\n(1,204)"]);
    }

    #[test]
    fn placeholder_without_price_keeps_rank_one_price() {
        let html = r#"<html><body><ul>
            <li class="s-item"><div class="s-item__title">Shop on eBay</div></li>
            <li class="s-item"><div class="s-item__title">Switch OLED</div><span class="s-item__price">$289.99</span></li>
            <li class="s-item"><div class="s-item__title">Switch Lite</div><span class="s-item__price">$150.00</span></li>
            </ul></body></html>"#;
        let SearchOutcome::Results(results) = parse_search_page(html).unwrap() else {
            panic!("expected results");
        };
        assert_eq!(results.titles, vec!["Switch OLED", "Switch Lite"]);
        assert_eq!(results.prices, vec!["$289.99", "$150.00"]);
    }

    #[test]
    fn new_listing_badge_is_stripped_as_a_whole_word() {
        let html = r#"<html><body><ul>
            <li class="s-item"><div class="s-item__title">New Listings Bundle</div><span class="s-item__price">$40.00</span></li>
            </ul></body></html>"#;
        let SearchOutcome::Results(results) = parse_search_page(html).unwrap() else {
            panic!("expected results");
        };
        assert_eq!(results.titles, vec!["New Listings Bundle"]);
    }

    #[test]
    fn detects_zero_results_banner() {
        let html = r#"<html><body><h3 class="srp-save-null-search__heading">No exact matches found</h3>
            <div class="s-item__title">Something else</div></body></html>"#;
        assert_eq!(parse_search_page(html).unwrap(), SearchOutcome::ZeroResults);
    }

    #[test]
    fn page_without_listings_is_an_error() {
        let err = parse_search_page("<html><body></body></html>").unwrap_err();
        assert!(matches!(err, ParserError::MissingField(_)));
    }
}
