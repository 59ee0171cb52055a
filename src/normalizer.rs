use crate::model::{Product, RawListing};
use rust_decimal::Decimal;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    /// The price field does not hold a distinct current and previous price.
    #[error("not a two-price deal: {0:?}")]
    NotADeal(String),
    #[error("unparsable price token {token:?}")]
    UnparsablePrice { token: String },
}

/// Turns scraped deal rows into products.
pub struct ListingNormalizer {
    currency_symbol: String,
}

impl ListingNormalizer {
    pub fn new(currency_symbol: impl Into<String>) -> Self {
        Self {
            currency_symbol: currency_symbol.into(),
        }
    }

    /// A listing is a deal only when its first and last price tokens both
    /// carry the currency marker and differ.
    pub fn is_deal(&self, price_text: &str) -> bool {
        let tokens: Vec<&str> = price_text.split_whitespace().collect();
        match (tokens.first(), tokens.last()) {
            (Some(first), Some(last)) => {
                first.contains(self.currency_symbol.as_str())
                    && last.contains(self.currency_symbol.as_str())
                    && first != last
            }
            _ => false,
        }
    }

    pub fn normalize(&self, raw: &RawListing) -> Result<Product, NormalizeError> {
        if !self.is_deal(&raw.price_text) {
            return Err(NormalizeError::NotADeal(raw.price_text.clone()));
        }
        let mut tokens = raw.price_text.split_whitespace();
        // is_deal guarantees at least two tokens
        let first = tokens.next().unwrap_or_default();
        let last = tokens.last().unwrap_or(first);

        let price = self.parse_money(first)?;
        let previous_price = self.parse_money(last)?;

        Ok(Product::new(
            raw.name.trim().to_string(),
            price,
            previous_price,
            normalize_site(&raw.site),
        ))
    }

    /// Strips the currency symbol and thousands separators: `"$1,299.99"` -> `1299.99`.
    pub fn parse_money(&self, token: &str) -> Result<Decimal, NormalizeError> {
        let cleaned = token.replace(self.currency_symbol.as_str(), "").replace(',', "");
        Decimal::from_str(cleaned.trim()).map_err(|_| NormalizeError::UnparsablePrice {
            token: token.to_string(),
        })
    }
}

/// Site labels come as `"Amazon · 2 hrs ago"`; only the first word names the store.
pub fn normalize_site(site: &str) -> String {
    site.split_whitespace().next().unwrap_or_default().to_string()
}
