pub mod dealnews;
pub mod ebay;
pub mod fetcher;
pub mod traits;

pub use dealnews::DealNewsSource;
pub use ebay::EbaySource;
pub use fetcher::HttpFetcher;
pub use traits::{ListingSource, MarketplaceSource};
