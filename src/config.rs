use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid policy: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingMode {
    /// Front page only, operator-checked alignment.
    Single,
    /// Every category page, automatic equal-length check.
    Extended,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub mode: ListingMode,
    pub home_url: String,
    pub category_urls: Vec<String>,
    pub scroll_amount: Option<u32>,
    /// Header/promo rows on the front page that carry a name but no price.
    pub name_price_offset: usize,
    /// Ask the operator to confirm the last aligned row of a front page.
    pub spot_check: bool,
    pub currency_symbol: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            mode: ListingMode::Single,
            home_url: "https://www.dealnews.com/".into(),
            category_urls: [
                "f1682/Staff-Pick/",
                "c202/Clothing-Accessories/",
                "c196/Home-Garden/",
                "c756/Health-Beauty/",
                "c142/Electronics/",
                "c39/Computers/",
                "c211/Sports-Fitness/",
                "c186/Gaming-Toys/",
                "c182/Office-School-Supplies/",
                "c238/Automotive/",
                "c178/Movies-Music-Books/",
            ]
            .iter()
            .map(|path| format!("https://www.dealnews.com/{}", path))
            .collect(),
            scroll_amount: None,
            name_price_offset: 6,
            spot_check: true,
            currency_symbol: "$".into(),
        }
    }
}

impl ListingConfig {
    /// Pages to scrape for the configured mode.
    pub fn urls(&self) -> Vec<String> {
        match self.mode {
            ListingMode::Single => vec![self.home_url.clone()],
            ListingMode::Extended => self.category_urls.clone(),
        }
    }

    pub fn scroll(&self) -> u32 {
        self.scroll_amount.unwrap_or(match self.mode {
            ListingMode::Single => 0,
            ListingMode::Extended => 5000,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    pub base_url: String,
    pub new_only: bool,
    pub buy_it_now: bool,
    pub free_shipping: bool,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ebay.com".into(),
            new_only: true,
            buy_it_now: true,
            free_shipping: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Insert/delete edit distance ratio.
    Indel,
    /// Normalized Levenshtein (substitutions cost one edit).
    Levenshtein,
}

/// What happens to an item whose marketplace category cannot be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFailurePolicy {
    Drop,
    /// Keep the item with an empty category; export prunes it.
    KeepEmpty,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 500,
            max_delay_ms: 8_000,
        }
    }
}

/// Thresholds and failure handling shared by every engine stage.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnginePolicy {
    pub rank1_threshold: f64,
    pub ranked_threshold: f64,
    pub max_ranked_results: usize,
    pub similarity: SimilarityMetric,
    pub fee_rate: Decimal,
    pub pursue_threshold: i64,
    pub category_failure: CategoryFailurePolicy,
    pub wait_timeout_secs: u64,
    pub session_retry: RetryPolicy,
}

impl Default for EnginePolicy {
    fn default() -> Self {
        Self {
            rank1_threshold: 0.40,
            ranked_threshold: 0.60,
            max_ranked_results: 5,
            similarity: SimilarityMetric::Indel,
            fee_rate: dec!(0.13),
            pursue_threshold: 45,
            category_failure: CategoryFailurePolicy::Drop,
            wait_timeout_secs: 5,
            session_retry: RetryPolicy::default(),
        }
    }
}

impl EnginePolicy {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("rank1_threshold", self.rank1_threshold),
            ("ranked_threshold", self.ranked_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!("{} must be within [0, 1], got {}", name, value)));
            }
        }
        if self.max_ranked_results == 0 {
            return Err(ConfigError::Invalid("max_ranked_results must be at least 1".into()));
        }
        if self.fee_rate < Decimal::ZERO || self.fee_rate >= Decimal::ONE {
            return Err(ConfigError::Invalid(format!("fee_rate must be within [0, 1), got {}", self.fee_rate)));
        }
        if self.session_retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("session_retry.max_attempts must be at least 1".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database_path: String,
    pub listing: ListingConfig,
    pub marketplace: MarketplaceConfig,
    pub policy: EnginePolicy,
    /// Ask the operator before merging a batch into the dataset.
    pub confirm_export: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "deals.db".into(),
            listing: ListingConfig::default(),
            marketplace: MarketplaceConfig::default(),
            policy: EnginePolicy::default(),
            confirm_export: true,
        }
    }
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = serde_json::from_str(content)?;
    config.policy.validate()?;
    Ok(config)
}
