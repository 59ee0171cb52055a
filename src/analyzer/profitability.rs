use crate::config::EnginePolicy;
use crate::model::Product;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Fee-adjusted margin and the automated pursue decision.
pub struct ProfitabilityEvaluator {
    fee_rate: Decimal,
    pursue_threshold: i64,
}

impl ProfitabilityEvaluator {
    pub fn new(policy: &EnginePolicy) -> Self {
        Self {
            fee_rate: policy.fee_rate,
            pursue_threshold: policy.pursue_threshold,
        }
    }

    /// `market - source - market * fee`, truncated toward zero.
    /// `None` while the marketplace price is unknown.
    pub fn margin(&self, source_price: Decimal, marketplace_price: Decimal) -> Option<i64> {
        if marketplace_price.is_zero() {
            return None;
        }
        let raw = marketplace_price - source_price - marketplace_price * self.fee_rate;
        raw.trunc().to_i64()
    }

    /// Writes margin and pursue flag; the human review flags are left as they are.
    pub fn evaluate(&self, product: &mut Product) {
        match self.margin(product.price, product.marketplace_price) {
            Some(margin) => {
                product.margin = margin;
                product.pursue = margin >= self.pursue_threshold;
            }
            None => {
                product.margin = 0;
                product.pursue = false;
            }
        }
    }
}
