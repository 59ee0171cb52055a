use crate::model::Product;
use tracing::{debug, info};

/// Logs the batch: rejected products at debug level, pursue-worthy ones at info.
pub fn show_results(products: &[Product]) {
    let (good, rest): (Vec<&Product>, Vec<&Product>) = products.iter().partition(|p| p.pursue);

    for product in &rest {
        debug!("{}", product);
    }

    if good.is_empty() {
        info!("THERE WERE NO GOOD PRODUCT(S)");
        return;
    }

    info!("GOOD PRODUCT(S): {}", good.len());
    for product in good {
        info!("💸 {}", product);
    }
}
