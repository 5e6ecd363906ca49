//! Prebid's standard price granularities expressed as bucket ladders.

use crate::domain::{PriceBucketConfig, PriceGranularity};

const fn ladder(min: f64, max: f64, increment: f64) -> PriceBucketConfig {
    PriceBucketConfig {
        precision: 2,
        min,
        max,
        increment,
    }
}

/// Expand a named granularity into the ladders Prebid.js uses for it.
///
/// - `low`: $0.50 steps up to $5
/// - `medium`: $0.10 steps up to $20
/// - `high`: $0.01 steps up to $20
/// - `auto`: $0.05 to $5, $0.10 to $10, $0.50 to $20
/// - `dense`: $0.01 to $3, $0.05 to $8, $0.50 to $20
pub fn granularity_buckets(granularity: PriceGranularity) -> Vec<PriceBucketConfig> {
    match granularity {
        PriceGranularity::Low => vec![ladder(0.0, 5.0, 0.50)],
        PriceGranularity::Medium => vec![ladder(0.0, 20.0, 0.10)],
        PriceGranularity::High => vec![ladder(0.0, 20.0, 0.01)],
        PriceGranularity::Auto => vec![
            ladder(0.0, 5.0, 0.05),
            ladder(5.0, 10.0, 0.10),
            ladder(10.0, 20.0, 0.50),
        ],
        PriceGranularity::Dense => vec![
            ladder(0.0, 3.0, 0.01),
            ladder(3.0, 8.0, 0.05),
            ladder(8.0, 20.0, 0.50),
        ],
    }
}
