//! Domain types used throughout the setup workflow.
//!
//! This module defines:
//!
//! - price bucket settings (`PriceBucketConfig`, `PriceBuckets`, `PriceGranularity`)
//! - ad-server entities (`Advertiser`, `Order`, `TargetingKey`, `TargetingValue`)
//! - request payloads (`CreativeConfig`, `LineItemConfig`, `LineItemCreativeAssociation`)

pub mod types;

pub use types::*;
