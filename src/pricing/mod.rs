//! Price bucketing: micro-amount conversions and price ladders.
//!
//! Everything here is pure arithmetic with no ad-server dependency.

pub mod buckets;
pub mod granularity;
pub mod micro;

pub use buckets::*;
pub use granularity::*;
pub use micro::*;
