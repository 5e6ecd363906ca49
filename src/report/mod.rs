//! Terminal reporting for setup runs and bucket previews.

pub mod format;

pub use format::*;
