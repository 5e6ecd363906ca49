//! Input/output helpers.
//!
//! - TOML settings loading + validation (`settings`)
//! - setup plan JSON export (`export`)

pub mod export;
pub mod settings;

pub use export::*;
pub use settings::*;
