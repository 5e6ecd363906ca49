//! `prebid-line-items` library crate.
//!
//! The binary (`prebid-li`) is a thin wrapper around this library so that the
//! setup workflow is testable against the simulated ad server without
//! spawning processes.

pub mod app;
pub mod cli;
pub mod dfp;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod pricing;
pub mod report;
