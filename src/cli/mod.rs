//! Command-line parsing for the Prebid line item setup tool.
//!
//! Argument parsing stays separate from the setup workflow so the workflow can
//! be driven from tests without a process boundary.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::PriceGranularity;

pub mod confirm;

pub const DEFAULT_SETTINGS_PATH: &str = "settings.toml";

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "prebid-li",
    version,
    about = "Create Prebid header-bidding orders, line items and creatives on an ad server"
)]
pub struct Cli {
    /// Log debug detail (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create the advertiser, order, creatives and line items for one bidder.
    Setup(SetupArgs),
    /// Validate a settings file without contacting the ad server.
    Check(CheckArgs),
    /// Preview the price buckets a bucket config or granularity expands to.
    Buckets(BucketArgs),
}

#[derive(Debug, Clone, Args)]
pub struct SetupArgs {
    /// Settings file (TOML).
    #[arg(short, long, default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,

    /// Skip the confirmation prompt.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Run against an in-memory ad server; nothing is created remotely.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the resulting setup plan to a JSON file.
    #[arg(long, value_name = "JSON")]
    pub export_plan: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// Settings file (TOML).
    #[arg(short, long, default_value = DEFAULT_SETTINGS_PATH)]
    pub settings: PathBuf,
}

/// Either a named granularity, an explicit ladder, or a settings file.
#[derive(Debug, Clone, Args)]
pub struct BucketArgs {
    /// Standard Prebid granularity.
    #[arg(short, long, value_enum, conflicts_with_all = ["settings", "max"])]
    pub granularity: Option<PriceGranularity>,

    /// Decimal places used to round and print prices.
    #[arg(long, default_value_t = 2)]
    pub precision: u32,

    #[arg(long, default_value_t = 0.0)]
    pub min: f64,

    #[arg(long, requires = "increment")]
    pub max: Option<f64>,

    #[arg(long, requires = "max")]
    pub increment: Option<f64>,

    /// Read `prebid.price_buckets` from a settings file.
    #[arg(short, long, conflicts_with = "max")]
    pub settings: Option<PathBuf>,

    /// Print every price instead of a summary.
    #[arg(long)]
    pub all: bool,
}
