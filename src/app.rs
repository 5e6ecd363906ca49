//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads and validates settings
//! - previews the setup and asks for confirmation
//! - runs the setup workflow against the gateway or the simulated ad server
//! - prints the report and writes the optional plan export

use std::io::IsTerminal;
use std::path::Path;

use clap::Parser;
use tracing::info;

use crate::cli::{BucketArgs, CheckArgs, Command, SetupArgs};
use crate::dfp::{AdServer, RemoteAdServer, SimulatedAdServer};
use crate::domain::{PriceBucket, PriceBucketConfig, PriceBuckets};
use crate::error::{AppError, ErrorKind};
use crate::io::settings::Settings;
use crate::pricing::bucket_config_problems;

pub mod naming;
pub mod pipeline;

/// Entry point for the `prebid-li` binary.
pub fn run() -> Result<(), AppError> {
    // `prebid-li` and `prebid-li --yes ...` behave like `prebid-li setup ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init_logging(cli.verbose);

    match cli.command {
        Command::Setup(args) => handle_setup(args),
        Command::Check(args) => handle_check(args),
        Command::Buckets(args) => handle_buckets(args),
    }
}

fn handle_setup(args: SetupArgs) -> Result<(), AppError> {
    let styled = std::io::stdout().is_terminal();
    let report = setup_from_file(
        &args.settings,
        styled,
        |prompt| if args.yes { Ok(true) } else { crate::cli::confirm::confirm(prompt) },
        |settings| -> Result<Box<dyn AdServer>, AppError> {
            if args.dry_run {
                Ok(Box::new(simulated_for(settings)))
            } else {
                Ok(Box::new(RemoteAdServer::from_env()?))
            }
        },
    )?;

    println!("{}", crate::report::format_setup_report(&report, args.dry_run));

    if let Some(path) = &args.export_plan {
        crate::io::export::write_plan_json(path, &report, args.dry_run)?;
        info!(path = %path.display(), "wrote setup plan");
    }

    Ok(())
}

/// Load and validate settings, preview, confirm, then run the workflow.
///
/// `connect` is only called once the settings are valid and the run is
/// confirmed, so a bad settings file never reaches the ad server.
fn setup_from_file(
    path: &Path,
    styled: bool,
    confirm: impl FnOnce(&str) -> Result<bool, AppError>,
    connect: impl FnOnce(&Settings) -> Result<Box<dyn AdServer>, AppError>,
) -> Result<pipeline::SetupReport, AppError> {
    let settings = Settings::load(path)?;
    let prices = settings.price_buckets.sequence()?;

    println!("{}", crate::report::format_setup_preview(&settings, &prices, styled));

    if !confirm("Is this correct?")? {
        return Err(AppError::new(ErrorKind::Canceled, "Setup canceled."));
    }

    let mut server = connect(&settings)?;
    run_setup(server.as_mut(), &settings, &prices)
}

fn run_setup(
    server: &mut dyn AdServer,
    settings: &Settings,
    prices: &[PriceBucket],
) -> Result<pipeline::SetupReport, AppError> {
    info!(bidder = %settings.bidder_code, line_items = prices.len(), "starting setup");
    pipeline::setup_partner(server, settings, prices)
}

/// In-memory ad server where every entity the settings name already exists.
///
/// The advertiser is left out when the settings allow creating it, so the dry
/// run shows that path.
fn simulated_for(settings: &Settings) -> SimulatedAdServer {
    let mut server = SimulatedAdServer::new().with_user(&settings.user_email);
    for name in &settings.placement_names {
        server = server.with_placement(name);
    }
    for name in &settings.ad_unit_names {
        server = server.with_ad_unit(name);
    }
    if !settings.create_advertiser_if_missing {
        server = server.with_advertiser(&settings.advertiser_name);
    }
    server
}

fn handle_check(args: CheckArgs) -> Result<(), AppError> {
    let settings = Settings::load(&args.settings)?;
    let prices = settings.price_buckets.sequence()?;
    println!(
        "{} is valid: {} line items for bidder {} across {} target(s).",
        args.settings.display(),
        prices.len(),
        settings.bidder_code,
        settings.target_count()
    );
    Ok(())
}

fn handle_buckets(args: BucketArgs) -> Result<(), AppError> {
    let buckets = buckets_from_args(&args)?;
    let prices = buckets.sequence()?;
    print!("{}", crate::report::format_bucket_preview(&prices, args.all));
    Ok(())
}

fn buckets_from_args(args: &BucketArgs) -> Result<PriceBuckets, AppError> {
    if let Some(granularity) = args.granularity {
        return Ok(PriceBuckets::Granularity(granularity));
    }
    if let Some(path) = &args.settings {
        return Ok(Settings::load(path)?.price_buckets);
    }
    let (Some(max), Some(increment)) = (args.max, args.increment) else {
        return Err(AppError::config(
            "Pass --granularity, --settings, or --max with --increment.",
        ));
    };

    let config = PriceBucketConfig {
        precision: args.precision,
        min: args.min,
        max,
        increment,
    };
    let problems = bucket_config_problems(&config, "buckets");
    if !problems.is_empty() {
        return Err(AppError::config(format!("Invalid bucket config:\n  - {}", problems.join("\n  - "))));
    }
    Ok(PriceBuckets::Single(config))
}

/// Rewrite argv so `prebid-li` defaults to `prebid-li setup`.
///
/// Rules:
/// - `prebid-li`                       -> `prebid-li setup`
/// - `prebid-li --dry-run ...`         -> `prebid-li setup --dry-run ...`
/// - `prebid-li --help/--version/-h`   -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("setup".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "setup" | "check" | "buckets");
    if is_subcommand {
        return argv;
    }

    if arg1.starts_with('-') {
        argv.insert(1, "setup".to_string());
    }
    argv
}
