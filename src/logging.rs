//! Tracing subscriber setup.
//!
//! Logs go to stderr so stdout stays clean for summaries and reports.
//! `RUST_LOG` wins over the verbosity flag when set.

use tracing_subscriber::filter::{EnvFilter, LevelFilter};

const QUIET_TARGETS: [&str; 2] = ["reqwest=warn", "hyper=warn"];

pub fn init_logging(verbose: bool) {
    let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let mut filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();
    for directive in QUIET_TARGETS {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    // A second init keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}
