//! Price bucket sequences.
//!
//! A bucket config `{precision, min, max, increment}` expands to every
//! micro-amount `min, min + increment, …` up to and including `max`.

use crate::domain::{PriceBucket, PriceBucketConfig, PriceBuckets};
use crate::error::AppError;
use crate::pricing::granularity::granularity_buckets;
use crate::pricing::micro::{MICRO_DIGITS, micro_amount_to_string, number_to_micro_amount};

/// Summaries list every price below this length, and elide the middle above it.
const SUMMARY_FULL_LIMIT: usize = 6;

/// Most price buckets one setup may expand to, across all of its ladders.
///
/// Every bucket becomes a line item, and the whole sequence is built in
/// memory before anything is created.
pub const MAX_PRICE_BUCKETS: u64 = 5_000;

/// Check a bucket config for problems, returning one message per problem.
///
/// `label` names the config in messages (e.g. `prebid.price_buckets[1]`).
pub fn bucket_config_problems(config: &PriceBucketConfig, label: &str) -> Vec<String> {
    let mut problems = Vec::new();

    if config.precision > MICRO_DIGITS {
        problems.push(format!(
            "{label}.precision must be between 0 and {MICRO_DIGITS} (got {}).",
            config.precision
        ));
    }
    for (field, value) in [("min", config.min), ("max", config.max), ("increment", config.increment)] {
        if !value.is_finite() {
            problems.push(format!("{label}.{field} must be a finite number."));
        }
    }
    if config.min.is_finite() && config.max.is_finite() && config.max < config.min.max(0.0) {
        problems.push(format!(
            "{label}.max ({}) must not be below {label}.min ({}).",
            config.max, config.min
        ));
    }
    if config.increment.is_finite() && number_to_micro_amount(config.increment, config.precision) <= 0 {
        problems.push(format!(
            "{label}.increment ({}) must be positive at precision {}.",
            config.increment, config.precision
        ));
    }
    if let Some(count) = bucket_count(config).filter(|c| *c > MAX_PRICE_BUCKETS) {
        problems.push(format!(
            "{label} expands to {count} price buckets; at most {MAX_PRICE_BUCKETS} are allowed."
        ));
    }

    problems
}

/// Number of buckets `config` expands to, computed without building them.
///
/// `None` when the config cannot be expanded (non-finite bounds or a step
/// that rounds to zero).
pub fn bucket_count(config: &PriceBucketConfig) -> Option<u64> {
    if !(config.min.is_finite() && config.max.is_finite() && config.increment.is_finite()) {
        return None;
    }
    let start = number_to_micro_amount(config.min.max(0.0), config.precision);
    let end = number_to_micro_amount(config.max, config.precision);
    let step = number_to_micro_amount(config.increment, config.precision);
    if step <= 0 {
        return None;
    }
    if end < start {
        return Some(0);
    }

    let count = (i128::from(end) - i128::from(start)) / i128::from(step) + 1;
    Some(u64::try_from(count).unwrap_or(u64::MAX))
}

/// Expand a single bucket config into its ascending micro-amount sequence.
///
/// A negative `min` is clamped to zero. The increment must stay positive after
/// rounding at the configured precision, otherwise the ladder would never end,
/// and the ladder may not exceed [`MAX_PRICE_BUCKETS`].
pub fn price_bucket_sequence(config: &PriceBucketConfig) -> Result<Vec<i64>, AppError> {
    if !(config.min.is_finite() && config.max.is_finite() && config.increment.is_finite()) {
        return Err(AppError::config("Price bucket min, max and increment must be finite numbers."));
    }

    let start = number_to_micro_amount(config.min.max(0.0), config.precision);
    let end = number_to_micro_amount(config.max, config.precision);
    let step = number_to_micro_amount(config.increment, config.precision);

    if step <= 0 {
        return Err(AppError::config(format!(
            "Price bucket increment {} rounds to {step} micros at precision {}; it must be positive.",
            config.increment, config.precision
        )));
    }
    if let Some(count) = bucket_count(config).filter(|c| *c > MAX_PRICE_BUCKETS) {
        return Err(too_many_buckets(count));
    }

    let mut prices = Vec::new();
    let mut current = start;
    while current <= end {
        prices.push(current);
        current = match current.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    Ok(prices)
}

fn too_many_buckets(count: u64) -> AppError {
    AppError::config(format!(
        "Price buckets expand to {count} prices; at most {MAX_PRICE_BUCKETS} are allowed."
    ))
}

impl PriceBucket {
    /// The `hb_pb` string for this bucket, e.g. `0.50`.
    pub fn price_string(&self) -> String {
        micro_amount_to_string(self.micro_amount, self.precision)
    }
}

impl PriceBuckets {
    /// The individual ladders behind this setting.
    pub fn configs(&self) -> Vec<PriceBucketConfig> {
        match self {
            PriceBuckets::Single(config) => vec![*config],
            PriceBuckets::Many(configs) => configs.clone(),
            PriceBuckets::Granularity(granularity) => granularity_buckets(*granularity),
        }
    }

    /// Bucket count summed over every ladder, before shared prices are merged.
    pub fn bucket_count(&self) -> u64 {
        self.configs()
            .iter()
            .filter_map(bucket_count)
            .fold(0, u64::saturating_add)
    }

    /// Merge every ladder into one strictly ascending sequence.
    ///
    /// Each bucket keeps the precision of the ladder it came from. Ladders that
    /// share an endpoint (e.g. `0..5` and `5..10`) contribute that price once,
    /// at the finer of the two precisions.
    pub fn sequence(&self) -> Result<Vec<PriceBucket>, AppError> {
        let total = self.bucket_count();
        if total > MAX_PRICE_BUCKETS {
            return Err(too_many_buckets(total));
        }

        let mut buckets = Vec::new();
        for config in self.configs() {
            buckets.extend(
                price_bucket_sequence(&config)?
                    .into_iter()
                    .map(|micro_amount| PriceBucket {
                        micro_amount,
                        precision: config.precision,
                    }),
            );
        }
        buckets.sort_by(|a, b| {
            a.micro_amount
                .cmp(&b.micro_amount)
                .then(b.precision.cmp(&a.precision))
        });
        buckets.dedup_by_key(|b| b.micro_amount);
        Ok(buckets)
    }
}

/// Human-readable preview of a price sequence.
///
/// Short sequences are listed in full; longer ones show the first three and
/// last three prices around an ellipsis.
pub fn prices_summary_string(prices: &[i64], precision: u32) -> String {
    summarize(prices, |p| micro_amount_to_string(*p, precision))
}

/// [`prices_summary_string`] for merged buckets, each at its own precision.
pub fn bucket_summary_string(buckets: &[PriceBucket]) -> String {
    summarize(buckets, PriceBucket::price_string)
}

fn summarize<T>(items: &[T], fmt: impl Fn(&T) -> String) -> String {
    if items.len() < SUMMARY_FULL_LIMIT {
        return items.iter().map(&fmt).collect::<Vec<_>>().join(", ");
    }

    let head: Vec<String> = items[..3].iter().map(&fmt).collect();
    let tail: Vec<String> = items[items.len() - 3..].iter().map(&fmt).collect();
    format!("{}, ... {}", head.join(", "), tail.join(", "))
}
