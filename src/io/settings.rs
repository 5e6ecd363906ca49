//! Settings file loading and validation.
//!
//! Settings are read from TOML in two passes:
//!
//! 1. `RawSettings`: every field optional, so a missing field is a validation
//!    message rather than a parse failure.
//! 2. `Settings::from_raw`: checks every field, collects *all* problems, and
//!    fails with a single configuration error listing them.
//!
//! No ad-server call happens before a `Settings` value exists.
//!
//! ```toml
//! [dfp]
//! user_email = "trafficker@example.com"
//! advertiser_name = "Prebid"
//! order_name = "Prebid: acme"
//! placement_names = ["Leaderboard"]
//!
//! [prebid]
//! bidder_code = "acme"
//! price_buckets = { precision = 2, min = 0, max = 20, increment = 0.10 }
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::app::naming::NameTemplate;
use crate::dfp::CreativeKind;
use crate::domain::{PriceBucketConfig, PriceBuckets, PriceGranularity, Size};
use crate::error::AppError;
use crate::pricing::{MAX_PRICE_BUCKETS, bucket_config_problems, bucket_count};

pub const DEFAULT_CURRENCY_CODE: &str = "USD";

/// Placement sizes used when the settings do not list any.
pub const DEFAULT_PLACEMENT_SIZES: [Size; 2] = [Size::new(300, 250), Size::new(728, 90)];

const BUCKET_LABEL: &str = "prebid.price_buckets";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub dfp: RawDfpSettings,
    pub prebid: RawPrebidSettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawDfpSettings {
    pub user_email: Option<String>,
    pub advertiser_name: Option<String>,
    pub order_name: Option<String>,
    pub placement_names: Option<Vec<String>>,
    pub ad_unit_names: Option<Vec<String>>,
    pub placement_sizes: Option<Vec<Size>>,
    pub create_advertiser_if_missing: Option<bool>,
    pub use_existing_order: Option<bool>,
    pub creatives_per_line_item: Option<i64>,
    pub currency_code: Option<String>,
    pub line_item_name_format: Option<String>,
    pub video: Option<bool>,
    pub vast_redirect_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawPrebidSettings {
    pub bidder_code: Option<String>,
    /// A table, an array of tables, or a granularity name.
    pub price_buckets: Option<toml::Value>,
}

/// Validated settings for one partner setup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub user_email: String,
    pub advertiser_name: String,
    pub order_name: String,
    pub placement_names: Vec<String>,
    pub ad_unit_names: Vec<String>,
    pub sizes: Vec<Size>,
    pub create_advertiser_if_missing: bool,
    pub use_existing_order: bool,
    pub creatives_per_line_item: usize,
    pub currency_code: String,
    pub line_item_name_format: NameTemplate,
    pub creative_kind: CreativeKind,
    pub bidder_code: String,
    pub price_buckets: PriceBuckets,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| AppError::io(format!("Failed to read settings file '{}': {e}", path.display())))?;
        Self::from_toml_str(&text)
            .map_err(|e| AppError::new(e.kind(), format!("{} ({})", e.message(), path.display())))
    }

    pub fn from_toml_str(text: &str) -> Result<Self, AppError> {
        let raw: RawSettings =
            toml::from_str(text).map_err(|e| AppError::config(format!("Invalid settings file: {e}")))?;
        Self::from_raw(raw)
    }

    pub fn from_raw(raw: RawSettings) -> Result<Self, AppError> {
        let mut problems = Vec::new();
        let RawSettings { dfp, prebid } = raw;

        let user_email = required(dfp.user_email, "dfp.user_email", &mut problems);
        if !user_email.is_empty() && !user_email.contains('@') {
            problems.push(format!("dfp.user_email ('{user_email}') is not an email address."));
        }
        let advertiser_name = required(dfp.advertiser_name, "dfp.advertiser_name", &mut problems);
        let order_name = required(dfp.order_name, "dfp.order_name", &mut problems);
        let bidder_code = required(prebid.bidder_code, "prebid.bidder_code", &mut problems);

        let placement_names = names(dfp.placement_names, "dfp.placement_names", &mut problems);
        let ad_unit_names = names(dfp.ad_unit_names, "dfp.ad_unit_names", &mut problems);
        let target_count = placement_names.len() + ad_unit_names.len();
        if target_count == 0 {
            problems.push(
                "dfp.placement_names or dfp.ad_unit_names must name at least one placement or ad unit.".to_string(),
            );
        }

        let sizes = dfp.placement_sizes.unwrap_or_else(|| DEFAULT_PLACEMENT_SIZES.to_vec());
        if sizes.is_empty() {
            problems.push("dfp.placement_sizes must list at least one size.".to_string());
        }
        for size in &sizes {
            if size.width == 0 || size.height == 0 {
                problems.push(format!("dfp.placement_sizes contains an empty size ({size})."));
            }
        }

        let creatives_per_line_item = match dfp.creatives_per_line_item {
            Some(n) if n >= 1 => n as usize,
            Some(n) => {
                problems.push(format!("dfp.creatives_per_line_item must be at least 1 (got {n})."));
                0
            }
            None => target_count,
        };

        let currency_code = dfp
            .currency_code
            .map(|c| c.trim().to_string())
            .unwrap_or_else(|| DEFAULT_CURRENCY_CODE.to_string());
        if !(currency_code.len() == 3 && currency_code.chars().all(|c| c.is_ascii_uppercase())) {
            problems.push(format!(
                "dfp.currency_code must be a three-letter ISO code such as USD (got '{currency_code}')."
            ));
        }

        let line_item_name_format = match dfp.line_item_name_format {
            Some(format) => NameTemplate::parse(&format).unwrap_or_else(|e| {
                problems.push(format!("dfp.line_item_name_format: {e}."));
                NameTemplate::default()
            }),
            None => NameTemplate::default(),
        };

        let creative_kind = if dfp.video.unwrap_or(false) {
            let url = dfp.vast_redirect_url.map(|u| u.trim().to_string()).unwrap_or_default();
            if url.is_empty() {
                problems.push("dfp.vast_redirect_url is required when dfp.video is true.".to_string());
            }
            CreativeKind::Video { vast_redirect_url: url }
        } else {
            CreativeKind::Display
        };

        let price_buckets = match prebid.price_buckets {
            Some(value) => parse_price_buckets(&value, &mut problems),
            None => {
                problems.push(format!("Missing required setting {BUCKET_LABEL}."));
                None
            }
        };

        match price_buckets {
            Some(price_buckets) if problems.is_empty() => Ok(Self {
                user_email,
                advertiser_name,
                order_name,
                placement_names,
                ad_unit_names,
                sizes,
                create_advertiser_if_missing: dfp.create_advertiser_if_missing.unwrap_or(false),
                use_existing_order: dfp.use_existing_order.unwrap_or(false),
                creatives_per_line_item,
                currency_code,
                line_item_name_format,
                creative_kind,
                bidder_code,
                price_buckets,
            }),
            _ => Err(AppError::config(format!(
                "Invalid settings:\n{}",
                problems
                    .iter()
                    .map(|p| format!("  - {p}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            ))),
        }
    }

    pub fn target_count(&self) -> usize {
        self.placement_names.len() + self.ad_unit_names.len()
    }
}

fn required(value: Option<String>, field: &str, problems: &mut Vec<String>) -> String {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => v,
        Some(_) => {
            problems.push(format!("Setting {field} must not be empty."));
            String::new()
        }
        None => {
            problems.push(format!("Missing required setting {field}."));
            String::new()
        }
    }
}

fn names(value: Option<Vec<String>>, field: &str, problems: &mut Vec<String>) -> Vec<String> {
    let names: Vec<String> = value.unwrap_or_default().into_iter().map(|n| n.trim().to_string()).collect();
    if names.iter().any(|n| n.is_empty()) {
        problems.push(format!("{field} contains an empty name."));
    }
    names
}

/// Parse the `price_buckets` setting, pushing a message per problem.
fn parse_price_buckets(value: &toml::Value, problems: &mut Vec<String>) -> Option<PriceBuckets> {
    let before = problems.len();
    let buckets = match value {
        toml::Value::String(name) => match PriceGranularity::from_name(name) {
            Some(granularity) => Some(PriceBuckets::Granularity(granularity)),
            None => {
                problems.push(format!(
                    "{BUCKET_LABEL} '{name}' is not a known granularity (low, medium, high, auto, dense)."
                ));
                None
            }
        },
        toml::Value::Table(table) => parse_bucket_table(table, BUCKET_LABEL, problems).map(PriceBuckets::Single),
        toml::Value::Array(items) if !items.is_empty() => {
            let mut configs = Vec::with_capacity(items.len());
            for (idx, item) in items.iter().enumerate() {
                let label = format!("{BUCKET_LABEL}[{idx}]");
                match item {
                    toml::Value::Table(table) => {
                        if let Some(config) = parse_bucket_table(table, &label, problems) {
                            configs.push(config);
                        }
                    }
                    _ => problems.push(format!("{label} must be a table.")),
                }
            }
            let total = configs.iter().filter_map(bucket_count).fold(0, u64::saturating_add);
            if problems.len() == before && total > MAX_PRICE_BUCKETS {
                problems.push(format!(
                    "{BUCKET_LABEL} expand to {total} price buckets in total; at most {MAX_PRICE_BUCKETS} are allowed."
                ));
            }
            Some(PriceBuckets::Many(configs))
        }
        _ => {
            problems.push(format!(
                "{BUCKET_LABEL} must be a table, a non-empty array of tables, or a granularity name."
            ));
            None
        }
    };

    (problems.len() == before).then_some(buckets).flatten()
}

fn parse_bucket_table(
    table: &toml::map::Map<String, toml::Value>,
    label: &str,
    problems: &mut Vec<String>,
) -> Option<PriceBucketConfig> {
    let missing: Vec<&str> = ["precision", "min", "max", "increment"]
        .into_iter()
        .filter(|k| !table.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        problems.push(format!(
            "{label} must contain keys precision, min, max and increment (missing: {}).",
            missing.join(", ")
        ));
        return None;
    }
    for key in table.keys() {
        if !matches!(key.as_str(), "precision" | "min" | "max" | "increment") {
            problems.push(format!("{label} has unknown key '{key}'."));
        }
    }

    let number = |key: &str, problems: &mut Vec<String>| -> Option<f64> {
        match table.get(key) {
            Some(toml::Value::Integer(i)) => Some(*i as f64),
            Some(toml::Value::Float(f)) => Some(*f),
            _ => {
                problems.push(format!("The '{key}' key in {label} must be a number."));
                None
            }
        }
    };

    let precision = match table.get("precision") {
        Some(toml::Value::Integer(i)) if *i >= 0 => u32::try_from(*i).ok(),
        Some(toml::Value::Float(f)) if *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64 => Some(*f as u32),
        _ => None,
    };
    if precision.is_none() {
        problems.push(format!("The 'precision' key in {label} must be a non-negative integer."));
    }
    let min = number("min", problems);
    let max = number("max", problems);
    let increment = number("increment", problems);

    let config = PriceBucketConfig {
        precision: precision?,
        min: min?,
        max: max?,
        increment: increment?,
    };
    let config_problems = bucket_config_problems(&config, label);
    if !config_problems.is_empty() {
        problems.extend(config_problems);
        return None;
    }
    Some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const VALID: &str = r#"
        [dfp]
        user_email = "fakeuser@example.com"
        advertiser_name = "My Advertiser"
        order_name = "My Cool Order"
        placement_names = ["My Site Leaderboard", "Another Placement"]
        ad_unit_names = ["Leaderboard Ad Unit", "Another Ad Unit"]

        [prebid]
        bidder_code = "mypartner"
        price_buckets = { precision = 2, min = 0, max = 20, increment = 0.10 }
    "#;

    fn settings_with(dfp_extra: &str, buckets: &str) -> Result<Settings, AppError> {
        Settings::from_toml_str(&format!(
            r#"
            [dfp]
            user_email = "fakeuser@example.com"
            advertiser_name = "My Advertiser"
            order_name = "My Cool Order"
            placement_names = ["My Site Leaderboard", "Another Placement"]
            {dfp_extra}

            [prebid]
            bidder_code = "mypartner"
            price_buckets = {buckets}
            "#
        ))
    }

    #[test]
    fn valid_settings_apply_defaults() {
        let settings = Settings::from_toml_str(VALID).unwrap();
        assert_eq!(settings.currency_code, "USD");
        assert_eq!(settings.sizes, DEFAULT_PLACEMENT_SIZES.to_vec());
        assert_eq!(settings.creatives_per_line_item, 4);
        assert!(!settings.create_advertiser_if_missing);
        assert!(!settings.use_existing_order);
        assert_eq!(settings.line_item_name_format, NameTemplate::default());
        assert_eq!(settings.creative_kind, CreativeKind::Display);
        assert_eq!(
            settings.price_buckets,
            PriceBuckets::Single(PriceBucketConfig {
                precision: 2,
                min: 0.0,
                max: 20.0,
                increment: 0.10,
            })
        );
    }

    #[test]
    fn creatives_default_to_target_count() {
        let s = settings_with("", "\"medium\"").unwrap();
        assert_eq!(s.creatives_per_line_item, 2);
        let s = settings_with("creatives_per_line_item = 5", "\"medium\"").unwrap();
        assert_eq!(s.creatives_per_line_item, 5);
    }

    #[test]
    fn custom_currency_and_format_are_used() {
        let s = settings_with(
            "currency_code = \"EUR\"\nline_item_name_format = \"{bidder_code}: HB ${price:0>5}\"",
            "\"low\"",
        )
        .unwrap();
        assert_eq!(s.currency_code, "EUR");
        assert_eq!(s.line_item_name_format.as_str(), "{bidder_code}: HB ${price:0>5}");
    }

    #[test]
    fn missing_required_settings_are_all_reported() {
        let err = Settings::from_toml_str("[prebid]\nprice_buckets = \"medium\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        for field in ["dfp.user_email", "dfp.advertiser_name", "dfp.order_name", "prebid.bidder_code"] {
            assert!(err.message().contains(field), "{field} not in {err}");
        }
        assert!(err.message().contains("at least one placement or ad unit"));
    }

    #[test]
    fn price_bucket_missing_key_is_rejected() {
        let err = settings_with("", "{ precision = 2, min = 0, increment = 0.10 }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("missing: max"), "{err}");
    }

    #[test]
    fn price_bucket_bad_value_types_are_rejected() {
        let err = settings_with("", "{ precision = 2, min = \"$0\", max = 20, increment = 0.10 }").unwrap_err();
        assert!(err.message().contains("'min'"), "{err}");

        let err = settings_with("", "{ precision = 2, min = 0, max = 20, increment = { inc = 0.10 } }").unwrap_err();
        assert!(err.message().contains("'increment'"), "{err}");
    }

    #[test]
    fn price_bucket_lists_and_granularities_parse() {
        let s = settings_with(
            "",
            "[{ precision = 2, min = 0, max = 5, increment = 0.05 }, { precision = 2, min = 5, max = 10, increment = 0.1 }]",
        )
        .unwrap();
        assert!(matches!(s.price_buckets, PriceBuckets::Many(ref v) if v.len() == 2));

        let s = settings_with("", "\"Dense\"").unwrap();
        assert_eq!(s.price_buckets, PriceBuckets::Granularity(PriceGranularity::Dense));

        assert!(settings_with("", "\"ultra\"").is_err());
        assert!(settings_with("", "[]").is_err());
    }

    #[test]
    fn zero_increment_is_rejected() {
        let err = settings_with("", "{ precision = 2, min = 0, max = 1, increment = 0.001 }").unwrap_err();
        assert!(err.message().contains("increment"), "{err}");
    }

    #[test]
    fn huge_ladders_are_rejected_at_load() {
        let err = settings_with("", "{ precision = 2, min = 0, max = 1000000000, increment = 0.01 }").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("at most 5000"), "{err}");

        let err = settings_with(
            "",
            "[{ precision = 2, min = 0, max = 30, increment = 0.01 }, { precision = 2, min = 30, max = 60, increment = 0.01 }]",
        )
        .unwrap_err();
        assert!(err.message().contains("in total"), "{err}");
    }

    #[test]
    fn video_requires_redirect_url() {
        let err = settings_with("video = true", "\"medium\"").unwrap_err();
        assert!(err.message().contains("vast_redirect_url"));
        let s = settings_with("video = true\nvast_redirect_url = \"https://cache.example.com/vast\"", "\"medium\"")
            .unwrap();
        assert!(s.creative_kind.is_video());
    }

    #[test]
    fn unknown_fields_and_bad_types_fail_to_parse() {
        assert!(settings_with("order_nmae = \"typo\"", "\"medium\"").is_err());
        assert!(settings_with("use_existing_order = \"yes\"", "\"medium\"").is_err());
    }
}
