//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - handed to an ad-server backend as request payloads
//! - exported to JSON as a setup plan
//! - compared in tests without going through a live ad server

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// A creative or placement size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Size {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// One price ladder: every `increment` from `min` to `max` (inclusive), rounded
/// at `precision` decimal digits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBucketConfig {
    pub precision: u32,
    pub min: f64,
    pub max: f64,
    pub increment: f64,
}

/// Prebid's built-in price granularities.
///
/// See `pricing::granularity` for the ladders each one expands to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PriceGranularity {
    Low,
    Medium,
    High,
    Auto,
    Dense,
}

impl PriceGranularity {
    pub fn name(self) -> &'static str {
        match self {
            PriceGranularity::Low => "low",
            PriceGranularity::Medium => "medium",
            PriceGranularity::High => "high",
            PriceGranularity::Auto => "auto",
            PriceGranularity::Dense => "dense",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "low" => Some(PriceGranularity::Low),
            "medium" => Some(PriceGranularity::Medium),
            "high" => Some(PriceGranularity::High),
            "auto" => Some(PriceGranularity::Auto),
            "dense" => Some(PriceGranularity::Dense),
            _ => None,
        }
    }
}

/// The price bucket setting as a whole.
///
/// Mirrors how publishers configure Prebid: one custom ladder, several custom
/// ladders covering different ranges, or a named standard granularity.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceBuckets {
    Single(PriceBucketConfig),
    Many(Vec<PriceBucketConfig>),
    Granularity(PriceGranularity),
}

/// One price bucket: a micro-amount and the precision its ladder prints it at.
///
/// `hb_pb` values are rendered per bucket, so a precision-2 ladder yields
/// `0.50` even when a finer ladder is configured alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceBucket {
    pub micro_amount: i64,
    pub precision: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advertiser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub name: String,
    pub advertiser_id: i64,
    pub trafficker_id: i64,
    /// Workflow status as reported by the ad server (e.g. `DRAFT`, `APPROVED`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingKey {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingValue {
    pub id: i64,
    pub name: String,
    pub key_id: i64,
}

/// Creative payload.
///
/// Display setups use a third-party creative carrying the Prebid render snippet;
/// video setups use a VAST redirect creative pointing at the cache URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CreativeConfig {
    ThirdParty {
        name: String,
        advertiser_id: i64,
        snippet: String,
        size: Size,
        safe_frame_compatible: bool,
    },
    VastRedirect {
        name: String,
        advertiser_id: i64,
        vast_xml_url: String,
        size: Size,
        duration_ms: u32,
    },
}

impl CreativeConfig {
    pub fn name(&self) -> &str {
        match self {
            CreativeConfig::ThirdParty { name, .. } | CreativeConfig::VastRedirect { name, .. } => name,
        }
    }

    pub fn advertiser_id(&self) -> i64 {
        match self {
            CreativeConfig::ThirdParty { advertiser_id, .. }
            | CreativeConfig::VastRedirect { advertiser_id, .. } => *advertiser_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CriteriaOperator {
    Is,
    IsNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogicalOperator {
    And,
    Or,
}

/// A single `key <op> value(s)` leaf of a custom targeting tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCriteria {
    pub key_id: i64,
    pub value_ids: Vec<i64>,
    pub operator: CriteriaOperator,
}

/// An AND/OR node over custom criteria.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomCriteriaSet {
    pub logical_operator: LogicalOperator,
    pub children: Vec<CustomCriteria>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryTargeting {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub placement_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ad_unit_ids: Vec<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Environment {
    Browser,
    VideoPlayer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Targeting {
    pub inventory: InventoryTargeting,
    pub custom: CustomCriteriaSet,
    /// Request platforms; only set for video line items.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub request_platforms: Vec<Environment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub micro_amount: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LineItemType {
    PricePriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CostType {
    Cpm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CreativeRotation {
    Even,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GoalType {
    None,
}

/// Everything needed to create one price-bucket line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemConfig {
    pub name: String,
    pub order_id: i64,
    pub targeting: Targeting,
    pub line_item_type: LineItemType,
    pub cost_type: CostType,
    pub cost_per_unit: Money,
    /// Start immediately; the ad server picks the start time.
    pub start_immediately: bool,
    pub unlimited_end: bool,
    pub creative_rotation: CreativeRotation,
    pub goal_type: GoalType,
    pub environment: Environment,
    pub creative_placeholders: Vec<Size>,
}

/// A line item <> creative link, optionally overriding the creative size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemCreativeAssociation {
    pub line_item_id: i64,
    pub creative_id: i64,
    #[serde(default)]
    pub sizes: Vec<Size>,
}
