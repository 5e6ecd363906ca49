//! Ad-server integration.
//!
//! The setup workflow only talks to the ad server through [`AdServer`], one
//! method per logical operation. Two backends implement it:
//!
//! - `remote`: blocking HTTP/JSON client for an ad-server gateway
//! - `simulated`: in-memory ad server used for dry runs and tests
//!
//! `payloads` builds request bodies and `targeting` layers get-or-create
//! semantics over custom targeting keys and values.

use crate::domain::{
    Advertiser, CreativeConfig, LineItemConfig, LineItemCreativeAssociation, Order, TargetingValue,
};
use crate::error::AppError;

pub mod payloads;
pub mod remote;
pub mod simulated;
pub mod targeting;

pub use payloads::*;
pub use remote::RemoteAdServer;
pub use simulated::SimulatedAdServer;
pub use targeting::*;

/// Operation names shared by every backend (used as gateway routes and call-log entries).
pub mod ops {
    pub const FIND_USER: &str = "users/find_by_email";
    pub const FIND_PLACEMENT: &str = "placements/find_by_name";
    pub const FIND_AD_UNIT: &str = "ad_units/find_by_name";
    pub const FIND_ADVERTISERS: &str = "advertisers/find_by_name";
    pub const CREATE_ADVERTISER: &str = "advertisers/create";
    pub const FIND_ORDERS: &str = "orders/find_by_name";
    pub const CREATE_ORDER: &str = "orders/create";
    pub const CREATE_CREATIVES: &str = "creatives/create";
    pub const FIND_TARGETING_KEY: &str = "targeting_keys/find_by_name";
    pub const CREATE_TARGETING_KEY: &str = "targeting_keys/create";
    pub const FIND_TARGETING_VALUES: &str = "targeting_values/find_by_key_name";
    pub const CREATE_TARGETING_VALUE: &str = "targeting_values/create";
    pub const CREATE_LINE_ITEMS: &str = "line_items/create";
    pub const CREATE_ASSOCIATIONS: &str = "line_item_creative_associations/create";
}

/// The ad-server operations the setup workflow relies on.
///
/// Lookups return `Ok(None)` / an empty list when nothing matches; deciding
/// whether that is fatal is up to the caller. Batch creates return ids in the
/// same order as their input.
pub trait AdServer {
    fn find_user_id_by_email(&mut self, email: &str) -> Result<Option<i64>, AppError>;

    fn find_placement_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError>;

    fn find_ad_unit_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError>;

    /// Every advertiser whose name matches exactly.
    fn find_advertisers_by_name(&mut self, name: &str) -> Result<Vec<Advertiser>, AppError>;

    fn create_advertiser(&mut self, name: &str) -> Result<Advertiser, AppError>;

    /// Every order whose name matches exactly. Order names are not unique.
    fn find_orders_by_name(&mut self, name: &str) -> Result<Vec<Order>, AppError>;

    fn create_order(&mut self, name: &str, advertiser_id: i64, trafficker_id: i64) -> Result<Order, AppError>;

    fn create_creatives(&mut self, creatives: &[CreativeConfig]) -> Result<Vec<i64>, AppError>;

    fn find_targeting_key_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError>;

    fn create_targeting_key(&mut self, name: &str) -> Result<i64, AppError>;

    fn find_targeting_values_by_key_name(&mut self, key_name: &str) -> Result<Vec<TargetingValue>, AppError>;

    fn create_targeting_value(&mut self, name: &str, key_id: i64) -> Result<i64, AppError>;

    fn create_line_items(&mut self, line_items: &[LineItemConfig]) -> Result<Vec<i64>, AppError>;

    /// Returns the number of associations created.
    fn create_line_item_creative_associations(
        &mut self,
        associations: &[LineItemCreativeAssociation],
    ) -> Result<usize, AppError>;
}
