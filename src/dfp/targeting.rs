//! Custom targeting keys and values.
//!
//! Header bidding line items target two keys:
//! - `hb_bidder`: which partner won the auction
//! - `hb_pb`: the partner's bucketed bid price
//!
//! Keys are resolved (or created) once per run. Values are loaded in bulk per
//! key and created lazily, so re-running the setup for another partner reuses
//! every price value that already exists.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::dfp::AdServer;
use crate::error::AppError;

pub const HB_BIDDER_KEY: &str = "hb_bidder";
pub const HB_PB_KEY: &str = "hb_pb";

/// Find a targeting key by name, creating it when absent.
///
/// Safe to call repeatedly: once the key exists no further create is issued.
pub fn get_or_create_targeting_key<S: AdServer + ?Sized>(server: &mut S, name: &str) -> Result<i64, AppError> {
    if let Some(id) = server.find_targeting_key_id_by_name(name)? {
        debug!(key = name, id, "targeting key exists");
        return Ok(id);
    }
    let id = server.create_targeting_key(name)?;
    info!(key = name, id, "created targeting key");
    Ok(id)
}

/// Name → id cache for the values of one targeting key.
#[derive(Debug, Clone)]
pub struct TargetingValueCache {
    key_name: String,
    key_id: i64,
    values: HashMap<String, i64>,
}

impl TargetingValueCache {
    /// Resolve `key_name` and load all of its existing values.
    ///
    /// The key must already exist; this never creates keys.
    pub fn load<S: AdServer + ?Sized>(server: &mut S, key_name: &str) -> Result<Self, AppError> {
        let key_id = server
            .find_targeting_key_id_by_name(key_name)?
            .ok_or_else(|| AppError::not_found(format!("Targeting key '{key_name}' does not exist.")))?;

        let mut values = HashMap::new();
        for value in server.find_targeting_values_by_key_name(key_name)? {
            values.entry(value.name).or_insert(value.id);
        }

        if values.is_empty() {
            info!(key = key_name, "targeting key exists but has no values");
        } else {
            info!(key = key_name, count = values.len(), "loaded existing targeting values");
        }

        Ok(Self {
            key_name: key_name.to_string(),
            key_id,
            values,
        })
    }

    pub fn key_id(&self) -> i64 {
        self.key_id
    }

    pub fn key_name(&self) -> &str {
        &self.key_name
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Id of the value named `name` (exact, case-sensitive), creating it on a miss.
    pub fn value_id<S: AdServer + ?Sized>(&mut self, server: &mut S, name: &str) -> Result<i64, AppError> {
        if let Some(id) = self.values.get(name) {
            return Ok(*id);
        }
        let id = server.create_targeting_value(name, self.key_id)?;
        info!(key = %self.key_name, value = name, id, "created targeting value");
        self.values.insert(name.to_string(), id);
        Ok(id)
    }
}
