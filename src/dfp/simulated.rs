//! In-memory ad server.
//!
//! Used for `--dry-run` (seeded from the settings so every named lookup
//! resolves) and as the test double for the setup workflow. Every operation is
//! appended to a call log so callers can assert exactly which remote calls a
//! step would have made.

use crate::dfp::{AdServer, ops};
use crate::domain::{
    Advertiser, CreativeConfig, LineItemConfig, LineItemCreativeAssociation, Order, TargetingKey, TargetingValue,
};
use crate::error::AppError;

/// First id handed out; keeps simulated ids visibly distinct from counts.
const FIRST_ID: i64 = 1000;

#[derive(Debug, Clone)]
struct Named {
    id: i64,
    name: String,
}

#[derive(Debug, Clone)]
pub struct SimulatedAdServer {
    next_id: i64,
    users: Vec<Named>,
    placements: Vec<Named>,
    ad_units: Vec<Named>,
    advertisers: Vec<Advertiser>,
    orders: Vec<Order>,
    keys: Vec<TargetingKey>,
    values: Vec<TargetingValue>,
    creatives: Vec<(i64, CreativeConfig)>,
    line_items: Vec<(i64, LineItemConfig)>,
    associations: Vec<LineItemCreativeAssociation>,
    calls: Vec<&'static str>,
    failing: Option<&'static str>,
}

impl Default for SimulatedAdServer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedAdServer {
    pub fn new() -> Self {
        Self {
            next_id: FIRST_ID,
            users: Vec::new(),
            placements: Vec::new(),
            ad_units: Vec::new(),
            advertisers: Vec::new(),
            orders: Vec::new(),
            keys: Vec::new(),
            values: Vec::new(),
            creatives: Vec::new(),
            line_items: Vec::new(),
            associations: Vec::new(),
            calls: Vec::new(),
            failing: None,
        }
    }

    pub fn with_user(mut self, email: &str) -> Self {
        let id = self.allocate_id();
        self.users.push(Named {
            id,
            name: email.to_string(),
        });
        self
    }

    pub fn with_placement(mut self, name: &str) -> Self {
        let id = self.allocate_id();
        self.placements.push(Named {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_ad_unit(mut self, name: &str) -> Self {
        let id = self.allocate_id();
        self.ad_units.push(Named {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_advertiser(mut self, name: &str) -> Self {
        let id = self.allocate_id();
        self.advertisers.push(Advertiser {
            id,
            name: name.to_string(),
        });
        self
    }

    pub fn with_order(mut self, name: &str, advertiser_id: i64) -> Self {
        let id = self.allocate_id();
        self.orders.push(Order {
            id,
            name: name.to_string(),
            advertiser_id,
            trafficker_id: 0,
            status: Some("APPROVED".to_string()),
        });
        self
    }

    pub fn with_targeting_key(mut self, name: &str) -> Self {
        let id = self.allocate_id();
        self.keys.push(TargetingKey {
            id,
            name: name.to_string(),
        });
        self
    }

    /// Seed a value under an already-seeded key. Unknown keys are ignored.
    pub fn with_targeting_value(mut self, key_name: &str, value: &str) -> Self {
        if let Some(key_id) = self.key_id(key_name) {
            let id = self.allocate_id();
            self.values.push(TargetingValue {
                id,
                name: value.to_string(),
                key_id,
            });
        }
        self
    }

    /// Make every call to `operation` fail with a remote-service error.
    pub fn failing_on(mut self, operation: &'static str) -> Self {
        self.failing = Some(operation);
        self
    }

    /// Every operation issued so far, in order.
    pub fn calls(&self) -> &[&'static str] {
        &self.calls
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls.iter().filter(|c| **c == operation).count()
    }

    pub fn user_id(&self, email: &str) -> Option<i64> {
        find_named(&self.users, email)
    }

    pub fn placement_id(&self, name: &str) -> Option<i64> {
        find_named(&self.placements, name)
    }

    pub fn ad_unit_id(&self, name: &str) -> Option<i64> {
        find_named(&self.ad_units, name)
    }

    pub fn advertisers(&self) -> &[Advertiser] {
        &self.advertisers
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn creatives(&self) -> &[(i64, CreativeConfig)] {
        &self.creatives
    }

    pub fn line_items(&self) -> &[(i64, LineItemConfig)] {
        &self.line_items
    }

    pub fn associations(&self) -> &[LineItemCreativeAssociation] {
        &self.associations
    }

    pub fn targeting_value_id(&self, key_name: &str, value: &str) -> Option<i64> {
        let key_id = self.key_id(key_name)?;
        self.values
            .iter()
            .find(|v| v.key_id == key_id && v.name == value)
            .map(|v| v.id)
    }

    pub fn targeting_values(&self, key_name: &str) -> Vec<TargetingValue> {
        match self.key_id(key_name) {
            Some(key_id) => self.values.iter().filter(|v| v.key_id == key_id).cloned().collect(),
            None => Vec::new(),
        }
    }

    fn key_id(&self, name: &str) -> Option<i64> {
        self.keys.iter().find(|k| k.name == name).map(|k| k.id)
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn record(&mut self, operation: &'static str) -> Result<(), AppError> {
        self.calls.push(operation);
        if self.failing == Some(operation) {
            return Err(AppError::remote(format!("Simulated ad server failure in {operation}.")));
        }
        Ok(())
    }
}

fn find_named(items: &[Named], name: &str) -> Option<i64> {
    items.iter().find(|n| n.name == name).map(|n| n.id)
}

impl AdServer for SimulatedAdServer {
    fn find_user_id_by_email(&mut self, email: &str) -> Result<Option<i64>, AppError> {
        self.record(ops::FIND_USER)?;
        Ok(self.user_id(email))
    }

    fn find_placement_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError> {
        self.record(ops::FIND_PLACEMENT)?;
        Ok(self.placement_id(name))
    }

    fn find_ad_unit_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError> {
        self.record(ops::FIND_AD_UNIT)?;
        Ok(self.ad_unit_id(name))
    }

    fn find_advertisers_by_name(&mut self, name: &str) -> Result<Vec<Advertiser>, AppError> {
        self.record(ops::FIND_ADVERTISERS)?;
        Ok(self.advertisers.iter().filter(|a| a.name == name).cloned().collect())
    }

    fn create_advertiser(&mut self, name: &str) -> Result<Advertiser, AppError> {
        self.record(ops::CREATE_ADVERTISER)?;
        let advertiser = Advertiser {
            id: self.allocate_id(),
            name: name.to_string(),
        };
        self.advertisers.push(advertiser.clone());
        Ok(advertiser)
    }

    fn find_orders_by_name(&mut self, name: &str) -> Result<Vec<Order>, AppError> {
        self.record(ops::FIND_ORDERS)?;
        Ok(self.orders.iter().filter(|o| o.name == name).cloned().collect())
    }

    fn create_order(&mut self, name: &str, advertiser_id: i64, trafficker_id: i64) -> Result<Order, AppError> {
        self.record(ops::CREATE_ORDER)?;
        let order = Order {
            id: self.allocate_id(),
            name: name.to_string(),
            advertiser_id,
            trafficker_id,
            status: Some("DRAFT".to_string()),
        };
        self.orders.push(order.clone());
        Ok(order)
    }

    fn create_creatives(&mut self, creatives: &[CreativeConfig]) -> Result<Vec<i64>, AppError> {
        self.record(ops::CREATE_CREATIVES)?;
        let mut ids = Vec::with_capacity(creatives.len());
        for creative in creatives {
            let id = self.allocate_id();
            self.creatives.push((id, creative.clone()));
            ids.push(id);
        }
        Ok(ids)
    }

    fn find_targeting_key_id_by_name(&mut self, name: &str) -> Result<Option<i64>, AppError> {
        self.record(ops::FIND_TARGETING_KEY)?;
        Ok(self.key_id(name))
    }

    fn create_targeting_key(&mut self, name: &str) -> Result<i64, AppError> {
        self.record(ops::CREATE_TARGETING_KEY)?;
        if self.key_id(name).is_some() {
            return Err(AppError::remote(format!("Targeting key '{name}' already exists.")));
        }
        let id = self.allocate_id();
        self.keys.push(TargetingKey {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    fn find_targeting_values_by_key_name(&mut self, key_name: &str) -> Result<Vec<TargetingValue>, AppError> {
        self.record(ops::FIND_TARGETING_VALUES)?;
        Ok(self.targeting_values(key_name))
    }

    fn create_targeting_value(&mut self, name: &str, key_id: i64) -> Result<i64, AppError> {
        self.record(ops::CREATE_TARGETING_VALUE)?;
        if !self.keys.iter().any(|k| k.id == key_id) {
            return Err(AppError::remote(format!("Unknown targeting key id {key_id}.")));
        }
        if self.values.iter().any(|v| v.key_id == key_id && v.name == name) {
            return Err(AppError::remote(format!(
                "Targeting value '{name}' already exists for key {key_id}."
            )));
        }
        let id = self.allocate_id();
        self.values.push(TargetingValue {
            id,
            name: name.to_string(),
            key_id,
        });
        Ok(id)
    }

    fn create_line_items(&mut self, line_items: &[LineItemConfig]) -> Result<Vec<i64>, AppError> {
        self.record(ops::CREATE_LINE_ITEMS)?;
        // A batch is created whole or not at all.
        if let Some(orphan) = line_items
            .iter()
            .find(|li| !self.orders.iter().any(|o| o.id == li.order_id))
        {
            return Err(AppError::remote(format!(
                "Line item '{}' references unknown order {}.",
                orphan.name, orphan.order_id
            )));
        }

        let mut ids = Vec::with_capacity(line_items.len());
        for line_item in line_items {
            let id = self.allocate_id();
            self.line_items.push((id, line_item.clone()));
            ids.push(id);
        }
        Ok(ids)
    }

    fn create_line_item_creative_associations(
        &mut self,
        associations: &[LineItemCreativeAssociation],
    ) -> Result<usize, AppError> {
        self.record(ops::CREATE_ASSOCIATIONS)?;
        self.associations.extend_from_slice(associations);
        Ok(associations.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_entities_resolve_by_exact_name() {
        let mut server = SimulatedAdServer::new()
            .with_user("trafficker@example.com")
            .with_placement("Leaderboard");
        assert!(server.find_user_id_by_email("trafficker@example.com").unwrap().is_some());
        assert!(server.find_user_id_by_email("TRAFFICKER@example.com").unwrap().is_none());
        assert!(server.find_placement_id_by_name("Leaderboard").unwrap().is_some());
        assert_eq!(server.calls(), &[ops::FIND_USER, ops::FIND_USER, ops::FIND_PLACEMENT]);
    }

    #[test]
    fn ids_are_unique_and_order_preserving() {
        let mut server = SimulatedAdServer::new().with_advertiser("Adv").with_user("u@example.com");
        let order = server.create_order("Order", 1000, 1001).unwrap();
        let configs = vec![
            crate::dfp::payloads::creative_config("a", 1000, &crate::dfp::payloads::CreativeKind::Display),
            crate::dfp::payloads::creative_config("b", 1000, &crate::dfp::payloads::CreativeKind::Display),
        ];
        let ids = server.create_creatives(&configs).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids[0] < ids[1]);
        assert!(ids[0] > order.id);
        assert_eq!(server.creatives()[1].1.name(), "b");
    }

    #[test]
    fn injected_failures_surface_as_remote_errors() {
        let mut server = SimulatedAdServer::new().failing_on(ops::CREATE_ORDER);
        let err = server.create_order("Order", 1, 2).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RemoteService);
        assert!(server.orders().is_empty());
    }

    #[test]
    fn line_item_batch_with_an_unknown_order_creates_nothing() {
        use crate::dfp::payloads::{LineItemTemplate, header_bidding_criteria, line_item_config};
        use crate::domain::InventoryTargeting;

        let mut server = SimulatedAdServer::new();
        let order = server.create_order("Order", 1, 2).unwrap();
        let inventory = InventoryTargeting::default();
        let line_item = |order_id, name: &str| {
            let template = LineItemTemplate {
                order_id,
                inventory: &inventory,
                sizes: &[],
                currency_code: "USD",
                video: false,
            };
            line_item_config(&template, name.to_string(), 100_000, header_bidding_criteria(1, 2, 3, 4))
        };

        let batch = vec![line_item(order.id, "valid"), line_item(order.id + 999, "orphan")];
        let err = server.create_line_items(&batch).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::RemoteService);
        assert!(err.message().contains("orphan"));
        assert!(server.line_items().is_empty());

        let ids = server.create_line_items(&batch[..1]).unwrap();
        assert_eq!(server.line_items().len(), 1);
        assert_eq!(server.line_items()[0].0, ids[0]);
    }
}
