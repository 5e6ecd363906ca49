//! Partner setup workflow shared by `setup` and `setup --dry-run`.
//!
//! resolve user -> resolve targets -> advertiser -> order -> creatives ->
//! targeting keys -> line items -> associations
//!
//! The workflow only sees the [`AdServer`] trait, so the real gateway and the
//! simulated backend run the exact same steps. A failure mid-way stops the
//! run; anything already created stays on the ad server.

use serde::Serialize;
use tracing::{debug, info};

use crate::dfp::{
    AdServer, CreativeKind, HB_BIDDER_KEY, HB_PB_KEY, LineItemTemplate, TargetingValueCache, cross_associations,
    duplicate_creative_configs, get_or_create_targeting_key, header_bidding_criteria, line_item_config,
};
use crate::domain::{Advertiser, InventoryTargeting, LineItemConfig, Order, PriceBucket, Size};
use crate::error::AppError;
use crate::io::settings::Settings;

/// Everything a setup run resolved or created.
#[derive(Debug, Clone, Serialize)]
pub struct SetupReport {
    pub bidder_code: String,
    pub user_id: i64,
    pub placement_ids: Vec<i64>,
    pub ad_unit_ids: Vec<i64>,
    pub advertiser: Advertiser,
    pub advertiser_created: bool,
    pub order: Order,
    pub order_created: bool,
    pub creative_ids: Vec<i64>,
    pub hb_bidder_key_id: i64,
    pub hb_pb_key_id: i64,
    pub line_item_ids: Vec<i64>,
    pub line_items: Vec<LineItemConfig>,
    pub association_count: usize,
}

/// Run the full setup for one bidder against `server`.
///
/// `prices` is the merged bucket sequence from the settings' price buckets;
/// every bucket becomes one line item.
pub fn setup_partner<S: AdServer + ?Sized>(
    server: &mut S,
    settings: &Settings,
    prices: &[PriceBucket],
) -> Result<SetupReport, AppError> {
    let user_id = server
        .find_user_id_by_email(&settings.user_email)?
        .ok_or_else(|| AppError::not_found(format!("User not found: {}", settings.user_email)))?;
    info!(user_id, email = %settings.user_email, "resolved trafficker");

    let inventory = resolve_inventory(server, settings)?;

    let (advertiser, advertiser_created) = resolve_advertiser(server, settings)?;
    let (order, order_created) = resolve_order(server, settings, advertiser.id, user_id)?;

    let creatives = duplicate_creative_configs(
        &settings.bidder_code,
        &settings.order_name,
        advertiser.id,
        settings.creatives_per_line_item,
        &settings.creative_kind,
    );
    let creative_ids = server.create_creatives(&creatives)?;
    info!(count = creative_ids.len(), "created creatives");

    let hb_bidder_key_id = get_or_create_targeting_key(server, HB_BIDDER_KEY)?;
    let hb_pb_key_id = get_or_create_targeting_key(server, HB_PB_KEY)?;

    let line_items = create_line_item_configs(server, settings, prices, order.id, &inventory)?;
    let line_item_ids = server.create_line_items(&line_items)?;
    info!(count = line_item_ids.len(), order_id = order.id, "created line items");

    // 1x1 third-party creatives need the slot sizes as overrides; VAST creatives keep their own.
    let size_overrides: &[Size] = match settings.creative_kind {
        CreativeKind::Display => settings.sizes.as_slice(),
        CreativeKind::Video { .. } => &[],
    };
    let associations = cross_associations(&line_item_ids, &creative_ids, size_overrides);
    let association_count = server.create_line_item_creative_associations(&associations)?;
    info!(count = association_count, "associated creatives with line items");

    Ok(SetupReport {
        bidder_code: settings.bidder_code.clone(),
        user_id,
        placement_ids: inventory.placement_ids,
        ad_unit_ids: inventory.ad_unit_ids,
        advertiser,
        advertiser_created,
        order,
        order_created,
        creative_ids,
        hb_bidder_key_id,
        hb_pb_key_id,
        line_item_ids,
        line_items,
        association_count,
    })
}

/// Build one line item config per price.
///
/// Assumes the `hb_bidder` and `hb_pb` keys exist. The bidder value is
/// resolved once; each price value is created on first use.
pub fn create_line_item_configs<S: AdServer + ?Sized>(
    server: &mut S,
    settings: &Settings,
    prices: &[PriceBucket],
    order_id: i64,
    inventory: &InventoryTargeting,
) -> Result<Vec<LineItemConfig>, AppError> {
    let mut bidder_values = TargetingValueCache::load(server, HB_BIDDER_KEY)?;
    let mut price_values = TargetingValueCache::load(server, HB_PB_KEY)?;
    let bidder_value_id = bidder_values.value_id(server, &settings.bidder_code)?;

    let template = LineItemTemplate {
        order_id,
        inventory,
        sizes: &settings.sizes,
        currency_code: &settings.currency_code,
        video: settings.creative_kind.is_video(),
    };

    let mut configs = Vec::with_capacity(prices.len());
    for bucket in prices {
        let price_str = bucket.price_string();
        let price_value_id = price_values.value_id(server, &price_str)?;
        let name = settings.line_item_name_format.render(&settings.bidder_code, &price_str);
        debug!(%name, price_micros = bucket.micro_amount, "line item");

        let criteria =
            header_bidding_criteria(bidder_values.key_id(), bidder_value_id, price_values.key_id(), price_value_id);
        configs.push(line_item_config(&template, name, bucket.micro_amount, criteria));
    }

    Ok(configs)
}

fn resolve_inventory<S: AdServer + ?Sized>(server: &mut S, settings: &Settings) -> Result<InventoryTargeting, AppError> {
    if settings.target_count() == 0 {
        return Err(AppError::config("No placements or ad units to target."));
    }

    let mut placement_ids = Vec::with_capacity(settings.placement_names.len());
    for name in &settings.placement_names {
        let id = server
            .find_placement_id_by_name(name)?
            .ok_or_else(|| AppError::not_found(format!("Placement not found: {name}")))?;
        placement_ids.push(id);
    }

    let mut ad_unit_ids = Vec::with_capacity(settings.ad_unit_names.len());
    for name in &settings.ad_unit_names {
        let id = server
            .find_ad_unit_id_by_name(name)?
            .ok_or_else(|| AppError::not_found(format!("Ad unit not found: {name}")))?;
        ad_unit_ids.push(id);
    }

    info!(placements = ?placement_ids, ad_units = ?ad_unit_ids, "resolved targets");
    Ok(InventoryTargeting {
        placement_ids,
        ad_unit_ids,
    })
}

fn resolve_advertiser<S: AdServer + ?Sized>(
    server: &mut S,
    settings: &Settings,
) -> Result<(Advertiser, bool), AppError> {
    let name = &settings.advertiser_name;
    let mut found = server.find_advertisers_by_name(name)?;

    match found.len() {
        0 if settings.create_advertiser_if_missing => {
            let advertiser = server.create_advertiser(name)?;
            info!(id = advertiser.id, %name, "created advertiser");
            Ok((advertiser, true))
        }
        0 => Err(AppError::not_found(format!(
            "Advertiser not found: {name}. Set dfp.create_advertiser_if_missing to create it."
        ))),
        1 => {
            let advertiser = found.remove(0);
            info!(id = advertiser.id, %name, "using existing advertiser");
            Ok((advertiser, false))
        }
        n => Err(AppError::conflict(format!("{n} advertisers are named {name}; expected one."))),
    }
}

fn resolve_order<S: AdServer + ?Sized>(
    server: &mut S,
    settings: &Settings,
    advertiser_id: i64,
    trafficker_id: i64,
) -> Result<(Order, bool), AppError> {
    let name = &settings.order_name;
    let mut found = server.find_orders_by_name(name)?;

    match found.len() {
        0 => {
            let order = server.create_order(name, advertiser_id, trafficker_id)?;
            info!(id = order.id, %name, "created order");
            Ok((order, true))
        }
        1 if settings.use_existing_order => {
            let order = found.remove(0);
            info!(id = order.id, %name, status = ?order.status, "using existing order");
            Ok((order, false))
        }
        1 => Err(AppError::conflict(format!(
            "An order named {name} already exists. Set dfp.use_existing_order to add line items to it."
        ))),
        n => Err(AppError::conflict(format!("{n} orders are named {name}; expected at most one."))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dfp::{SimulatedAdServer, ops};
    use crate::domain::{Environment, LogicalOperator};
    use crate::error::ErrorKind;

    fn acme_settings(extra_dfp: &str) -> Settings {
        Settings::from_toml_str(&format!(
            r#"
            [dfp]
            user_email = "trafficker@example.com"
            advertiser_name = "Prebid"
            order_name = "Prebid: acme"
            placement_names = ["Leaderboard"]
            placement_sizes = [{{ width = 728, height = 90 }}]
            {extra_dfp}

            [prebid]
            bidder_code = "acme"
            price_buckets = {{ precision = 2, min = 0, max = 0.30, increment = 0.10 }}
            "#
        ))
        .unwrap()
    }

    fn seeded_server() -> SimulatedAdServer {
        SimulatedAdServer::new()
            .with_user("trafficker@example.com")
            .with_placement("Leaderboard")
            .with_advertiser("Prebid")
    }

    fn run(server: &mut SimulatedAdServer, settings: &Settings) -> Result<SetupReport, AppError> {
        let prices = settings.price_buckets.sequence().unwrap();
        setup_partner(server, settings, &prices)
    }

    #[test]
    fn acme_setup_creates_one_line_item_per_bucket() {
        let settings = acme_settings("");
        let prices = settings.price_buckets.sequence().unwrap();
        let micros: Vec<i64> = prices.iter().map(|p| p.micro_amount).collect();
        assert_eq!(micros, vec![0, 100_000, 200_000, 300_000]);

        let mut server = seeded_server();
        let report = setup_partner(&mut server, &settings, &prices).unwrap();

        let names: Vec<&str> = report.line_items.iter().map(|li| li.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["acme: HB $0.00", "acme: HB $0.10", "acme: HB $0.20", "acme: HB $0.30"]
        );
        let costs: Vec<i64> = report.line_items.iter().map(|li| li.cost_per_unit.micro_amount).collect();
        assert_eq!(costs, micros);

        let hb_pb_values: Vec<String> = server.targeting_values(HB_PB_KEY).into_iter().map(|v| v.name).collect();
        assert_eq!(hb_pb_values, vec!["0.00", "0.10", "0.20", "0.30"]);

        for (li, price) in report.line_items.iter().zip(["0.00", "0.10", "0.20", "0.30"]) {
            let custom = &li.targeting.custom;
            assert_eq!(custom.logical_operator, LogicalOperator::And);
            assert_eq!(custom.children.len(), 2);
            assert_eq!(custom.children[0].key_id, report.hb_bidder_key_id);
            assert_eq!(
                custom.children[0].value_ids,
                vec![server.targeting_value_id(HB_BIDDER_KEY, "acme").unwrap()]
            );
            assert_eq!(custom.children[1].key_id, report.hb_pb_key_id);
            assert_eq!(
                custom.children[1].value_ids,
                vec![server.targeting_value_id(HB_PB_KEY, price).unwrap()]
            );
            assert_eq!(
                crate::pricing::number_to_micro_amount(price.parse().unwrap(), 2),
                li.cost_per_unit.micro_amount
            );
            assert_eq!(li.order_id, report.order.id);
            assert_eq!(li.targeting.inventory.placement_ids, report.placement_ids);
        }

        assert!(report.order_created);
        assert!(!report.advertiser_created);
        assert_eq!(report.creative_ids.len(), 1);
        assert_eq!(report.line_item_ids.len(), 4);
        assert_eq!(report.association_count, 4);
        assert!(server.associations().iter().all(|a| a.sizes == vec![Size::new(728, 90)]));
        assert_eq!(server.call_count(ops::CREATE_LINE_ITEMS), 1);
    }

    #[test]
    fn bidder_value_is_created_once_and_existing_prices_are_reused() {
        let settings = acme_settings("");
        let mut server = seeded_server()
            .with_targeting_key(HB_PB_KEY)
            .with_targeting_value(HB_PB_KEY, "0.10")
            .with_targeting_value(HB_PB_KEY, "0.20");

        run(&mut server, &settings).unwrap();

        // "acme" for hb_bidder, then "0.00" and "0.30" for hb_pb.
        assert_eq!(server.call_count(ops::CREATE_TARGETING_VALUE), 3);
        assert_eq!(server.call_count(ops::CREATE_TARGETING_KEY), 1);
        assert_eq!(server.call_count(ops::FIND_TARGETING_VALUES), 2);
    }

    #[test]
    fn rerun_with_existing_order_creates_no_new_targeting() {
        let settings = acme_settings("use_existing_order = true");
        let mut server = seeded_server();
        run(&mut server, &settings).unwrap();
        let values_before = server.call_count(ops::CREATE_TARGETING_VALUE);

        let report = run(&mut server, &settings).unwrap();
        assert!(!report.order_created);
        assert_eq!(server.call_count(ops::CREATE_TARGETING_VALUE), values_before);
        assert_eq!(server.call_count(ops::CREATE_TARGETING_KEY), 2);
        assert_eq!(server.orders().len(), 1);
    }

    #[test]
    fn missing_bucket_max_is_a_configuration_error() {
        let err = Settings::from_toml_str(
            r#"
            [dfp]
            user_email = "trafficker@example.com"
            advertiser_name = "Prebid"
            order_name = "Prebid: acme"
            placement_names = ["Leaderboard"]

            [prebid]
            bidder_code = "acme"
            price_buckets = { precision = 2, min = 0, increment = 0.10 }
            "#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.message().contains("max"));
    }

    #[test]
    fn mixed_precision_ladders_keep_their_own_price_strings() {
        let settings = Settings::from_toml_str(
            r#"
            [dfp]
            user_email = "trafficker@example.com"
            advertiser_name = "Prebid"
            order_name = "Prebid: acme"
            placement_names = ["Leaderboard"]

            [prebid]
            bidder_code = "acme"
            price_buckets = [
                { precision = 2, min = 0, max = 1, increment = 0.5 },
                { precision = 3, min = 1, max = 1.01, increment = 0.005 },
            ]
            "#,
        )
        .unwrap();
        let mut server = seeded_server();
        let report = run(&mut server, &settings).unwrap();

        let names: Vec<&str> = report.line_items.iter().map(|li| li.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["acme: HB $0.00", "acme: HB $0.50", "acme: HB $1.000", "acme: HB $1.005", "acme: HB $1.010"]
        );
        let hb_pb_values: Vec<String> = server.targeting_values(HB_PB_KEY).into_iter().map(|v| v.name).collect();
        assert!(hb_pb_values.contains(&"0.50".to_string()));
        assert!(!hb_pb_values.contains(&"0.500".to_string()));
        assert_eq!(report.line_items[3].cost_per_unit.micro_amount, 1_005_000);
    }

    #[test]
    fn unknown_user_is_not_found() {
        let settings = acme_settings("");
        let mut server = SimulatedAdServer::new().with_placement("Leaderboard");
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(server.calls(), &[ops::FIND_USER]);
    }

    #[test]
    fn unknown_placement_or_ad_unit_is_not_found() {
        let settings = acme_settings("");
        let mut server = SimulatedAdServer::new().with_user("trafficker@example.com");
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.message().contains("Leaderboard"));

        let settings = acme_settings("ad_unit_names = [\"Sidebar\"]");
        let mut server = seeded_server();
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.message().contains("Sidebar"));
        assert_eq!(server.call_count(ops::CREATE_ORDER), 0);
    }

    #[test]
    fn missing_advertiser_is_created_only_when_allowed() {
        let settings = acme_settings("");
        let mut server = SimulatedAdServer::new()
            .with_user("trafficker@example.com")
            .with_placement("Leaderboard");
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(server.call_count(ops::CREATE_ADVERTISER), 0);

        let settings = acme_settings("create_advertiser_if_missing = true");
        let report = run(&mut server, &settings).unwrap();
        assert!(report.advertiser_created);
        assert_eq!(server.advertisers().len(), 1);
    }

    #[test]
    fn duplicate_advertisers_conflict() {
        let settings = acme_settings("");
        let mut server = seeded_server().with_advertiser("Prebid");
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn existing_order_conflicts_unless_reuse_is_allowed() {
        let settings = acme_settings("");
        let mut server = seeded_server().with_order("Prebid: acme", 1);
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(server.call_count(ops::CREATE_CREATIVES), 0);

        let settings = acme_settings("use_existing_order = true");
        let mut server = seeded_server()
            .with_order("Prebid: acme", 1)
            .with_order("Prebid: acme", 1);
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn remote_failure_stops_without_rollback() {
        let settings = acme_settings("");
        let mut server = seeded_server().failing_on(ops::CREATE_LINE_ITEMS);
        let err = run(&mut server, &settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RemoteService);

        assert_eq!(server.orders().len(), 1);
        assert_eq!(server.creatives().len(), 1);
        assert!(server.line_items().is_empty());
        assert_eq!(server.call_count(ops::CREATE_ASSOCIATIONS), 0);
    }

    #[test]
    fn creatives_follow_configured_count() {
        let settings = acme_settings("creatives_per_line_item = 3");
        let mut server = seeded_server();
        let report = run(&mut server, &settings).unwrap();
        assert_eq!(report.creative_ids.len(), 3);
        assert_eq!(report.association_count, 12);
        assert_eq!(server.creatives()[2].1.name(), "acme: HB Prebid: acme, #3");
    }

    #[test]
    fn video_setup_targets_the_player_without_size_overrides() {
        let settings = acme_settings("video = true\nvast_redirect_url = \"https://cache.example.com/vast\"");
        let mut server = seeded_server();
        let report = run(&mut server, &settings).unwrap();
        assert!(report.line_items.iter().all(|li| li.environment == Environment::VideoPlayer));
        assert!(server.associations().iter().all(|a| a.sizes.is_empty()));
    }

    #[test]
    fn custom_name_format_and_currency_flow_into_line_items() {
        let settings = acme_settings("currency_code = \"EUR\"\nline_item_name_format = \"{bidder_code}: HB ${price:0>5}\"");
        let mut server = seeded_server();
        let report = run(&mut server, &settings).unwrap();
        assert_eq!(report.line_items[1].name, "acme: HB $00.10");
        assert!(report.line_items.iter().all(|li| li.cost_per_unit.currency_code == "EUR"));
    }
}
