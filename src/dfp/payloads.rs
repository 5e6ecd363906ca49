//! Request payload builders.
//!
//! Pure functions from resolved ids + settings to the configs handed to
//! [`AdServer`](crate::dfp::AdServer) batch creates.

use crate::domain::{
    CostType, CreativeConfig, CreativeRotation, CriteriaOperator, CustomCriteria, CustomCriteriaSet, Environment,
    GoalType, InventoryTargeting, LineItemConfig, LineItemCreativeAssociation, LineItemType, LogicalOperator,
    Money, Size, Targeting,
};

/// Prebid universal creative markup served by every display creative.
pub const CREATIVE_SNIPPET: &str = include_str!("creative_snippet.html");

/// Display creatives are 1x1 and rely on size overrides to serve into any slot.
pub const DISPLAY_CREATIVE_SIZE: Size = Size::new(1, 1);

pub const VIDEO_CREATIVE_SIZE: Size = Size::new(640, 480);

pub const VIDEO_CREATIVE_DURATION_MS: u32 = 1000;

/// Which creative flavor a setup provisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreativeKind {
    Display,
    Video { vast_redirect_url: String },
}

impl CreativeKind {
    pub fn is_video(&self) -> bool {
        matches!(self, CreativeKind::Video { .. })
    }
}

/// Name of the `num`-th duplicate creative, e.g. `acme: HB My Order, #2`.
pub fn creative_name(bidder_code: &str, order_name: &str, num: usize) -> String {
    format!("{bidder_code}: HB {order_name}, #{num}")
}

pub fn creative_config(name: &str, advertiser_id: i64, kind: &CreativeKind) -> CreativeConfig {
    match kind {
        CreativeKind::Display => CreativeConfig::ThirdParty {
            name: name.to_string(),
            advertiser_id,
            snippet: CREATIVE_SNIPPET.to_string(),
            size: DISPLAY_CREATIVE_SIZE,
            safe_frame_compatible: true,
        },
        CreativeKind::Video { vast_redirect_url } => CreativeConfig::VastRedirect {
            name: name.to_string(),
            advertiser_id,
            vast_xml_url: vast_redirect_url.clone(),
            size: VIDEO_CREATIVE_SIZE,
            duration_ms: VIDEO_CREATIVE_DURATION_MS,
        },
    }
}

/// `count` identical creatives, numbered from 1.
///
/// An ad server serves each creative at most once per page, so a line item
/// needs as many copies as there are slots on the page.
pub fn duplicate_creative_configs(
    bidder_code: &str,
    order_name: &str,
    advertiser_id: i64,
    count: usize,
    kind: &CreativeKind,
) -> Vec<CreativeConfig> {
    (1..=count)
        .map(|num| creative_config(&creative_name(bidder_code, order_name, num), advertiser_id, kind))
        .collect()
}

/// Custom targeting `hb_bidder IS <bidder> AND hb_pb IS <price>`.
pub fn header_bidding_criteria(
    hb_bidder_key_id: i64,
    hb_bidder_value_id: i64,
    hb_pb_key_id: i64,
    hb_pb_value_id: i64,
) -> CustomCriteriaSet {
    CustomCriteriaSet {
        logical_operator: LogicalOperator::And,
        children: vec![
            CustomCriteria {
                key_id: hb_bidder_key_id,
                value_ids: vec![hb_bidder_value_id],
                operator: CriteriaOperator::Is,
            },
            CustomCriteria {
                key_id: hb_pb_key_id,
                value_ids: vec![hb_pb_value_id],
                operator: CriteriaOperator::Is,
            },
        ],
    }
}

/// Inputs shared by every line item of one setup.
#[derive(Debug, Clone)]
pub struct LineItemTemplate<'a> {
    pub order_id: i64,
    pub inventory: &'a InventoryTargeting,
    pub sizes: &'a [Size],
    pub currency_code: &'a str,
    pub video: bool,
}

/// One price-priority CPM line item.
pub fn line_item_config(
    template: &LineItemTemplate<'_>,
    name: String,
    cpm_micro_amount: i64,
    custom: CustomCriteriaSet,
) -> LineItemConfig {
    let environment = if template.video {
        Environment::VideoPlayer
    } else {
        Environment::Browser
    };
    let request_platforms = if template.video {
        vec![Environment::VideoPlayer]
    } else {
        Vec::new()
    };

    LineItemConfig {
        name,
        order_id: template.order_id,
        targeting: Targeting {
            inventory: template.inventory.clone(),
            custom,
            request_platforms,
        },
        line_item_type: LineItemType::PricePriority,
        cost_type: CostType::Cpm,
        cost_per_unit: Money {
            currency_code: template.currency_code.to_string(),
            micro_amount: cpm_micro_amount,
        },
        start_immediately: true,
        unlimited_end: true,
        creative_rotation: CreativeRotation::Even,
        goal_type: GoalType::None,
        environment,
        creative_placeholders: template.sizes.to_vec(),
    }
}

/// Associate every creative with every line item.
///
/// `size_overrides` is copied into each association; pass an empty slice to
/// keep the creatives' own size.
pub fn cross_associations(
    line_item_ids: &[i64],
    creative_ids: &[i64],
    size_overrides: &[Size],
) -> Vec<LineItemCreativeAssociation> {
    let mut out = Vec::with_capacity(line_item_ids.len() * creative_ids.len());
    for &line_item_id in line_item_ids {
        for &creative_id in creative_ids {
            out.push(LineItemCreativeAssociation {
                line_item_id,
                creative_id,
                sizes: size_overrides.to_vec(),
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_creatives_are_numbered_from_one() {
        let configs = duplicate_creative_configs("mypartner", "My Cool Order", 246810, 3, &CreativeKind::Display);
        let names: Vec<&str> = configs.iter().map(|c| c.name()).collect();
        assert_eq!(
            names,
            vec![
                "mypartner: HB My Cool Order, #1",
                "mypartner: HB My Cool Order, #2",
                "mypartner: HB My Cool Order, #3",
            ]
        );
        assert!(configs.iter().all(|c| c.advertiser_id() == 246810));
        match &configs[0] {
            CreativeConfig::ThirdParty {
                snippet,
                size,
                safe_frame_compatible,
                ..
            } => {
                assert_eq!(snippet, CREATIVE_SNIPPET);
                assert_eq!(*size, Size::new(1, 1));
                assert!(*safe_frame_compatible);
            }
            other => panic!("expected third-party creative, got {other:?}"),
        }
    }

    #[test]
    fn video_creatives_redirect_to_vast() {
        let kind = CreativeKind::Video {
            vast_redirect_url: "https://cache.example.com/vast?uuid=%%PATTERN:hb_uuid%%".to_string(),
        };
        match creative_config("v", 1, &kind) {
            CreativeConfig::VastRedirect {
                vast_xml_url,
                size,
                duration_ms,
                ..
            } => {
                assert!(vast_xml_url.contains("hb_uuid"));
                assert_eq!(size, Size::new(640, 480));
                assert_eq!(duration_ms, 1000);
            }
            other => panic!("expected VAST creative, got {other:?}"),
        }
    }

    #[test]
    fn line_item_carries_price_and_targeting() {
        let inventory = InventoryTargeting {
            placement_ids: vec![9876543, 1234567],
            ad_unit_ids: Vec::new(),
        };
        let sizes = [Size::new(728, 90)];
        let template = LineItemTemplate {
            order_id: 1234567,
            inventory: &inventory,
            sizes: &sizes,
            currency_code: "HUF",
            video: false,
        };
        let criteria = header_bidding_criteria(999999, 3434343434, 888888, 5656565656);
        let config = line_item_config(&template, "iamabiddr: HB $00.30".to_string(), 300_000, criteria);

        assert_eq!(config.cost_per_unit.micro_amount, 300_000);
        assert_eq!(config.cost_per_unit.currency_code, "HUF");
        assert_eq!(config.targeting.inventory.placement_ids, vec![9876543, 1234567]);
        assert_eq!(config.targeting.custom.logical_operator, LogicalOperator::And);
        assert_eq!(config.targeting.custom.children.len(), 2);
        assert_eq!(config.targeting.custom.children[0].key_id, 999999);
        assert_eq!(config.targeting.custom.children[1].value_ids, vec![5656565656]);
        assert_eq!(config.creative_placeholders, vec![Size::new(728, 90)]);
        assert_eq!(config.environment, Environment::Browser);
        assert!(config.targeting.request_platforms.is_empty());
    }

    #[test]
    fn video_line_items_target_the_video_player() {
        let inventory = InventoryTargeting::default();
        let template = LineItemTemplate {
            order_id: 1,
            inventory: &inventory,
            sizes: &[],
            currency_code: "USD",
            video: true,
        };
        let config = line_item_config(&template, "x".to_string(), 0, header_bidding_criteria(1, 2, 3, 4));
        assert_eq!(config.environment, Environment::VideoPlayer);
        assert_eq!(config.targeting.request_platforms, vec![Environment::VideoPlayer]);
    }

    #[test]
    fn associations_cover_the_cross_product() {
        let licas = cross_associations(&[987654, 7654321, 5432109], &[111222, 223344], &[]);
        assert_eq!(licas.len(), 6);
        assert_eq!((licas[0].line_item_id, licas[0].creative_id), (987654, 111222));
        assert_eq!((licas[1].line_item_id, licas[1].creative_id), (987654, 223344));
        assert_eq!((licas[5].line_item_id, licas[5].creative_id), (5432109, 223344));
        assert!(licas.iter().all(|l| l.sizes.is_empty()));
    }

    #[test]
    fn associations_carry_size_overrides() {
        let sizes = [Size::new(300, 250), Size::new(728, 90)];
        let licas = cross_associations(&[1], &[2, 3], &sizes);
        assert!(licas.iter().all(|l| l.sizes == sizes));
    }
}
