//! Formatted terminal output: the pre-run preview, the setup report and
//! bucket previews.
//!
//! Formatting returns `String`s so output can be asserted on in tests; the
//! caller decides where it goes.

use crossterm::style::Stylize;

use crate::app::pipeline::SetupReport;
use crate::dfp::{HB_BIDDER_KEY, HB_PB_KEY};
use crate::io::settings::Settings;
use crate::domain::PriceBucket;
use crate::pricing::bucket_summary_string;

/// Describe what a setup run is about to create.
///
/// `styled` highlights the values with terminal colors.
pub fn format_setup_preview(settings: &Settings, prices: &[PriceBucket], styled: bool) -> String {
    let hl = |s: &str| -> String {
        if styled {
            s.bold().blue().to_string()
        } else {
            s.to_string()
        }
    };

    let mut out = String::new();
    out.push_str(&format!(
        "Going to create {} new line items.\n",
        hl(&prices.len().to_string())
    ));
    out.push_str(&format!("  Order: {}\n", hl(&settings.order_name)));
    out.push_str(&format!("  Advertiser: {}\n", hl(&settings.advertiser_name)));
    out.push_str(&format!("  Owner: {}\n", hl(&settings.user_email)));
    out.push_str(&format!(
        "  Creatives per line item: {}{}\n",
        hl(&settings.creatives_per_line_item.to_string()),
        if settings.creative_kind.is_video() { " (video)" } else { "" }
    ));
    out.push('\n');

    out.push_str("Line items will have targeting:\n");
    out.push_str(&format!(
        "  {HB_PB_KEY} = {}\n",
        hl(&bucket_summary_string(prices))
    ));
    out.push_str(&format!("  {HB_BIDDER_KEY} = {}\n", hl(&settings.bidder_code)));
    if !settings.placement_names.is_empty() {
        out.push_str(&format!("  placements = {}\n", hl(&settings.placement_names.join(", "))));
    }
    if !settings.ad_unit_names.is_empty() {
        out.push_str(&format!("  ad units = {}\n", hl(&settings.ad_unit_names.join(", "))));
    }
    let sizes: Vec<String> = settings.sizes.iter().map(ToString::to_string).collect();
    out.push_str(&format!("  sizes = {}\n", hl(&sizes.join(", "))));
    out.push_str(&format!("  currency = {}\n", hl(&settings.currency_code)));

    out
}

/// Summarize a finished (or simulated) setup.
pub fn format_setup_report(report: &SetupReport, dry_run: bool) -> String {
    let mut out = String::new();

    if dry_run {
        out.push_str("=== Dry run: nothing was created on the ad server ===\n");
    }
    out.push_str(&format!(
        "Advertiser: {} (id {}{})\n",
        report.advertiser.name,
        report.advertiser.id,
        created_tag(report.advertiser_created)
    ));
    out.push_str(&format!(
        "Order: {} (id {}{})\n",
        report.order.name,
        report.order.id,
        created_tag(report.order_created)
    ));
    out.push_str(&format!("Trafficker user id: {}\n", report.user_id));
    out.push_str(&format!(
        "Targeting keys: {HB_BIDDER_KEY}={} {HB_PB_KEY}={}\n",
        report.hb_bidder_key_id, report.hb_pb_key_id
    ));
    out.push_str(&format!("Creatives: {}\n", report.creative_ids.len()));
    out.push_str(&format!("Line items: {}\n", report.line_item_ids.len()));
    out.push_str(&format!("Associations: {}\n", report.association_count));

    if let (Some(first), Some(last)) = (report.line_items.first(), report.line_items.last()) {
        out.push_str(&format!("  first: {}\n", first.name));
        if report.line_items.len() > 1 {
            out.push_str(&format!("  last : {}\n", last.name));
        }
    }

    out.push_str(&format!(
        "\nDone! Order {} now serves {} bids.\n",
        report.order.name, report.bidder_code
    ));
    out
}

/// Preview a price ladder as a summary line, or one price per line when `all`.
pub fn format_bucket_preview(prices: &[PriceBucket], all: bool) -> String {
    let mut out = format!("{} price buckets\n", prices.len());
    if all {
        for price in prices {
            out.push_str(&price.price_string());
            out.push('\n');
        }
    } else {
        out.push_str(&bucket_summary_string(prices));
        out.push('\n');
    }
    out
}

fn created_tag(created: bool) -> &'static str {
    if created { ", created" } else { ", existing" }
}
