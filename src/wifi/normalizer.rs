//! Maps one airport-preferences network dictionary onto [`Network`].

use anyhow::Result;
use plist::Value;

use crate::document::Fields;
use crate::models::{Network, NetworkCategory};
use crate::settings::ChannelTrailStyle;

use super::channel_history::{reconcile_raw, ChannelHistory};
use super::parse_log::ParseLog;
use super::ssid::readable_ssids;

/// Where a raw record came from; shared by every entry of one batch.
#[derive(Debug, Clone, Copy)]
pub struct NetworkOrigin<'a> {
    pub category: NetworkCategory,
    pub schema_version: i64,
    pub source: &'a str,
    pub trail_style: ChannelTrailStyle,
}

/// Name and rank resolved by the caller from the record's key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub name: String,
    pub preferred_rank: Option<i64>,
}

pub fn normalize_entry(
    raw: &Value,
    identity: Identity,
    origin: &NetworkOrigin<'_>,
    log: &mut ParseLog,
) -> Result<Network> {
    let fields = Fields::of(raw)?;

    let collocated_group = readable_ssids(
        fields.array("CollocatedGroup"),
        origin.schema_version,
        log,
    );
    let channel_history = match fields.require_array("ChannelHistory") {
        Ok(Some(items)) => reconcile_raw(items, origin.trail_style, log),
        Ok(None) => ChannelHistory::default(),
        Err(err) => {
            log.error(format!("could not parse channel history: {err}"));
            ChannelHistory::default()
        }
    };

    Ok(Network {
        name: identity.name,
        raw_identifier: fields.text("SSIDString"),
        category: origin.category,
        schema_version: origin.schema_version,
        preferred_rank: identity.preferred_rank,
        security_type: fields.display("SecurityType"),
        roaming_profile_type: fields.display("RoamingProfileType"),
        add_reason: String::new(),
        disabled: fields.flag("Disabled"),
        system_managed: fields.flag("SystemMode"),
        possibly_hidden: fields.flag("PossiblyHiddenNetwork"),
        temporarily_disabled: fields.flag("TemporarilyDisabled"),
        closed_network: fields.flag("Closed"),
        service_provider_roaming: fields.flag("SPRoaming"),
        has_passpoint: fields.flag("Passpoint"),
        is_auto_login: fields.flag("AutoLogin"),
        is_captive: fields.flag("Captive"),
        is_personal_hotspot: fields.flag("PersonalHotspot"),
        collocated_group,
        last_connected: fields.date("LastConnected"),
        channel_history_summary: channel_history.summary,
        channel_history_others: channel_history.trail,
        access_point_history: access_point_history(&fields),
        added_at: None,
        joined_by_system_at: None,
        joined_by_user_at: None,
        updated_at: None,
        last_discovered_at: None,
        source_path: origin.source.to_string(),
    })
}

/// `BSSIDHistory` (schema 1900) as `[MAC=<id>, <timestamp>]` pairs written
/// back to back with no separator.
fn access_point_history(fields: &Fields<'_>) -> String {
    fields
        .array("BSSIDHistory")
        .iter()
        .filter_map(|item| Fields::of(item).ok())
        .map(|item| {
            format!(
                "[MAC={}, {}]",
                item.display("BSSID"),
                item.display("Timestamp")
            )
        })
        .collect()
}
