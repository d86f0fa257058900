//! `com.apple.wifi.known-networks.plist`: a dictionary keyed by network,
//! each value holding join timestamps, an `__OSSpecific__` block and a
//! `BSSList`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use plist::Value;

use crate::document::Fields;
use crate::models::{Network, NetworkCategory};

use super::parse_log::ParseLog;
use super::ssid::decode_utf8_ignoring;

const COLLOCATED_PREFIX: &str = "wifi.ssid.";

/// Later of the two join timestamps, or whichever one is present.
pub fn last_connected(
    joined_by_system_at: Option<DateTime<Utc>>,
    joined_by_user_at: Option<DateTime<Utc>>,
) -> Option<DateTime<Utc>> {
    match (joined_by_system_at, joined_by_user_at) {
        (Some(system), Some(user)) => Some(system.max(user)),
        (system, None) => system,
        (None, user) => user,
    }
}

/// Decode a `wifi.ssid.<hex>` collocated-group entry. Anything else is
/// passed through verbatim with a format warning.
pub fn collocated_ssid(item: &str, log: &mut ParseLog) -> String {
    let Some(payload) = item.strip_prefix(COLLOCATED_PREFIX) else {
        log.warn(format!("format seems different for CollocatedGroup string {item}"));
        return item.to_string();
    };
    match hex::decode(payload) {
        Ok(bytes) => decode_utf8_ignoring(&bytes),
        Err(err) => {
            log.warn(format!(
                "format seems different for CollocatedGroup string {item}: {err}"
            ));
            item.to_string()
        }
    }
}

pub fn read_known_networks_store(
    plist: &Value,
    source: &str,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) {
    let Some(store) = plist.as_dictionary() else {
        log.error("known networks store root is not a dictionary");
        return;
    };

    let result = store.iter().try_for_each(|(key, raw)| {
        let net = normalize_known_network(raw, source, log)
            .with_context(|| format!("known network {key}"))?;
        networks.push(net);
        Ok::<(), anyhow::Error>(())
    });
    if let Err(err) = result {
        log.error(format!("known networks batch failed: {err:#}"));
    }
}

fn normalize_known_network(raw: &Value, source: &str, log: &mut ParseLog) -> Result<Network> {
    let fields = Fields::of(raw)?;

    let name = decode_utf8_ignoring(&fields.get_or("SSID", Vec::new()));
    let joined_by_system_at = fields.date("JoinedBySystemAt");
    let joined_by_user_at = fields.date("JoinedByUserAt");

    let mut bssids = Vec::new();
    let mut collocated_group = Vec::new();
    let mut channel_history = Vec::new();
    let mut roaming_profile_type = String::new();
    let mut is_captive = false;
    let mut temporarily_disabled = false;

    if let Some(details) = fields.dictionary("__OSSpecific__") {
        bssids.extend(
            details
                .array("BSSIDList")
                .iter()
                .filter_map(|item| Fields::of(item).ok())
                .map(|item| item.text("LEAKY_AP_BSSID"))
                .filter(|bssid| !bssid.is_empty()),
        );
        for item in details.array("CollocatedGroup") {
            match item.as_string() {
                Some(item) => collocated_group.push(collocated_ssid(item, log)),
                None => log.warn("skipping non-text CollocatedGroup entry"),
            }
        }
        // Raw (timestamp, channel) pairs; this store is not reconciled.
        for item in details.array("ChannelHistory") {
            let Ok(item) = Fields::of(item) else { continue };
            let timestamp = item.display("Timestamp");
            if !timestamp.is_empty() {
                let channel = item.get_or("Channel", 0i64);
                channel_history.push(format!("({timestamp}, {channel})"));
            }
        }
        roaming_profile_type = details.display("RoamingProfileType");
        is_captive = details
            .dictionary("CaptiveProfile")
            .map(|profile| profile.flag("CaptiveNetwork"))
            .unwrap_or(false);
        temporarily_disabled = details.flag("TemporarilyDisabled");
    }

    let mut access_point_history = bssids.join(",");
    for bss in fields.array("BSSList") {
        let Ok(bss) = Fields::of(bss) else { continue };
        access_point_history.push_str(&format!(
            ",[MAC={}, {}]",
            bss.display("BSSID"),
            bss.display("LastAssociatedAt")
        ));
    }
    let access_point_history = access_point_history.trim_start_matches(',').to_string();

    Ok(Network {
        raw_identifier: name.clone(),
        name,
        category: NetworkCategory::Known,
        schema_version: 0,
        preferred_rank: None,
        security_type: fields.display("SupportedSecurityTypes"),
        roaming_profile_type,
        add_reason: fields.display("AddReason"),
        disabled: false,
        system_managed: fields.flag("SystemMode"),
        possibly_hidden: false,
        temporarily_disabled,
        closed_network: false,
        service_provider_roaming: false,
        has_passpoint: false,
        is_auto_login: false,
        is_captive,
        is_personal_hotspot: false,
        collocated_group,
        last_connected: last_connected(joined_by_system_at, joined_by_user_at),
        channel_history_summary: None,
        channel_history_others: channel_history,
        access_point_history,
        added_at: fields.date("AddedAt"),
        joined_by_system_at,
        joined_by_user_at,
        updated_at: fields.date("UpdatedAt"),
        last_discovered_at: fields.date("LastDiscoveredAt"),
        source_path: source.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use plist::Dictionary;

    fn dict(entries: Vec<(&str, Value)>) -> Value {
        let mut dict = Dictionary::new();
        for (key, value) in entries {
            dict.insert(key.to_string(), value);
        }
        Value::Dictionary(dict)
    }

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, d, 0, 0, 0).unwrap()
    }

    #[test]
    fn last_connected_prefers_the_later_join() {
        assert_eq!(last_connected(Some(day(1)), None), Some(day(1)));
        assert_eq!(last_connected(None, Some(day(2))), Some(day(2)));
        assert_eq!(last_connected(None, None), None);
        assert_eq!(last_connected(Some(day(5)), Some(day(3))), Some(day(5)));
        assert_eq!(last_connected(Some(day(3)), Some(day(5))), Some(day(5)));
    }

    #[test]
    fn text_join_dates_feed_last_connected() {
        let doc = dict(vec![(
            "wifi.network.ssid.home",
            dict(vec![
                ("SSID", Value::Data(b"home".to_vec())),
                ("JoinedBySystemAt", Value::from("2020-01-01")),
            ]),
        )]);
        let mut networks = Vec::new();
        let mut log = ParseLog::new("test");
        read_known_networks_store(&doc, "/known.plist", &mut networks, &mut log);

        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].name, "home");
        assert_eq!(networks[0].raw_identifier, "home");
        assert_eq!(networks[0].last_connected, Some(day(1)));
        assert_eq!(networks[0].joined_by_user_at, None);
        assert_eq!(networks[0].schema_version, 0);
    }

    #[test]
    fn os_specific_block_is_flattened() {
        let details = dict(vec![
            (
                "BSSIDList",
                Value::Array(vec![
                    dict(vec![("LEAKY_AP_BSSID", Value::from("aa:aa:aa:aa:aa:aa"))]),
                    dict(vec![("LEAKY_AP_BSSID", Value::from("bb:bb:bb:bb:bb:bb"))]),
                ]),
            ),
            (
                "CollocatedGroup",
                Value::Array(vec![
                    Value::from(format!("wifi.ssid.{}", hex::encode("guest"))),
                    Value::from("unexpected-format"),
                ]),
            ),
            (
                "ChannelHistory",
                Value::Array(vec![
                    dict(vec![
                        ("Channel", Value::from(6i64)),
                        ("Timestamp", Value::from("2021-02-03 04:05:06")),
                    ]),
                    dict(vec![("Channel", Value::from(11i64))]),
                ]),
            ),
            (
                "CaptiveProfile",
                dict(vec![("CaptiveNetwork", Value::from(true))]),
            ),
            ("TemporarilyDisabled", Value::from(true)),
            ("RoamingProfileType", Value::from("Single")),
        ]);
        let doc = dict(vec![(
            "wifi.network.ssid.cafe",
            dict(vec![
                ("SSID", Value::Data(b"cafe".to_vec())),
                ("__OSSpecific__", details),
                (
                    "BSSList",
                    Value::Array(vec![dict(vec![
                        ("BSSID", Value::from("cc:cc:cc:cc:cc:cc")),
                        ("LastAssociatedAt", Value::from("2021-02-03 04:05:06")),
                    ])]),
                ),
            ]),
        )]);
        let mut networks = Vec::new();
        let mut log = ParseLog::new("test");
        read_known_networks_store(&doc, "/known.plist", &mut networks, &mut log);

        let net = &networks[0];
        assert_eq!(
            net.access_point_history,
            "aa:aa:aa:aa:aa:aa,bb:bb:bb:bb:bb:bb,[MAC=cc:cc:cc:cc:cc:cc, 2021-02-03 04:05:06]"
        );
        assert_eq!(net.collocated_group, vec!["guest", "unexpected-format"]);
        assert_eq!(net.channel_history_others, vec!["(2021-02-03 04:05:06, 6)"]);
        assert_eq!(net.channel_history_summary, None);
        assert!(net.is_captive && net.temporarily_disabled);
        assert_eq!(net.roaming_profile_type, "Single");
        assert_eq!(log.count(crate::wifi::parse_log::Severity::Warning), 1);
    }

    #[test]
    fn bss_list_alone_has_no_leading_separator() {
        let doc = dict(vec![(
            "n",
            dict(vec![(
                "BSSList",
                Value::Array(vec![dict(vec![("BSSID", Value::from("dd:dd:dd:dd:dd:dd"))])]),
            )]),
        )]);
        let mut networks = Vec::new();
        let mut log = ParseLog::new("test");
        read_known_networks_store(&doc, "/known.plist", &mut networks, &mut log);
        assert_eq!(networks[0].access_point_history, "[MAC=dd:dd:dd:dd:dd:dd, ]");
        assert_eq!(networks[0].name, "");
    }

    #[test]
    fn invalid_collocated_hex_passes_through() {
        let mut log = ParseLog::new("test");
        assert_eq!(collocated_ssid("wifi.ssid.zz", &mut log), "wifi.ssid.zz");
        assert_eq!(log.count(crate::wifi::parse_log::Severity::Warning), 1);
    }

    #[test]
    fn malformed_entry_stops_the_batch() {
        let doc = dict(vec![
            ("a", dict(vec![("SSID", Value::Data(b"a".to_vec()))])),
            ("b", Value::from(1i64)),
            ("c", dict(vec![("SSID", Value::Data(b"c".to_vec()))])),
        ]);
        let mut networks = Vec::new();
        let mut log = ParseLog::new("test");
        read_known_networks_store(&doc, "/known.plist", &mut networks, &mut log);
        assert_eq!(networks.len(), 1);
        assert!(log.has_errors());
    }
}
