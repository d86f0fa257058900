//! Airport preferences store: schema-generation dispatch and update-history
//! recovery.
//!
//! Version 12 and 14 documents (and documents with no version at all) keep a
//! flat `RememberedNetworks` list. Later generations key `KnownNetworks` by
//! wrapped SSID, rank them through `PreferredOrder`, and archive the previous
//! layout inside `UpdateHistory[*].Previous`.

use std::collections::HashMap;

use anyhow::{Context, Result};
use plist::{Dictionary, Value};

use crate::document::Fields;
use crate::models::{Network, NetworkCategory};
use crate::settings::ExtractorSettings;

use super::normalizer::{normalize_entry, Identity, NetworkOrigin};
use super::parse_log::ParseLog;
use super::ssid::readable_ssid;

/// Newest generation that still uses the flat `RememberedNetworks` list.
pub const LEGACY_MAX_VERSION: i64 = 14;

/// Decoded name → 1-based rank. The first occurrence of a name wins.
pub fn preferred_order_ranks(
    raw_order: &[Value],
    schema_version: i64,
    log: &mut ParseLog,
) -> HashMap<String, i64> {
    let mut ranks = HashMap::new();
    for (position, raw) in raw_order.iter().enumerate() {
        let name = readable_ssid(raw.as_string().unwrap_or_default(), schema_version, log);
        ranks.entry(name).or_insert(position as i64 + 1);
    }
    ranks
}

pub fn read_airport_preferences(
    plist: &Value,
    source: &str,
    settings: &ExtractorSettings,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) {
    let root = match Fields::of(plist) {
        Ok(root) => root,
        Err(err) => {
            log.error(format!("airport preferences root is malformed: {err}"));
            return;
        }
    };

    let version = root.get_or("Version", 0i64);
    log.debug(format!("airport preferences version is {version}"));
    if version == 0 && !source.ends_with(settings.backup_suffix.as_str()) {
        log.error("could not find the airport preferences version number");
    }

    let origin = NetworkOrigin {
        category: NetworkCategory::Known,
        schema_version: version,
        source,
        trail_style: settings.channel_trail,
    };

    if version <= LEGACY_MAX_VERSION {
        match root.require_array("RememberedNetworks") {
            Ok(Some(remembered)) => read_remembered_batch(remembered, &origin, networks, log),
            Ok(None) => log.debug("RememberedNetworks not found"),
            Err(err) => log.error(format!("remembered networks batch failed: {err}")),
        }
        return;
    }

    read_known_networks(&root, &origin, networks, log);

    let history = match root.require_array("UpdateHistory") {
        Ok(history) => history.unwrap_or_default(),
        Err(err) => {
            log.error(format!("update history batch failed: {err}"));
            return;
        }
    };
    for (index, history_item) in history.iter().enumerate() {
        if let Err(err) = read_update_snapshot(history_item, &origin, networks, log) {
            log.error(format!("update history snapshot {index} failed: {err:#}"));
        }
    }
}

/// `RememberedNetworks` list. Entries carry no key, so no name or rank.
fn read_remembered_batch(
    remembered: &[Value],
    origin: &NetworkOrigin<'_>,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) {
    let result = remembered.iter().enumerate().try_for_each(|(i, raw)| {
        let net = normalize_entry(raw, Identity::default(), origin, log)
            .with_context(|| format!("remembered network {i}"))?;
        networks.push(net);
        Ok::<(), anyhow::Error>(())
    });
    if let Err(err) = result {
        log.error(format!("remembered networks batch failed: {err:#}"));
    }
}

/// `KnownNetworks` plus its `PreferredOrder`, read from `container` (the
/// document root or an archived `Previous` block).
fn read_known_networks(
    container: &Fields<'_>,
    origin: &NetworkOrigin<'_>,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) {
    let order: &[Value] = match container.require_array("PreferredOrder") {
        Ok(order) => order.unwrap_or_default(),
        Err(err) => {
            log.error(format!("preferred order is unreadable, networks stay unranked: {err}"));
            &[]
        }
    };
    let ranks = preferred_order_ranks(order, origin.schema_version, log);

    let known = match container.require_dictionary("KnownNetworks") {
        Ok(Some(known)) => known,
        Ok(None) => return,
        Err(err) => {
            log.error(format!("known networks batch failed: {err}"));
            return;
        }
    };

    if let Err(err) = read_known_batch(known, &ranks, origin, networks, log) {
        log.error(format!("known networks batch failed: {err:#}"));
    }
}

fn read_known_batch(
    known: &Dictionary,
    ranks: &HashMap<String, i64>,
    origin: &NetworkOrigin<'_>,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) -> Result<()> {
    for (key, raw) in known.iter() {
        let name = readable_ssid(key, origin.schema_version, log);
        let identity = Identity {
            preferred_rank: ranks.get(&name).copied(),
            name,
        };
        let net = normalize_entry(raw, identity, origin, log)
            .with_context(|| format!("known network {key}"))?;
        networks.push(net);
    }
    Ok(())
}

fn read_update_snapshot(
    history_item: &Value,
    current: &NetworkOrigin<'_>,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) -> Result<()> {
    let item = Fields::of(history_item)?;
    log.debug(format!(
        "update history timestamp is {}",
        item.display("Timestamp")
    ));

    let Some(previous) = item.require_dictionary("Previous")? else {
        return Ok(());
    };
    if previous.is_empty() {
        return Ok(());
    }
    let previous = Fields::new(previous);

    let prev_version = previous.get_or("Version", 0i64);
    log.info(format!("update history version is {prev_version}"));

    let origin = NetworkOrigin {
        category: NetworkCategory::PreviouslyRemembered,
        schema_version: prev_version,
        ..*current
    };

    match previous.require_array("RememberedNetworks") {
        Ok(Some(remembered)) => read_remembered_batch(remembered, &origin, networks, log),
        Ok(None) => {}
        Err(err) => log.error(format!("previous remembered networks batch failed: {err}")),
    }
    read_known_networks(&previous, &origin, networks, log);
    Ok(())
}
