use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use plist::Value;

use crate::document::{kind_of, Fields};
use crate::models::ChannelObservation;
use crate::settings::ChannelTrailStyle;

use super::parse_log::ParseLog;

pub const CHANNEL_TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Most recent observation plus a readable trail of the others.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelHistory {
    pub summary: Option<ChannelObservation>,
    pub trail: Vec<String>,
}

pub fn format_channel_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(CHANNEL_TIMESTAMP_FORMAT).to_string()
}

/// `(YYYY/MM/DD HH:MM:SS, channel)`
pub fn format_observation(observation: &ChannelObservation) -> String {
    format!(
        "({}, {})",
        format_channel_timestamp(&observation.timestamp),
        observation.channel
    )
}

/// Index of the entry treated as most recent.
///
/// Entries are not assumed sorted. The scan moves to `i + 1` whenever entry
/// `i + 1` is strictly newer than entry `i`, so the result is the last point
/// where the sequence stepped forward in time rather than the global maximum.
pub fn latest_index(entries: &[ChannelObservation]) -> Option<usize> {
    let timestamps: Vec<DateTime<Utc>> = entries.iter().map(|entry| entry.timestamp).collect();
    scan_latest(&timestamps)
}

fn scan_latest(timestamps: &[DateTime<Utc>]) -> Option<usize> {
    if timestamps.is_empty() {
        return None;
    }
    let mut high = 0;
    for (i, pair) in timestamps.windows(2).enumerate() {
        if pair[0] < pair[1] {
            high = i + 1;
        }
    }
    Some(high)
}

pub fn reconcile(entries: &[ChannelObservation], style: ChannelTrailStyle) -> ChannelHistory {
    let Some(high) = latest_index(entries) else {
        return ChannelHistory::default();
    };
    let chosen = entries[high];

    let trail = entries
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != high)
        .map(|(_, own)| match style {
            // Every line repeats the chosen entry; kept for report compatibility.
            ChannelTrailStyle::ChosenEntry => format_observation(&chosen),
            ChannelTrailStyle::OwnEntry => format_observation(own),
        })
        .collect();

    ChannelHistory {
        summary: Some(chosen),
        trail,
    }
}

/// Raw entry whose channel is only read once the entry is rendered.
#[derive(Debug, Clone, Copy)]
struct PendingObservation {
    index: usize,
    timestamp: DateTime<Utc>,
    channel: Option<i64>,
}

impl PendingObservation {
    fn resolve(&self) -> Result<ChannelObservation> {
        let channel = self
            .channel
            .ok_or_else(|| anyhow!("channel history entry {} has no usable Channel", self.index))?;
        Ok(ChannelObservation {
            timestamp: self.timestamp,
            channel,
        })
    }
}

/// Every entry must be a dictionary with a usable `Timestamp`; `Channel` is
/// checked later, only for the entries that get rendered.
fn pending_from_raw(raw: &[Value]) -> Result<Vec<PendingObservation>> {
    raw.iter()
        .enumerate()
        .map(|(index, item)| {
            let fields =
                Fields::of(item).with_context(|| format!("channel history entry {index}"))?;
            let timestamp = fields.date("Timestamp").ok_or_else(|| {
                anyhow!(
                    "channel history entry {index} has no usable Timestamp ({})",
                    fields.raw("Timestamp").map(kind_of).unwrap_or("absent")
                )
            })?;
            Ok(PendingObservation {
                index,
                timestamp,
                channel: fields.get_opt::<i64>("Channel"),
            })
        })
        .collect()
}

/// Reconcile raw `{Timestamp, Channel}` dictionaries. Fails when a timestamp
/// is unusable, or when an entry that has to be rendered has no channel.
pub fn reconcile_from_raw(raw: &[Value], style: ChannelTrailStyle) -> Result<ChannelHistory> {
    let pending = pending_from_raw(raw)?;
    let timestamps: Vec<DateTime<Utc>> = pending.iter().map(|entry| entry.timestamp).collect();
    let Some(high) = scan_latest(&timestamps) else {
        return Ok(ChannelHistory::default());
    };
    let chosen = pending[high].resolve()?;

    let trail = pending
        .iter()
        .filter(|entry| entry.index != high)
        .map(|entry| match style {
            ChannelTrailStyle::ChosenEntry => Ok(format_observation(&chosen)),
            ChannelTrailStyle::OwnEntry => entry.resolve().map(|own| format_observation(&own)),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ChannelHistory {
        summary: Some(chosen),
        trail,
    })
}

/// Reconcile a raw list; a malformed list leaves the history unresolved.
pub fn reconcile_raw(raw: &[Value], style: ChannelTrailStyle, log: &mut ParseLog) -> ChannelHistory {
    reconcile_from_raw(raw, style).unwrap_or_else(|err| {
        log.error(format!("could not parse channel history: {err:#}"));
        ChannelHistory::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use plist::Dictionary;

    fn at(hour: u32, channel: i64) -> ChannelObservation {
        ChannelObservation {
            timestamp: Utc.with_ymd_and_hms(2021, 3, 4, hour, 0, 0).unwrap(),
            channel,
        }
    }

    #[test]
    fn empty_history_has_no_summary() {
        let history = reconcile(&[], ChannelTrailStyle::ChosenEntry);
        assert_eq!(history, ChannelHistory::default());
    }

    #[test]
    fn single_entry_becomes_summary() {
        let history = reconcile(&[at(5, 11)], ChannelTrailStyle::ChosenEntry);
        assert_eq!(history.summary, Some(at(5, 11)));
        assert!(history.trail.is_empty());
    }

    #[test]
    fn scan_follows_last_forward_step_not_global_max() {
        // Global max is index 0, but the last forward step lands on index 2.
        let entries = [at(9, 1), at(2, 6), at(4, 11)];
        assert_eq!(latest_index(&entries), Some(2));

        let history = reconcile(&entries, ChannelTrailStyle::ChosenEntry);
        assert_eq!(history.summary, Some(at(4, 11)));
    }

    #[test]
    fn ties_keep_the_earlier_entry() {
        let entries = [at(3, 1), at(3, 6)];
        assert_eq!(latest_index(&entries), Some(0));
    }

    #[test]
    fn trail_repeats_the_chosen_entry_by_default() {
        let entries = [at(1, 1), at(2, 6), at(3, 11)];
        let history = reconcile(&entries, ChannelTrailStyle::ChosenEntry);
        assert_eq!(
            history.trail,
            vec!["(2021/03/04 03:00:00, 11)", "(2021/03/04 03:00:00, 11)"]
        );
    }

    #[test]
    fn own_entry_style_lists_each_entry() {
        let entries = [at(1, 1), at(2, 6), at(3, 11)];
        let history = reconcile(&entries, ChannelTrailStyle::OwnEntry);
        assert_eq!(
            history.trail,
            vec!["(2021/03/04 01:00:00, 1)", "(2021/03/04 02:00:00, 6)"]
        );
    }

    #[test]
    fn malformed_raw_history_is_left_unresolved() {
        let mut entry = Dictionary::new();
        entry.insert("Channel".into(), Value::from(6i64));
        let raw = vec![Value::Dictionary(entry)];

        let mut log = ParseLog::new("test");
        let history = reconcile_raw(&raw, ChannelTrailStyle::ChosenEntry, &mut log);
        assert_eq!(history, ChannelHistory::default());
        assert!(log.has_errors());
    }

    #[test]
    fn raw_history_is_converted() {
        let mut entry = Dictionary::new();
        entry.insert("Channel".into(), Value::from(36i64));
        entry.insert("Timestamp".into(), Value::from("2021-03-04 10:15:00"));
        let raw = vec![Value::Dictionary(entry)];

        let mut log = ParseLog::new("test");
        let history = reconcile_raw(&raw, ChannelTrailStyle::ChosenEntry, &mut log);
        let summary = history.summary.unwrap();
        assert_eq!(summary.channel, 36);
        assert_eq!(format_channel_timestamp(&summary.timestamp), "2021/03/04 10:15:00");
        assert!(log.entries().is_empty());
    }

    fn raw_entry(timestamp: &str, channel: Option<i64>) -> Value {
        let mut entry = Dictionary::new();
        entry.insert("Timestamp".into(), Value::from(timestamp));
        if let Some(channel) = channel {
            entry.insert("Channel".into(), Value::from(channel));
        }
        Value::Dictionary(entry)
    }

    #[test]
    fn missing_channel_on_an_unrendered_entry_is_tolerated() {
        let raw = vec![
            raw_entry("2020-01-01 10:00:00", None),
            raw_entry("2020-01-02 10:00:00", Some(6)),
        ];

        let mut log = ParseLog::new("test");
        let history = reconcile_raw(&raw, ChannelTrailStyle::ChosenEntry, &mut log);
        let summary = history.summary.unwrap();
        assert_eq!(
            format!("{}, {}", format_channel_timestamp(&summary.timestamp), summary.channel),
            "2020/01/02 10:00:00, 6"
        );
        assert_eq!(history.trail, vec!["(2020/01/02 10:00:00, 6)"]);
        assert!(!log.has_errors());
    }

    #[test]
    fn missing_channel_fails_when_the_entry_is_rendered() {
        let raw = vec![
            raw_entry("2020-01-01 10:00:00", None),
            raw_entry("2020-01-02 10:00:00", Some(6)),
        ];
        assert!(reconcile_from_raw(&raw, ChannelTrailStyle::OwnEntry).is_err());

        // The chosen entry itself has no channel.
        let raw = vec![
            raw_entry("2020-01-01 10:00:00", Some(1)),
            raw_entry("2020-01-02 10:00:00", None),
        ];
        let mut log = ParseLog::new("test");
        let history = reconcile_raw(&raw, ChannelTrailStyle::ChosenEntry, &mut log);
        assert_eq!(history, ChannelHistory::default());
        assert!(log.has_errors());
    }
}
