//! Canonical network entity shared by every record-store normalizer.
//!
//! A `Network` is built fresh for each raw record, fully populated before it
//! is appended to the result sequence, and never touched afterwards.

use std::fmt;

use chrono::{DateTime, Utc};

/// Provenance of a recovered network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkCategory {
    #[default]
    Unknown,
    Known,
    /// Recovered from the `Previous` block of an update-history snapshot.
    PreviouslyRemembered,
}

impl NetworkCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkCategory::Unknown => "UNKNOWN",
            NetworkCategory::Known => "KNOWN",
            NetworkCategory::PreviouslyRemembered => "PREVIOUSREMEMBERED",
        }
    }
}

impl fmt::Display for NetworkCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(timestamp, channel)` observation from a channel history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelObservation {
    pub timestamp: DateTime<Utc>,
    pub channel: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub name: String,
    pub raw_identifier: String,
    pub category: NetworkCategory,
    pub schema_version: i64,
    /// 1-based position in the preferred-order list; `None` when not listed.
    pub preferred_rank: Option<i64>,
    pub security_type: String,
    pub roaming_profile_type: String,
    pub add_reason: String,
    pub disabled: bool,
    pub system_managed: bool,
    pub possibly_hidden: bool,
    pub temporarily_disabled: bool,
    pub closed_network: bool,
    pub service_provider_roaming: bool,
    pub has_passpoint: bool,
    pub is_auto_login: bool,
    pub is_captive: bool,
    pub is_personal_hotspot: bool,
    pub collocated_group: Vec<String>,
    pub last_connected: Option<DateTime<Utc>>,
    pub channel_history_summary: Option<ChannelObservation>,
    pub channel_history_others: Vec<String>,
    pub access_point_history: String,
    pub added_at: Option<DateTime<Utc>>,
    pub joined_by_system_at: Option<DateTime<Utc>>,
    pub joined_by_user_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub last_discovered_at: Option<DateTime<Utc>>,
    pub source_path: String,
}
