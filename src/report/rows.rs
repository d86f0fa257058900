//! Rendering of [`Network`] entities into report cells, in
//! [`WIFI_COLUMNS`](super::columns::WIFI_COLUMNS) order.

use chrono::{DateTime, Utc};
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue, ValueRef};

use crate::models::Network;
use crate::wifi::channel_history::format_channel_timestamp;

use super::helpers::format_report_date;

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Integer(Option<i64>),
    Date(Option<DateTime<Utc>>),
}

impl Cell {
    /// Text form used by the CSV output. Absent values render empty.
    pub fn render(&self) -> String {
        match self {
            Cell::Text(text) => text.clone(),
            Cell::Integer(value) => value.map(|n| n.to_string()).unwrap_or_default(),
            Cell::Date(value) => value.as_ref().map(format_report_date).unwrap_or_default(),
        }
    }
}

impl ToSql for Cell {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Cell::Text(text) => ToSqlOutput::Borrowed(ValueRef::Text(text.as_bytes())),
            Cell::Integer(Some(n)) => ToSqlOutput::Owned(SqlValue::Integer(*n)),
            Cell::Date(Some(dt)) => ToSqlOutput::Owned(SqlValue::Text(format_report_date(dt))),
            Cell::Integer(None) | Cell::Date(None) => ToSqlOutput::Owned(SqlValue::Null),
        })
    }
}

fn flag(value: bool) -> Cell {
    Cell::Text(if value { "True" } else { "False" }.to_string())
}

fn text(value: impl Into<String>) -> Cell {
    Cell::Text(value.into())
}

pub fn network_row(net: &Network) -> Vec<Cell> {
    let last_channel = net
        .channel_history_summary
        .map(|obs| format!("{}, {}", format_channel_timestamp(&obs.timestamp), obs.channel))
        .unwrap_or_default();

    vec![
        text(&net.name),
        text(&net.raw_identifier),
        Cell::Integer(net.preferred_rank),
        text(net.schema_version.to_string()),
        text(net.category.as_str()),
        text(&net.security_type),
        flag(net.is_auto_login),
        flag(net.is_captive),
        flag(net.closed_network),
        text(net.collocated_group.join(",")),
        flag(net.disabled),
        Cell::Date(net.last_connected),
        flag(net.has_passpoint),
        flag(net.is_personal_hotspot),
        flag(net.possibly_hidden),
        text(&net.roaming_profile_type),
        flag(net.service_provider_roaming),
        flag(net.system_managed),
        flag(net.temporarily_disabled),
        text(last_channel),
        text(net.channel_history_others.join(", ")),
        text(&net.access_point_history),
        Cell::Date(net.added_at),
        Cell::Date(net.joined_by_system_at),
        Cell::Date(net.joined_by_user_at),
        Cell::Date(net.updated_at),
        Cell::Date(net.last_discovered_at),
        text(&net.add_reason),
        text(&net.source_path),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChannelObservation, NetworkCategory};
    use crate::report::columns::{DataType, WIFI_COLUMNS};
    use chrono::TimeZone;

    fn sample() -> Network {
        Network {
            name: "cafe".into(),
            raw_identifier: "cafe".into(),
            category: NetworkCategory::PreviouslyRemembered,
            schema_version: 2600,
            preferred_rank: Some(3),
            collocated_group: vec!["guest".into(), "lobby".into()],
            channel_history_summary: Some(ChannelObservation {
                timestamp: Utc.with_ymd_and_hms(2020, 3, 4, 5, 6, 7).unwrap(),
                channel: 36,
            }),
            channel_history_others: vec!["(a, 1)".into(), "(b, 2)".into()],
            is_captive: true,
            last_connected: Some(Utc.with_ymd_and_hms(2020, 3, 4, 5, 6, 7).unwrap()),
            source_path: "/prefs.plist".into(),
            ..Network::default()
        }
    }

    #[test]
    fn row_matches_column_contract() {
        let row = network_row(&sample());
        assert_eq!(row.len(), WIFI_COLUMNS.len());
        for (cell, column) in row.iter().zip(WIFI_COLUMNS) {
            match cell {
                Cell::Integer(_) => assert_eq!(column.data_type, DataType::Integer),
                Cell::Date(_) => assert_eq!(column.data_type, DataType::Date),
                Cell::Text(_) => assert!(matches!(
                    column.data_type,
                    DataType::Text | DataType::OpaqueText
                )),
            }
        }
    }

    #[test]
    fn cells_render_report_text() {
        let row = network_row(&sample());
        let rendered: Vec<String> = row.iter().map(Cell::render).collect();
        assert_eq!(rendered[2], "3");
        assert_eq!(rendered[3], "2600");
        assert_eq!(rendered[4], "PREVIOUSREMEMBERED");
        assert_eq!(rendered[6], "False");
        assert_eq!(rendered[7], "True");
        assert_eq!(rendered[9], "guest,lobby");
        assert_eq!(rendered[11], "2020-03-04 05:06:07");
        assert_eq!(rendered[19], "2020/03/04 05:06:07, 36");
        assert_eq!(rendered[20], "(a, 1), (b, 2)");
        assert_eq!(rendered[22], "");
        assert_eq!(rendered[28], "/prefs.plist");
    }

    #[test]
    fn absent_summary_renders_empty() {
        let row = network_row(&Network::default());
        assert_eq!(row[2], Cell::Integer(None));
        assert_eq!(row[19], Cell::Text(String::new()));
        assert_eq!(row[4].render(), "UNKNOWN");
    }
}
