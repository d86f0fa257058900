//! Column contract of the Wi-Fi report. Names and order are consumed by
//! downstream tooling and must not change.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Text,
    Integer,
    /// Stored as text in `YYYY-MM-DD HH:MM:SS` form.
    Date,
    /// Values whose native type differs between record stores; written as
    /// text without coercion.
    OpaqueText,
}

impl DataType {
    pub fn sql_type(&self) -> &'static str {
        match self {
            DataType::Integer => "INTEGER",
            DataType::Text | DataType::Date | DataType::OpaqueText => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub data_type: DataType,
}

const fn column(name: &'static str, data_type: DataType) -> Column {
    Column { name, data_type }
}

pub const WIFI_COLUMNS: &[Column] = &[
    column("Name", DataType::Text),
    column("SSIDString", DataType::Text),
    column("Preferred order", DataType::Integer),
    column("Version", DataType::Text),
    column("Type", DataType::Text),
    column("Security Type", DataType::OpaqueText),
    column("Auto login", DataType::Text),
    column("Captive", DataType::Text),
    column("Closed", DataType::Text),
    column("Collocated group", DataType::Text),
    column("Disabled", DataType::Text),
    column("Last connected", DataType::Date),
    column("Passpoint", DataType::Text),
    column("Personal Hotspot", DataType::Text),
    column("Possibly hidden network", DataType::Text),
    column("Roaming profile type", DataType::Text),
    column("SPRoaming", DataType::Text),
    column("System mode", DataType::Text),
    column("Temporarily disabled", DataType::Text),
    column("Last connected channel", DataType::Text),
    column("Other channel history", DataType::Text),
    column("BSSIDHistory", DataType::Text),
    column("AddedAt", DataType::Date),
    column("JoinedBySystemAt", DataType::Date),
    column("JoinedByUserAt", DataType::Date),
    column("UpdatedAt", DataType::Date),
    column("LastDiscoveredAt", DataType::Date),
    column("AddReason", DataType::OpaqueText),
    column("Source", DataType::Text),
];
