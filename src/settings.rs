use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::log_warn;

const ENABLE_LOGS: bool = true;

pub const KNOWN_NETWORKS_FILE_NAME: &str = "com.apple.wifi.known-networks.plist";

/// How the non-chosen lines of a channel-history trail are rendered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelTrailStyle {
    /// Every line repeats the chosen (most recent) entry. Matches the
    /// established report output.
    #[default]
    ChosenEntry,
    /// Every line shows its own timestamp and channel.
    OwnEntry,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtractorSettings {
    pub channel_trail: ChannelTrailStyle,
    pub known_networks_file_name: String,
    pub backup_suffix: String,
    /// Store locations relative to a mounted volume root.
    pub image_paths: Vec<String>,
    pub table_name: String,
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self {
            channel_trail: ChannelTrailStyle::default(),
            known_networks_file_name: KNOWN_NETWORKS_FILE_NAME.into(),
            backup_suffix: ".backup".into(),
            image_paths: vec![
                "/Library/Preferences/SystemConfiguration/com.apple.airport.preferences.plist"
                    .into(),
                "/Library/Preferences/SystemConfiguration/com.apple.airport.preferences.plist.backup"
                    .into(),
                format!("/Library/Preferences/{KNOWN_NETWORKS_FILE_NAME}"),
            ],
            table_name: "Wifi".into(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: ExtractorSettings,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log_warn!(
                    "Ignoring unreadable settings in {}: {err}; using defaults",
                    path.display()
                );
                ExtractorSettings::default()
            })
        } else {
            ExtractorSettings::default()
        };

        Ok(Self { path, data })
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.data
    }

    pub fn persist(&self) -> Result<()> {
        let serialized = serde_json::to_string_pretty(&self.data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
