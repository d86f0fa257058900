pub mod airport;
pub mod channel_history;
pub mod known_networks;
pub mod normalizer;
pub mod parse_log;
pub mod ssid;

use std::path::{Path, PathBuf};

use plist::Value;

use crate::document::load_document;
use crate::log_debug;
use crate::models::Network;
use crate::settings::ExtractorSettings;

pub use parse_log::{Diagnostic, ParseLog, Severity};

const ENABLE_LOGS: bool = true;

/// Which record-store shape a document has. Decided from the file name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    AirportPreferences,
    KnownNetworks,
}

impl StoreKind {
    pub fn for_path(path: &Path, settings: &ExtractorSettings) -> Self {
        let is_known_networks = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name == settings.known_networks_file_name);
        if is_known_networks {
            StoreKind::KnownNetworks
        } else {
            StoreKind::AirportPreferences
        }
    }
}

#[derive(Debug)]
pub struct ParseOutcome {
    pub networks: Vec<Network>,
    pub log: ParseLog,
}

/// Append every network recoverable from an already-loaded document.
pub fn parse_document(
    document: &Value,
    source: &str,
    kind: StoreKind,
    settings: &ExtractorSettings,
    networks: &mut Vec<Network>,
    log: &mut ParseLog,
) {
    match kind {
        StoreKind::AirportPreferences => {
            airport::read_airport_preferences(document, source, settings, networks, log)
        }
        StoreKind::KnownNetworks => {
            known_networks::read_known_networks_store(document, source, networks, log)
        }
    }
}

/// Load and parse one record store. A load failure is logged once and
/// yields no networks.
pub fn parse_file(path: &Path, settings: &ExtractorSettings) -> ParseOutcome {
    let source = path.display().to_string();
    let mut log = ParseLog::new(source.clone());
    let mut networks = Vec::new();

    match load_document(path) {
        Ok(document) => {
            let kind = StoreKind::for_path(path, settings);
            parse_document(&document, &source, kind, settings, &mut networks, &mut log);
        }
        Err(err) => log.error(format!("could not open plist: {err:#}")),
    }

    ParseOutcome { networks, log }
}

/// Resolve a store location (absolute inside the image) under a mounted
/// volume root.
pub fn image_path(root: &Path, location: &str) -> PathBuf {
    root.join(location.trim_start_matches('/'))
}

/// Parse every configured store location that exists under `root`, in
/// configuration order.
pub fn parse_image(root: &Path, settings: &ExtractorSettings) -> Vec<ParseOutcome> {
    settings
        .image_paths
        .iter()
        .map(|location| image_path(root, location))
        .filter(|path| {
            let present = path.is_file();
            if !present {
                log_debug!("{} not found in image", path.display());
            }
            present
        })
        .map(|path| parse_file(&path, settings))
        .collect()
}
