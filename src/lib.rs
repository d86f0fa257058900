mod cli;
pub mod document;
pub mod models;
pub mod report;
pub mod settings;
mod utils;
pub mod wifi;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use cli::{Cli, Command};
use models::Network;
use report::{network_row, Cell, ReportFormat, ReportSink, WIFI_COLUMNS};
use settings::{ExtractorSettings, SettingsStore};
use wifi::{ParseOutcome, Severity};

const ENABLE_LOGS: bool = true;

/// Write one result set to every sink. Empty results are never written.
/// Sink failures are logged and do not stop the remaining sinks.
pub async fn report_networks(
    sinks: &[ReportSink],
    table: &str,
    networks: &[Network],
    source: &str,
    started_at: DateTime<Utc>,
) {
    if networks.is_empty() {
        log_info!("No wifi networks found");
        return;
    }
    log_info!("Found {} network(s)", networks.len());

    let rows: Vec<Vec<Cell>> = networks.iter().map(network_row).collect();
    for sink in sinks {
        if let Err(err) = sink
            .write_table(table, WIFI_COLUMNS, &rows, source, started_at)
            .await
        {
            log_error!("Failed to write report for {source}: {err:#}");
        }
    }
}

fn summarize(outcome: &ParseOutcome) {
    let log = &outcome.log;
    log_debug!(
        "{}: {} network(s), {} warning(s), {} error(s)",
        log.source(),
        outcome.networks.len(),
        log.count(Severity::Warning),
        log.count(Severity::Error)
    );
}

fn open_sinks(formats: &[ReportFormat], output_dir: &Path) -> Result<Vec<ReportSink>> {
    let mut requested: Vec<ReportFormat> = Vec::new();
    for kind in formats {
        if !requested.contains(kind) {
            requested.push(*kind);
        }
    }
    requested
        .into_iter()
        .map(|kind| {
            ReportSink::open(kind, output_dir).with_context(|| {
                format!("failed to open {kind:?} report in {}", output_dir.display())
            })
        })
        .collect()
}

async fn execute(cli: Cli, settings: ExtractorSettings) -> Result<()> {
    match cli.command {
        Command::InitSettings { path } => {
            SettingsStore::new(path.clone())?.persist()?;
            log_info!("Settings written to {}", path.display());
        }
        Command::Files { paths } => {
            let sinks = open_sinks(&cli.formats, &cli.output_dir)?;
            for path in paths {
                let started_at = Utc::now();
                let outcome = wifi::parse_file(&path, &settings);
                summarize(&outcome);
                report_networks(
                    &sinks,
                    &settings.table_name,
                    &outcome.networks,
                    &path.display().to_string(),
                    started_at,
                )
                .await;
            }
        }
        Command::Image { root } => {
            let sinks = open_sinks(&cli.formats, &cli.output_dir)?;
            let started_at = Utc::now();
            let mut networks = Vec::new();
            for outcome in wifi::parse_image(&root, &settings) {
                summarize(&outcome);
                networks.extend(outcome.networks);
            }
            report_networks(
                &sinks,
                &settings.table_name,
                &networks,
                &root.display().to_string(),
                started_at,
            )
            .await;
        }
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    let settings = match &cli.settings {
        Some(path) => SettingsStore::new(path.clone())?.settings().clone(),
        None => ExtractorSettings::default(),
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    runtime.block_on(execute(cli, settings))
}
