use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::report::ReportFormat;

#[derive(Debug, Parser)]
#[command(
    name = "wifi-history",
    version,
    about = "Reconstruct remembered Wi-Fi networks from macOS preference stores"
)]
pub struct Cli {
    /// JSON settings file. Missing files fall back to defaults.
    #[arg(long, global = true, env = "WIFI_HISTORY_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Directory that receives the report outputs.
    #[arg(long, global = true, default_value = ".")]
    pub output_dir: PathBuf,

    /// Report output; repeat for several.
    #[arg(long = "format", value_enum, global = true, default_values_t = [ReportFormat::Sqlite])]
    pub formats: Vec<ReportFormat>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse individual preference files; each one is reported on its own.
    Files {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Parse the well-known store locations under a mounted volume root.
    Image { root: PathBuf },
    /// Write the default settings to a file.
    InitSettings { path: PathBuf },
}
