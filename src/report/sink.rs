use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::ValueEnum;

use crate::log_info;

use super::{columns::Column, rows::Cell, CsvReport, ReportDatabase};

const ENABLE_LOGS: bool = true;

pub const SQLITE_FILE_NAME: &str = "wifi_history.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Sqlite,
    Csv,
}

pub enum ReportSink {
    Sqlite(ReportDatabase),
    Csv(CsvReport),
}

impl ReportSink {
    pub fn open(format: ReportFormat, output_dir: &Path) -> Result<Self> {
        Ok(match format {
            ReportFormat::Sqlite => {
                ReportSink::Sqlite(ReportDatabase::open(output_dir.join(SQLITE_FILE_NAME))?)
            }
            ReportFormat::Csv => ReportSink::Csv(CsvReport::new(output_dir.to_path_buf())?),
        })
    }

    pub async fn write_table(
        &self,
        table: &str,
        columns: &'static [Column],
        rows: &[Vec<Cell>],
        source: &str,
        started_at: DateTime<Utc>,
    ) -> Result<()> {
        match self {
            ReportSink::Sqlite(db) => {
                let run = db
                    .write_table(
                        table.to_string(),
                        columns,
                        rows.to_vec(),
                        source.to_string(),
                        started_at,
                    )
                    .await?;
                log_info!(
                    "Wrote {} row(s) to {} in {} (run {})",
                    run.row_count,
                    table,
                    db.path().display(),
                    run.id
                );
            }
            ReportSink::Csv(report) => {
                let path = report.write_table(table, columns, rows)?;
                log_info!("Wrote {} row(s) to {}", rows.len(), path.display());
            }
        }
        Ok(())
    }
}
