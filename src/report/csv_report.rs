use std::{fs::OpenOptions, path::PathBuf};

use anyhow::{Context, Result};

use super::{columns::Column, rows::Cell};

/// Appends report tables to `<dir>/<table>.csv`.
#[derive(Debug, Clone)]
pub struct CsvReport {
    dir: PathBuf,
}

impl CsvReport {
    pub fn new(dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create report directory {}", dir.display()))?;
        Ok(Self { dir })
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    /// Header is written only when the file does not exist yet.
    pub fn write_table(&self, table: &str, columns: &[Column], rows: &[Vec<Cell>]) -> Result<PathBuf> {
        let path = self.table_path(table);
        let is_new = !path.exists();

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if is_new {
            writer
                .write_record(columns.iter().map(|column| column.name))
                .with_context(|| format!("failed to write header to {}", path.display()))?;
        }
        for row in rows {
            writer
                .write_record(row.iter().map(Cell::render))
                .with_context(|| format!("failed to write row to {}", path.display()))?;
        }
        writer
            .flush()
            .with_context(|| format!("failed to flush {}", path.display()))?;

        Ok(path)
    }
}
