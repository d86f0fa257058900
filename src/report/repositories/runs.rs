use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use uuid::Uuid;

use crate::models::ReportRun;
use crate::report::{
    columns::Column,
    helpers::{parse_datetime, to_i64, to_usize},
    rows::Cell,
    ReportDatabase,
};

use super::tables::insert_rows;

fn row_to_run(row: &Row) -> Result<ReportRun> {
    let started_at: String = row.get("started_at")?;
    let finished_at: String = row.get("finished_at")?;
    let row_count: i64 = row.get("row_count")?;

    Ok(ReportRun {
        id: row.get("id")?,
        table_name: row.get("table_name")?,
        started_at: parse_datetime(&started_at, "started_at")?,
        finished_at: parse_datetime(&finished_at, "finished_at")?,
        row_count: to_usize(row_count, "row_count")?,
        sources: Vec::new(),
    })
}

impl ReportDatabase {
    /// Write one batch of rows into `table` and record the run. Either every
    /// row and the run record land, or nothing does.
    pub async fn write_table(
        &self,
        table: String,
        columns: &'static [Column],
        rows: Vec<Vec<Cell>>,
        source: String,
        started_at: DateTime<Utc>,
    ) -> Result<ReportRun> {
        self.execute(format!("write {table}"), move |conn| {
            let tx = conn
                .transaction()
                .context("failed to open report transaction")?;

            insert_rows(&tx, &table, columns, &rows)?;

            let finished_at = Utc::now();
            let run = ReportRun {
                id: Uuid::new_v4().to_string(),
                table_name: table,
                started_at,
                finished_at,
                row_count: rows.len(),
                sources: vec![source],
            };

            tx.execute(
                "INSERT INTO runs (id, table_name, started_at, finished_at, row_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    run.id,
                    run.table_name,
                    run.started_at.to_rfc3339(),
                    run.finished_at.to_rfc3339(),
                    to_i64(run.row_count)?,
                ],
            )
            .context("failed to record report run")?;
            for source in &run.sources {
                tx.execute(
                    "INSERT INTO sources (run_id, source_path) VALUES (?1, ?2)",
                    params![run.id, source],
                )
                .context("failed to record report source")?;
            }

            tx.commit().context("failed to commit report")?;
            Ok(run)
        })
        .await
    }

    /// All recorded runs, oldest first, with their sources.
    pub async fn list_runs(&self) -> Result<Vec<ReportRun>> {
        self.execute("list runs", |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, table_name, started_at, finished_at, row_count
                 FROM runs
                 ORDER BY started_at ASC",
            )?;
            let mut rows = stmt.query([])?;
            let mut runs = Vec::new();
            while let Some(row) = rows.next()? {
                runs.push(row_to_run(row)?);
            }

            let mut sources_stmt =
                conn.prepare("SELECT source_path FROM sources WHERE run_id = ?1 ORDER BY rowid")?;
            for run in &mut runs {
                let sources = sources_stmt
                    .query_map(params![run.id], |row| row.get::<_, String>(0))?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                run.sources = sources;
            }

            Ok(runs)
        })
        .await
    }
}
