use anyhow::{Context, Result};
use rusqlite::{params_from_iter, Transaction};

use crate::report::{columns::Column, helpers::quote_identifier, rows::Cell};

pub(crate) fn create_table_sql(table: &str, columns: &[Column]) -> String {
    let definitions = columns
        .iter()
        .map(|column| {
            format!(
                "{} {}",
                quote_identifier(column.name),
                column.data_type.sql_type()
            )
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({definitions})",
        quote_identifier(table)
    )
}

pub(crate) fn insert_sql(table: &str, columns: &[Column]) -> String {
    let names = columns
        .iter()
        .map(|column| quote_identifier(column.name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO {} ({names}) VALUES ({placeholders})",
        quote_identifier(table)
    )
}

/// Create `table` if needed and insert every row. Runs inside the caller's
/// transaction.
pub(crate) fn insert_rows(
    tx: &Transaction<'_>,
    table: &str,
    columns: &[Column],
    rows: &[Vec<Cell>],
) -> Result<()> {
    tx.execute_batch(&create_table_sql(table, columns))
        .with_context(|| format!("failed to create table {table}"))?;

    let mut stmt = tx
        .prepare(&insert_sql(table, columns))
        .with_context(|| format!("failed to prepare insert into {table}"))?;
    for (index, row) in rows.iter().enumerate() {
        stmt.execute(params_from_iter(row.iter()))
            .with_context(|| format!("failed to insert row {index} into {table}"))?;
    }
    Ok(())
}
