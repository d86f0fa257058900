use chrono::{DateTime, Utc};

/// One completed write of a report table.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRun {
    pub id: String,
    pub table_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub row_count: usize,
    pub sources: Vec<String>,
}
