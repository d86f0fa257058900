//! Tabular report sink: the Wi-Fi column contract plus SQLite and CSV
//! outputs.

pub mod columns;
pub mod csv_report;
mod helpers;
mod migrations;
pub mod repositories;
pub mod rows;
pub mod sink;

use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use log::{debug, error, info, warn};
use rusqlite::Connection;
use tokio::sync::oneshot;

use migrations::run_migrations;

pub use columns::{Column, DataType, WIFI_COLUMNS};
pub use csv_report::CsvReport;
pub use rows::{network_row, Cell};
pub use sink::{ReportFormat, ReportSink};

type ReportTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

/// Work queued for the report thread. Each job names what it does so the
/// worker can log it.
enum ReportJob {
    Run { label: String, task: ReportTask },
    Close,
}

struct ReportWorker {
    jobs: mpsc::Sender<ReportJob>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for ReportWorker {
    fn drop(&mut self) {
        let mut guard = match self.thread.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.jobs.send(ReportJob::Close) {
                error!("Failed to close report thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join report thread: {join_err:?}");
            }
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open SQLite report {}", path.display()))?;

    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("Report {} stays in rollback journal mode: {err}", path.display());
    }
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("failed to enable foreign keys")?;
    run_migrations(&mut conn).context("failed to run report migrations")?;

    Ok(conn)
}

fn serve(mut conn: Connection, jobs: mpsc::Receiver<ReportJob>, path: &Path) {
    let mut served = 0usize;
    while let Ok(job) = jobs.recv() {
        match job {
            ReportJob::Run { label, task } => {
                let started = Instant::now();
                task(&mut conn);
                served += 1;
                debug!("{label} on {} took {:?}", path.display(), started.elapsed());
            }
            ReportJob::Close => break,
        }
    }
    info!(
        "Report thread for {} closing after {served} job(s)",
        path.display()
    );
}

/// SQLite report file owned by a dedicated worker thread. Clones share the
/// same connection.
#[derive(Clone)]
pub struct ReportDatabase {
    worker: Arc<ReportWorker>,
    db_path: Arc<PathBuf>,
}

impl ReportDatabase {
    pub fn open(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create report directory {}", parent.display())
            })?;
        }

        let (job_tx, job_rx) = mpsc::channel::<ReportJob>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let thread_path = db_path.clone();

        let thread = thread::Builder::new()
            .name("wifi-history-report".into())
            .spawn(move || match open_connection(&thread_path) {
                Ok(conn) => {
                    if ready_tx.send(Ok(())).is_ok() {
                        serve(conn, job_rx, &thread_path);
                    }
                }
                Err(err) => {
                    let _ = ready_tx.send(Err(err));
                }
            })
            .context("failed to spawn report worker thread")?;

        ready_rx
            .recv()
            .context("report worker exited before signaling readiness")??;

        info!("Report database opened at {}", db_path.display());

        Ok(Self {
            worker: Arc::new(ReportWorker {
                jobs: job_tx,
                thread: Mutex::new(Some(thread)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Run `task` on the report thread and wait for its result. `label`
    /// shows up in the worker's timing log.
    pub async fn execute<F, T>(&self, label: impl Into<String>, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let label = label.into();
        let (reply_tx, reply_rx) = oneshot::channel();

        let reply_label = label.clone();
        let job = ReportJob::Run {
            label: label.clone(),
            task: Box::new(move |conn| {
                if reply_tx.send(task(conn)).is_err() {
                    warn!("Caller of {reply_label} went away before the result arrived");
                }
            }),
        };

        self.worker
            .jobs
            .send(job)
            .map_err(|_| anyhow!("report thread is closed; cannot {label}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("report thread stopped during {label}"))?
    }
}
