//! cronwatch-store: persisted scheduled-job state.
//!
//! The scheduler writes job outcomes here; the monitor reads them back
//! through [`JobRepository`] to find jobs that failed or got stuck.

pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// A scheduled job as persisted by the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job name.
    pub name: String,
    /// Shell command the scheduler runs.
    pub command: String,
    /// Cron expression (e.g. "0 2 * * *").
    pub schedule: String,
    /// Whether the operator switched this job off.
    pub disabled: bool,
    /// True while the job is believed to be executing.
    pub locked: bool,
    /// Exit code of the last execution.
    pub last_return_code: i32,
    /// Start of the most recent execution, if the job ever ran.
    pub last_execution: Option<DateTime<Utc>>,
}

/// Read surface the monitor sweeps over.
pub trait JobRepository: Send + Sync {
    /// Every active job that failed (non-zero return code) or has been
    /// locked for longer than `lock_timeout_secs`, in a stable order.
    fn find_problem_jobs(&self, lock_timeout_secs: u64) -> Result<Vec<JobRecord>>;
}
