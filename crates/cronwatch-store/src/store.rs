//! SQLite-backed scheduled-job storage.

use chrono::{Duration, Utc};
use rusqlite::{Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Mutex;

use crate::{JobRecord, JobRepository, Result};

const JOB_COLUMNS: &str =
    "name, command, schedule, disabled, locked, last_return_code, last_execution";

/// Persistent storage for scheduled-job state.
pub struct SqliteJobStore {
    conn: Mutex<Connection>,
}

impl SqliteJobStore {
    /// Open or create a job store.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;

             CREATE TABLE IF NOT EXISTS scheduled_jobs (
                 name TEXT PRIMARY KEY,
                 command TEXT NOT NULL,
                 schedule TEXT NOT NULL,
                 disabled INTEGER NOT NULL DEFAULT 0,
                 locked INTEGER NOT NULL DEFAULT 0,
                 last_return_code INTEGER NOT NULL DEFAULT 0,
                 last_execution TEXT
             );",
        )?;

        tracing::debug!("Job store opened: {}", db_path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS scheduled_jobs (
                 name TEXT PRIMARY KEY,
                 command TEXT NOT NULL,
                 schedule TEXT NOT NULL,
                 disabled INTEGER NOT NULL DEFAULT 0,
                 locked INTEGER NOT NULL DEFAULT 0,
                 last_return_code INTEGER NOT NULL DEFAULT 0,
                 last_execution TEXT
             );",
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or update a job. This is the scheduler's write path.
    pub fn upsert_job(&self, job: &JobRecord) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO scheduled_jobs
                 (name, command, schedule, disabled, locked, last_return_code, last_execution)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                job.name,
                job.command,
                job.schedule,
                job.disabled as i64,
                job.locked as i64,
                job.last_return_code,
                job.last_execution.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// Get a job by name.
    pub fn get_job(&self, name: &str) -> Result<Option<JobRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs WHERE name = ?1"
        ))?;
        let job = stmt
            .query_row(rusqlite::params![name], row_to_job)
            .optional()?;
        Ok(job)
    }

    /// List all jobs, ordered by name.
    pub fn list_jobs(&self) -> Result<Vec<JobRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs ORDER BY name"
        ))?;
        let jobs = stmt
            .query_map([], row_to_job)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    /// Delete a job.
    pub fn delete_job(&self, name: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let count = conn.execute(
            "DELETE FROM scheduled_jobs WHERE name = ?1",
            rusqlite::params![name],
        )?;
        Ok(count > 0)
    }
}

impl JobRepository for SqliteJobStore {
    /// The problem predicate lives in this query and nowhere else: an active
    /// job is a problem iff its last return code is non-zero, or it is still
    /// locked and started longer than `lock_timeout_secs` ago. A locked row
    /// with no recorded execution has no elapsed time to measure and is
    /// left out.
    fn find_problem_jobs(&self, lock_timeout_secs: u64) -> Result<Vec<JobRecord>> {
        let cutoff = Utc::now() - Duration::seconds(lock_timeout_secs as i64);
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&format!(
            "SELECT {JOB_COLUMNS} FROM scheduled_jobs
             WHERE disabled = 0
               AND (last_return_code != 0 OR (locked = 1 AND last_execution < ?1))
             ORDER BY name"
        ))?;
        let jobs = stmt
            .query_map(rusqlite::params![cutoff.to_rfc3339()], row_to_job)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(jobs)
    }
}

fn row_to_job(row: &Row<'_>) -> rusqlite::Result<JobRecord> {
    Ok(JobRecord {
        name: row.get(0)?,
        command: row.get(1)?,
        schedule: row.get(2)?,
        disabled: row.get::<_, i64>(3)? != 0,
        locked: row.get::<_, i64>(4)? != 0,
        last_return_code: row.get(5)?,
        last_execution: row
            .get::<_, Option<String>>(6)?
            .and_then(|s| s.parse().ok()),
    })
}
