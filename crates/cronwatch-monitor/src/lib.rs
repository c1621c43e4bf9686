//! cronwatch-monitor: the sweep that turns persisted job state into a report.
//!
//! One pass per invocation: query the job store for failed or stuck jobs,
//! render a plain-text report, then either print it, mail it to every
//! receiver, or stay quiet. The monitor never mutates job state.

pub mod policy;
pub mod report;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::warn;

use cronwatch_notify::{Notifier, local_hostname};
use cronwatch_store::{JobRepository, StoreError};

use crate::policy::Action;

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("job store query failed: {0}")]
    Store(#[from] StoreError),
}

/// Run parameters, resolved once per sweep.
#[derive(Debug, Clone)]
pub struct MonitorOptions {
    /// Seconds after which a locked job counts as stuck.
    pub lock_timeout_secs: u64,
    /// Print the report instead of mailing it.
    pub dump: bool,
    /// Report receivers, in configuration order.
    pub receivers: Vec<String>,
    /// Mail the sentinel text even when everything is healthy.
    pub notify_when_healthy: bool,
}

/// What a sweep ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No receivers configured and not dumping; the store was never queried.
    SkippedNoReceivers,
    /// Console text for the caller to write to stdout verbatim.
    Dumped { output: String },
    /// Report mailed; `failed` lists receivers whose delivery errored.
    Notified { delivered: usize, failed: Vec<String> },
    /// Nothing to report and healthy runs are kept quiet.
    Healthy,
}

/// A single health sweep over the scheduled-job store.
pub struct Monitor {
    options: MonitorOptions,
    repository: Arc<dyn JobRepository>,
    notifier: Arc<dyn Notifier>,
}

impl Monitor {
    pub fn new(
        options: MonitorOptions,
        repository: Arc<dyn JobRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            options,
            repository,
            notifier,
        }
    }

    /// Execute one sweep.
    ///
    /// The no-receivers guard runs before the store is touched; it is the
    /// only short-circuit. Once the store has been queried the outcome
    /// follows [`policy::decide`] and is always surfaced. A store failure
    /// aborts the run; delivery failures do not.
    pub async fn run(&self) -> Result<RunOutcome, MonitorError> {
        if !self.options.dump && self.options.receivers.is_empty() {
            warn!("no receivers configured; add receivers to the config or run with --dump");
            return Ok(RunOutcome::SkippedNoReceivers);
        }

        let problems = self
            .repository
            .find_problem_jobs(self.options.lock_timeout_secs)?;
        let report = report::build_report(&problems);

        match policy::decide(
            !problems.is_empty(),
            self.options.dump,
            self.options.notify_when_healthy,
        ) {
            Action::Dump => {
                // Report lines carry their own newline, the sentinel does not.
                let output = if problems.is_empty() {
                    format!("{report}\n")
                } else {
                    report
                };
                Ok(RunOutcome::Dumped { output })
            }
            Action::Notify => Ok(self.deliver(&report).await),
            Action::Skip => Ok(RunOutcome::Healthy),
        }
    }

    /// Mail the report to every receiver, best effort. One receiver's
    /// failure is logged and recorded but does not stop the rest.
    async fn deliver(&self, body: &str) -> RunOutcome {
        let subject = subject_line(Utc::now());
        let mut failed = Vec::new();

        for receiver in &self.options.receivers {
            if let Err(e) = self.notifier.send(receiver, &subject, body).await {
                warn!(receiver = %receiver, error = %e, "report delivery failed");
                failed.push(receiver.clone());
            }
        }

        if !failed.is_empty() {
            warn!(
                failed = failed.len(),
                total = self.options.receivers.len(),
                "monitoring report only partially delivered"
            );
        }

        RunOutcome::Notified {
            delivered: self.options.receivers.len() - failed.len(),
            failed,
        }
    }
}

/// Subject for report mails: source host plus the run's timestamp, so
/// receivers can tell runs apart.
fn subject_line(now: DateTime<Utc>) -> String {
    format!(
        "cronjob monitoring {}, {}",
        local_hostname(),
        now.format("%Y-%m-%d %H:%M:%S")
    )
}
