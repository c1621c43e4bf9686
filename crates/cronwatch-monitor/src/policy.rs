//! Dispatch decision for a completed sweep.

/// What to do with a finished report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the report to the console.
    Dump,
    /// Deliver the report to every receiver.
    Notify,
    /// Stay quiet.
    Skip,
}

/// Select the action for one run.
///
/// Dump mode always prints, problems or not; without it, problems are
/// mailed and a healthy sweep is only mailed when `notify_when_healthy`
/// is set.
pub fn decide(has_problems: bool, dump: bool, notify_when_healthy: bool) -> Action {
    if dump {
        Action::Dump
    } else if has_problems || notify_when_healthy {
        Action::Notify
    } else {
        Action::Skip
    }
}
