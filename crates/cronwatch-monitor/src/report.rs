//! Plain-text report rendering.

use cronwatch_store::JobRecord;

/// Fixed text used whenever no problem jobs were found.
pub const NO_ERRORS: &str = "No errors found.";

/// Render one line per problem job, in input order, or the sentinel text
/// when the list is empty.
///
/// Line format:
/// `<name>: returncode <code>, locked: <locked>, last execution: <YYYY-MM-DD HH:MM>`
/// with `never` standing in for jobs that have no recorded execution.
pub fn build_report(problems: &[JobRecord]) -> String {
    if problems.is_empty() {
        return NO_ERRORS.to_string();
    }

    problems
        .iter()
        .map(|job| {
            let last_execution = job
                .last_execution
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "never".to_string());
            format!(
                "{}: returncode {}, locked: {}, last execution: {}\n",
                job.name, job.last_return_code, job.locked, last_execution
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(name: &str, code: i32, locked: bool) -> JobRecord {
        JobRecord {
            name: name.into(),
            command: "/usr/local/bin/backup.sh".into(),
            schedule: "0 2 * * *".into(),
            disabled: false,
            locked,
            last_return_code: code,
            last_execution: Some(Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_empty_list_yields_sentinel() {
        assert_eq!(build_report(&[]), "No errors found.");
    }

    #[test]
    fn test_single_failed_job_line() {
        let report = build_report(&[record("backup", 1, false)]);
        assert_eq!(
            report,
            "backup: returncode 1, locked: false, last execution: 2024-01-01 02:00\n"
        );
    }

    #[test]
    fn test_one_line_per_job_in_input_order() {
        let report = build_report(&[
            record("rotate-logs", 2, false),
            record("backup", 0, true),
            record("sync-mirror", 1, false),
        ]);
        let lines: Vec<&str> = report.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("rotate-logs: returncode 2"));
        assert!(lines[1].starts_with("backup: returncode 0, locked: true"));
        assert!(lines[2].starts_with("sync-mirror: returncode 1"));
    }

    #[test]
    fn test_job_without_execution_prints_never() {
        let job = JobRecord {
            last_execution: None,
            ..record("backup", 1, false)
        };
        assert_eq!(
            build_report(&[job]),
            "backup: returncode 1, locked: false, last execution: never\n"
        );
    }

    #[test]
    fn test_deterministic_for_same_input() {
        let problems = vec![record("backup", 1, false), record("rotate-logs", 0, true)];
        assert_eq!(build_report(&problems), build_report(&problems));
    }
}
