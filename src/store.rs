//! Readers for the three artifacts the external checker maintains: the
//! status snapshot, the metrics history, and the health-check log.
//!
//! Every read goes back to disk so concurrent writer updates are picked up
//! immediately. A missing file is a normal state; an unparseable file is
//! treated the same way but logged, since it usually means a partial write.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::warn;

use crate::models::{MetricRecord, StatusSnapshot};

/// Latest snapshot, or `None` when the checker has not written one (or the
/// file is unreadable/corrupt).
pub fn read_status(path: &Path) -> Option<StatusSnapshot> {
    let raw = read_if_present(path)?;
    match serde_json::from_str(&raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Status snapshot is not valid JSON");
            None
        }
    }
}

/// Full metrics history in append order. Absent or corrupt files degrade to
/// an empty history.
pub fn read_metrics_history(path: &Path) -> Vec<MetricRecord> {
    let Some(raw) = read_if_present(path) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(history) => history,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Metrics history is not valid JSON");
            Vec::new()
        }
    }
}

/// Tail of the health-check log: apply the optional `[LEVEL]` filter first,
/// then keep the last `lines` entries.
pub fn read_log_lines(path: &Path, lines: usize, level: Option<&str>) -> Vec<String> {
    let Some(raw) = read_if_present(path) else {
        return Vec::new();
    };
    let tag = level.map(|level| format!("[{}]", level.to_uppercase()));
    let selected: Vec<&str> = raw
        .lines()
        .filter(|line| tag.as_deref().map_or(true, |tag| line.contains(tag)))
        .collect();
    let skip = selected.len().saturating_sub(lines);
    selected[skip..].iter().map(|line| line.trim().to_string()).collect()
}

fn read_if_present(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(raw) => Some(raw),
        Err(e) => {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "Unable to read monitoring artifact");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HealthState;
    use tempfile::TempDir;

    #[test]
    fn missing_files_are_a_valid_state() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.json");
        assert!(read_status(&path).is_none());
        assert!(read_metrics_history(&path).is_empty());
        assert!(read_log_lines(&path, 50, None).is_empty());
    }

    #[test]
    fn corrupt_snapshot_degrades_to_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("status.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(read_status(&path).is_none());
    }

    #[test]
    fn corrupt_history_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("metrics.json");
        fs::write(&path, r#"{"this": "is not an array"}"#).unwrap();
        assert!(read_metrics_history(&path).is_empty());
    }

    #[test]
    fn reads_snapshot_and_history() {
        let dir = TempDir::new().unwrap();
        let status_path = dir.path().join("status.json");
        fs::write(&status_path, r#"{"status": "healthy", "checks": {"vpn": "success"}}"#).unwrap();
        let snapshot = read_status(&status_path).unwrap();
        assert_eq!(snapshot.state(), HealthState::Healthy);

        let metrics_path = dir.path().join("metrics.json");
        fs::write(
            &metrics_path,
            r#"[{"check": "vpn", "status": "success", "response_time": 0.12}]"#,
        )
        .unwrap();
        let history = read_metrics_history(&metrics_path);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].check, "vpn");
        assert_eq!(history[0].response_time, 0.12);
    }

    #[test]
    fn log_tail_keeps_most_recent_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("healthcheck.log");
        fs::write(&path, "one\ntwo\nthree\nfour\n").unwrap();
        assert_eq!(read_log_lines(&path, 2, None), vec!["three", "four"]);
        assert_eq!(read_log_lines(&path, 10, None).len(), 4);
    }

    #[test]
    fn log_level_filter_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("healthcheck.log");
        fs::write(
            &path,
            "2026-08-07 [INFO] check passed\n2026-08-07 [WARN] slow response\n2026-08-07 [ERROR] check failed\n",
        )
        .unwrap();
        let warnings = read_log_lines(&path, 50, Some("warn"));
        assert_eq!(warnings, vec!["2026-08-07 [WARN] slow response"]);

        // Filter applies before the tail window.
        let errors = read_log_lines(&path, 1, Some("ERROR"));
        assert_eq!(errors, vec!["2026-08-07 [ERROR] check failed"]);
    }
}
