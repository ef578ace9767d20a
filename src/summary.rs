//! Reduces the raw metrics history into per-check-type statistics.

use std::collections::BTreeMap;

use crate::models::{MetricRecord, SummaryEntry};

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Partition the history by check name and aggregate each partition.
///
/// Records with an empty check name are skipped. `last_status` is the status
/// of the partition's most recently appended record, not its best or worst.
pub fn summarize(history: &[MetricRecord]) -> BTreeMap<String, SummaryEntry> {
    let mut partitions: BTreeMap<&str, Vec<&MetricRecord>> = BTreeMap::new();
    for record in history {
        if record.check.is_empty() {
            continue;
        }
        partitions.entry(&record.check).or_default().push(record);
    }

    let mut summary = BTreeMap::new();
    for (check, records) in partitions {
        let total = records.len();
        if total == 0 {
            continue;
        }
        let successes = records.iter().filter(|r| r.status == "success").count();
        let time_sum: f64 = records.iter().map(|r| r.response_time).sum();
        let time_max = records.iter().map(|r| r.response_time).fold(0.0_f64, f64::max);
        let last_status = records
            .last()
            .map(|r| r.status.clone())
            .unwrap_or_else(|| "unknown".into());

        summary.insert(
            check.to_string(),
            SummaryEntry {
                success_rate: round2(successes as f64 / total as f64 * 100.0),
                total_checks: total,
                avg_response_time: round3(time_sum / total as f64),
                max_response_time: round3(time_max),
                last_status,
            },
        );
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(check: &str, status: &str, response_time: f64) -> MetricRecord {
        MetricRecord {
            check: check.into(),
            status: status.into(),
            response_time,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn empty_history_yields_empty_summary() {
        assert!(summarize(&[]).is_empty());
    }

    #[test]
    fn vpn_round_trip() {
        let history = vec![
            record("vpn", "success", 0.1),
            record("vpn", "success", 0.2),
            record("vpn", "success", 0.3),
        ];
        let summary = summarize(&history);
        let entry = &summary["vpn"];
        assert_eq!(entry.success_rate, 100.0);
        assert_eq!(entry.total_checks, 3);
        assert_eq!(entry.avg_response_time, 0.2);
        assert_eq!(entry.max_response_time, 0.3);
        assert_eq!(entry.last_status, "success");
    }

    #[test]
    fn success_rate_counts_only_success_and_stays_in_bounds() {
        let history = vec![
            record("vpn", "success", 0.1),
            record("vpn", "failure", 0.4),
            record("vpn", "timeout", 0.9),
        ];
        let summary = summarize(&history);
        let entry = &summary["vpn"];
        assert_eq!(entry.success_rate, 33.33);
        assert!(entry.success_rate >= 0.0 && entry.success_rate <= 100.0);
        // Implied success count reverses back to the actual count.
        let implied = (entry.success_rate / 100.0 * entry.total_checks as f64).round() as usize;
        assert_eq!(implied, 1);
    }

    #[test]
    fn last_status_follows_append_order() {
        let history = vec![
            record("service", "failure", 2.5),
            record("service", "success", 0.1),
            record("service", "failure", 0.2),
        ];
        let summary = summarize(&history);
        assert_eq!(summary["service"].last_status, "failure");
        assert_eq!(summary["service"].max_response_time, 2.5);
    }

    #[test]
    fn records_without_a_check_name_are_skipped() {
        let history = vec![
            record("", "success", 0.1),
            record("vpn", "success", 0.2),
        ];
        let summary = summarize(&history);
        assert_eq!(summary.len(), 1);
        assert_eq!(summary["vpn"].total_checks, 1);
    }

    #[test]
    fn partitions_are_independent() {
        let history = vec![
            record("vpn", "success", 0.1),
            record("service", "failure", 1.0),
            record("vpn", "failure", 0.3),
        ];
        let summary = summarize(&history);
        assert_eq!(summary["vpn"].success_rate, 50.0);
        assert_eq!(summary["vpn"].total_checks, 2);
        assert_eq!(summary["service"].success_rate, 0.0);
        assert_eq!(summary["service"].last_status, "failure");
    }

    #[test]
    fn averages_are_rounded_to_three_decimals() {
        let history = vec![
            record("vpn", "success", 0.1),
            record("vpn", "success", 0.2),
            record("vpn", "success", 0.25),
        ];
        let summary = summarize(&history);
        assert_eq!(summary["vpn"].avg_response_time, 0.183);
    }
}
