//! Prometheus text-exposition rendering for the current snapshot and the
//! metrics-history summary.

use std::fmt::Write;

use crate::models::{MetricRecord, StatusSnapshot};
use crate::summary::summarize;

/// Render the exposition document. The output always terminates as valid
/// Prometheus text; a rendering failure degrades to a trailing comment
/// instead of aborting the response.
pub fn exposition(snapshot: Option<&StatusSnapshot>, history: &[MetricRecord]) -> String {
    let mut out = String::new();
    if let Err(e) = write_exposition(&mut out, snapshot, history) {
        let _ = writeln!(out, "# Error: {e}");
    }
    out
}

fn write_exposition(
    out: &mut String,
    snapshot: Option<&StatusSnapshot>,
    history: &[MetricRecord],
) -> std::fmt::Result {
    writeln!(
        out,
        "# HELP vpnpulse_health_check Health check status (1=healthy, 0=unhealthy)"
    )?;
    writeln!(out, "# TYPE vpnpulse_health_check gauge")?;

    if let Some(snapshot) = snapshot {
        writeln!(out, "vpnpulse_health_check {}", snapshot.state().gauge_value())?;
        for (check, outcome) in &snapshot.checks {
            let value = if outcome == "success" { 1 } else { 0 };
            writeln!(out, "vpnpulse_check{{check=\"{check}\"}} {value}")?;
        }
    }

    if !history.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "# HELP vpnpulse_response_time_seconds Response time for health checks"
        )?;
        writeln!(out, "# TYPE vpnpulse_response_time_seconds gauge")?;
        for (check, stats) in summarize(history) {
            writeln!(
                out,
                "vpnpulse_response_time_seconds{{check=\"{check}\",stat=\"average\"}} {}",
                stats.avg_response_time
            )?;
            writeln!(
                out,
                "vpnpulse_response_time_seconds{{check=\"{check}\",stat=\"maximum\"}} {}",
                stats.max_response_time
            )?;
            writeln!(
                out,
                "vpnpulse_success_rate_percent{{check=\"{check}\"}} {}",
                stats.success_rate
            )?;
        }
    }

    Ok(())
}
