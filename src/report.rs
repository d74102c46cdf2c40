use std::fmt::Write;

use crate::dashboard::Dashboard;
use crate::models::{AlertStatus, Direction, RollingRow};

fn latest_per_group(rows: &[RollingRow]) -> Vec<&RollingRow> {
    let mut latest: Vec<&RollingRow> = Vec::new();
    for row in rows {
        match latest.iter_mut().find(|r| r.row.key == row.row.key) {
            Some(slot) if slot.row.bucket <= row.row.bucket => *slot = row,
            Some(_) => {}
            None => latest.push(row),
        }
    }
    latest
}

pub fn build_report(scope: Option<&str>, dashboard: &Dashboard) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all months");
    let summary = &dashboard.summary;

    let _ = writeln!(output, "# Lead Operations Report");
    match (summary.first_date, summary.last_date) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                output,
                "Generated for {} ({} records from {} to {})",
                scope_label, summary.records, first, last
            );
        }
        _ => {
            let _ = writeln!(output, "Generated for {} (no records)", scope_label);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Lead Outcomes");

    if summary.records == 0 {
        let _ = writeln!(output, "No leads recorded for this scope.");
    } else {
        for total in summary.outcomes.iter() {
            let _ = writeln!(
                output,
                "- {}: {} leads across {} records",
                total.outcome, total.leads, total.records
            );
        }
        let _ = writeln!(output, "- total: {} leads", summary.total_leads);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Metric Health");

    if dashboard.alerts.is_empty() {
        let _ = writeln!(output, "No metrics to evaluate for this scope.");
    } else {
        for alert in dashboard.alerts.iter() {
            let _ = writeln!(output, "### {}", alert.value);
            for metric in alert.metrics.iter() {
                let mark = match metric.status {
                    AlertStatus::Pass => "PASS",
                    AlertStatus::Fail => "FAIL",
                };
                let comparator = match metric.direction {
                    Direction::AtMost => "<=",
                    Direction::AtLeast => ">=",
                };
                let _ = writeln!(
                    output,
                    "- {} {}: avg {:.4} (target {} {}, {} records)",
                    mark,
                    metric.metric,
                    metric.average,
                    comparator,
                    metric.target,
                    metric.observations
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Latest Smoothed Trends");

    for trend in dashboard.trends.iter() {
        let _ = writeln!(output, "### {}", trend.metric);
        if trend.overall.is_empty() {
            let _ = writeln!(output, "No observations.");
            continue;
        }
        for row in latest_per_group(&trend.overall) {
            let _ = writeln!(
                output,
                "- overall on {}: {:.4} (window {})",
                row.row.bucket, row.smoothed, row.window_len
            );
        }
        for row in latest_per_group(&trend.segmented) {
            let _ = writeln!(
                output,
                "- {} on {}: {:.4} (window {})",
                row.row.key.join(" / "),
                row.row.bucket,
                row.smoothed,
                row.window_len
            );
        }
    }

    output
}
