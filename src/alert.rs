//! Threshold checks of per-dimension metric averages.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{
    AlertRow, AlertStatus, ClassifiedRecord, Dimension, Direction, Metric, MetricAlert,
    MetricThreshold,
};

impl MetricThreshold {
    pub fn at_most(metric: Metric, target: f64) -> Self {
        Self {
            metric,
            target,
            direction: Direction::AtMost,
        }
    }

    pub fn at_least(metric: Metric, target: f64) -> Self {
        Self {
            metric,
            target,
            direction: Direction::AtLeast,
        }
    }

    pub fn check(&self, average: f64) -> AlertStatus {
        let pass = match self.direction {
            Direction::AtMost => average <= self.target,
            Direction::AtLeast => average >= self.target,
        };
        if pass {
            AlertStatus::Pass
        } else {
            AlertStatus::Fail
        }
    }
}

/// Averages every thresholded metric per value of `dimension` and classifies
/// it as pass or fail.
///
/// Values appear in first-seen order. A metric with no observations for a
/// value is left out of that row.
pub fn evaluate(
    records: &[ClassifiedRecord],
    dimension: Dimension,
    thresholds: &[MetricThreshold],
) -> Vec<AlertRow> {
    let mut ranks: HashMap<&str, usize> = HashMap::new();
    let mut totals: Vec<(&str, Vec<(f64, usize)>)> = Vec::new();

    for record in records {
        let value = record.dimension_value(dimension);
        let rank = *ranks.entry(value).or_insert_with(|| {
            totals.push((value, vec![(0.0, 0); thresholds.len()]));
            totals.len() - 1
        });

        for (slot, threshold) in thresholds.iter().enumerate() {
            if let Some(observed) = record.record.metric(threshold.metric) {
                let entry = &mut totals[rank].1[slot];
                entry.0 += observed;
                entry.1 += 1;
            }
        }
    }

    let rows: Vec<AlertRow> = totals
        .into_iter()
        .map(|(value, sums)| AlertRow {
            dimension,
            value: value.to_string(),
            metrics: thresholds
                .iter()
                .zip(sums)
                .filter(|(_, (_, count))| *count > 0)
                .map(|(threshold, (total, count))| {
                    let average = total / count as f64;
                    MetricAlert {
                        metric: threshold.metric,
                        average,
                        observations: count,
                        target: threshold.target,
                        direction: threshold.direction,
                        status: threshold.check(average),
                    }
                })
                .collect(),
        })
        .collect();

    debug!(
        records = records.len(),
        values = rows.len(),
        dimension = dimension.column(),
        "evaluated alerts"
    );
    rows
}
