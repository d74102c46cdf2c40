//! Trailing moving averages over aggregated series.

use std::collections::{HashMap, VecDeque};

use tracing::debug;

use crate::error::EngineError;
use crate::models::{AggregatedTable, Dimension, RollingRow};

pub const DEFAULT_WINDOW: usize = 7;

/// Smooths each `group_by` series of `table` with a trailing mean over the
/// last `window` present observations.
///
/// The window counts observations, not calendar days, and warms up
/// progressively: the first row of a group is its own mean. Output keeps the
/// row order of `table`.
pub fn smooth(
    table: &AggregatedTable,
    group_by: &[Dimension],
    window: usize,
) -> Result<Vec<RollingRow>, EngineError> {
    if window == 0 {
        return Err(EngineError::InvalidWindow(window));
    }

    let positions = group_by
        .iter()
        .map(|dimension| {
            table
                .spec
                .dimensions
                .iter()
                .position(|d| d == dimension)
                .ok_or_else(|| EngineError::UnknownDimension {
                    field: dimension.column().to_string(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut order: Vec<usize> = (0..table.rows.len()).collect();
    order.sort_by_key(|&i| table.rows[i].bucket);

    let mut windows: HashMap<Vec<&str>, VecDeque<f64>> = HashMap::new();
    let mut smoothed = vec![(0.0, 0); table.rows.len()];

    for index in order {
        let row = &table.rows[index];
        let group: Vec<&str> = positions.iter().map(|&p| row.key[p].as_str()).collect();
        let trailing = windows.entry(group).or_default();
        trailing.push_back(row.value);
        if trailing.len() > window {
            trailing.pop_front();
        }
        let mean = trailing.iter().sum::<f64>() / trailing.len() as f64;
        smoothed[index] = (mean, trailing.len());
    }

    debug!(rows = table.rows.len(), groups = windows.len(), window, "smoothed series");

    Ok(table
        .rows
        .iter()
        .zip(smoothed)
        .map(|(row, (value, window_len))| RollingRow {
            row: row.clone(),
            smoothed: value,
            window_len,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AggregatedRow, AggregationSpec, Metric, TimeBucket};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    fn sample_table(points: &[(u32, &str, f64)]) -> AggregatedTable {
        AggregatedTable {
            spec: AggregationSpec::mean_of(
                Metric::CostPerAcquisition,
                TimeBucket::Day,
                vec![Dimension::Channel],
            ),
            rows: points
                .iter()
                .map(|(d, channel, value)| AggregatedRow {
                    bucket: day(*d),
                    key: vec![channel.to_string()],
                    metric: Metric::CostPerAcquisition,
                    value: *value,
                    observations: 1,
                })
                .collect(),
        }
    }

    fn smoothed_values(rows: &[RollingRow]) -> Vec<f64> {
        rows.iter().map(|r| r.smoothed).collect()
    }

    #[test]
    fn warms_up_before_window_fills() {
        let table = sample_table(&[(1, "Google", 10.0), (2, "Google", 20.0), (5, "Google", 30.0)]);
        let rows = smooth(&table, &[Dimension::Channel], DEFAULT_WINDOW).unwrap();
        assert_eq!(smoothed_values(&rows), vec![10.0, 15.0, 20.0]);
        assert_eq!(rows.iter().map(|r| r.window_len).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn constant_series_stays_constant() {
        let points: Vec<_> = (1..=12).map(|d| (d, "Google", 42.5)).collect();
        let rows = smooth(&sample_table(&points), &[Dimension::Channel], 7).unwrap();
        assert!(rows.iter().all(|r| (r.smoothed - 42.5).abs() < 1e-9));
    }

    #[test]
    fn window_drops_oldest_observation() {
        let table = sample_table(&[
            (1, "Google", 1.0),
            (2, "Google", 2.0),
            (3, "Google", 3.0),
            (4, "Google", 4.0),
        ]);
        let rows = smooth(&table, &[Dimension::Channel], 2).unwrap();
        assert_eq!(smoothed_values(&rows), vec![1.0, 1.5, 2.5, 3.5]);
    }

    #[test]
    fn groups_are_smoothed_independently() {
        let table = sample_table(&[
            (1, "Google", 10.0),
            (1, "Facebook", 100.0),
            (2, "Google", 30.0),
            (3, "Facebook", 200.0),
        ]);
        let rows = smooth(&table, &[Dimension::Channel], 7).unwrap();
        assert_eq!(smoothed_values(&rows), vec![10.0, 100.0, 20.0, 150.0]);
    }

    #[test]
    fn never_looks_ahead() {
        let early = sample_table(&[(1, "Google", 10.0), (2, "Google", 20.0)]);
        let extended = sample_table(&[
            (1, "Google", 10.0),
            (2, "Google", 20.0),
            (3, "Google", 90.0),
        ]);
        let a = smooth(&early, &[Dimension::Channel], 7).unwrap();
        let b = smooth(&extended, &[Dimension::Channel], 7).unwrap();
        assert_eq!(smoothed_values(&a), smoothed_values(&b)[..2].to_vec());
    }

    #[test]
    fn empty_group_key_smooths_whole_table() {
        let table = sample_table(&[(1, "Google", 10.0), (1, "Facebook", 30.0)]);
        let rows = smooth(&table, &[], 7).unwrap();
        assert_eq!(smoothed_values(&rows), vec![10.0, 20.0]);
    }

    #[test]
    fn rejects_zero_window_and_foreign_dimension() {
        let table = sample_table(&[(1, "Google", 10.0)]);
        assert_eq!(
            smooth(&table, &[Dimension::Channel], 0),
            Err(EngineError::InvalidWindow(0))
        );
        assert_eq!(
            smooth(&table, &[Dimension::Product], 7),
            Err(EngineError::UnknownDimension {
                field: "Producto".to_string()
            })
        );
    }

    #[test]
    fn empty_table_gives_empty_rows() {
        let rows = smooth(&sample_table(&[]), &[Dimension::Channel], 7).unwrap();
        assert!(rows.is_empty());
    }
}
