//! Grouping of classified records by time bucket and dimension tuple.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{
    AggregatedRow, AggregatedTable, AggregationSpec, ClassifiedRecord, Dimension, Metric, Reducer,
    TimeBucket,
};

impl AggregationSpec {
    /// Sum of leads per bucket and outcome.
    pub fn leads_by_outcome(bucket: TimeBucket) -> Self {
        Self {
            bucket,
            dimensions: vec![Dimension::Outcome],
            metric: Metric::LeadsObtained,
            reducer: Reducer::Sum,
        }
    }

    /// Mean of `metric` per bucket and `dimensions`; an empty dimension list
    /// yields the overall series.
    pub fn mean_of(metric: Metric, bucket: TimeBucket, dimensions: Vec<Dimension>) -> Self {
        Self {
            bucket,
            dimensions,
            metric,
            reducer: Reducer::Mean,
        }
    }
}

/// Groups `records` per `spec`.
///
/// Rows come out ascending by bucket, then by the order in which each
/// dimension tuple is first seen when records are scanned by ascending date.
/// Groups without a single value for the metric are not emitted.
pub fn aggregate(records: &[ClassifiedRecord], spec: &AggregationSpec) -> AggregatedTable {
    let mut order: Vec<usize> = (0..records.len()).collect();
    order.sort_by_key(|&i| records[i].record.date);

    let mut ranks: HashMap<Vec<String>, usize> = HashMap::new();
    let mut keys: Vec<Vec<String>> = Vec::new();
    let mut groups: BTreeMap<(NaiveDate, usize), (f64, usize)> = BTreeMap::new();

    for index in order {
        let record = &records[index];
        let key: Vec<String> = spec
            .dimensions
            .iter()
            .map(|dimension| record.dimension_value(*dimension).to_string())
            .collect();

        let rank = match ranks.get(&key) {
            Some(rank) => *rank,
            None => {
                let rank = keys.len();
                ranks.insert(key.clone(), rank);
                keys.push(key);
                rank
            }
        };

        let Some(value) = record.record.metric(spec.metric) else {
            continue;
        };

        let bucket = spec.bucket.bucket(record.record.date);
        let entry = groups.entry((bucket, rank)).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let rows: Vec<AggregatedRow> = groups
        .into_iter()
        .map(|((bucket, rank), (total, count))| AggregatedRow {
            bucket,
            key: keys[rank].clone(),
            metric: spec.metric,
            value: match spec.reducer {
                Reducer::Sum => total,
                Reducer::Mean => total / count as f64,
            },
            observations: count,
        })
        .collect();

    debug!(
        records = records.len(),
        groups = rows.len(),
        metric = %spec.metric,
        "aggregated records"
    );

    AggregatedTable {
        spec: spec.clone(),
        rows,
    }
}
