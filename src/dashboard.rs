//! Assembles every derived table a dashboard renders from one plan.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::info;

use crate::aggregate::aggregate;
use crate::alert::evaluate;
use crate::config::ReportPlan;
use crate::error::EngineError;
use crate::models::{
    AggregatedTable, AggregationSpec, AlertRow, ClassifiedRecord, Metric, Outcome, RollingRow,
};
use crate::smooth::smooth;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeTotal {
    pub outcome: Outcome,
    pub records: usize,
    pub leads: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub total_leads: u64,
    pub outcomes: Vec<OutcomeTotal>,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricTrend {
    pub metric: Metric,
    pub segmented: Vec<RollingRow>,
    pub overall: Vec<RollingRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub summary: Summary,
    pub leads_by_outcome: AggregatedTable,
    pub trends: Vec<MetricTrend>,
    pub alerts: Vec<AlertRow>,
}

pub fn summarize(records: &[ClassifiedRecord]) -> Summary {
    let outcomes = Outcome::ALL
        .iter()
        .map(|outcome| {
            let matching = records.iter().filter(|r| r.outcome == *outcome);
            OutcomeTotal {
                outcome: *outcome,
                records: matching.clone().count(),
                leads: matching.filter_map(|r| r.record.leads_obtained).sum(),
            }
        })
        .collect::<Vec<_>>();

    Summary {
        records: records.len(),
        total_leads: outcomes.iter().map(|o| o.leads).sum(),
        outcomes,
        first_date: records.iter().map(|r| r.record.date).min(),
        last_date: records.iter().map(|r| r.record.date).max(),
    }
}

/// Segmented and overall smoothed means of one metric.
pub fn metric_trend(
    records: &[ClassifiedRecord],
    plan: &ReportPlan,
    metric: Metric,
) -> Result<MetricTrend, EngineError> {
    let segmented = aggregate(
        records,
        &AggregationSpec::mean_of(metric, plan.bucket, plan.segment_dimensions.clone()),
    );
    let overall = aggregate(
        records,
        &AggregationSpec::mean_of(metric, plan.bucket, Vec::new()),
    );

    Ok(MetricTrend {
        metric,
        segmented: smooth(&segmented, &plan.segment_dimensions, plan.window)?,
        overall: smooth(&overall, &[], plan.window)?,
    })
}

pub fn build_dashboard(
    records: &[ClassifiedRecord],
    plan: &ReportPlan,
) -> Result<Dashboard, EngineError> {
    let records = plan.filter.apply(records);

    let trends = plan
        .trend_metrics
        .iter()
        .map(|metric| metric_trend(&records, plan, *metric))
        .collect::<Result<Vec<_>, _>>()?;

    let dashboard = Dashboard {
        summary: summarize(&records),
        leads_by_outcome: aggregate(&records, &AggregationSpec::leads_by_outcome(plan.bucket)),
        trends,
        alerts: evaluate(&records, plan.alert_dimension, &plan.thresholds),
    };

    info!(
        records = dashboard.summary.records,
        trends = dashboard.trends.len(),
        alerts = dashboard.alerts.len(),
        "built dashboard"
    );
    Ok(dashboard)
}
