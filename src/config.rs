//! Engine configuration as loaded from JSON, and its validated form.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::filter::RecordFilter;
use crate::models::{Dimension, Direction, Metric, MetricThreshold, TimeBucket};
use crate::schema;
use crate::smooth::DEFAULT_WINDOW;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub metric: String,
    pub target: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub bucket: TimeBucket,
    pub window: usize,
    pub trend_metrics: Vec<String>,
    pub segment_dimensions: Vec<String>,
    pub alert_dimension: String,
    pub thresholds: Vec<ThresholdConfig>,
    pub filter: RecordFilter,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bucket: TimeBucket::Day,
            window: DEFAULT_WINDOW,
            trend_metrics: vec![schema::CPA.into(), schema::ROI.into(), schema::CTR.into()],
            segment_dimensions: vec![schema::CHANNEL.into(), schema::PRODUCT.into()],
            alert_dimension: schema::CHANNEL.into(),
            // No CTR target by default: it differs between deployments.
            thresholds: vec![
                ThresholdConfig {
                    metric: schema::CPA.into(),
                    target: 120.0,
                    direction: Direction::AtMost,
                },
                ThresholdConfig {
                    metric: schema::ROI.into(),
                    target: 1.5,
                    direction: Direction::AtLeast,
                },
            ],
            filter: RecordFilter::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// Replaces any configured CTR threshold with an at-least `target`.
    pub fn set_ctr_target(&mut self, target: f64) {
        self.thresholds
            .retain(|t| t.metric.parse::<Metric>().ok() != Some(Metric::ClickThroughRate));
        self.thresholds.push(ThresholdConfig {
            metric: schema::CTR.into(),
            target,
            direction: Direction::AtLeast,
        });
    }

    /// Validates every field name before any aggregation runs.
    pub fn resolve(&self) -> Result<ReportPlan, EngineError> {
        if self.window == 0 {
            return Err(EngineError::InvalidWindow(self.window));
        }

        let trend_metrics = self
            .trend_metrics
            .iter()
            .map(|m| m.parse::<Metric>())
            .collect::<Result<Vec<_>, _>>()?;
        let segment_dimensions = self
            .segment_dimensions
            .iter()
            .map(|d| d.parse::<Dimension>())
            .collect::<Result<Vec<_>, _>>()?;
        let alert_dimension = self.alert_dimension.parse::<Dimension>()?;
        let thresholds = self
            .thresholds
            .iter()
            .map(|t| -> Result<MetricThreshold, EngineError> {
                Ok(MetricThreshold {
                    metric: t.metric.parse()?,
                    target: t.target,
                    direction: t.direction,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ReportPlan {
            bucket: self.bucket,
            window: self.window,
            trend_metrics,
            segment_dimensions,
            alert_dimension,
            thresholds,
            filter: self.filter.clone(),
        })
    }
}

/// Typed, validated configuration consumed by the dashboard builder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPlan {
    pub bucket: TimeBucket,
    pub window: usize,
    pub trend_metrics: Vec<Metric>,
    pub segment_dimensions: Vec<Dimension>,
    pub alert_dimension: Dimension,
    pub thresholds: Vec<MetricThreshold>,
    pub filter: RecordFilter,
}
