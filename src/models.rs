use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::schema;

/// One raw row as delivered by the fetch side: column name to cell value.
pub type RawRow = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub date: NaiveDate,
    pub status: String,
    pub rejection_reason: String,
    pub channel: String,
    pub product: String,
    pub leads_obtained: Option<u64>,
    pub cost_per_acquisition: Option<f64>,
    pub return_on_investment: Option<f64>,
    pub click_through_rate: Option<f64>,
}

impl Record {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::LeadsObtained => self.leads_obtained.map(|v| v as f64),
            Metric::CostPerAcquisition => self.cost_per_acquisition,
            Metric::ReturnOnInvestment => self.return_on_investment,
            Metric::ClickThroughRate => self.click_through_rate,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Successful,
    InProgress,
    Rejected,
}

impl Outcome {
    pub const ALL: [Outcome; 3] = [Outcome::Successful, Outcome::InProgress, Outcome::Rejected];

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Successful => "successful",
            Outcome::InProgress => "in_progress",
            Outcome::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedRecord {
    #[serde(flatten)]
    pub record: Record,
    pub outcome: Outcome,
}

impl ClassifiedRecord {
    pub fn dimension_value(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Channel => &self.record.channel,
            Dimension::Product => &self.record.product,
            Dimension::Status => &self.record.status,
            Dimension::RejectionReason => &self.record.rejection_reason,
            Dimension::Outcome => self.outcome.as_str(),
        }
    }
}

/// Categorical field records can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Channel,
    Product,
    Status,
    RejectionReason,
    Outcome,
}

impl Dimension {
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Channel => schema::CHANNEL,
            Dimension::Product => schema::PRODUCT,
            Dimension::Status => schema::STATUS,
            Dimension::RejectionReason => schema::REJECTION_REASON,
            Dimension::Outcome => schema::OUTCOME,
        }
    }
}

impl FromStr for Dimension {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            schema::CHANNEL | "channel" => Ok(Dimension::Channel),
            schema::PRODUCT | "product" => Ok(Dimension::Product),
            schema::STATUS | "status" => Ok(Dimension::Status),
            schema::REJECTION_REASON | "rejection_reason" => Ok(Dimension::RejectionReason),
            schema::OUTCOME | "outcome" => Ok(Dimension::Outcome),
            other => Err(EngineError::UnknownDimension {
                field: other.to_string(),
            }),
        }
    }
}

/// Numeric field records carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    LeadsObtained,
    CostPerAcquisition,
    ReturnOnInvestment,
    ClickThroughRate,
}

impl Metric {
    pub fn column(&self) -> &'static str {
        match self {
            Metric::LeadsObtained => schema::LEADS_OBTAINED,
            Metric::CostPerAcquisition => schema::CPA,
            Metric::ReturnOnInvestment => schema::ROI,
            Metric::ClickThroughRate => schema::CTR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::LeadsObtained => "leads_obtained",
            Metric::CostPerAcquisition => "cost_per_acquisition",
            Metric::ReturnOnInvestment => "return_on_investment",
            Metric::ClickThroughRate => "click_through_rate",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            schema::LEADS_OBTAINED | "leads_obtained" => Ok(Metric::LeadsObtained),
            schema::CPA | "cost_per_acquisition" => Ok(Metric::CostPerAcquisition),
            schema::ROI | "return_on_investment" => Ok(Metric::ReturnOnInvestment),
            schema::CTR | "click_through_rate" => Ok(Metric::ClickThroughRate),
            other => Err(EngineError::UnknownMetric {
                field: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    #[default]
    Day,
    Month,
}

impl TimeBucket {
    /// Maps a date onto the first day of its bucket.
    pub fn bucket(&self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reducer {
    Sum,
    Mean,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregationSpec {
    pub bucket: TimeBucket,
    pub dimensions: Vec<Dimension>,
    pub metric: Metric,
    pub reducer: Reducer,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedRow {
    pub bucket: NaiveDate,
    pub key: Vec<String>,
    pub metric: Metric,
    pub value: f64,
    pub observations: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTable {
    pub spec: AggregationSpec,
    pub rows: Vec<AggregatedRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RollingRow {
    #[serde(flatten)]
    pub row: AggregatedRow,
    pub smoothed: f64,
    pub window_len: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    AtMost,
    AtLeast,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricThreshold {
    pub metric: Metric,
    pub target: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Pass,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAlert {
    pub metric: Metric,
    pub average: f64,
    pub observations: usize,
    pub target: f64,
    pub direction: Direction,
    pub status: AlertStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRow {
    pub dimension: Dimension,
    pub value: String,
    pub metrics: Vec<MetricAlert>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_parse_from_column_and_snake_names() {
        assert_eq!("Canal".parse::<Dimension>(), Ok(Dimension::Channel));
        assert_eq!("product".parse::<Dimension>(), Ok(Dimension::Product));
        assert_eq!(
            "Region".parse::<Dimension>(),
            Err(EngineError::UnknownDimension {
                field: "Region".to_string()
            })
        );
    }

    #[test]
    fn metrics_parse_from_column_and_snake_names() {
        assert_eq!("CPA".parse::<Metric>(), Ok(Metric::CostPerAcquisition));
        assert_eq!(
            "click_through_rate".parse::<Metric>(),
            Ok(Metric::ClickThroughRate)
        );
        assert!(matches!(
            "cpa".parse::<Metric>(),
            Err(EngineError::UnknownMetric { .. })
        ));
    }

    #[test]
    fn metrics_map_to_sheet_columns() {
        assert_eq!(Metric::LeadsObtained.column(), "Leads_Obtenidos");
        assert_eq!(Metric::CostPerAcquisition.column(), "CPA");
        assert_eq!(Metric::ClickThroughRate.column(), "CTR");
        for metric in [Metric::ReturnOnInvestment, Metric::ClickThroughRate] {
            assert_eq!(metric.column().parse::<Metric>(), Ok(metric));
        }
    }

    #[test]
    fn month_bucket_snaps_to_first_day() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 17).unwrap();
        assert_eq!(TimeBucket::Day.bucket(date), date);
        assert_eq!(
            TimeBucket::Month.bucket(date),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
    }
}
