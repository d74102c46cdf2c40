//! Month selection and channel/product narrowing ahead of aggregation.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::ClassifiedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::of(date) == *self
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("invalid month {s:?} (expected YYYY-MM)");
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { year, month })
    }
}

/// Distinct months present in `records`, oldest first.
pub fn available_months(records: &[ClassifiedRecord]) -> Vec<YearMonth> {
    records
        .iter()
        .map(|r| YearMonth::of(r.record.date))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Criteria a record must meet to take part in a report. Empty lists match
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordFilter {
    pub month: Option<YearMonth>,
    pub channels: Vec<String>,
    pub products: Vec<String>,
}

impl RecordFilter {
    pub fn matches(&self, record: &ClassifiedRecord) -> bool {
        if let Some(month) = self.month {
            if !month.contains(record.record.date) {
                return false;
            }
        }
        if !self.channels.is_empty() && !self.channels.contains(&record.record.channel) {
            return false;
        }
        if !self.products.is_empty() && !self.products.contains(&record.record.product) {
            return false;
        }
        true
    }

    pub fn apply(&self, records: &[ClassifiedRecord]) -> Vec<ClassifiedRecord> {
        records
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect()
    }
}
