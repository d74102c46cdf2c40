//! Raw sheet rows to typed records.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::error::EngineError;
use crate::models::{Metric, RawRow, Record};
use crate::schema;

/// Parses every raw row into a [`Record`], failing the whole batch on the
/// first bad cell.
pub fn normalize(rows: &[RawRow]) -> Result<Vec<Record>, EngineError> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };

    for column in schema::REQUIRED {
        if !first.contains_key(column) {
            return Err(EngineError::MissingColumn {
                column: column.to_string(),
            });
        }
    }

    for (index, row) in rows.iter().enumerate().skip(1) {
        if row.len() != first.len() || !row.keys().eq(first.keys()) {
            return Err(EngineError::SchemaMismatch { row: index });
        }
    }

    let records = rows
        .iter()
        .enumerate()
        .map(|(index, row)| parse_row(index, row))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(rows = records.len(), "normalized record batch");
    Ok(records)
}

fn parse_row(index: usize, row: &RawRow) -> Result<Record, EngineError> {
    Ok(Record {
        date: parse_date(index, cell(row, schema::DATE))?,
        status: text(cell(row, schema::STATUS)),
        rejection_reason: text(cell(row, schema::REJECTION_REASON)),
        channel: text(cell(row, schema::CHANNEL)),
        product: text(cell(row, schema::PRODUCT)),
        leads_obtained: parse_count(
            index,
            Metric::LeadsObtained.column(),
            cell(row, Metric::LeadsObtained.column()),
        )?,
        cost_per_acquisition: metric_cell(index, row, Metric::CostPerAcquisition)?,
        return_on_investment: metric_cell(index, row, Metric::ReturnOnInvestment)?,
        click_through_rate: metric_cell(index, row, Metric::ClickThroughRate)?,
    })
}

fn metric_cell(index: usize, row: &RawRow, metric: Metric) -> Result<Option<f64>, EngineError> {
    parse_real(index, metric.column(), cell(row, metric.column()))
}

fn cell<'a>(row: &'a RawRow, column: &str) -> &'a Value {
    row.get(column).unwrap_or(&Value::Null)
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parses `dd/mm/yyyy`; the year must be exactly four digits.
pub fn parse_date(index: usize, value: &Value) -> Result<NaiveDate, EngineError> {
    let malformed = || EngineError::MalformedDate {
        row: index,
        value: text(value),
    };

    let Value::String(raw) = value else {
        return Err(malformed());
    };

    if raw.chars().any(char::is_whitespace) {
        return Err(malformed());
    }

    let year = raw.rsplit('/').next().unwrap_or_default();
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    NaiveDate::parse_from_str(raw, schema::DATE_FORMAT).map_err(|_| malformed())
}

fn parse_real(index: usize, field: &str, value: &Value) -> Result<Option<f64>, EngineError> {
    let malformed = || EngineError::MalformedMetric {
        row: index,
        field: field.to_string(),
        value: text(value),
    };

    let parsed = match value {
        Value::Null => return Ok(None),
        Value::Number(n) => n.as_f64().ok_or_else(malformed)?,
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => s.trim().parse::<f64>().map_err(|_| malformed())?,
        _ => return Err(malformed()),
    };

    if !parsed.is_finite() || parsed < 0.0 {
        return Err(malformed());
    }
    Ok(Some(parsed))
}

fn parse_count(index: usize, field: &str, value: &Value) -> Result<Option<u64>, EngineError> {
    let malformed = || EngineError::MalformedMetric {
        row: index,
        field: field.to_string(),
        value: text(value),
    };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(count), _) => Ok(Some(count)),
            (None, Some(f)) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => {
                Ok(Some(f as u64))
            }
            _ => Err(malformed()),
        },
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<u64>().map(Some).map_err(|_| malformed()),
        _ => Err(malformed()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_row(date: &str) -> RawRow {
        let mut row = RawRow::new();
        row.insert(schema::DATE.into(), json!(date));
        row.insert(schema::STATUS.into(), json!("Completado"));
        row.insert(schema::REJECTION_REASON.into(), json!("N/A"));
        row.insert(schema::CHANNEL.into(), json!("Facebook"));
        row.insert(schema::PRODUCT.into(), json!("Tarjeta"));
        row.insert(schema::LEADS_OBTAINED.into(), json!(12));
        row.insert(schema::CPA.into(), json!("95.5"));
        row.insert(schema::ROI.into(), json!(1.8));
        row.insert(schema::CTR.into(), json!(""));
        row
    }

    #[test]
    fn parses_typed_record() {
        let records = normalize(&[sample_row("05/02/2024")]).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 2, 5).unwrap());
        assert_eq!(record.status, "Completado");
        assert_eq!(record.leads_obtained, Some(12));
        assert_eq!(record.cost_per_acquisition, Some(95.5));
        assert_eq!(record.return_on_investment, Some(1.8));
        assert_eq!(record.click_through_rate, None);
    }

    #[test]
    fn empty_batch_is_not_an_error() {
        assert_eq!(normalize(&[]), Ok(Vec::new()));
    }

    #[test]
    fn invalid_month_fails_whole_batch() {
        let rows = vec![sample_row("01/01/2024"), sample_row("31/13/2024")];
        assert_eq!(
            normalize(&rows),
            Err(EngineError::MalformedDate {
                row: 1,
                value: "31/13/2024".to_string()
            })
        );
    }

    #[test]
    fn two_digit_year_is_rejected() {
        let err = normalize(&[sample_row("01/01/24")]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedDate { row: 0, .. }));
    }

    #[test]
    fn whitespace_in_date_is_rejected() {
        for raw in [" 05/02/2024", "05/ 02/2024", "05/02/2024 "] {
            assert_eq!(
                parse_date(0, &json!(raw)),
                Err(EngineError::MalformedDate {
                    row: 0,
                    value: raw.to_string()
                })
            );
        }
    }

    #[test]
    fn iso_date_is_rejected() {
        let err = normalize(&[sample_row("2024-01-01")]).unwrap_err();
        assert!(matches!(err, EngineError::MalformedDate { .. }));
    }

    #[test]
    fn non_numeric_metric_is_rejected() {
        let mut row = sample_row("01/01/2024");
        row.insert(schema::ROI.into(), json!("alto"));
        assert_eq!(
            normalize(&[row]),
            Err(EngineError::MalformedMetric {
                row: 0,
                field: schema::ROI.to_string(),
                value: "alto".to_string()
            })
        );
    }

    #[test]
    fn negative_and_non_finite_metrics_are_rejected() {
        let mut row = sample_row("01/01/2024");
        row.insert(schema::CPA.into(), json!("-3"));
        assert!(matches!(
            normalize(&[row]),
            Err(EngineError::MalformedMetric { .. })
        ));

        let mut row = sample_row("01/01/2024");
        row.insert(schema::CTR.into(), json!("NaN"));
        assert!(matches!(
            normalize(&[row]),
            Err(EngineError::MalformedMetric { .. })
        ));
    }

    #[test]
    fn fractional_lead_count_is_rejected() {
        let mut row = sample_row("01/01/2024");
        row.insert(schema::LEADS_OBTAINED.into(), json!("2.5"));
        assert!(matches!(
            normalize(&[row]),
            Err(EngineError::MalformedMetric { .. })
        ));
    }

    #[test]
    fn missing_required_column_is_reported() {
        let mut row = sample_row("01/01/2024");
        row.remove(schema::CHANNEL);
        assert_eq!(
            normalize(&[row]),
            Err(EngineError::MissingColumn {
                column: schema::CHANNEL.to_string()
            })
        );
    }

    #[test]
    fn rows_with_different_columns_are_rejected() {
        let mut second = sample_row("02/01/2024");
        second.insert("Extra".into(), json!("x"));
        assert_eq!(
            normalize(&[sample_row("01/01/2024"), second]),
            Err(EngineError::SchemaMismatch { row: 1 })
        );
    }
}
