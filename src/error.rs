use thiserror::Error;

/// Failures raised by the aggregation engine.
///
/// Row positions are zero-based indices into the raw input.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("malformed date {value:?} at row {row} (expected dd/mm/yyyy)")]
    MalformedDate { row: usize, value: String },

    #[error("malformed value {value:?} for {field} at row {row}")]
    MalformedMetric {
        row: usize,
        field: String,
        value: String,
    },

    #[error("unknown dimension: {field}")]
    UnknownDimension { field: String },

    #[error("unknown metric: {field}")]
    UnknownMetric { field: String },

    #[error("missing column: {column}")]
    MissingColumn { column: String },

    #[error("row {row} does not share the column set of row 0")]
    SchemaMismatch { row: usize },

    #[error("rolling window must be at least 1, got {0}")]
    InvalidWindow(usize),
}
