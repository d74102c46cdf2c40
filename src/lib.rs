//! Aggregation engine for lead-generation sheet exports: record
//! normalization, lead classification, grouped sums and means, rolling
//! smoothing and threshold alerts.
//!
//! Every engine function is a pure transformation of its inputs. Callers own
//! the record set, the configuration and any caching of results.

pub mod aggregate;
pub mod alert;
pub mod cache;
pub mod classify;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod smooth;
pub mod source;

pub use aggregate::aggregate;
pub use alert::evaluate;
pub use classify::{classify, classify_all};
pub use error::EngineError;
pub use normalize::normalize;
pub use smooth::smooth;
