use crate::models::{ClassifiedRecord, Outcome, Record};
use crate::schema::status;

/// First matching rule wins. A completed lead that still carries a rejection
/// reason falls through to `Rejected`.
pub fn classify(record: &Record) -> Outcome {
    let not_rejected = record.rejection_reason == status::NOT_REJECTED;
    match record.status.as_str() {
        status::COMPLETED if not_rejected => Outcome::Successful,
        status::IN_PROGRESS if not_rejected => Outcome::InProgress,
        _ => Outcome::Rejected,
    }
}

pub fn classify_all(records: Vec<Record>) -> Vec<ClassifiedRecord> {
    records
        .into_iter()
        .map(|record| {
            let outcome = classify(&record);
            ClassifiedRecord { record, outcome }
        })
        .collect()
}
