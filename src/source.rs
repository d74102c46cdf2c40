//! Loading raw rows from sheet exports on disk.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde_json::Value;
use tracing::info;

use crate::models::RawRow;

/// Reads a headed CSV export; every cell is kept as text.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<Vec<RawRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<BTreeMap<String, String>>().enumerate() {
        let row = result.with_context(|| format!("failed to read CSV row {index}"))?;
        rows.push(
            row.into_iter()
                .map(|(column, cell)| (column, Value::String(cell)))
                .collect(),
        );
    }

    Ok(rows)
}

/// Reads a JSON array of objects, as returned by spreadsheet record exports.
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<Vec<RawRow>> {
    serde_json::from_reader(reader).context("expected a JSON array of row objects")
}

pub fn load_path(path: &Path) -> anyhow::Result<Vec<RawRow>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let rows = if is_json {
        read_json(file)
    } else {
        read_csv(file)
    }
    .with_context(|| format!("failed to load rows from {}", path.display()))?;

    info!(rows = rows.len(), path = %path.display(), "loaded raw rows");
    Ok(rows)
}
