//! Result export.
//!
//! Serializes a batch of outcomes to JSON or CSV, picking the format from
//! the output path's extension.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::ExportError;
use crate::outcome::{BatchResult, FAILURE_MARKER_KEY, SOURCE_KEY};

/// Write the batch to `path`, dispatching on its extension.
///
/// `.json` produces a pretty-printed array of records; `.csv` produces a
/// flat table. Any other extension is rejected.
pub fn export_outcomes(batch: &BatchResult, path: &Path) -> Result<(), ExportError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "json" => export_json(batch, path)?,
        "csv" => export_csv(batch, path)?,
        _ => return Err(ExportError::UnsupportedFormat { extension }),
    }

    info!(path = %path.display(), records = batch.len(), "exported results");
    Ok(())
}

fn export_json(batch: &BatchResult, path: &Path) -> Result<(), ExportError> {
    let values = batch.to_values();
    let mut file = File::create(path)?;
    serde_json::to_writer_pretty(&mut file, &values)?;
    file.write_all(b"\n")?;
    Ok(())
}

/// Flatten outcomes into a CSV table.
///
/// Columns are the sorted union of field names across all outcomes, minus
/// the provenance tag and the failure marker, which only carry meaning in
/// the JSON form. Nested values are embedded as JSON text.
fn export_csv(batch: &BatchResult, path: &Path) -> Result<(), ExportError> {
    let values = batch.to_values();

    let mut columns: Vec<String> = Vec::new();
    for value in &values {
        if let Value::Object(map) = value {
            for key in map.keys() {
                if key == SOURCE_KEY || key == FAILURE_MARKER_KEY {
                    continue;
                }
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
    }
    columns.sort();

    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&columns)?;

    for value in &values {
        let Value::Object(map) = value else { continue };
        let row: Vec<String> = columns
            .iter()
            .map(|column| match map.get(column) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(Value::Bool(b)) => b.to_string(),
                Some(Value::Number(n)) => n.to_string(),
                // Arrays and objects become embedded JSON text.
                Some(nested) => nested.to_string(),
            })
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush().map_err(ExportError::Io)?;
    Ok(())
}
