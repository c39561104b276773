//! Scalar extraction from shot files
//!
//! A shot file is a JSON document whose nested objects of scalar leaves
//! (numbers, strings, booleans, nulls) map to hierarchical column
//! identities: `{"laser": {"power": 1.2}}` yields the column
//! `("laser", "power")`. Arrays and other non-scalar leaves are skipped.
//!
//! Shot files are written by a concurrently-running acquisition process,
//! so a read may catch a half-written file. The extractor retries both
//! the open and the parse a few times before giving up with an
//! [`ShotDashError::Extraction`]; callers skip the file and move on.

use crate::error::{Result, ShotDashError};
use crate::types::{CellValue, ColumnId, Record, FILEPATH_COLUMN};
use std::path::Path;
use std::time::Duration;

/// Default number of read attempts for a possibly-locked file.
pub const DEFAULT_OPEN_RETRIES: u32 = 5;

/// Default delay between read attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Extract a single-row record from a shot file with default retry
/// settings.
pub fn extract(path: impl AsRef<Path>) -> Result<Record> {
    extract_with_retry(path, DEFAULT_OPEN_RETRIES, DEFAULT_RETRY_DELAY)
}

/// Extract a single-row record, retrying transient read/parse failures.
///
/// A missing file fails immediately; a file that is unreadable or not yet
/// valid JSON is retried `attempts` times with `delay` between tries.
pub fn extract_with_retry(
    path: impl AsRef<Path>,
    attempts: u32,
    delay: Duration,
) -> Result<Record> {
    let path = path.as_ref();
    let mut last_error = String::new();

    for attempt in 1..=attempts.max(1) {
        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<serde_json::Value>(&content) {
                Ok(value) => return build_record(path, &value),
                Err(e) => {
                    // Likely a concurrent writer; the next read may see
                    // the completed file.
                    last_error = format!("invalid JSON: {e}");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ShotDashError::extraction(path, "file not found"));
            }
            Err(e) => {
                last_error = format!("read failed: {e}");
            }
        }

        if attempt < attempts {
            tracing::debug!(
                path = %path.display(),
                attempt,
                error = %last_error,
                "shot file not readable yet, retrying"
            );
            std::thread::sleep(delay);
        }
    }

    Err(ShotDashError::extraction(path, last_error))
}

/// Flatten the parsed document into a record.
fn build_record(path: &Path, value: &serde_json::Value) -> Result<Record> {
    let object = value.as_object().ok_or_else(|| {
        ShotDashError::extraction(path, "top-level value is not an object")
    })?;

    let mut record = Record::new(path);
    let mut prefix = Vec::new();
    for (key, child) in object {
        if key == FILEPATH_COLUMN {
            // The bootstrap column is owned by the table, not the file
            tracing::warn!(path = %path.display(), "shot file defines reserved 'filepath' key, ignoring");
            continue;
        }
        prefix.push(key.clone());
        flatten(&mut prefix, child, &mut record);
        prefix.pop();
    }
    Ok(record)
}

fn flatten(prefix: &mut Vec<String>, value: &serde_json::Value, record: &mut Record) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, child) in map {
                prefix.push(key.clone());
                flatten(prefix, child, record);
                prefix.pop();
            }
        }
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_f64() {
                record.insert(ColumnId::new(prefix.clone()), CellValue::Float(v));
            }
        }
        serde_json::Value::String(s) => {
            record.insert(ColumnId::new(prefix.clone()), CellValue::Text(s.clone()));
        }
        serde_json::Value::Bool(b) => {
            record.insert(
                ColumnId::new(prefix.clone()),
                CellValue::Float(if *b { 1.0 } else { 0.0 }),
            );
        }
        serde_json::Value::Null => {
            record.insert(ColumnId::new(prefix.clone()), CellValue::Null);
        }
        serde_json::Value::Array(_) => {
            tracing::trace!(column = %prefix.join("/"), "skipping non-scalar value");
        }
    }
}
