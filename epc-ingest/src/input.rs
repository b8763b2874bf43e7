//! Input loading
//!
//! Accepts a JSON array of records, a single JSON object, or JSON Lines (one
//! record per line, blank lines ignored). Records are returned as raw JSON
//! values; turning them into [`crate::models::RawRecord`]s is per-record work
//! for the orchestrator, so one malformed record never sinks the file.

use crate::error::{IngestError, IngestResult};
use serde_json::Value;
use std::path::Path;
use tracing::debug;

/// Read every record from an input file
///
/// Any failure here is fatal: a file that cannot be read, or whose text is
/// neither a JSON document nor valid JSON Lines.
pub fn load_records(path: &Path) -> IngestResult<Vec<Value>> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| IngestError::Input(format!("cannot read {}: {}", path.display(), e)))?;

    let records = parse_records(&text)
        .map_err(|reason| IngestError::Input(format!("{}: {}", path.display(), reason)))?;

    debug!(path = %path.display(), records = records.len(), "Loaded input records");
    Ok(records)
}

/// Parse input text into records
pub fn parse_records(text: &str) -> Result<Vec<Value>, String> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => return Ok(items),
        Ok(object @ Value::Object(_)) => return Ok(vec![object]),
        Ok(other) => return Err(format!("expected an array or object of records, found {}", other)),
        // Multiple documents: fall through to JSON Lines
        Err(_) => {}
    }

    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str::<Value>(line).map_err(|e| format!("line {}: {}", index + 1, e))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_json_array() {
        let records = parse_records(r#"[{"program_name": "A"}, {"program_name": "B"}]"#).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1], json!({"program_name": "B"}));
    }

    #[test]
    fn test_json_lines() {
        let text = "{\"program_name\": \"A\"}\n\n{\"program_name\": \"B\"}\n42\n";
        let records = parse_records(text).unwrap();
        // Non-object lines are kept; the orchestrator skips them per record
        assert_eq!(records.len(), 3);
        assert_eq!(records[2], json!(42));
    }

    #[test]
    fn test_invalid_json_lines_reports_line() {
        let err = parse_records("{\"program_name\": \"A\"}\n{oops\n").unwrap_err();
        assert!(err.starts_with("line 2"));
    }

    #[test]
    fn test_scalar_document_rejected() {
        assert!(parse_records("\"just text\"").is_err());
        assert!(parse_records("   ").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_records(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, IngestError::Input(_)));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"[{{"title": "RSI"}}]"#).unwrap();
        let records = load_records(file.path()).unwrap();
        assert_eq!(records, vec![json!({"title": "RSI"})]);
    }
}
