//! Per-instance result files.

use crate::cli::OutputFormat;
use crate::commands::Result;
use multisplunk_core::Record;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Write one instance's rows to `<dir>/<name>.<ext>` and return the path.
pub fn write_rows(
    dir: &Path,
    endpoint: &str,
    rows: &[Record],
    format: OutputFormat,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name(endpoint, format));
    match format {
        OutputFormat::Json => write_json(&path, rows)?,
        OutputFormat::Csv => write_csv(&path, rows)?,
    }
    Ok(path)
}

/// Instance names may contain path separators; keep the file inside `dir`.
pub fn file_name(endpoint: &str, format: OutputFormat) -> String {
    let stem: String = endpoint
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    format!("{}.{}", stem, format.extension())
}

/// Two-space indented JSON array; non-ASCII text is written as-is.
pub fn write_json(path: &Path, rows: &[Record]) -> Result<()> {
    let mut body = serde_json::to_string_pretty(rows)?;
    body.push('\n');
    fs::write(path, body)?;
    Ok(())
}

/// Header from the first row's fields, in the order the service sent them.
///
/// No rows produces an empty file.
pub fn write_csv(path: &Path, rows: &[Record]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    if let Some(first) = rows.first() {
        let header: Vec<&str> = first.keys().map(String::as_str).collect();
        writer.write_record(&header)?;
        for row in rows {
            writer.write_record(header.iter().map(|key| cell(row.get(*key))))?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// Strings verbatim, nested values as compact JSON, missing or null empty.
pub fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
