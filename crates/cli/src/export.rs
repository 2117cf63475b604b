//! Export of final candidates
//!
//! Each row carries the value text, the (optionally reduced) path and a
//! `[object Kind]` type tag. Two formats are supported: CSV and tab-separated lines.

use anyhow::{Context, Result};
use dt_core::{stringify, ObjectPath, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Output format of an export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Lines,
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ExportFormat::Csv),
            "lines" => Ok(ExportFormat::Lines),
            other => anyhow::bail!("Unknown export format '{}' (expected csv or lines)", other),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Csv => f.write_str("csv"),
            ExportFormat::Lines => f.write_str("lines"),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Format used when a command does not name one (default: csv)
    #[serde(default)]
    pub format: ExportFormat,

    /// Reduce candidate paths before writing them (default: true)
    #[serde(default = "default_true")]
    pub reduce_paths: bool,

    /// Write a header row in CSV output (default: true)
    #[serde(default = "default_true")]
    pub header: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: ExportFormat::default(),
            reduce_paths: true,
            header: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One exported candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRow {
    pub value: String,
    pub path: String,
    pub type_tag: String,
}

impl ExportRow {
    pub fn new(value: &Value, path: &ObjectPath) -> Self {
        Self {
            value: value_text(value),
            path: path.to_path_string(),
            type_tag: value.type_tag(),
        }
    }
}

/// Single-line text of a value
///
/// Canonical JSON when the value has one, its display form otherwise.
pub fn value_text(value: &Value) -> String {
    let text = match value {
        Value::Undefined => "undefined".to_string(),
        _ => stringify(value).unwrap_or_else(|_| value.to_string()),
    };
    text.replace('\n', "\\n")
}

/// Write rows as CSV with `value,path,type` columns
pub fn write_csv<W: Write>(writer: W, rows: &[ExportRow], header: bool) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);

    if header {
        writer
            .write_record(["value", "path", "type"])
            .context("Failed to write CSV header")?;
    }
    for row in rows {
        writer
            .write_record([row.value.as_str(), row.path.as_str(), row.type_tag.as_str()])
            .context("Failed to write CSV row")?;
    }

    writer.flush().context("Failed to flush CSV output")?;
    Ok(())
}

/// Write rows as `path<TAB>type<TAB>value` lines
pub fn write_lines<W: Write>(mut writer: W, rows: &[ExportRow]) -> Result<()> {
    for row in rows {
        writeln!(writer, "{}\t{}\t{}", row.path, row.type_tag, row.value)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write rows to `path`, returning the number of rows written
pub fn export_to_file(path: &Path, format: ExportFormat, rows: &[ExportRow], header: bool) -> Result<usize> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    let writer = BufWriter::new(file);

    match format {
        ExportFormat::Csv => write_csv(writer, rows, header)?,
        ExportFormat::Lines => write_lines(writer, rows)?,
    }
    Ok(rows.len())
}
