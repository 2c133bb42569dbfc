//! `crosstally-io` — CSV adapters for the reconciliation engine.
//!
//! Decodes CSV text into `RecordSet`s and serializes routed `OutputTable`s
//! back to CSV text. The engine itself never sees file paths or byte
//! streams; callers read and write files.

use std::fmt;

use crosstally_recon::model::{RecordSet, Row};
use crosstally_recon::OutputTable;

#[derive(Debug)]
pub enum IoError {
    /// CSV parse error (bad quoting, uneven records, ...).
    Csv(String),
    /// Input has no header row to derive a schema from.
    MissingHeaders,
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::MissingHeaders => write!(f, "CSV input has no header row"),
        }
    }
}

impl std::error::Error for IoError {}

/// Decode CSV text into a record set. The header row becomes the schema;
/// short records leave trailing columns missing.
pub fn read_record_set(name: &str, csv_data: &str) -> Result<RecordSet, IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| IoError::Csv(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(IoError::MissingHeaders);
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| IoError::Csv(e.to_string()))?;
        let values = columns
            .iter()
            .enumerate()
            .filter_map(|(i, col)| record.get(i).map(|v| (col.clone(), v.to_string())))
            .collect();
        rows.push(Row::new(values));
    }

    Ok(RecordSet::new(name, columns, rows))
}

/// Serialize an output table to CSV text. An empty table yields just the
/// header row; a table with no columns yields empty output.
pub fn write_table(table: &OutputTable) -> Result<String, IoError> {
    if table.columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&table.columns)
        .map_err(|e| IoError::Csv(e.to_string()))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .map_err(|e| IoError::Csv(e.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| IoError::Csv(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| IoError::Csv(e.to_string()))
}
