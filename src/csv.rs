//! CSV export of fetched collections.
//!
//! Records are JSON objects; the header is taken from the keys of the first
//! record and later records are written in that column order (extra keys are
//! dropped, missing ones left empty). Nested objects are written as JSON text
//! and arrays as their elements joined with `, `.

use crate::error::ExportError;
use crate::fetcher::{fetch_page, FilterSet};
use crate::transport::Transport;
use serde_json::Value;
use tracing::info;

/// Page size used when exporting a whole remote collection.
pub const EXPORT_PAGE_SIZE: usize = 1000;

/// Download name for the collection at `path`: `/agents` gives `agents.csv`.
pub fn csv_file_name(path: &str) -> String {
    let path = path.split('?').next().unwrap_or_default();
    let name = path
        .rsplit('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("export");
    format!("{name}.csv")
}

fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn header_of(first: &Value) -> Vec<String> {
    match first {
        Value::Object(map) => map.keys().cloned().collect(),
        _ => vec!["value".to_string()],
    }
}

fn row(record: &Value, header: &[String]) -> Vec<String> {
    match record {
        Value::Object(map) => header
            .iter()
            .map(|key| map.get(key).map(cell).unwrap_or_default())
            .collect(),
        other => vec![cell(other)],
    }
}

struct CsvBuilder {
    header: Option<Vec<String>>,
    writer: ::csv::Writer<Vec<u8>>,
}

impl CsvBuilder {
    fn new() -> Self {
        Self {
            header: None,
            writer: ::csv::WriterBuilder::new()
                .terminator(::csv::Terminator::Any(b'\n'))
                .flexible(true)
                .from_writer(Vec::new()),
        }
    }

    fn write<'a>(&mut self, records: impl IntoIterator<Item = &'a Value>) -> Result<usize, ExportError> {
        let mut written = 0;
        for record in records {
            if self.header.is_none() {
                let header = header_of(record);
                self.writer.write_record(&header)?;
                self.header = Some(header);
            }
            let header = self.header.as_deref().unwrap_or_default();
            self.writer.write_record(row(record, header))?;
            written += 1;
        }
        Ok(written)
    }

    fn finish(self) -> Result<String, ExportError> {
        let bytes = self
            .writer
            .into_inner()
            .map_err(|e| ExportError::Csv(e.into_error().into()))?;
        Ok(String::from_utf8(bytes)?)
    }
}

/// Renders records as CSV. Empty input gives an empty string.
///
/// ```rust
/// use serde_json::json;
/// use wz_table::csv::records_to_csv;
///
/// let csv = records_to_csv(&[
///     json!({ "id": "001", "group": ["default", "web"] }),
///     json!({ "id": "002", "group": [] }),
/// ]).unwrap();
/// assert_eq!(csv, "id,group\n001,\"default, web\"\n002,\n");
/// ```
pub fn records_to_csv(records: &[Value]) -> Result<String, ExportError> {
    let mut builder = CsvBuilder::new();
    builder.write(records)?;
    builder.finish()
}

/// Renders a fetcher buffer as CSV, skipping rows not fetched yet.
pub fn buffer_to_csv(items: &[Option<Value>]) -> Result<String, ExportError> {
    let mut builder = CsvBuilder::new();
    builder.write(items.iter().flatten())?;
    builder.finish()
}

/// Fetches the whole collection at `path` with `filters`, in pages of
/// [`EXPORT_PAGE_SIZE`], and renders it as CSV.
pub async fn export_remote(
    transport: &dyn Transport,
    path: &str,
    filters: &FilterSet,
) -> Result<String, ExportError> {
    let mut builder = CsvBuilder::new();
    let mut offset = 0;
    let mut rows = 0;
    loop {
        let mut params = vec![
            ("limit".to_string(), EXPORT_PAGE_SIZE.to_string()),
            ("offset".to_string(), offset.to_string()),
        ];
        filters.serialize_into(&mut params);
        let page = fetch_page::<Value>(transport, path, &params).await?;
        let fetched = page.items.len();
        rows += builder.write(&page.items)?;
        offset += EXPORT_PAGE_SIZE;
        if fetched == 0 || offset >= page.total_items {
            break;
        }
    }
    info!(event = "csv_exported", path, rows);
    builder.finish()
}
