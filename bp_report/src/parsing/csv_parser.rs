use polars::prelude::*;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, ReportResult};

/// A source must carry a timestamp column followed by three readings.
pub const REQUIRED_COLUMNS: usize = 4;

/// The first [`REQUIRED_COLUMNS`] cells of one CSV record, untyped.
/// Empty cells are `None`.
pub type RawRow = [Option<String>; REQUIRED_COLUMNS];

/// A source file read as text, before any type coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub source: PathBuf,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Build a table directly, e.g. from an in-memory export.
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

/// Read a CSV export into a [`RawTable`].
///
/// Every column is read as a string so that malformed cells survive until
/// cleaning decides what to drop. Columns past the fourth are ignored.
///
/// # Errors
/// `ReportError::Input` when the file cannot be read or parsed, or when it
/// has fewer than [`REQUIRED_COLUMNS`] columns.
pub fn read_raw_table(csv_path: &Path) -> ReportResult<RawTable> {
    if !csv_path.is_file() {
        return Err(ReportError::input(csv_path, "file not found"));
    }

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| opts.with_truncate_ragged_lines(true))
        .try_into_reader_with_file_path(Some(csv_path.into()))
        .and_then(|reader| reader.finish())
        .map_err(|e| ReportError::input(csv_path, format!("failed to parse CSV: {}", e)))?;

    dataframe_to_raw_table(csv_path, &df)
}

/// Convert a string-typed DataFrame into a [`RawTable`].
pub fn dataframe_to_raw_table(source: &Path, df: &DataFrame) -> ReportResult<RawTable> {
    if df.width() < REQUIRED_COLUMNS {
        return Err(ReportError::input(
            source,
            format!(
                "less than {} columns (found {})",
                REQUIRED_COLUMNS,
                df.width()
            ),
        ));
    }

    let headers: Vec<String> = df
        .get_column_names()
        .iter()
        .take(REQUIRED_COLUMNS)
        .map(|name| name.to_string())
        .collect();

    let mut columns: Vec<Vec<Option<String>>> = Vec::with_capacity(REQUIRED_COLUMNS);
    for column in df.get_columns().iter().take(REQUIRED_COLUMNS) {
        let as_text = column
            .cast(&DataType::String)
            .map_err(|e| ReportError::input(source, format!("unreadable column: {}", e)))?;
        let values = as_text
            .str()
            .map_err(|e| ReportError::input(source, format!("unreadable column: {}", e)))?
            .into_iter()
            .map(|cell| cell.map(str::to_string))
            .collect();
        columns.push(values);
    }

    let rows = (0..df.height())
        .map(|i| std::array::from_fn(|c| columns[c][i].clone()))
        .collect();

    Ok(RawTable::new(source, headers, rows))
}
