use polars::prelude::*;
use std::fs::File;
use std::path::Path;

use crate::core::SampleSet;
use crate::error::{ReportError, ReportResult};

/// Layout used for timestamps in every written artifact.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Convert a sample set into a DataFrame with the original column names.
pub fn samples_to_dataframe(set: &SampleSet) -> PolarsResult<DataFrame> {
    let timestamps: Vec<String> = set
        .samples
        .iter()
        .map(|s| s.timestamp.format(TIMESTAMP_FORMAT).to_string())
        .collect();

    let mut columns = vec![Column::new(set.timestamp_column.as_str().into(), timestamps)];
    for (i, name) in set.metric_names.iter().enumerate() {
        let values: Vec<f64> = set.samples.iter().map(|s| s.values[i]).collect();
        columns.push(Column::new(name.as_str().into(), values));
    }

    DataFrame::new(columns)
}

/// Write the merged sample set as CSV with a header row.
///
/// Metric columns go out in the order the device exported them, so the
/// file loads back into the same set under the same loader settings.
pub fn write_samples_csv(set: &SampleSet, path: &Path) -> ReportResult<()> {
    let mut df = samples_to_dataframe(&set.in_source_order())
        .map_err(|e| ReportError::Render(format!("failed to build sample table: {}", e)))?;
    let mut file = File::create(path).map_err(|e| ReportError::io(path, e))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .map_err(|e| ReportError::Render(format!("failed to write {}: {}", path.display(), e)))
}
