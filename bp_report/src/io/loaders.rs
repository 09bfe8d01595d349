use log::{debug, info, warn};
use std::path::PathBuf;

use crate::core::{SampleSet, METRIC_COUNT};
use crate::error::{ReportError, ReportResult};
use crate::parsing::{read_raw_table, RawTable};
use crate::transformations::cleaning::{clean_table, remove_duplicates};

/// A source that contributed nothing, with the reason it was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedSource {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of loading and merging all sources.
#[derive(Debug, Clone)]
pub struct LoadReport {
    /// Merged, deduplicated samples in first-seen order.
    pub sample_set: SampleSet,
    /// Sources that could not be read at all.
    pub skipped: Vec<SkippedSource>,
    /// Rows rejected during type coercion, over all sources.
    pub dropped_rows: usize,
    /// Exact duplicates removed after merging.
    pub duplicates_removed: usize,
}

/// Loads device exports, cleans them, and merges them into one sample set.
#[derive(Debug, Clone)]
pub struct SampleLoader {
    swap_metric_columns: bool,
}

impl Default for SampleLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleLoader {
    /// Loader that keeps the metric columns in file order.
    pub fn new() -> Self {
        Self {
            swap_metric_columns: false,
        }
    }

    /// Exchange the 2nd and 3rd readings (and their names) after merging.
    pub fn with_swapped_metrics(mut self, swap: bool) -> Self {
        self.swap_metric_columns = swap;
        self
    }

    /// Read, clean and merge CSV files.
    ///
    /// Unreadable or too-narrow files are skipped with a warning.
    ///
    /// # Errors
    /// `ReportError::NoData` when no source yields a single valid sample.
    pub fn load_files(&self, paths: &[PathBuf]) -> ReportResult<LoadReport> {
        let mut tables = Vec::with_capacity(paths.len());
        let mut skipped = Vec::new();

        for path in paths {
            match read_raw_table(path) {
                Ok(table) => tables.push(table),
                Err(ReportError::Input { path, message }) => {
                    warn!("Skipping file {}: {}", path.display(), message);
                    skipped.push(SkippedSource {
                        path,
                        reason: message,
                    });
                }
                Err(other) => return Err(other),
            }
        }

        let mut report = self.load_tables(&tables, paths.len())?;
        report.skipped.splice(0..0, skipped);
        Ok(report)
    }

    /// Clean and merge tables that are already in memory.
    ///
    /// `source_count` is the number of sources originally requested and is
    /// only used for reporting.
    pub fn load_tables(&self, tables: &[RawTable], source_count: usize) -> ReportResult<LoadReport> {
        let mut merged = Vec::new();
        let mut dropped_rows = 0;
        let mut names: Option<(String, [String; METRIC_COUNT])> = None;

        for table in tables {
            let cleaned = clean_table(table);
            debug!(
                "Source {}: {} rows kept, {} dropped",
                table.source.display(),
                cleaned.samples.len(),
                cleaned.dropped_rows
            );
            dropped_rows += cleaned.dropped_rows;
            if names.is_none() && !cleaned.samples.is_empty() {
                names = Some(column_names(table));
            }
            merged.extend(cleaned.samples);
        }

        let Some((timestamp_column, metric_names)) = names else {
            return Err(ReportError::NoData {
                sources: source_count,
            });
        };

        let before = merged.len();
        let samples = remove_duplicates(merged);
        let duplicates_removed = before - samples.len();

        let mut sample_set = SampleSet::new(timestamp_column, metric_names, samples);
        if self.swap_metric_columns {
            sample_set = sample_set.swap_metrics();
        }

        info!(
            "Loaded {} samples from {} source(s) ({} malformed rows, {} duplicates removed)",
            sample_set.len(),
            tables.len(),
            dropped_rows,
            duplicates_removed
        );

        Ok(LoadReport {
            sample_set,
            skipped: Vec::new(),
            dropped_rows,
            duplicates_removed,
        })
    }
}

/// Header names of the timestamp column and the three readings.
fn column_names(table: &RawTable) -> (String, [String; METRIC_COUNT]) {
    let defaults = SampleSet::default_metric_names();
    let header = |i: usize| {
        table
            .headers
            .get(i)
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
    };
    let timestamp = header(0).unwrap_or_else(|| "datetime".to_string());
    let metrics = std::array::from_fn(|i| header(i + 1).unwrap_or_else(|| defaults[i].clone()));
    (timestamp, metrics)
}

/// Source paths as displayed in logs.
pub fn describe_sources(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
