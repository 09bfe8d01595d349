//! Render adapters and artifact output.
//!
//! The core hands finished tables to the adapters and never calls a
//! drawing or spreadsheet API itself. Image and workbook output go through
//! the [`ChartRenderer`] and [`WorkbookWriter`] traits, implemented by
//! [`PngChartRenderer`] and [`XlsxWorkbookWriter`]; the text summary and the
//! JSON report document are written here directly.
//!
//! Every artifact name is derived from one base path by swapping the
//! extension, see [`ArtifactPaths`].

pub mod chart;
pub mod png;
pub mod text;
pub mod xlsx;

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::{ReportError, ReportResult};
use crate::services::layout::ReportLayout;
use crate::services::workbook::WorkbookLayout;

pub use chart::{ChartDocument, ChartPanel, LinePanel, LineSeries, LineStyle, TablePanel};
pub use png::PngChartRenderer;
pub use text::{format_section, format_summary};
pub use xlsx::XlsxWorkbookWriter;

/// Draws the chart document into an image file.
pub trait ChartRenderer: Send + Sync {
    fn render(&self, document: &ChartDocument, path: &Path) -> ReportResult<()>;
}

/// Replays a workbook plan into a spreadsheet file.
pub trait WorkbookWriter: Send + Sync {
    fn write(&self, workbook: &WorkbookLayout, path: &Path) -> ReportResult<()>;
}

/// Output file names, one per artifact, sharing the base path's stem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPaths {
    pub csv: PathBuf,
    pub image: PathBuf,
    pub workbook: PathBuf,
    pub summary: PathBuf,
    pub document: PathBuf,
}

impl ArtifactPaths {
    pub fn from_base(base: &Path) -> Self {
        Self {
            csv: base.with_extension("csv"),
            image: base.with_extension("png"),
            workbook: base.with_extension("xlsx"),
            summary: base.with_extension("txt"),
            document: base.with_extension("json"),
        }
    }
}

/// Everything an external renderer needs, serialized to `<base>.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    pub layout: ReportLayout,
    pub workbook: WorkbookLayout,
    pub chart: ChartDocument,
}

fn create(path: &Path) -> ReportResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| ReportError::io(path, e))
}

/// Write the text summary.
pub fn write_text_summary(summary: &str, path: &Path) -> ReportResult<()> {
    let mut out = create(path)?;
    out.write_all(summary.as_bytes())
        .and_then(|_| out.flush())
        .map_err(|e| ReportError::io(path, e))
}

/// Write the report document as pretty-printed JSON.
pub fn write_report_document(document: &ReportDocument, path: &Path) -> ReportResult<()> {
    let mut out = create(path)?;
    serde_json::to_writer_pretty(&mut out, document)
        .map_err(|e| ReportError::Render(format!("failed to serialize report document: {}", e)))?;
    out.flush().map_err(|e| ReportError::io(path, e))
}
