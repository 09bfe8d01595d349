//! # bp-report
//!
//! Report engine for blood-pressure monitor exports.
//!
//! Measurements downloaded from a paired monitor (timestamp plus three
//! readings) are cleaned, merged across files, split into three fixed
//! day segments and summarized. The same aggregated data is laid out for
//! three outputs that must stay consistent: a chart image, a spreadsheet
//! workbook with native charts, and a plain-text summary.
//!
//! ## Architecture
//!
//! - [`core`]: samples, periods of day, date spans
//! - [`parsing`]: CSV sources into untyped tables
//! - [`transformations`]: typed cleaning, deduplication, range filtering
//! - [`io`]: multi-source loading and the merged CSV writer
//! - [`services`]: statistics, aggregation, long/wide layout, workbook plan
//! - [`render`]: adapter traits, chart document, text summary, artifact paths
//! - [`pipeline`]: the [`ReportPipeline`] entry point
//! - [`fetch`]: the external device download step
//!
//! ## Example
//!
//! ```no_run
//! use bp_report::{ReportConfig, ReportPipeline};
//! use std::path::PathBuf;
//!
//! let config = ReportConfig {
//!     inputs: vec![PathBuf::from("M7-1-2025-06-01.csv")],
//!     output: PathBuf::from("analiza-2025-06-01.csv"),
//!     ..ReportConfig::default()
//! };
//! let report = ReportPipeline::new(config).run()?;
//! println!("{}", report.summary);
//! # Ok::<(), bp_report::ReportError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod fetch;
pub mod io;
pub mod labels;
pub mod parsing;
pub mod pipeline;
pub mod render;
pub mod services;
pub mod transformations;

pub use config::ReportConfig;
pub use error::{FetchError, ReportError, ReportResult};
pub use labels::{Labels, Language};
pub use pipeline::{Report, ReportPipeline};
