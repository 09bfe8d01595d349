//! Report pipeline.
//!
//! Stages run strictly in order: load and clean, filter and sort,
//! aggregate, lay out, render. [`ReportPipeline::build`] runs everything up
//! to the layout and touches no output file; [`ReportPipeline::write`] then
//! produces the artifacts. A hard error in any building stage therefore
//! leaves no partial output behind.

use log::{info, warn};

use crate::config::ReportConfig;
use crate::core::SampleSet;
use crate::error::{ReportError, ReportResult};
use crate::io::loaders::describe_sources;
use crate::io::{write_samples_csv, LoadReport, SampleLoader, SkippedSource};
use crate::labels::Labels;
use crate::parsing::RawTable;
use crate::render::{
    format_summary, write_report_document, write_text_summary, ArtifactPaths, ChartDocument,
    ChartRenderer, PngChartRenderer, ReportDocument, WorkbookWriter, XlsxWorkbookWriter,
};
use crate::services::aggregation::{aggregate, Aggregation};
use crate::services::layout::{LayoutBuilder, ReportLayout};
use crate::services::workbook::WorkbookLayout;
use crate::transformations::filter_and_sort;

/// Everything one run derived, ready to be written.
#[derive(Debug, Clone)]
pub struct Report {
    /// Cleaned, filtered and time-ordered samples.
    pub sample_set: SampleSet,
    pub skipped: Vec<SkippedSource>,
    pub dropped_rows: usize,
    pub duplicates_removed: usize,
    pub aggregation: Aggregation,
    pub layout: ReportLayout,
    pub workbook: WorkbookLayout,
    pub chart: ChartDocument,
    pub summary: String,
}

impl Report {
    /// The serializable part of the report.
    pub fn document(&self) -> ReportDocument {
        ReportDocument {
            layout: self.layout.clone(),
            workbook: self.workbook.clone(),
            chart: self.chart.clone(),
        }
    }
}

/// Runs one report from a [`ReportConfig`].
pub struct ReportPipeline {
    config: ReportConfig,
    labels: Labels,
    chart_renderer: Option<Box<dyn ChartRenderer>>,
    workbook_writer: Option<Box<dyn WorkbookWriter>>,
}

impl ReportPipeline {
    /// Pipeline writing every artifact, the image with [`PngChartRenderer`]
    /// and the workbook with [`XlsxWorkbookWriter`].
    pub fn new(config: ReportConfig) -> Self {
        Self::without_adapters(config)
            .with_chart_renderer(PngChartRenderer::new())
            .with_workbook_writer(XlsxWorkbookWriter::new())
    }

    /// Pipeline that only writes the CSV, text summary and JSON document
    /// until adapters are added.
    pub fn without_adapters(config: ReportConfig) -> Self {
        let labels = config.labels();
        Self {
            config,
            labels,
            chart_renderer: None,
            workbook_writer: None,
        }
    }

    pub fn with_chart_renderer(mut self, renderer: impl ChartRenderer + 'static) -> Self {
        self.chart_renderer = Some(Box::new(renderer));
        self
    }

    pub fn with_workbook_writer(mut self, writer: impl WorkbookWriter + 'static) -> Self {
        self.workbook_writer = Some(Box::new(writer));
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn artifact_paths(&self) -> ArtifactPaths {
        ArtifactPaths::from_base(&self.config.output)
    }

    fn loader(&self) -> SampleLoader {
        SampleLoader::new().with_swapped_metrics(self.config.swap_metric_columns)
    }

    /// Load the configured input files and derive every table.
    pub fn build(&self) -> ReportResult<Report> {
        if self.config.inputs.is_empty() {
            return Err(ReportError::Config("no input files given".to_string()));
        }
        info!("Reading {}", describe_sources(&self.config.inputs));
        let load = self.loader().load_files(&self.config.inputs)?;
        Ok(self.build_from_load(load))
    }

    /// Same as [`build`](Self::build) for tables already in memory.
    pub fn build_from_tables(&self, tables: &[RawTable]) -> ReportResult<Report> {
        let load = self.loader().load_tables(tables, tables.len())?;
        Ok(self.build_from_load(load))
    }

    fn build_from_load(&self, load: LoadReport) -> Report {
        let LoadReport {
            mut sample_set,
            skipped,
            dropped_rows,
            duplicates_removed,
        } = load;

        let merged = sample_set.len();
        sample_set.samples = filter_and_sort(std::mem::take(&mut sample_set.samples), &self.config.range);
        if sample_set.is_empty() {
            warn!("No samples inside the requested time range");
        } else if sample_set.len() < merged {
            info!("{} of {} samples inside the time range", sample_set.len(), merged);
        }

        let aggregation = aggregate(&sample_set);
        let layout = LayoutBuilder::new(&self.labels).build(&sample_set, &aggregation);
        let workbook = WorkbookLayout::build(
            &sample_set,
            &layout,
            &self.labels,
            self.config.max_column_width,
        );
        let chart = ChartDocument::build(&layout, &self.labels);
        let summary = format_summary(&layout, &self.labels);

        Report {
            sample_set,
            skipped,
            dropped_rows,
            duplicates_removed,
            aggregation,
            layout,
            workbook,
            chart,
            summary,
        }
    }

    /// Write every artifact of a built report.
    pub fn write(&self, report: &Report) -> ReportResult<ArtifactPaths> {
        let paths = self.artifact_paths();

        write_samples_csv(&report.sample_set, &paths.csv)?;
        info!("Sorted and merged CSV saved as {}", paths.csv.display());

        write_text_summary(&report.summary, &paths.summary)?;
        info!("Summaries exported to {}", paths.summary.display());

        write_report_document(&report.document(), &paths.document)?;
        info!("Report document saved as {}", paths.document.display());

        match &self.chart_renderer {
            Some(renderer) => {
                renderer.render(&report.chart, &paths.image)?;
                info!("Chart saved as {}", paths.image.display());
            }
            None => info!("No chart renderer configured, skipping {}", paths.image.display()),
        }

        match &self.workbook_writer {
            Some(writer) => {
                writer.write(&report.workbook, &paths.workbook)?;
                info!("Workbook saved as {}", paths.workbook.display());
            }
            None => info!(
                "No workbook writer configured, skipping {}",
                paths.workbook.display()
            ),
        }

        Ok(paths)
    }

    /// Build, then write.
    pub fn run(&self) -> ReportResult<Report> {
        let report = self.build()?;
        self.write(&report)?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Period;
    use crate::services::statistics::Scope;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    fn table(source: &str, rows: &[[&str; 4]]) -> RawTable {
        RawTable::new(
            source,
            ["datetime", "sys", "dia", "pulse"].map(String::from).to_vec(),
            rows.iter().map(|r| r.map(|c| Some(c.to_string()))).collect(),
        )
    }

    fn pipeline(config: ReportConfig) -> ReportPipeline {
        ReportPipeline::without_adapters(config)
    }

    #[test]
    fn test_build_from_tables() {
        let config = ReportConfig {
            swap_metric_columns: false,
            ..ReportConfig::default()
        };
        let report = pipeline(config)
            .build_from_tables(&[table(
                "a.csv",
                &[
                    ["2025-06-01 18:00", "130", "85", "70"],
                    ["2025-06-01 08:00", "120", "80", "60"],
                ],
            )])
            .unwrap();

        assert_eq!(report.sample_set.len(), 2);
        assert!(report.sample_set.samples[0].timestamp < report.sample_set.samples[1].timestamp);
        assert_eq!(report.layout.long_rows.len(), 2);
        assert!(report.aggregation.scope_stats.get(Scope::Period(Period::Midday)).is_none());
        assert!(report.summary.contains("No data"));
    }

    #[test]
    fn test_swap_applies_to_names_and_values() {
        let report = pipeline(ReportConfig::default())
            .build_from_tables(&[table("a.csv", &[["2025-06-01 08:00", "120", "80", "60"]])])
            .unwrap();

        assert_eq!(report.sample_set.metric_names, ["sys", "pulse", "dia"].map(String::from));
        assert_eq!(report.sample_set.samples[0].values, [120.0, 60.0, 80.0]);
    }

    #[test]
    fn test_range_filter_may_leave_nothing() {
        let mut config = ReportConfig::default();
        config.range.start = chrono::NaiveDateTime::parse_from_str("2030-01-01 00:00", "%Y-%m-%d %H:%M").ok();
        let report = pipeline(config)
            .build_from_tables(&[table("a.csv", &[["2025-06-01 08:00", "120", "80", "60"]])])
            .unwrap();

        assert!(report.sample_set.is_empty());
        assert!(report.layout.wide_rows.is_empty());
        assert_eq!(report.aggregation.scope_stats.empty_scopes().len(), 4);
    }

    #[test]
    fn test_no_inputs_is_config_error() {
        let err = pipeline(ReportConfig::default()).build().unwrap_err();
        assert!(matches!(err, ReportError::Config(_)));
    }

    #[test]
    fn test_no_data_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.csv");
        std::fs::write(&empty, "datetime,a,b,c\nbad,x,y,z\n").unwrap();
        let config = ReportConfig {
            inputs: vec![empty],
            output: dir.path().join("report.csv"),
            ..ReportConfig::default()
        };

        let err = pipeline(config).run().unwrap_err();

        assert!(matches!(err, ReportError::NoData { sources: 1 }));
        assert!(!dir.path().join("report.csv").exists());
        assert!(!dir.path().join("report.txt").exists());
        assert!(!dir.path().join("report.json").exists());
    }

    #[derive(Clone, Default)]
    struct RecordingRenderer {
        calls: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl ChartRenderer for RecordingRenderer {
        fn render(&self, document: &ChartDocument, path: &Path) -> ReportResult<()> {
            assert!(!document.panels.is_empty());
            self.calls.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    impl WorkbookWriter for RecordingRenderer {
        fn write(&self, workbook: &WorkbookLayout, path: &Path) -> ReportResult<()> {
            assert_eq!(workbook.sheets.len(), 5);
            self.calls.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }
    }

    #[test]
    fn test_write_invokes_adapters_with_derived_paths() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("M7-1-2025-06-01.csv");
        std::fs::write(&source, "datetime,sys,dia,pulse\n2025-06-01 08:00,120,80,60\n").unwrap();
        let recorder = RecordingRenderer::default();
        let config = ReportConfig {
            inputs: vec![source],
            output: dir.path().join("analiza.csv"),
            ..ReportConfig::default()
        };

        let pipeline = pipeline(config)
            .with_chart_renderer(recorder.clone())
            .with_workbook_writer(recorder.clone());
        pipeline.run().unwrap();

        let calls = recorder.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![dir.path().join("analiza.png"), dir.path().join("analiza.xlsx")]
        );
        assert!(dir.path().join("analiza.csv").is_file());
        assert!(dir.path().join("analiza.txt").is_file());
        assert!(dir.path().join("analiza.json").is_file());
    }

    #[test]
    fn test_default_pipeline_writes_image_and_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("M7-1-2025-06-01.csv");
        std::fs::write(
            &source,
            "datetime,sys,pulse,dia\n2025-06-01 08:00,120,60,80\n2025-06-02 19:00,128,66,84\n",
        )
        .unwrap();
        let config = ReportConfig {
            inputs: vec![source],
            output: dir.path().join("analiza.csv"),
            ..ReportConfig::default()
        };

        ReportPipeline::new(config).run().unwrap();

        let png = std::fs::read(dir.path().join("analiza.png")).unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        let xlsx = std::fs::read(dir.path().join("analiza.xlsx")).unwrap();
        assert!(xlsx.starts_with(b"PK"));
    }

    #[test]
    fn test_without_adapters_skips_image_and_workbook() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.csv");
        std::fs::write(&source, "datetime,sys,dia,pulse\n2025-06-01 08:00,120,80,60\n").unwrap();
        let config = ReportConfig {
            inputs: vec![source],
            output: dir.path().join("out.csv"),
            ..ReportConfig::default()
        };

        ReportPipeline::without_adapters(config).run().unwrap();

        assert!(dir.path().join("out.json").is_file());
        assert!(!dir.path().join("out.png").exists());
        assert!(!dir.path().join("out.xlsx").exists());
    }
}
