//! Workbook output through `rust_xlsxwriter`.
//!
//! [`XlsxWorkbookWriter`] replays a [`WorkbookLayout`] cell by cell. Number
//! formats come from [`CellValue::number_format`], the same source the
//! column widths were measured with.

use log::debug;
use rust_xlsxwriter::{
    Chart, ChartErrorBars, ChartErrorBarsType, ChartFormat, ChartLine, ChartLineDashType,
    ChartRange, ChartType, Color, Format, Workbook, Worksheet, XlsxError,
};
use std::path::Path;

use super::WorkbookWriter;
use crate::error::{ReportError, ReportResult};
use crate::services::workbook::{
    Cell, CellRange, CellStyle, CellValue, ChartSeries, SheetLayout, WorkbookChart, WorkbookLayout,
};

/// Default chart size in pixels before scaling.
const CHART_WIDTH: f64 = 480.0;
const CHART_HEIGHT: f64 = 288.0;

/// Writes `.xlsx` files with native line charts.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWorkbookWriter;

impl XlsxWorkbookWriter {
    pub fn new() -> Self {
        Self
    }
}

impl WorkbookWriter for XlsxWorkbookWriter {
    fn write(&self, layout: &WorkbookLayout, path: &Path) -> ReportResult<()> {
        let mut workbook = Workbook::new();
        for sheet in &layout.sheets {
            let worksheet = build_worksheet(sheet).map_err(|e| xlsx_error(&sheet.name, e))?;
            workbook.push_worksheet(worksheet);
        }
        workbook
            .save(path)
            .map_err(|e| ReportError::Render(format!("failed to save {}: {}", path.display(), e)))
    }
}

fn xlsx_error(sheet: &str, error: XlsxError) -> ReportError {
    ReportError::Render(format!("sheet '{}': {}", sheet, error))
}

/// `#rrggbb` to the packed RGB value the chart API expects. Unparseable
/// colors fall back to black.
fn rgb(hex: &str) -> Color {
    let value = u32::from_str_radix(hex.trim_start_matches('#'), 16).unwrap_or(0);
    Color::RGB(value & 0x00FF_FFFF)
}

fn cell_format(cell: &Cell) -> Format {
    let format = match cell.style {
        CellStyle::Plain => Format::new(),
        CellStyle::Header => Format::new().set_bold(),
        CellStyle::Title => Format::new().set_bold().set_font_size(12),
    };
    match cell.value.number_format() {
        Some(number_format) => format.set_num_format(number_format),
        None => format,
    }
}

fn write_cell(worksheet: &mut Worksheet, cell: &Cell) -> Result<(), XlsxError> {
    let format = cell_format(cell);
    let (row, col) = (cell.row, cell.col);
    match &cell.value {
        CellValue::Text(text) => worksheet.write_string_with_format(row, col, text, &format)?,
        CellValue::Number(value) => worksheet.write_number_with_format(row, col, *value, &format)?,
        CellValue::Count(count) => {
            worksheet.write_number_with_format(row, col, *count as f64, &format)?
        }
        CellValue::Date(date) => worksheet.write_datetime_with_format(row, col, date, &format)?,
        CellValue::DateTime(ts) => worksheet.write_datetime_with_format(row, col, ts, &format)?,
    };
    Ok(())
}

fn build_worksheet(sheet: &SheetLayout) -> Result<Worksheet, XlsxError> {
    let mut worksheet = Worksheet::new();
    worksheet.set_name(&sheet.name)?;

    for cell in &sheet.cells {
        write_cell(&mut worksheet, cell)?;
    }
    for (col, width) in sheet.column_widths.iter().enumerate() {
        if *width > 0 {
            // one character of padding, as spreadsheet apps do on autofit
            worksheet.set_column_width(col as u16, (*width + 1) as f64)?;
        }
    }
    for chart in &sheet.charts {
        worksheet.insert_chart(chart.anchor_row, chart.anchor_col, &build_chart(chart))?;
    }
    debug!(
        "Sheet {}: {} cells, {} charts",
        sheet.name,
        sheet.cells.len(),
        sheet.charts.len()
    );
    Ok(worksheet)
}

fn range_tuple(range: &CellRange) -> (&str, u32, u16, u32, u16) {
    (
        range.sheet.as_str(),
        range.first_row,
        range.first_col,
        range.last_row,
        range.last_col,
    )
}

fn chart_range(range: &CellRange) -> ChartRange {
    ChartRange::new_from_range(
        &range.sheet,
        range.first_row,
        range.first_col,
        range.last_row,
        range.last_col,
    )
}

fn add_series(chart: &mut Chart, series: &ChartSeries) {
    let mut line = ChartLine::new();
    line.set_color(rgb(&series.color));
    if series.dashed {
        line.set_dash_type(ChartLineDashType::RoundDot);
    }

    let plotted = chart.add_series();
    plotted
        .set_name((
            series.name_ref.sheet.as_str(),
            series.name_ref.first_row,
            series.name_ref.first_col,
        ))
        .set_categories(range_tuple(&series.categories))
        .set_values(range_tuple(&series.values))
        .set_format(ChartFormat::new().set_line(&line));

    if let Some(errors) = &series.error_bars {
        let range = chart_range(errors);
        let mut bars = ChartErrorBars::new();
        bars.set_type(ChartErrorBarsType::Custom(range.clone(), range));
        plotted.set_y_error_bars(&bars);
    }
}

fn build_chart(spec: &WorkbookChart) -> Chart {
    let mut chart = Chart::new(ChartType::Line);
    for series in &spec.series {
        add_series(&mut chart, series);
    }
    chart.title().set_name(spec.title.as_str());
    chart.x_axis().set_name(spec.x_axis.as_str());
    chart.y_axis().set_name(spec.y_axis.as_str());
    if spec.date_axis {
        chart.x_axis().set_date_axis(true);
    }
    chart
        .set_width((CHART_WIDTH * spec.scale).round() as u32)
        .set_height((CHART_HEIGHT * spec.scale).round() as u32);
    chart
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Sample, SampleSet};
    use crate::labels::Labels;
    use crate::services::aggregation::aggregate;
    use crate::services::layout::LayoutBuilder;
    use chrono::NaiveDateTime;

    fn workbook() -> WorkbookLayout {
        let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        let set = SampleSet::new(
            "datetime",
            ["sys", "dia", "bpm"].map(String::from),
            vec![
                Sample::new(ts("2025-06-01 08:00"), [120.0, 80.0, 60.0]),
                Sample::new(ts("2025-06-01 08:20"), [124.0, 82.0, 61.0]),
                Sample::new(ts("2025-06-03 19:00"), [131.0, 86.0, 70.0]),
            ],
        );
        let labels = Labels::polish();
        let layout = LayoutBuilder::new(&labels).build(&set, &aggregate(&set));
        WorkbookLayout::build(&set, &layout, &labels, 50)
    }

    #[test]
    fn test_rgb_parsing() {
        assert_eq!(rgb("#1f77b4"), Color::RGB(0x1f77b4));
        assert_eq!(rgb("ff2200"), Color::RGB(0xff2200));
        assert_eq!(rgb("not a color"), Color::RGB(0));
    }

    #[test]
    fn test_writes_xlsx_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("analiza.xlsx");

        XlsxWorkbookWriter::new().write(&workbook(), &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.len() > 1000);
        assert!(bytes.starts_with(b"PK"));
    }

    #[test]
    fn test_missing_directory_is_render_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("analiza.xlsx");

        let err = XlsxWorkbookWriter::new().write(&workbook(), &path).unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
    }

    #[test]
    fn test_empty_workbook_still_writes() {
        let set = SampleSet::new("datetime", SampleSet::default_metric_names(), Vec::new());
        let labels = Labels::english();
        let layout = LayoutBuilder::new(&labels).build(&set, &aggregate(&set));
        let plan = WorkbookLayout::build(&set, &layout, &labels, 50);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");

        XlsxWorkbookWriter::new().write(&plan, &path).unwrap();
        assert!(path.is_file());
    }
}
