//! Spreadsheet plan for the workbook artifact.
//!
//! The plan lists every cell, the width each column needs and the charts
//! with the exact cell ranges they plot. A [`crate::render::WorkbookWriter`]
//! only has to replay it. Chart ranges are computed from the same column
//! functions that place the cells, so series and data rows cannot drift
//! apart.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::core::{Period, SampleSet, METRIC_COUNT};
use crate::io::writers::TIMESTAMP_FORMAT;
use crate::labels::Labels;
use crate::services::layout::{
    wide_column_count, wide_error_column, wide_value_column, ReportLayout, DATE_FORMAT,
};
use crate::services::statistics::StatField;

pub const DATA_SHEET: &str = "Data";
pub const SUMMARY_SHEET: &str = "Summary";
pub const CHART_DATA_SHEET: &str = "ChartData";
pub const LONG_SHEET: &str = "Long";
pub const WIDE_SHEET: &str = "Wide";

/// Line colors per metric, in column order.
pub const METRIC_COLORS: [&str; METRIC_COUNT] = ["#1f77b4", "#ff2200", "#2ca02c"];

/// Rows reserved per statistics section on the summary sheet: title,
/// header, one row per metric, and a spacer.
const SUMMARY_SECTION_ROWS: u32 = 3 + METRIC_COUNT as u32;

/// Where the daily chart sits on the summary sheet (row, column).
const SUMMARY_CHART_ANCHOR: (u32, u16) = (2, 7);

// Long sheet columns
const LONG_LABEL_COL: u16 = 0;
const LONG_DATE_COL: u16 = 1;
const LONG_COUNT_COL: u16 = 2;
const LONG_MEAN_COL: u16 = 3;
const LONG_ERROR_COL: u16 = LONG_MEAN_COL + METRIC_COUNT as u16;

// ChartData sheet columns
const DAILY_DATE_COL: u16 = 0;
const DAILY_MEAN_COL: u16 = 1;
const DAILY_ERROR_COL: u16 = DAILY_MEAN_COL + METRIC_COUNT as u16;

/// Spreadsheet number format for measured values.
pub const NUMBER_FORMAT: &str = "0.00";
/// Spreadsheet number format for sample counts.
pub const COUNT_FORMAT: &str = "0";
/// Spreadsheet equivalent of [`DATE_FORMAT`].
pub const DATE_CELL_FORMAT: &str = "yyyy-mm-dd";
/// Spreadsheet equivalent of [`TIMESTAMP_FORMAT`].
pub const DATETIME_CELL_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Compact number text for summaries and table panels: two decimals,
/// trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Spreadsheet column letters for a zero-based index (0 → A, 26 → AA).
pub fn column_letters(col: u16) -> String {
    let mut n = col as u32 + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Content of a written cell. Blank cells are simply not written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    Text(String),
    Number(f64),
    Count(u64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Spreadsheet number format the cell is written with, `None` for text.
    pub fn number_format(&self) -> Option<&'static str> {
        match self {
            CellValue::Text(_) => None,
            CellValue::Number(_) => Some(NUMBER_FORMAT),
            CellValue::Count(_) => Some(COUNT_FORMAT),
            CellValue::Date(_) => Some(DATE_CELL_FORMAT),
            CellValue::DateTime(_) => Some(DATETIME_CELL_FORMAT),
        }
    }

    /// The text a spreadsheet shows for the cell under
    /// [`number_format`](Self::number_format).
    pub fn display_text(&self) -> String {
        match self {
            CellValue::Text(text) => text.clone(),
            CellValue::Number(value) => format!("{:.2}", value),
            CellValue::Count(count) => count.to_string(),
            CellValue::Date(date) => date.format(DATE_FORMAT).to_string(),
            CellValue::DateTime(ts) => ts.format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    /// Characters needed to display the value.
    pub fn display_width(&self) -> usize {
        self.display_text().chars().count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellStyle {
    Plain,
    Header,
    Title,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub row: u32,
    pub col: u16,
    pub value: CellValue,
    pub style: CellStyle,
}

/// Widest display need per column, capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnWidths {
    max_width: usize,
    widths: Vec<usize>,
}

impl ColumnWidths {
    pub fn new(max_width: usize) -> Self {
        Self {
            max_width,
            widths: Vec::new(),
        }
    }

    /// Record that `col` has to fit `width` characters.
    pub fn observe(&mut self, col: u16, width: usize) {
        let col = col as usize;
        if self.widths.len() <= col {
            self.widths.resize(col + 1, 0);
        }
        let capped = width.min(self.max_width);
        if capped > self.widths[col] {
            self.widths[col] = capped;
        }
    }

    pub fn get(&self, col: u16) -> usize {
        self.widths.get(col as usize).copied().unwrap_or(0)
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    pub fn into_vec(self) -> Vec<usize> {
        self.widths
    }
}

/// Rectangular block of cells on one sheet, inclusive on both ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellRange {
    pub sheet: String,
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

impl CellRange {
    /// A single column from `first_row` to `last_row`.
    pub fn column(sheet: &str, col: u16, first_row: u32, last_row: u32) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_row,
            first_col: col,
            last_row,
            last_col: col,
        }
    }

    pub fn cell(sheet: &str, row: u32, col: u16) -> Self {
        Self::column(sheet, col, row, row)
    }

    pub fn row_count(&self) -> u32 {
        self.last_row - self.first_row + 1
    }

    /// Absolute A1 reference, e.g. `'ChartData'!$B$2:$B$31`.
    pub fn to_a1(&self) -> String {
        let start = format!("${}${}", column_letters(self.first_col), self.first_row + 1);
        let end = format!("${}${}", column_letters(self.last_col), self.last_row + 1);
        if start == end {
            format!("'{}'!{}", self.sheet, start)
        } else {
            format!("'{}'!{}:{}", self.sheet, start, end)
        }
    }
}

/// One plotted series with its data ranges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub name: String,
    pub name_ref: CellRange,
    pub categories: CellRange,
    pub values: CellRange,
    /// Symmetric custom error bars, same rows as `values`.
    pub error_bars: Option<CellRange>,
    pub color: String,
    pub dashed: bool,
}

/// A native line chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookChart {
    pub title: String,
    pub x_axis: String,
    pub y_axis: String,
    pub date_axis: bool,
    pub series: Vec<ChartSeries>,
    /// Top-left cell the chart is inserted at.
    pub anchor_row: u32,
    pub anchor_col: u16,
    pub scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetLayout {
    pub name: String,
    pub cells: Vec<Cell>,
    pub column_widths: Vec<usize>,
    pub charts: Vec<WorkbookChart>,
}

impl SheetLayout {
    pub fn cell(&self, row: u32, col: u16) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|c| c.row == row && c.col == col)
            .map(|c| &c.value)
    }

    /// Index of the last row holding any cell.
    pub fn last_row(&self) -> Option<u32> {
        self.cells.iter().map(|c| c.row).max()
    }
}

/// Accumulates cells for one sheet while tracking column widths.
struct SheetBuilder {
    name: String,
    cells: Vec<Cell>,
    widths: ColumnWidths,
    charts: Vec<WorkbookChart>,
}

impl SheetBuilder {
    fn new(name: &str, max_width: usize) -> Self {
        Self {
            name: name.to_string(),
            cells: Vec::new(),
            widths: ColumnWidths::new(max_width),
            charts: Vec::new(),
        }
    }

    fn write(&mut self, row: u32, col: u16, value: CellValue, style: CellStyle) {
        self.widths.observe(col, value.display_width());
        self.cells.push(Cell {
            row,
            col,
            value,
            style,
        });
    }

    fn text(&mut self, row: u32, col: u16, text: &str, style: CellStyle) {
        self.write(row, col, CellValue::Text(text.to_string()), style);
    }

    fn number(&mut self, row: u32, col: u16, value: f64) {
        self.write(row, col, CellValue::Number(value), CellStyle::Plain);
    }

    fn finish(self) -> SheetLayout {
        SheetLayout {
            name: self.name,
            cells: self.cells,
            column_widths: self.widths.into_vec(),
            charts: self.charts,
        }
    }
}

/// The complete workbook plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkbookLayout {
    pub sheets: Vec<SheetLayout>,
}

impl WorkbookLayout {
    pub fn sheet(&self, name: &str) -> Option<&SheetLayout> {
        self.sheets.iter().find(|s| s.name == name)
    }

    /// Every chart, with the sheet it is placed on.
    pub fn charts(&self) -> impl Iterator<Item = (&str, &WorkbookChart)> {
        self.sheets
            .iter()
            .flat_map(|s| s.charts.iter().map(move |c| (s.name.as_str(), c)))
    }

    /// Plan the workbook for a finished layout.
    pub fn build(
        set: &SampleSet,
        layout: &ReportLayout,
        labels: &Labels,
        max_column_width: usize,
    ) -> Self {
        let mut summary = summary_sheet(layout, max_column_width);
        let chart_data = chart_data_sheet(layout, labels, max_column_width);
        if let Some(chart) = daily_chart(&chart_data, layout, labels) {
            summary.charts.push(chart);
        }

        Self {
            sheets: vec![
                data_sheet(set, max_column_width),
                summary.finish(),
                chart_data,
                long_sheet(layout, labels, max_column_width),
                wide_sheet(layout, labels, max_column_width),
            ],
        }
    }
}

fn data_sheet(set: &SampleSet, max_width: usize) -> SheetLayout {
    let mut sheet = SheetBuilder::new(DATA_SHEET, max_width);
    sheet.text(0, 0, &set.timestamp_column, CellStyle::Header);
    for (i, name) in set.metric_names.iter().enumerate() {
        sheet.text(0, 1 + i as u16, name, CellStyle::Header);
    }
    for (r, sample) in set.samples.iter().enumerate() {
        let row = 1 + r as u32;
        sheet.write(row, 0, CellValue::DateTime(sample.timestamp), CellStyle::Plain);
        for (i, value) in sample.values.iter().enumerate() {
            sheet.number(row, 1 + i as u16, *value);
        }
    }
    sheet.finish()
}

/// Statistics sections stacked top to bottom; empty scopes are left out.
fn summary_sheet(layout: &ReportLayout, max_width: usize) -> SheetBuilder {
    let mut sheet = SheetBuilder::new(SUMMARY_SHEET, max_width);
    for (index, (section, table)) in layout.non_empty_sections().enumerate() {
        let top = index as u32 * SUMMARY_SECTION_ROWS;
        sheet.text(top, 0, &section.title, CellStyle::Title);
        for (i, field) in StatField::ALL.iter().enumerate() {
            sheet.text(top + 1, 1 + i as u16, field.key(), CellStyle::Header);
        }
        for (r, metric) in table.rows.iter().enumerate() {
            let row = top + 2 + r as u32;
            sheet.text(row, 0, &metric.metric, CellStyle::Header);
            for (i, value) in metric.stats.values().iter().enumerate() {
                sheet.number(row, 1 + i as u16, *value);
            }
        }
    }
    sheet
}

fn chart_data_sheet(layout: &ReportLayout, labels: &Labels, max_width: usize) -> SheetLayout {
    let mut sheet = SheetBuilder::new(CHART_DATA_SHEET, max_width);
    sheet.text(0, DAILY_DATE_COL, &labels.date_column, CellStyle::Header);
    for (i, name) in layout.metric_names.iter().enumerate() {
        sheet.text(0, DAILY_MEAN_COL + i as u16, name, CellStyle::Header);
        sheet.text(0, DAILY_ERROR_COL + i as u16, &labels.std_column(name), CellStyle::Header);
    }
    for (r, point) in layout.daily_all.points.iter().enumerate() {
        let row = 1 + r as u32;
        sheet.write(row, DAILY_DATE_COL, CellValue::Date(point.date), CellStyle::Plain);
        for i in 0..METRIC_COUNT {
            sheet.number(row, DAILY_MEAN_COL + i as u16, point.means[i]);
            if let Some(std) = point.stddevs[i] {
                sheet.number(row, DAILY_ERROR_COL + i as u16, std);
            }
        }
    }
    sheet.finish()
}

fn daily_chart(chart_data: &SheetLayout, layout: &ReportLayout, labels: &Labels) -> Option<WorkbookChart> {
    let last_row = layout.daily_all.points.len() as u32;
    if last_row == 0 {
        return None;
    }
    let sheet = chart_data.name.as_str();
    let series = layout
        .metric_names
        .iter()
        .enumerate()
        .map(|(i, name)| ChartSeries {
            name: name.clone(),
            name_ref: CellRange::cell(sheet, 0, DAILY_MEAN_COL + i as u16),
            categories: CellRange::column(sheet, DAILY_DATE_COL, 1, last_row),
            values: CellRange::column(sheet, DAILY_MEAN_COL + i as u16, 1, last_row),
            error_bars: Some(CellRange::column(sheet, DAILY_ERROR_COL + i as u16, 1, last_row)),
            color: METRIC_COLORS[i].to_string(),
            dashed: i == METRIC_COUNT - 1,
        })
        .collect();

    Some(WorkbookChart {
        title: labels.daily_error_chart_title.clone(),
        x_axis: labels.date_axis.clone(),
        y_axis: labels.value_axis.clone(),
        date_axis: true,
        series,
        anchor_row: SUMMARY_CHART_ANCHOR.0,
        anchor_col: SUMMARY_CHART_ANCHOR.1,
        scale: 2.0,
    })
}

fn long_sheet(layout: &ReportLayout, labels: &Labels, max_width: usize) -> SheetLayout {
    let mut sheet = SheetBuilder::new(LONG_SHEET, max_width);
    sheet.text(0, LONG_LABEL_COL, &labels.label_column, CellStyle::Header);
    sheet.text(0, LONG_DATE_COL, &labels.date_column, CellStyle::Header);
    sheet.text(0, LONG_COUNT_COL, &labels.count_column, CellStyle::Header);
    for (i, name) in layout.metric_names.iter().enumerate() {
        sheet.text(0, LONG_MEAN_COL + i as u16, name, CellStyle::Header);
        sheet.text(0, LONG_ERROR_COL + i as u16, &labels.std_column(name), CellStyle::Header);
    }

    for (r, long) in layout.long_rows.iter().enumerate() {
        let row = 1 + r as u32;
        sheet.text(row, LONG_LABEL_COL, &long.label, CellStyle::Plain);
        sheet.write(row, LONG_DATE_COL, CellValue::Date(long.date), CellStyle::Plain);
        sheet.write(row, LONG_COUNT_COL, CellValue::Count(long.count as u64), CellStyle::Plain);
        let errors = long.error_bars();
        for i in 0..METRIC_COUNT {
            sheet.number(row, LONG_MEAN_COL + i as u16, long.means[i]);
            sheet.number(row, LONG_ERROR_COL + i as u16, errors[i]);
        }
    }

    let last_row = layout.long_rows.len() as u32;
    if last_row > 0 {
        let name = sheet.name.clone();
        let series = layout
            .metric_names
            .iter()
            .enumerate()
            .map(|(i, metric)| ChartSeries {
                name: metric.clone(),
                name_ref: CellRange::cell(&name, 0, LONG_MEAN_COL + i as u16),
                categories: CellRange::column(&name, LONG_LABEL_COL, 1, last_row),
                values: CellRange::column(&name, LONG_MEAN_COL + i as u16, 1, last_row),
                error_bars: Some(CellRange::column(&name, LONG_ERROR_COL + i as u16, 1, last_row)),
                color: METRIC_COLORS[i].to_string(),
                dashed: i == METRIC_COUNT - 1,
            })
            .collect();
        sheet.charts.push(WorkbookChart {
            title: labels.long_chart_title.clone(),
            x_axis: labels.date_axis.clone(),
            y_axis: labels.value_axis.clone(),
            date_axis: false,
            series,
            anchor_row: 1,
            anchor_col: LONG_ERROR_COL + METRIC_COUNT as u16 + 1,
            scale: 2.0,
        });
    }
    sheet.finish()
}

fn wide_sheet(layout: &ReportLayout, labels: &Labels, max_width: usize) -> SheetLayout {
    let mut sheet = SheetBuilder::new(WIDE_SHEET, max_width);
    sheet.text(0, 0, &labels.date_column, CellStyle::Header);
    for period in Period::ALL {
        let period_name = labels.period_name(period);
        for (i, metric) in layout.metric_names.iter().enumerate() {
            let value_header = format!("{} {}", period_name, metric);
            let error_header = labels.std_column(&value_header);
            sheet.text(0, wide_value_column(period, i) as u16, &value_header, CellStyle::Header);
            sheet.text(0, wide_error_column(period, i) as u16, &error_header, CellStyle::Header);
        }
    }

    for (r, wide) in layout.wide_rows.iter().enumerate() {
        let row = 1 + r as u32;
        sheet.write(row, 0, CellValue::Date(wide.date), CellStyle::Plain);
        for (c, cell) in wide.cells().into_iter().enumerate() {
            if let Some(value) = cell {
                sheet.number(row, 1 + c as u16, value);
            }
        }
    }

    let last_row = layout.wide_rows.len() as u32;
    if last_row > 0 {
        let name = sheet.name.clone();
        let mut series = Vec::with_capacity(Period::ALL.len() * METRIC_COUNT);
        for period in Period::ALL {
            for (i, metric) in layout.metric_names.iter().enumerate() {
                let value_col = wide_value_column(period, i) as u16;
                series.push(ChartSeries {
                    name: format!("{} {}", labels.period_name(period), metric),
                    name_ref: CellRange::cell(&name, 0, value_col),
                    categories: CellRange::column(&name, 0, 1, last_row),
                    values: CellRange::column(&name, value_col, 1, last_row),
                    error_bars: Some(CellRange::column(
                        &name,
                        wide_error_column(period, i) as u16,
                        1,
                        last_row,
                    )),
                    color: METRIC_COLORS[i].to_string(),
                    dashed: i == METRIC_COUNT - 1,
                });
            }
        }
        sheet.charts.push(WorkbookChart {
            title: labels.wide_chart_title.clone(),
            x_axis: labels.date_axis.clone(),
            y_axis: labels.value_axis.clone(),
            date_axis: true,
            series,
            anchor_row: 1,
            anchor_col: wide_column_count() as u16 + 1,
            scale: 2.0,
        });
    }
    sheet.finish()
}
