//! Statistics, aggregation and report layout.
//!
//! Everything here is pure computation over an ordered [`crate::core::SampleSet`]:
//! [`aggregation::aggregate`] makes one pass to produce the scope tables and
//! day/period buckets, [`layout::LayoutBuilder`] projects them into the long,
//! wide and daily tables, and [`workbook::WorkbookLayout`] turns the layout
//! into a cell-level spreadsheet plan.

pub mod aggregation;
pub mod layout;
pub mod statistics;
pub mod workbook;


pub use aggregation::{aggregate, Aggregation, BucketKey, DayPeriodBucket};
pub use layout::{
    daily_averages, DailyPoint, DailySeries, LayoutBuilder, LongRow, ReportLayout, ScopeSection,
    WideBlock, WideRow,
};
pub use statistics::{quantile, Scope, ScopeStatistics, StatField, StatRow, StatTable};
pub use workbook::{CellRange, CellValue, ChartSeries, SheetLayout, WorkbookChart, WorkbookLayout};
