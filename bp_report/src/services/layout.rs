//! Tabular projections of the aggregated data.
//!
//! The same buckets are laid out two ways:
//!
//! - **long**: one [`LongRow`] per existing (date, period) bucket, sparse
//! - **wide**: one [`WideRow`] per calendar date of the span, dense, with a
//!   block of columns per period that stays empty when the bucket is missing
//!
//! plus daily-average series (all samples, and per period) for overview
//! charts. Missing spread stays `None` in every table; only
//! [`LongRow::error_bars`] and [`WideBlock::error_bars`] substitute zero, for
//! chart error bars that need a number for every plotted point.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{DateSpan, MetricValues, Period, Sample, SampleSet, METRIC_COUNT};
use crate::labels::Labels;
use crate::services::aggregation::{Aggregation, DayPeriodBucket};
use crate::services::statistics::{mean, sample_std_dev, Scope, StatTable};

/// Date layout used in labels and text output.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns per period block in the wide table: three means, three errors.
pub const WIDE_BLOCK_WIDTH: usize = 2 * METRIC_COUNT;

/// Wide-table column holding the mean of `metric` for `period`.
/// Column 0 is the date.
pub fn wide_value_column(period: Period, metric: usize) -> usize {
    1 + period.index() * WIDE_BLOCK_WIDTH + metric
}

/// Wide-table column holding the spread of `metric` for `period`.
pub fn wide_error_column(period: Period, metric: usize) -> usize {
    wide_value_column(period, metric) + METRIC_COUNT
}

/// Total number of wide-table columns, date included.
pub fn wide_column_count() -> usize {
    1 + Period::ALL.len() * WIDE_BLOCK_WIDTH
}

fn zero_if_absent(stddevs: &[Option<f64>; METRIC_COUNT]) -> [f64; METRIC_COUNT] {
    stddevs.map(|s| s.unwrap_or(0.0))
}

/// One existing day/period bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    /// `"<date> <period name>"`
    pub label: String,
    pub date: NaiveDate,
    pub period: Period,
    pub count: usize,
    pub means: MetricValues,
    pub stddevs: [Option<f64>; METRIC_COUNT],
}

impl LongRow {
    /// Spread with zero standing in for single-sample buckets.
    pub fn error_bars(&self) -> [f64; METRIC_COUNT] {
        zero_if_absent(&self.stddevs)
    }
}

/// Values of one period inside a [`WideRow`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WideBlock {
    pub count: usize,
    pub means: MetricValues,
    pub stddevs: [Option<f64>; METRIC_COUNT],
}

impl WideBlock {
    pub fn error_bars(&self) -> [f64; METRIC_COUNT] {
        zero_if_absent(&self.stddevs)
    }
}

impl From<&DayPeriodBucket> for WideBlock {
    fn from(bucket: &DayPeriodBucket) -> Self {
        Self {
            count: bucket.count,
            means: bucket.means,
            stddevs: bucket.stddevs,
        }
    }
}

/// One calendar date with a block per period, `None` where no bucket exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WideRow {
    pub date: NaiveDate,
    pub blocks: [Option<WideBlock>; 3],
}

impl WideRow {
    pub fn block(&self, period: Period) -> Option<&WideBlock> {
        self.blocks[period.index()].as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Option::is_none)
    }

    /// Cell values in wide column order (date column excluded), `None` for
    /// blank cells.
    pub fn cells(&self) -> Vec<Option<f64>> {
        let mut cells = vec![None; wide_column_count() - 1];
        for period in Period::ALL {
            let Some(block) = self.block(period) else {
                continue;
            };
            let errors = block.error_bars();
            for metric in 0..METRIC_COUNT {
                cells[wide_value_column(period, metric) - 1] = Some(block.means[metric]);
                cells[wide_error_column(period, metric) - 1] = Some(errors[metric]);
            }
        }
        cells
    }
}

/// Mean (and spread) of every metric on one calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub count: usize,
    pub means: MetricValues,
    pub stddevs: [Option<f64>; METRIC_COUNT],
}

/// Daily averages over all samples or over one period's samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySeries {
    /// `None` for the all-samples overview.
    pub period: Option<Period>,
    pub title: String,
    pub points: Vec<DailyPoint>,
}

/// A statistics table section with its resolved title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeSection {
    pub scope: Scope,
    pub title: String,
    /// `None` for an empty scope; writers must render a placeholder or
    /// omit the section.
    pub table: Option<StatTable>,
}

/// Every table and series a render adapter needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportLayout {
    pub timestamp_column: String,
    pub metric_names: [String; METRIC_COUNT],
    pub date_span: Option<DateSpan>,
    pub scope_sections: Vec<ScopeSection>,
    pub long_rows: Vec<LongRow>,
    pub wide_rows: Vec<WideRow>,
    pub daily_all: DailySeries,
    pub daily_by_period: Vec<DailySeries>,
}

impl ReportLayout {
    /// Sections whose scope holds data.
    pub fn non_empty_sections(&self) -> impl Iterator<Item = (&ScopeSection, &StatTable)> {
        self.scope_sections
            .iter()
            .filter_map(|section| section.table.as_ref().map(|table| (section, table)))
    }
}

/// Compute daily means per metric, optionally restricted to one period.
///
/// Only dates that hold samples appear. Spread uses the sample standard
/// deviation and is `None` for single-sample days.
pub fn daily_averages(samples: &[Sample], period: Option<Period>) -> Vec<DailyPoint> {
    let mut by_date: BTreeMap<NaiveDate, [Vec<f64>; METRIC_COUNT]> = BTreeMap::new();
    for sample in samples
        .iter()
        .filter(|s| period.is_none_or(|p| s.period() == p))
    {
        let columns = by_date.entry(sample.date()).or_default();
        for (column, value) in columns.iter_mut().zip(&sample.values) {
            column.push(*value);
        }
    }

    by_date
        .into_iter()
        .filter_map(|(date, columns)| {
            let mut means = [0.0; METRIC_COUNT];
            for (slot, values) in means.iter_mut().zip(&columns) {
                *slot = mean(values)?;
            }
            Some(DailyPoint {
                date,
                count: columns[0].len(),
                means,
                stddevs: columns.each_ref().map(|values| sample_std_dev(values)),
            })
        })
        .collect()
}

/// Builds [`ReportLayout`]s with one resolved set of labels.
#[derive(Debug, Clone, Copy)]
pub struct LayoutBuilder<'a> {
    labels: &'a Labels,
}

impl<'a> LayoutBuilder<'a> {
    pub fn new(labels: &'a Labels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &Labels {
        self.labels
    }

    /// Lay out an ordered sample set and its aggregation.
    pub fn build(&self, set: &SampleSet, aggregation: &Aggregation) -> ReportLayout {
        ReportLayout {
            timestamp_column: set.timestamp_column.clone(),
            metric_names: set.metric_names.clone(),
            date_span: aggregation.date_span,
            scope_sections: self.scope_sections(aggregation),
            long_rows: self.long_rows(aggregation),
            wide_rows: self.wide_rows(aggregation),
            daily_all: DailySeries {
                period: None,
                title: self.labels.daily_chart_title.clone(),
                points: daily_averages(&set.samples, None),
            },
            daily_by_period: Period::ALL
                .iter()
                .map(|&period| DailySeries {
                    period: Some(period),
                    title: self.labels.period_chart_title(period),
                    points: daily_averages(&set.samples, Some(period)),
                })
                .collect(),
        }
    }

    pub fn scope_sections(&self, aggregation: &Aggregation) -> Vec<ScopeSection> {
        Scope::ALL
            .iter()
            .map(|&scope| ScopeSection {
                scope,
                title: self.labels.scope_title(scope),
                table: aggregation.scope_stats.get(scope).cloned(),
            })
            .collect()
    }

    /// `"<date> <period name>"`
    pub fn row_label(&self, date: NaiveDate, period: Period) -> String {
        format!("{} {}", date.format(DATE_FORMAT), self.labels.period_name(period))
    }

    /// One row per existing bucket, by date then period.
    pub fn long_rows(&self, aggregation: &Aggregation) -> Vec<LongRow> {
        let Some(span) = aggregation.date_span else {
            return Vec::new();
        };
        span.dates()
            .flat_map(|date| Period::ALL.iter().map(move |&period| (date, period)))
            .filter_map(|(date, period)| {
                let bucket = aggregation.bucket(date, period)?;
                Some(LongRow {
                    label: self.row_label(date, period),
                    date,
                    period,
                    count: bucket.count,
                    means: bucket.means,
                    stddevs: bucket.stddevs,
                })
            })
            .collect()
    }

    /// One row per date of the span, including dates without any bucket.
    pub fn wide_rows(&self, aggregation: &Aggregation) -> Vec<WideRow> {
        let Some(span) = aggregation.date_span else {
            return Vec::new();
        };
        span.dates()
            .map(|date| WideRow {
                date,
                blocks: Period::ALL.map(|period| aggregation.bucket(date, period).map(WideBlock::from)),
            })
            .collect()
    }
}
