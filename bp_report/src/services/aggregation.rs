//! Single-pass aggregation of ordered samples.
//!
//! Produces the per-scope statistics tables and the sparse map of
//! (date, period) buckets. Buckets are only created for combinations that
//! hold at least one sample.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::{DateSpan, MetricValues, Period, SampleSet, METRIC_COUNT};
use crate::services::statistics::{
    mean, sample_std_dev, Scope, ScopeEntry, ScopeStatistics, StatTable,
};

/// Key of a day/period bucket. Orders by date, then by period of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    pub date: NaiveDate,
    pub period: Period,
}

impl BucketKey {
    pub fn new(date: NaiveDate, period: Period) -> Self {
        Self { date, period }
    }
}

/// Mean and spread of every metric over the samples of one (date, period).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayPeriodBucket {
    pub count: usize,
    pub means: MetricValues,
    /// `None` when the bucket holds a single sample.
    pub stddevs: [Option<f64>; METRIC_COUNT],
}

impl DayPeriodBucket {
    /// Summarize per-metric values. `None` for an empty group.
    pub fn from_columns(columns: &[Vec<f64>; METRIC_COUNT]) -> Option<Self> {
        let count = columns[0].len();
        let mut means = [0.0; METRIC_COUNT];
        for (slot, values) in means.iter_mut().zip(columns) {
            *slot = mean(values)?;
        }
        Some(Self {
            count,
            means,
            stddevs: columns.each_ref().map(|values| sample_std_dev(values)),
        })
    }

    /// Whether a spread could be computed.
    pub fn has_spread(&self) -> bool {
        self.stddevs.iter().all(Option::is_some)
    }
}

/// Everything derived from one pass over the samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregation {
    pub scope_stats: ScopeStatistics,
    pub buckets: BTreeMap<BucketKey, DayPeriodBucket>,
    /// `None` when there were no samples.
    pub date_span: Option<DateSpan>,
}

impl Aggregation {
    pub fn bucket(&self, date: NaiveDate, period: Period) -> Option<&DayPeriodBucket> {
        self.buckets.get(&BucketKey::new(date, period))
    }
}

type Columns = [Vec<f64>; METRIC_COUNT];

fn push_values(columns: &mut Columns, values: &MetricValues) {
    for (column, value) in columns.iter_mut().zip(values) {
        column.push(*value);
    }
}

/// Aggregate an ordered sample set.
///
/// Scopes without samples produce an entry with no table. A sample set
/// that is empty altogether yields no buckets and no date span.
pub fn aggregate(set: &SampleSet) -> Aggregation {
    let mut scope_columns: [Columns; 4] = Default::default();
    let mut bucket_columns: BTreeMap<BucketKey, Columns> = BTreeMap::new();

    for sample in &set.samples {
        let period = sample.period();
        push_values(&mut scope_columns[Scope::All.index()], &sample.values);
        push_values(&mut scope_columns[Scope::Period(period).index()], &sample.values);
        push_values(
            bucket_columns
                .entry(BucketKey::new(sample.date(), period))
                .or_default(),
            &sample.values,
        );
    }

    let entries = Scope::ALL
        .iter()
        .zip(&scope_columns)
        .map(|(scope, columns)| {
            let table = StatTable::from_columns(&set.metric_names, columns);
            if table.is_none() {
                warn!("No samples in scope '{}'", scope.key());
            }
            ScopeEntry {
                scope: scope.key().to_string(),
                sample_count: columns[0].len(),
                table,
            }
        })
        .collect();

    let buckets: BTreeMap<BucketKey, DayPeriodBucket> = bucket_columns
        .iter()
        .filter_map(|(key, columns)| {
            let bucket = DayPeriodBucket::from_columns(columns)?;
            debug!(
                "Bucket {} {}: count={}{}",
                key.date,
                key.period,
                bucket.count,
                if bucket.has_spread() { "" } else { " (no spread)" }
            );
            Some((*key, bucket))
        })
        .collect();

    Aggregation {
        scope_stats: ScopeStatistics { entries },
        buckets,
        date_span: DateSpan::from_samples(&set.samples),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Sample;
    use chrono::NaiveDateTime;

    fn sample(ts: &str, values: MetricValues) -> Sample {
        Sample::new(
            NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
            values,
        )
    }

    fn set(samples: Vec<Sample>) -> SampleSet {
        SampleSet::new("datetime", ["sys", "dia", "bpm"].map(String::from), samples)
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_bucket_with_identical_values_has_zero_spread() {
        let agg = aggregate(&set(vec![
            sample("2025-01-01 08:00", [10.0, 10.0, 10.0]),
            sample("2025-01-01 09:00", [10.0, 10.0, 10.0]),
        ]));
        let bucket = agg.bucket(date("2025-01-01"), Period::Morning).unwrap();

        assert_eq!(bucket.count, 2);
        assert_eq!(bucket.means[0], 10.0);
        assert_eq!(bucket.stddevs[0], Some(0.0));
    }

    #[test]
    fn test_single_sample_bucket_has_no_spread() {
        let agg = aggregate(&set(vec![sample("2025-01-01 12:00", [10.0, 20.0, 30.0])]));
        let bucket = agg.bucket(date("2025-01-01"), Period::Midday).unwrap();

        assert_eq!(bucket.count, 1);
        assert_eq!(bucket.means, [10.0, 20.0, 30.0]);
        assert_eq!(bucket.stddevs, [None, None, None]);
        assert!(!bucket.has_spread());
    }

    #[test]
    fn test_buckets_are_sparse() {
        let agg = aggregate(&set(vec![
            sample("2025-01-01 08:00", [1.0, 1.0, 1.0]),
            sample("2025-01-03 20:00", [2.0, 2.0, 2.0]),
        ]));

        assert_eq!(agg.buckets.len(), 2);
        assert!(agg.bucket(date("2025-01-02"), Period::Morning).is_none());
        assert!(agg.bucket(date("2025-01-01"), Period::Evening).is_none());
        assert_eq!(agg.date_span.unwrap().day_count(), 3);
    }

    #[test]
    fn test_bucket_order_is_date_then_period() {
        let agg = aggregate(&set(vec![
            sample("2025-01-02 07:00", [1.0, 1.0, 1.0]),
            sample("2025-01-01 18:00", [1.0, 1.0, 1.0]),
            sample("2025-01-01 07:00", [1.0, 1.0, 1.0]),
        ]));
        let keys: Vec<(NaiveDate, Period)> =
            agg.buckets.keys().map(|k| (k.date, k.period)).collect();

        assert_eq!(
            keys,
            vec![
                (date("2025-01-01"), Period::Morning),
                (date("2025-01-01"), Period::Evening),
                (date("2025-01-02"), Period::Morning),
            ]
        );
    }

    #[test]
    fn test_scope_statistics_report_empty_scopes() {
        let agg = aggregate(&set(vec![
            sample("2025-06-01 08:00", [120.0, 80.0, 60.0]),
            sample("2025-06-01 08:30", [122.0, 81.0, 62.0]),
        ]));
        let stats = &agg.scope_stats;

        let all = stats.get(Scope::All).unwrap();
        assert_eq!(all.get("sys").unwrap().min, 120.0);
        assert_eq!(all.get("sys").unwrap().max, 122.0);
        assert!(stats.get(Scope::Period(Period::Morning)).is_some());
        assert!(stats.get(Scope::Period(Period::Midday)).is_none());
        assert!(stats.get(Scope::Period(Period::Evening)).is_none());
        assert_eq!(stats.empty_scopes(), vec!["midday", "evening"]);
        assert_eq!(stats.sample_count(Scope::All), 2);
    }

    #[test]
    fn test_empty_sample_set() {
        let agg = aggregate(&set(vec![]));
        assert!(agg.buckets.is_empty());
        assert!(agg.date_span.is_none());
        assert_eq!(agg.scope_stats.empty_scopes().len(), 4);
    }
}
