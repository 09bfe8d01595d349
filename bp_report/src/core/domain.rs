//! Domain models for measurement samples.
//!
//! A [`Sample`] is one timestamped triple of readings exported by the
//! measurement device, e.g. two pressure values and a pulse rate. Samples
//! only exist once all four fields parsed; they are never mutated after
//! the loader accepts them.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::period::Period;

/// Number of numeric readings carried by every sample.
pub const METRIC_COUNT: usize = 3;

/// One value per metric, in column order.
pub type MetricValues = [f64; METRIC_COUNT];

/// A single timestamped measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: NaiveDateTime,
    pub values: MetricValues,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, values: MetricValues) -> Self {
        Self { timestamp, values }
    }

    /// Calendar date of the measurement.
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    /// Day segment the measurement falls into.
    pub fn period(&self) -> Period {
        Period::classify(&self.timestamp)
    }

    /// Copy of this sample with the 2nd and 3rd readings exchanged.
    pub fn with_swapped_metrics(&self) -> Self {
        let [a, b, c] = self.values;
        Self::new(self.timestamp, [a, c, b])
    }

    /// Identity used for duplicate detection.
    ///
    /// `-0.0` and `0.0` compare equal as values, so both map to the same key.
    pub(crate) fn dedup_key(&self) -> (NaiveDateTime, [u64; METRIC_COUNT]) {
        let bits = self.values.map(|v| if v == 0.0 { 0u64 } else { v.to_bits() });
        (self.timestamp, bits)
    }
}

/// An ordered collection of samples with the column names they came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSet {
    pub timestamp_column: String,
    pub metric_names: [String; METRIC_COUNT],
    pub samples: Vec<Sample>,
    /// The 2nd and 3rd readings (and names) were exchanged after loading.
    #[serde(default)]
    pub metrics_swapped: bool,
}

impl SampleSet {
    pub fn new(
        timestamp_column: impl Into<String>,
        metric_names: [String; METRIC_COUNT],
        samples: Vec<Sample>,
    ) -> Self {
        Self {
            timestamp_column: timestamp_column.into(),
            metric_names,
            samples,
            metrics_swapped: false,
        }
    }

    /// Exchange the 2nd and 3rd readings of every sample together with
    /// their column names. Applying it twice restores the original set.
    pub fn swap_metrics(self) -> Self {
        let mut metric_names = self.metric_names;
        metric_names.swap(1, 2);
        Self {
            timestamp_column: self.timestamp_column,
            metric_names,
            samples: self.samples.iter().map(Sample::with_swapped_metrics).collect(),
            metrics_swapped: !self.metrics_swapped,
        }
    }

    /// The set with its metric columns in the order the device wrote them.
    pub fn in_source_order(&self) -> Self {
        if self.metrics_swapped {
            self.clone().swap_metrics()
        } else {
            self.clone()
        }
    }

    /// Column names used when a source has no usable header.
    pub fn default_metric_names() -> [String; METRIC_COUNT] {
        ["metric1".to_string(), "metric2".to_string(), "metric3".to_string()]
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Replace the samples, keeping the column names.
    pub fn with_samples(&self, samples: Vec<Sample>) -> Self {
        Self {
            timestamp_column: self.timestamp_column.clone(),
            metric_names: self.metric_names.clone(),
            samples,
            metrics_swapped: self.metrics_swapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn test_sample_date_and_period() {
        let sample = Sample::new(ts("2025-06-01 08:00"), [120.0, 80.0, 60.0]);
        assert_eq!(sample.date(), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        assert_eq!(sample.period(), Period::Morning);
    }

    #[test]
    fn test_source_order_undoes_swap() {
        let names = ["sys", "dia", "pulse"].map(String::from);
        let set = SampleSet::new("datetime", names, vec![Sample::new(ts("2025-06-01 08:00"), [120.0, 80.0, 60.0])]);

        let swapped = set.clone().swap_metrics();
        assert!(swapped.metrics_swapped);
        assert_eq!(swapped.metric_names, ["sys", "pulse", "dia"].map(String::from));
        assert_eq!(swapped.samples[0].values, [120.0, 60.0, 80.0]);

        assert_eq!(swapped.in_source_order(), set);
        assert_eq!(set.in_source_order(), set);
    }

    #[test]
    fn test_swapped_metrics() {
        let sample = Sample::new(ts("2025-06-01 08:00"), [120.0, 60.0, 80.0]);
        assert_eq!(sample.with_swapped_metrics().values, [120.0, 80.0, 60.0]);
    }

    #[test]
    fn test_dedup_key_treats_signed_zero_as_equal() {
        let a = Sample::new(ts("2025-06-01 08:00"), [0.0, 1.0, 2.0]);
        let b = Sample::new(ts("2025-06-01 08:00"), [-0.0, 1.0, 2.0]);
        assert_eq!(a.dedup_key(), b.dedup_key());
    }
}
