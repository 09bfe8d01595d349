//! Descriptive statistics over metric values.
//!
//! Quantiles use linear interpolation between closest ranks (the "R-7"
//! definition, also the default of most dataframe libraries): for `n` sorted
//! values and probability `p`, the rank is `h = (n - 1) * p` and the result
//! is `x[floor(h)] + (h - floor(h)) * (x[floor(h) + 1] - x[floor(h)])`.

use serde::{Deserialize, Serialize};

use crate::core::{Period, METRIC_COUNT};

/// R-7 quantile of already sorted values. `None` for an empty slice.
pub fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    let h = last as f64 * p.clamp(0.0, 1.0);
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(last);
    let (a, b) = (sorted[lo], sorted[hi]);
    let t = h - lo as f64;
    if t == 0.0 || a == b {
        return Some(a);
    }
    let gap = b - a;
    if gap.is_finite() {
        Some(a + t * gap)
    } else {
        Some((1.0 - t) * a + t * b)
    }
}

/// Largest magnitude in `values`, used to rescale sums that would
/// overflow.
fn magnitude(values: &[f64]) -> f64 {
    values.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
}

/// Arithmetic mean. `None` for an empty slice.
///
/// Finite inputs always give a finite mean: when the plain sum overflows,
/// the values are rescaled by their largest magnitude and averaged with a
/// running mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum: f64 = values.iter().sum();
    if sum.is_finite() {
        return Some(sum / values.len() as f64);
    }
    let scale = magnitude(values);
    let scaled = values
        .iter()
        .enumerate()
        .fold(0.0, |m, (i, v)| m + (v / scale - m) / (i + 1) as f64);
    Some(scaled * scale)
}

/// Sample standard deviation (N - 1 denominator).
///
/// `None` when fewer than two values are available. A zero result always
/// means the values were identical. Squared deviations that overflow are
/// recomputed on rescaled values, so the result is only infinite when the
/// spread itself exceeds the `f64` range.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let denominator = (values.len() - 1) as f64;
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    if sum_sq.is_finite() {
        return Some((sum_sq / denominator).sqrt());
    }
    let scale = magnitude(values);
    let scaled_mean = m / scale;
    let scaled_sq: f64 = values
        .iter()
        .map(|v| {
            let d = v / scale - scaled_mean;
            d * d
        })
        .sum();
    Some((scaled_sq / denominator).sqrt() * scale)
}

/// Field of a [`StatRow`], in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatField {
    Min,
    Q1,
    Median,
    Q3,
    Max,
}

impl StatField {
    pub const ALL: [StatField; 5] = [
        StatField::Min,
        StatField::Q1,
        StatField::Median,
        StatField::Q3,
        StatField::Max,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StatField::Min => "min",
            StatField::Q1 => "q1",
            StatField::Median => "median",
            StatField::Q3 => "q3",
            StatField::Max => "max",
        }
    }
}

/// Five-number summary of one metric within one scope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatRow {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
}

impl StatRow {
    /// Summarize unsorted values. `None` when there are none.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        Self::from_sorted(&sorted)
    }

    pub fn from_sorted(sorted: &[f64]) -> Option<Self> {
        Some(Self {
            min: *sorted.first()?,
            q1: quantile(sorted, 0.25)?,
            median: quantile(sorted, 0.5)?,
            q3: quantile(sorted, 0.75)?,
            max: *sorted.last()?,
        })
    }

    pub fn get(&self, field: StatField) -> f64 {
        match field {
            StatField::Min => self.min,
            StatField::Q1 => self.q1,
            StatField::Median => self.median,
            StatField::Q3 => self.q3,
            StatField::Max => self.max,
        }
    }

    /// Values in [`StatField::ALL`] order.
    pub fn values(&self) -> [f64; 5] {
        StatField::ALL.map(|f| self.get(f))
    }
}

/// Statistics of one named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricStats {
    pub metric: String,
    pub stats: StatRow,
}

/// One [`StatRow`] per metric, in column order. Only exists for non-empty
/// scopes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatTable {
    pub rows: Vec<MetricStats>,
}

impl StatTable {
    /// Build from per-metric values. `None` if the scope has no samples.
    pub fn from_columns(names: &[String; METRIC_COUNT], columns: &[Vec<f64>; METRIC_COUNT]) -> Option<Self> {
        let rows = names
            .iter()
            .zip(columns)
            .map(|(name, values)| {
                StatRow::from_values(values).map(|stats| MetricStats {
                    metric: name.clone(),
                    stats,
                })
            })
            .collect::<Option<Vec<_>>>()?;
        Some(Self { rows })
    }

    pub fn get(&self, metric: &str) -> Option<&StatRow> {
        self.rows.iter().find(|r| r.metric == metric).map(|r| &r.stats)
    }
}

/// Population a [`StatTable`] summarizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    All,
    Period(Period),
}

impl Scope {
    /// All scopes in output order.
    pub const ALL: [Scope; 4] = [
        Scope::All,
        Scope::Period(Period::Morning),
        Scope::Period(Period::Midday),
        Scope::Period(Period::Evening),
    ];

    pub fn key(self) -> &'static str {
        match self {
            Scope::All => "all",
            Scope::Period(p) => p.key(),
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.key() == key)
    }

    /// Position in [`Scope::ALL`].
    pub fn index(self) -> usize {
        match self {
            Scope::All => 0,
            Scope::Period(p) => p.index() + 1,
        }
    }
}

/// Statistics for every scope; `table` is `None` for an empty scope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeEntry {
    pub scope: String,
    pub sample_count: usize,
    pub table: Option<StatTable>,
}

/// Scope name → optional statistics table, in [`Scope::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopeStatistics {
    pub entries: Vec<ScopeEntry>,
}

impl ScopeStatistics {
    /// `None` when the scope had no samples.
    pub fn get(&self, scope: Scope) -> Option<&StatTable> {
        self.entries
            .get(scope.index())
            .and_then(|entry| entry.table.as_ref())
    }

    pub fn sample_count(&self, scope: Scope) -> usize {
        self.entries
            .get(scope.index())
            .map_or(0, |entry| entry.sample_count)
    }

    /// Keys of scopes without data.
    pub fn empty_scopes(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.table.is_none())
            .map(|e| e.scope.as_str())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_quantiles_linear_interpolation() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        let row = StatRow::from_values(&values).unwrap();

        assert_eq!(row.min, 1.0);
        assert!(approx(row.q1, 3.25));
        assert!(approx(row.median, 5.5));
        assert!(approx(row.q3, 7.75));
        assert_eq!(row.max, 10.0);
    }

    #[test]
    fn test_quantiles_unsorted_input() {
        let row = StatRow::from_values(&[5.0, 1.0, 3.0, 2.0, 4.0]).unwrap();
        assert_eq!(row.values(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_single_value_row() {
        let row = StatRow::from_values(&[42.0]).unwrap();
        assert_eq!(row.values(), [42.0; 5]);
    }

    #[test]
    fn test_empty_values_have_no_row() {
        assert!(StatRow::from_values(&[]).is_none());
        assert!(quantile(&[], 0.5).is_none());
        assert!(mean(&[]).is_none());
    }

    #[test]
    fn test_sample_std_dev() {
        assert_eq!(sample_std_dev(&[10.0, 10.0]), Some(0.0));
        assert_eq!(sample_std_dev(&[10.0]), None);
        assert_eq!(sample_std_dev(&[]), None);

        let std = sample_std_dev(&[120.0, 122.0]).unwrap();
        assert!(approx(std, std::f64::consts::SQRT_2));

        // N-1 denominator: population std of 1..=5 is sqrt(2), sample std is sqrt(2.5)
        let std = sample_std_dev(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert!(approx(std, 2.5f64.sqrt()));
    }

    #[test]
    fn test_huge_readings_keep_finite_mean_and_spread() {
        let same = [1e308; 4];
        assert_eq!(mean(&same), Some(1e308));
        assert_eq!(sample_std_dev(&same), Some(0.0));

        let values = [1.5e308, 1.5e308, 1.0e308];
        let m = mean(&values).unwrap();
        assert!(m.is_finite());
        assert!((m / 1e308 - 4.0 / 3.0).abs() < 1e-9);

        // deviations are 1/6 and 1/3 of 1e308: variance (1/36 + 1/36 + 1/9) / 2 = 1/12
        let std = sample_std_dev(&values).unwrap();
        assert!(std.is_finite());
        assert!((std / 1e308 - (1.0f64 / 12.0).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_quantile_between_opposite_extremes() {
        let row = StatRow::from_values(&[-1.5e308, 1.5e308]).unwrap();
        assert!(row.values().iter().all(|v| v.is_finite()));
        assert_eq!(row.median, 0.0);
        assert!((row.q1 / 1e308 + 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_stat_table_empty_scope() {
        let names = ["a", "b", "c"].map(String::from);
        let empty: [Vec<f64>; 3] = Default::default();
        assert!(StatTable::from_columns(&names, &empty).is_none());

        let table = StatTable::from_columns(&names, &[vec![1.0], vec![2.0], vec![3.0]]).unwrap();
        assert_eq!(table.get("b").unwrap().max, 2.0);
        assert!(table.get("z").is_none());
    }

    #[test]
    fn test_scope_keys() {
        let keys: Vec<&str> = Scope::ALL.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec!["all", "morning", "midday", "evening"]);
        assert_eq!(Scope::from_key("midday"), Some(Scope::Period(Period::Midday)));
        assert_eq!(Scope::from_key("night"), None);
    }

    proptest! {
        #[test]
        fn prop_stat_row_is_ordered(values in prop::collection::vec(-1000.0f64..1000.0, 1..50)) {
            let row = StatRow::from_values(&values).unwrap();
            prop_assert!(row.min <= row.q1);
            prop_assert!(row.q1 <= row.median);
            prop_assert!(row.median <= row.q3);
            prop_assert!(row.q3 <= row.max);
        }

        #[test]
        fn prop_std_dev_is_non_negative(values in prop::collection::vec(-1000.0f64..1000.0, 2..50)) {
            prop_assert!(sample_std_dev(&values).unwrap() >= 0.0);
        }
    }
}
