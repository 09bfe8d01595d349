use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::Sample;

/// Inclusive range of calendar dates covered by a sample set.
///
/// Iterating a span yields every date between `first` and `last`, including
/// dates with no samples at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

impl DateSpan {
    /// Returns `None` when `last` precedes `first`.
    pub fn new(first: NaiveDate, last: NaiveDate) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    /// Span from the earliest to the latest sample date, `None` if there are
    /// no samples. The input does not need to be sorted.
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let mut dates = samples.iter().map(Sample::date);
        let first = dates.next()?;
        let (min, max) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self {
            first: min,
            last: max,
        })
    }

    /// Number of calendar dates in the span, at least one.
    pub fn day_count(&self) -> usize {
        (self.last - self.first).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.first <= date && date <= self.last
    }

    /// Every date in the span, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        (0..self.day_count() as u64).filter_map(move |offset| self.first.checked_add_days(Days::new(offset)))
    }
}
