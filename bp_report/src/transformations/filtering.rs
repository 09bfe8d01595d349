use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::core::Sample;
use crate::transformations::cleaning::parse_timestamp;

/// Inclusive time window. A missing bound leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
}

impl TimeRange {
    pub fn new(start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        Self { start, end }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, timestamp: &NaiveDateTime) -> bool {
        self.start.is_none_or(|start| *timestamp >= start)
            && self.end.is_none_or(|end| *timestamp <= end)
    }
}

/// Which side of a [`TimeRange`] a user-supplied bound belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    Start,
    End,
}

/// Parse a user-supplied bound.
///
/// Accepts anything [`parse_timestamp`] accepts. A bare `YYYY-MM-DD` end
/// bound covers the whole day; a bare start bound begins at midnight.
pub fn parse_bound(raw: &str, kind: BoundKind) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(match kind {
            BoundKind::Start => date.and_time(NaiveTime::MIN),
            BoundKind::End => date.and_hms_nano_opt(23, 59, 59, 999_999_999)?,
        });
    }
    parse_timestamp(raw)
}

/// Keep samples inside `range`, then stably sort them by timestamp.
///
/// Samples sharing a timestamp keep their merged order. An empty result is
/// not an error here.
pub fn filter_and_sort(samples: Vec<Sample>, range: &TimeRange) -> Vec<Sample> {
    let mut kept: Vec<Sample> = if range.is_unbounded() {
        samples
    } else {
        samples
            .into_iter()
            .filter(|s| range.contains(&s.timestamp))
            .collect()
    };
    kept.sort_by_key(|s| s.timestamp);
    kept
}
