use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::collections::HashSet;

use crate::core::{MetricValues, Sample, METRIC_COUNT};
use crate::parsing::{RawRow, RawTable};

/// Timestamp layouts accepted in the first column, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Parse a timestamp cell.
///
/// RFC 3339 values keep their wall-clock time and drop the offset, since
/// the device records local time. A bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_local()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parse a reading cell. Only finite numbers are accepted.
pub fn parse_metric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn parse_row(row: &RawRow) -> Option<Sample> {
    let timestamp = parse_timestamp(row[0].as_deref()?)?;
    let mut values: MetricValues = [0.0; METRIC_COUNT];
    for (slot, cell) in values.iter_mut().zip(&row[1..]) {
        *slot = parse_metric(cell.as_deref()?)?;
    }
    Some(Sample::new(timestamp, values))
}

/// Samples that survived cleaning one source, with the rejected row count.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedTable {
    pub samples: Vec<Sample>,
    pub dropped_rows: usize,
}

/// Coerce every row of a raw table, dropping rows where the timestamp or
/// any of the three readings fails to parse. Row order is preserved.
pub fn clean_table(table: &RawTable) -> CleanedTable {
    let samples: Vec<Sample> = table.rows.iter().filter_map(parse_row).collect();
    CleanedTable {
        dropped_rows: table.height() - samples.len(),
        samples,
    }
}

/// Remove exact duplicates, keeping the first occurrence of each sample.
pub fn remove_duplicates(samples: Vec<Sample>) -> Vec<Sample> {
    let mut seen = HashSet::with_capacity(samples.len());
    samples
        .into_iter()
        .filter(|s| seen.insert(s.dedup_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: [&str; 4]) -> RawRow {
        cells.map(|c| if c.is_empty() { None } else { Some(c.to_string()) })
    }

    fn table(rows: Vec<RawRow>) -> RawTable {
        let headers = ["datetime", "sys", "dia", "bpm"].map(String::from).to_vec();
        RawTable::new("test.csv", headers, rows)
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();
        assert_eq!(parse_timestamp("2025-06-01 08:30"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01 08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2025/06/01 08:30"), Some(expected));
        assert_eq!(parse_timestamp("2025-06-01T08:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp(" 2025-06-01 08:30 "), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_bare_date_is_midnight() {
        let ts = parse_timestamp("2025-06-01").unwrap();
        assert_eq!(ts.format("%H:%M:%S").to_string(), "00:00:00");
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2025-13-01 08:00"), None);
    }

    #[test]
    fn test_parse_metric() {
        assert_eq!(parse_metric("120"), Some(120.0));
        assert_eq!(parse_metric(" 81.5 "), Some(81.5));
        assert_eq!(parse_metric("abc"), None);
        assert_eq!(parse_metric("NaN"), None);
        assert_eq!(parse_metric("inf"), None);
    }

    #[test]
    fn test_clean_table_drops_malformed_rows() {
        let cleaned = clean_table(&table(vec![
            row(["2025-06-01 08:00", "120", "80", "60"]),
            row(["not a date", "120", "80", "60"]),
            row(["2025-06-01 09:00", "x", "80", "60"]),
            row(["2025-06-01 10:00", "120", "80", ""]),
            row(["2025-06-01 11:00", "121", "79", "61"]),
        ]));

        assert_eq!(cleaned.samples.len(), 2);
        assert_eq!(cleaned.dropped_rows, 3);
        assert_eq!(cleaned.samples[0].values, [120.0, 80.0, 60.0]);
        assert_eq!(cleaned.samples[1].values, [121.0, 79.0, 61.0]);
    }

    #[test]
    fn test_remove_duplicates_keeps_first() {
        let ts = parse_timestamp("2025-06-01 08:00").unwrap();
        let later = parse_timestamp("2025-06-01 09:00").unwrap();
        let samples = vec![
            Sample::new(later, [1.0, 2.0, 3.0]),
            Sample::new(ts, [1.0, 2.0, 3.0]),
            Sample::new(later, [1.0, 2.0, 3.0]),
            Sample::new(ts, [1.0, 2.0, 4.0]),
        ];
        let unique = remove_duplicates(samples);

        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].timestamp, later);
        assert_eq!(unique[1].timestamp, ts);
        assert_eq!(unique[2].values, [1.0, 2.0, 4.0]);
    }
}
