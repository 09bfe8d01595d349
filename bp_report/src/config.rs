//! Report configuration.
//!
//! One immutable [`ReportConfig`] record drives a run. It can be read from
//! a TOML file; the command line then overrides individual fields before
//! the pipeline is built.
//!
//! ```toml
//! inputs = ["M7-1-2025-06-01.csv", "Evolv-1-2025-06-01.csv"]
//! output = "analiza.csv"
//! language = "pl"
//!
//! [range]
//! start = "2025-05-01"
//! end = "2025-05-31"
//!
//! [[devices]]
//! name = "M7"
//! model = "hem-7361t"
//! mac = "00:11:22:33:44:55"
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReportError, ReportResult};
use crate::fetch::{DeviceSpec, FetchSettings};
use crate::labels::{LabelOverrides, Labels, Language};
use crate::transformations::filtering::{parse_bound, BoundKind, TimeRange};

/// Settings for one report run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Source CSV files, merged in this order.
    #[serde(default)]
    pub inputs: Vec<PathBuf>,
    /// Base path every artifact name is derived from.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Inclusive time window.
    #[serde(default, deserialize_with = "deserialize_range")]
    pub range: TimeRange,
    /// Exchange the 2nd and 3rd readings. The supported devices export them
    /// in the opposite order of the report.
    #[serde(default = "default_swap_metric_columns")]
    pub swap_metric_columns: bool,
    /// Cap for workbook column widths, in characters.
    #[serde(default = "default_max_column_width")]
    pub max_column_width: usize,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub labels: LabelOverrides,
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default = "DeviceSpec::defaults")]
    pub devices: Vec<DeviceSpec>,
}

fn default_output() -> PathBuf {
    PathBuf::from("analysis.csv")
}

fn default_swap_metric_columns() -> bool {
    true
}

fn default_max_column_width() -> usize {
    50
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: default_output(),
            range: TimeRange::unbounded(),
            swap_metric_columns: default_swap_metric_columns(),
            max_column_width: default_max_column_width(),
            language: Language::default(),
            labels: LabelOverrides::default(),
            fetch: FetchSettings::default(),
            devices: DeviceSpec::defaults(),
        }
    }
}

/// Range bounds as written in the file: any accepted timestamp layout or a
/// bare date.
#[derive(Deserialize)]
struct RawRange {
    start: Option<String>,
    end: Option<String>,
}

fn deserialize_range<'de, D>(deserializer: D) -> Result<TimeRange, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = RawRange::deserialize(deserializer)?;
    let bound = |value: Option<String>, kind: BoundKind| -> Result<_, D::Error> {
        value
            .map(|v| {
                parse_bound(&v, kind)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", v)))
            })
            .transpose()
    };
    Ok(TimeRange::new(
        bound(raw.start, BoundKind::Start)?,
        bound(raw.end, BoundKind::End)?,
    ))
}

impl ReportConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> ReportResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            ReportError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ReportResult<Self> {
        let config: ReportConfig = toml::from_str(content)
            .map_err(|e| ReportError::Config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> ReportResult<()> {
        if self.max_column_width == 0 {
            return Err(ReportError::Config(
                "max_column_width must be at least 1".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.range.start, self.range.end) {
            if start > end {
                return Err(ReportError::Config(format!(
                    "range start {} is after range end {}",
                    start, end
                )));
            }
        }
        if self.fetch.timeout_secs == 0 {
            return Err(ReportError::Config(
                "fetch.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Display strings for the configured language with overrides applied.
    pub fn labels(&self) -> Labels {
        self.labels.apply(Labels::for_language(self.language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ReportConfig::from_toml_str("").unwrap();

        assert_eq!(config, ReportConfig::default());
        assert!(config.swap_metric_columns);
        assert_eq!(config.max_column_width, 50);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.fetch.output_file, "user1.csv");
    }

    #[test]
    fn test_full_config() {
        let config = ReportConfig::from_toml_str(
            r#"
            inputs = ["a.csv", "b.csv"]
            output = "out/report.csv"
            swap_metric_columns = false
            max_column_width = 30
            language = "pl"

            [labels]
            no_data = "n/a"

            [range]
            start = "2025-05-01"
            end = "2025-05-31"

            [fetch]
            program = "python3"
            timeout_secs = 60

            [[devices]]
            name = "M7"
            model = "hem-7361t"
            mac = "00:11:22:33:44:55"
            "#,
        )
        .unwrap();

        assert_eq!(config.inputs, vec![PathBuf::from("a.csv"), PathBuf::from("b.csv")]);
        assert!(!config.swap_metric_columns);
        assert_eq!(config.language, Language::Polish);
        assert_eq!(config.range.start, Some(ts("2025-05-01 00:00:00")));
        assert_eq!(
            config.range.end,
            NaiveDate::from_ymd_opt(2025, 5, 31)
                .and_then(|d| d.and_hms_nano_opt(23, 59, 59, 999_999_999))
        );
        assert_eq!(config.fetch.program, "python3");
        assert_eq!(config.fetch.working_dir, PathBuf::from("omblepy-main"));
        assert_eq!(config.devices.len(), 1);

        let labels = config.labels();
        assert_eq!(labels.morning, "Rano");
        assert_eq!(labels.no_data, "n/a");
    }

    #[test]
    fn test_range_with_time_of_day() {
        let config = ReportConfig::from_toml_str(
            r#"
            [range]
            end = "2025-05-31 12:30"
            "#,
        )
        .unwrap();

        assert_eq!(config.range.start, None);
        assert_eq!(config.range.end, Some(ts("2025-05-31 12:30:00")));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        for content in [
            "max_column_width = 0",
            "language = \"de\"",
            "[range]\nstart = \"yesterday\"",
            "[range]\nstart = \"2025-06-02\"\nend = \"2025-06-01\"",
        ] {
            let err = ReportConfig::from_toml_str(content).unwrap_err();
            assert!(matches!(err, ReportError::Config(_)), "{}", content);
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ReportConfig::from_file("/nonexistent/bp-report.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
