//! Display strings for every artifact.
//!
//! Labels are resolved once per run from a [`Language`] (optionally with
//! per-field overrides from the config file) and handed explicitly to the
//! layout builder and the writers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::Period;
use crate::services::statistics::Scope;

/// Built-in label sets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    #[serde(alias = "en")]
    English,
    #[serde(alias = "pl")]
    Polish,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "pl" | "polish" => Ok(Language::Polish),
            _ => Err(format!("Unknown language '{}'. Expected 'en' or 'pl'", s)),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("en"),
            Language::Polish => f.write_str("pl"),
        }
    }
}

/// Resolved display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Labels {
    pub morning: String,
    pub midday: String,
    pub evening: String,
    pub all_rows_title: String,
    /// Title of a per-period table; `{period}` is replaced by the period name.
    pub period_title: String,
    pub summary_header: String,
    pub no_data: String,
    pub daily_chart_title: String,
    pub daily_error_chart_title: String,
    /// Title of a per-period overview chart; `{period}` as above.
    pub period_chart_title: String,
    pub long_chart_title: String,
    pub wide_chart_title: String,
    pub date_axis: String,
    pub value_axis: String,
    pub label_column: String,
    pub date_column: String,
    pub count_column: String,
    /// Suffix appended to a metric name for its spread column.
    pub std_suffix: String,
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

impl Labels {
    pub fn english() -> Self {
        Self {
            morning: "Morning".to_string(),
            midday: "Midday".to_string(),
            evening: "Evening".to_string(),
            all_rows_title: "Summary: All Rows".to_string(),
            period_title: "Summary: {period}".to_string(),
            summary_header: "=== Summary Tables ===".to_string(),
            no_data: "No data".to_string(),
            daily_chart_title: "Daily Averages".to_string(),
            daily_error_chart_title: "Daily Averages with Error Bars".to_string(),
            period_chart_title: "Daily Averages: {period}".to_string(),
            long_chart_title: "Averages per Day and Period".to_string(),
            wide_chart_title: "Daily Averages by Period".to_string(),
            date_axis: "Date".to_string(),
            value_axis: "Average Value".to_string(),
            label_column: "label".to_string(),
            date_column: "date".to_string(),
            count_column: "count".to_string(),
            std_suffix: "_std".to_string(),
        }
    }

    pub fn polish() -> Self {
        Self {
            morning: "Rano".to_string(),
            midday: "Południe".to_string(),
            evening: "Wieczór".to_string(),
            all_rows_title: "Podsumowanie: wszystkie pomiary".to_string(),
            period_title: "Podsumowanie: {period}".to_string(),
            summary_header: "=== Tabele podsumowań ===".to_string(),
            no_data: "Brak danych".to_string(),
            daily_chart_title: "Średnie dzienne".to_string(),
            daily_error_chart_title: "Średnie dzienne z odchyleniem".to_string(),
            period_chart_title: "Średnie dzienne: {period}".to_string(),
            long_chart_title: "Średnie według dnia i pory dnia".to_string(),
            wide_chart_title: "Średnie dzienne według pory dnia".to_string(),
            date_axis: "Data".to_string(),
            value_axis: "Wartość średnia".to_string(),
            label_column: "etykieta".to_string(),
            date_column: "data".to_string(),
            count_column: "liczba".to_string(),
            std_suffix: "_odch".to_string(),
        }
    }

    pub fn for_language(language: Language) -> Self {
        match language {
            Language::English => Self::english(),
            Language::Polish => Self::polish(),
        }
    }

    pub fn period_name(&self, period: Period) -> &str {
        match period {
            Period::Morning => &self.morning,
            Period::Midday => &self.midday,
            Period::Evening => &self.evening,
        }
    }

    pub fn scope_title(&self, scope: Scope) -> String {
        match scope {
            Scope::All => self.all_rows_title.clone(),
            Scope::Period(p) => self.period_title.replace("{period}", self.period_name(p)),
        }
    }

    pub fn period_chart_title(&self, period: Period) -> String {
        self.period_chart_title
            .replace("{period}", self.period_name(period))
    }

    pub fn std_column(&self, metric: &str) -> String {
        format!("{}{}", metric, self.std_suffix)
    }
}

/// Partial label overrides read from the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelOverrides {
    pub morning: Option<String>,
    pub midday: Option<String>,
    pub evening: Option<String>,
    pub no_data: Option<String>,
    pub value_axis: Option<String>,
}

impl LabelOverrides {
    pub fn apply(&self, mut labels: Labels) -> Labels {
        let fields = [
            (&self.morning, &mut labels.morning),
            (&self.midday, &mut labels.midday),
            (&self.evening, &mut labels.evening),
            (&self.no_data, &mut labels.no_data),
            (&self.value_axis, &mut labels.value_axis),
        ];
        for (value, slot) in fields {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        labels
    }
}
