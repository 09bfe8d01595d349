//! Chart image description.
//!
//! [`ChartDocument`] lists the panels of the report image in drawing order:
//! the daily-average overview, one overview per period, and the statistics
//! tables. A [`super::ChartRenderer`] draws it with whatever plotting
//! backend it wraps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::{Period, METRIC_COUNT};
use crate::labels::Labels;
use crate::services::layout::{DailySeries, ReportLayout, ScopeSection};
use crate::services::statistics::{Scope, StatField};
use crate::services::workbook::{format_number, METRIC_COLORS};

/// Header color of a statistics table panel.
pub fn scope_color(scope: Scope) -> &'static str {
    match scope {
        Scope::All => "#444444",
        Scope::Period(Period::Morning) => "#009944",
        Scope::Period(Period::Midday) => "#996600",
        Scope::Period(Period::Evening) => "#004499",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dotted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSeries {
    pub name: String,
    pub color: String,
    pub style: LineStyle,
    pub points: Vec<(NaiveDate, f64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinePanel {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<LineSeries>,
    /// Shown instead of the plot when no series has points.
    pub placeholder: Option<String>,
}

impl LinePanel {
    fn from_daily(daily: &DailySeries, metric_names: &[String; METRIC_COUNT], labels: &Labels) -> Self {
        let series = metric_names
            .iter()
            .enumerate()
            .map(|(i, name)| LineSeries {
                name: name.clone(),
                color: METRIC_COLORS[i].to_string(),
                style: if i == METRIC_COUNT - 1 {
                    LineStyle::Dotted
                } else {
                    LineStyle::Solid
                },
                points: daily.points.iter().map(|p| (p.date, p.means[i])).collect(),
            })
            .collect();

        Self {
            title: daily.title.clone(),
            x_label: labels.date_axis.clone(),
            y_label: labels.value_axis.clone(),
            series,
            placeholder: daily.points.is_empty().then(|| labels.no_data.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }
}

/// A statistics table drawn as a grid. Empty scopes carry a placeholder
/// instead of rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePanel {
    pub title: String,
    pub header_color: String,
    pub columns: Vec<String>,
    /// Row label and formatted cells.
    pub rows: Vec<(String, Vec<String>)>,
    pub placeholder: Option<String>,
}

impl TablePanel {
    fn from_section(section: &ScopeSection, labels: &Labels) -> Self {
        let columns = StatField::ALL.iter().map(|f| f.key().to_string()).collect();
        let (rows, placeholder) = match &section.table {
            Some(table) => (
                table
                    .rows
                    .iter()
                    .map(|row| {
                        let cells: Vec<String> =
                            row.stats.values().iter().map(|v| format_number(*v)).collect();
                        (row.metric.clone(), cells)
                    })
                    .collect(),
                None,
            ),
            None => (Vec::new(), Some(labels.no_data.clone())),
        };

        Self {
            title: section.title.clone(),
            header_color: scope_color(section.scope).to_string(),
            columns,
            rows,
            placeholder,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartPanel {
    Line(LinePanel),
    Table(TablePanel),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDocument {
    pub panels: Vec<ChartPanel>,
}

impl ChartDocument {
    pub fn build(layout: &ReportLayout, labels: &Labels) -> Self {
        let mut panels = vec![ChartPanel::Line(LinePanel::from_daily(
            &layout.daily_all,
            &layout.metric_names,
            labels,
        ))];
        panels.extend(
            layout
                .daily_by_period
                .iter()
                .map(|daily| ChartPanel::Line(LinePanel::from_daily(daily, &layout.metric_names, labels))),
        );
        panels.extend(
            layout
                .scope_sections
                .iter()
                .map(|section| ChartPanel::Table(TablePanel::from_section(section, labels))),
        );
        Self { panels }
    }

    pub fn line_panels(&self) -> impl Iterator<Item = &LinePanel> {
        self.panels.iter().filter_map(|p| match p {
            ChartPanel::Line(line) => Some(line),
            ChartPanel::Table(_) => None,
        })
    }

    pub fn table_panels(&self) -> impl Iterator<Item = &TablePanel> {
        self.panels.iter().filter_map(|p| match p {
            ChartPanel::Table(table) => Some(table),
            ChartPanel::Line(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Sample, SampleSet};
    use crate::services::aggregation::aggregate;
    use crate::services::layout::LayoutBuilder;
    use chrono::NaiveDateTime;

    fn document() -> ChartDocument {
        let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        let set = SampleSet::new(
            "datetime",
            ["sys", "dia", "bpm"].map(String::from),
            vec![
                Sample::new(ts("2025-06-01 08:00"), [120.0, 80.0, 60.0]),
                Sample::new(ts("2025-06-02 08:00"), [124.0, 84.0, 64.0]),
            ],
        );
        let labels = Labels::english();
        let layout = LayoutBuilder::new(&labels).build(&set, &aggregate(&set));
        ChartDocument::build(&layout, &labels)
    }

    #[test]
    fn test_panel_order() {
        let doc = document();

        assert_eq!(doc.line_panels().count(), 4);
        assert_eq!(doc.table_panels().count(), 4);
        assert!(matches!(doc.panels[0], ChartPanel::Line(_)));
        assert!(matches!(doc.panels[4], ChartPanel::Table(_)));
    }

    #[test]
    fn test_third_metric_is_dotted() {
        let doc = document();
        let overview = doc.line_panels().next().unwrap();

        assert_eq!(overview.title, "Daily Averages");
        assert_eq!(overview.series[0].style, LineStyle::Solid);
        assert_eq!(overview.series[2].style, LineStyle::Dotted);
        assert_eq!(overview.series[0].points.len(), 2);
    }

    #[test]
    fn test_empty_scope_table_has_placeholder() {
        let doc = document();
        let tables: Vec<&TablePanel> = doc.table_panels().collect();

        assert_eq!(tables[0].header_color, "#444444");
        assert_eq!(tables[0].rows[0].1[0], "120");
        assert!(tables[0].placeholder.is_none());
        assert_eq!(tables[2].placeholder.as_deref(), Some("No data"));
        assert!(tables[2].rows.is_empty());

        let midday = doc.line_panels().nth(2).unwrap();
        assert!(midday.is_empty());
        assert_eq!(midday.placeholder.as_deref(), Some("No data"));
        assert!(doc.line_panels().next().unwrap().placeholder.is_none());
    }
}
