//! Plain-text summary tables.

use std::fmt::Write as _;

use crate::labels::Labels;
use crate::services::layout::{ReportLayout, ScopeSection};
use crate::services::statistics::{StatField, StatTable};

fn format_table(table: &StatTable) -> String {
    let header: Vec<&str> = StatField::ALL.iter().map(|f| f.key()).collect();
    let cells: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|row| row.stats.values().iter().map(|v| format!("{:.2}", v)).collect())
        .collect();

    let label_width = table
        .rows
        .iter()
        .map(|row| row.metric.chars().count())
        .max()
        .unwrap_or(0);
    let widths: Vec<usize> = header
        .iter()
        .enumerate()
        .map(|(i, name)| {
            cells
                .iter()
                .map(|row| row[i].len())
                .chain(std::iter::once(name.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut out = String::new();
    let _ = write!(out, "{:label_width$}", "");
    for (name, width) in header.iter().zip(&widths) {
        let _ = write!(out, "  {:>width$}", name, width = *width);
    }
    out.push('\n');
    for (row, values) in table.rows.iter().zip(&cells) {
        let _ = write!(out, "{:<label_width$}", row.metric);
        for (value, width) in values.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", value, width = *width);
        }
        out.push('\n');
    }
    out
}

/// Render one scope section: title line, then the table or the placeholder.
pub fn format_section(section: &ScopeSection, labels: &Labels) -> String {
    let body = match &section.table {
        Some(table) => format_table(table),
        None => format!("{}\n", labels.no_data),
    };
    format!("{}:\n{}", section.title, body)
}

/// The complete text summary, every scope in output order.
pub fn format_summary(layout: &ReportLayout, labels: &Labels) -> String {
    let sections: Vec<String> = layout
        .scope_sections
        .iter()
        .map(|section| format_section(section, labels))
        .collect();
    format!("{}\n\n{}", labels.summary_header, sections.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Period, Sample, SampleSet};
    use crate::services::aggregation::aggregate;
    use crate::services::layout::LayoutBuilder;
    use chrono::NaiveDateTime;

    fn layout(labels: &Labels) -> ReportLayout {
        let ts = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        let set = SampleSet::new(
            "datetime",
            ["sys", "dia", "bpm"].map(String::from),
            vec![
                Sample::new(ts("2025-06-01 08:00"), [120.0, 80.0, 60.0]),
                Sample::new(ts("2025-06-01 08:30"), [122.0, 81.0, 62.0]),
            ],
        );
        LayoutBuilder::new(labels).build(&set, &aggregate(&set))
    }

    #[test]
    fn test_summary_header_and_sections() {
        let labels = Labels::english();
        let text = format_summary(&layout(&labels), &labels);

        assert!(text.starts_with("=== Summary Tables ===\n\n"));
        let all = text.find("Summary: All Rows:").unwrap();
        let morning = text.find("Summary: Morning:").unwrap();
        let evening = text.find("Summary: Evening:").unwrap();
        assert!(all < morning && morning < evening);
    }

    #[test]
    fn test_table_is_right_aligned_with_two_decimals() {
        let labels = Labels::english();
        let layout = layout(&labels);
        let table = layout.scope_sections[0].table.as_ref().unwrap();
        let text = format_table(table);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "        min      q1  median      q3     max");
        assert_eq!(lines[1], "sys  120.00  120.50  121.00  121.50  122.00");
        assert!(lines.iter().all(|l| l.len() == lines[0].len()));
    }

    #[test]
    fn test_empty_scope_prints_placeholder() {
        let labels = Labels::english();
        let layout = layout(&labels);
        let midday = &layout.scope_sections[Period::Midday.index() + 1];

        assert_eq!(format_section(midday, &labels), "Summary: Midday:\nNo data\n");
    }
}
