use crate::{
    compare::get_changed_entries_in_report,
    types::{ComparedReport, ComparedReportEntry, DiffByMetric, DiffForEntry},
    units::{format_bytes, signed_size},
};

use super::{format_change, ReportOptions};

const HEADER: [&str; 3] = ["Fixture", "Before", "After (minified/GZIP)"];

type Row = [String; 3];

fn size(value: u64) -> String {
    format_bytes(signed_size(value))
}

fn before_cell(value: u64, diff: &DiffByMetric) -> String {
    format_bytes(signed_size(value).saturating_sub(diff.delta))
}

fn after_cell(value: u64, diff: &DiffByMetric, opts: &ReportOptions) -> String {
    if diff.delta == 0 {
        size(value)
    } else {
        format!("{} ({})", size(value), format_change(diff, opts.delta_format))
    }
}

fn entry_rows(entry: &ComparedReportEntry, opts: &ReportOptions) -> [Row; 2] {
    match &entry.diff {
        DiffForEntry::NoBaseline => [
            [
                entry.package_name.clone(),
                "N/A".to_string(),
                size(entry.minified_size),
            ],
            [
                format!("{} (new)", entry.name),
                "N/A".to_string(),
                size(entry.gzipped_size),
            ],
        ],
        DiffForEntry::Measured {
            exceeds_threshold,
            minified,
            gzip,
        } => {
            let marker = if *exceeds_threshold { " !" } else { "" };
            [
                [
                    entry.package_name.clone(),
                    before_cell(entry.minified_size, minified),
                    after_cell(entry.minified_size, minified, opts),
                ],
                [
                    format!("{}{marker}", entry.name),
                    before_cell(entry.gzipped_size, gzip),
                    after_cell(entry.gzipped_size, gzip, opts),
                ],
            ]
        }
    }
}

fn render_table(groups: &[[Row; 2]]) -> String {
    let header: Row = HEADER.map(str::to_string);
    let mut widths = header.clone().map(|h| h.chars().count());
    for row in groups.iter().flatten() {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let line = |row: &Row| {
        format!(
            "{:<w0$}  {:>w1$}  {:>w2$}",
            row[0],
            row[1],
            row[2],
            w0 = widths[0],
            w1 = widths[1],
            w2 = widths[2]
        )
        .trim_end()
        .to_string()
    };
    let rule = "-".repeat(widths.iter().sum::<usize>() + 4);

    let mut s = String::new();
    s.push_str(&line(&header));
    s.push('\n');
    for group in groups {
        s.push_str(&rule);
        s.push('\n');
        for row in group {
            s.push_str(&line(row));
            s.push('\n');
        }
    }
    s
}

/// Renders a plain-text comparison table. Rows over the threshold end with `!`.
pub fn render_cli_table(report: &ComparedReport, opts: &ReportOptions) -> String {
    let entries = get_changed_entries_in_report(report.clone());

    let mut s = String::new();
    if entries.changed_entries.is_empty() {
        s.push_str("No changes\n");
    } else {
        let groups: Vec<_> = entries
            .changed_entries
            .iter()
            .map(|e| entry_rows(e, opts))
            .collect();
        s.push_str(&render_table(&groups));
    }

    if opts.show_unchanged && !entries.unchanged_entries.is_empty() {
        s.push('\n');
        s.push_str("Unchanged fixtures\n");
        let groups: Vec<_> = entries
            .unchanged_entries
            .iter()
            .map(|e| entry_rows(e, opts))
            .collect();
        s.push_str(&render_table(&groups));
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DeltaFormat;

    fn measured(delta: i64, percent: &str, exceeds_threshold: bool) -> DiffForEntry {
        DiffForEntry::Measured {
            exceeds_threshold,
            minified: DiffByMetric {
                delta,
                percent: percent.to_string(),
            },
            gzip: DiffByMetric {
                delta: 0,
                percent: "0%".to_string(),
            },
        }
    }

    fn entry(package_name: &str, name: &str, diff: DiffForEntry) -> ComparedReportEntry {
        ComparedReportEntry {
            package_name: package_name.to_string(),
            name: name.to_string(),
            path: format!("{name}.fixture.js"),
            minified_size: 1500,
            gzipped_size: 300,
            diff,
        }
    }

    #[test]
    fn renders_changed_and_new_entries() {
        let report = vec![
            entry("foo-package", "New entry", DiffForEntry::NoBaseline),
            entry("bar-package", "Grown", measured(500, "50%", true)),
        ];

        let out = render_cli_table(&report, &ReportOptions::default());
        let lines: Vec<_> = out.lines().collect();

        assert!(lines[0].starts_with("Fixture"));
        assert!(lines[2].starts_with("bar-package"));
        assert!(lines[2].contains("1 kB"));
        assert!(lines[2].ends_with("1.5 kB (+500 B↑)"));
        assert!(lines[3].starts_with("Grown !"));
        assert!(lines[5].starts_with("foo-package"));
        assert!(lines[5].contains("N/A"));
        assert!(lines[6].starts_with("New entry (new)"));
    }

    #[test]
    fn percent_format_shows_percentages() {
        let report = vec![entry("p", "Grown", measured(500, "50%", false))];
        let opts = ReportOptions {
            delta_format: DeltaFormat::Percent,
            ..ReportOptions::default()
        };

        let out = render_cli_table(&report, &opts);
        assert!(out.contains("1.5 kB (+50%↑)"));
        assert!(!out.contains(" !"));
    }

    #[test]
    fn unchanged_entries_are_listed_on_request() {
        let report = vec![entry("p", "Same", measured(0, "0%", false))];

        let hidden = render_cli_table(&report, &ReportOptions::default());
        assert_eq!(hidden, "No changes\n");

        let shown = render_cli_table(
            &report,
            &ReportOptions {
                show_unchanged: true,
                ..ReportOptions::default()
            },
        );
        assert!(shown.contains("Unchanged fixtures"));
        assert!(shown.contains("Same"));
    }
}
