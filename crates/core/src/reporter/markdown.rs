use crate::{
    compare::get_changed_entries_in_report,
    types::{ComparedReport, ComparedReportEntry, DiffByMetric, DiffForEntry},
    units::{format_bytes, signed_size},
};

use super::{delta_value, ReportOptions};

const ICON_BASE_URL: &str = "https://microsoft.github.io/sizeAuditor-website/images/icons";
const ICON_INCREASE: &str = "IncreaseYellow.svg";
const ICON_DECREASE: &str = "Decrease.svg";

fn code(value: &str) -> String {
    format!("`{value}`")
}

fn size(value: i64) -> String {
    code(&format_bytes(value))
}

fn direction_symbol(delta: i64) -> String {
    let icon = match delta.signum() {
        1 => ICON_INCREASE,
        -1 => ICON_DECREASE,
        _ => return String::new(),
    };
    format!(" <img aria-hidden=\"true\" src=\"{ICON_BASE_URL}/{icon}\" />")
}

fn format_delta(diff: &DiffByMetric, opts: &ReportOptions) -> String {
    if diff.delta == 0 {
        return String::new();
    }
    format!(
        "{}{}",
        code(&delta_value(diff, opts.delta_format)),
        direction_symbol(diff.delta)
    )
}

fn title(entry: &ComparedReportEntry) -> String {
    format!(
        "<samp>{}</samp> <br /> <abbr title='{}'>{}</abbr>",
        entry.package_name, entry.path, entry.name
    )
}

fn sizes(minified: i64, gzipped: i64) -> String {
    format!("{}<br />{}", size(minified), size(gzipped))
}

fn changed_row(entry: &ComparedReportEntry, opts: &ReportOptions) -> String {
    let minified_size = signed_size(entry.minified_size);
    let gzipped_size = signed_size(entry.gzipped_size);

    let (before, difference) = match &entry.diff {
        DiffForEntry::NoBaseline => (sizes(0, 0), "🆕 New entry".to_string()),
        DiffForEntry::Measured {
            exceeds_threshold,
            minified,
            gzip,
        } => {
            let alert = if *exceeds_threshold { " 🚨" } else { "" };
            (
                sizes(
                    minified_size.saturating_sub(minified.delta),
                    gzipped_size.saturating_sub(gzip.delta),
                ),
                format!(
                    "{}<br />{}{alert}",
                    format_delta(minified, opts),
                    format_delta(gzip, opts)
                ),
            )
        }
    };

    format!(
        "| {} | {} | {} | {} |\n",
        title(entry),
        before,
        sizes(minified_size, gzipped_size),
        difference
    )
}

fn footer(opts: &ReportOptions) -> String {
    if opts.commit_sha.is_empty() {
        return "<sub>🤖 This report was generated without a baseline</sub>\n".to_string();
    }

    let target = match &opts.repository {
        Some(repository) => format!(
            "<a href='{}/commit/{sha}'>{sha}</a>",
            repository.trim_end_matches('/'),
            sha = opts.commit_sha
        ),
        None => format!("<code>{}</code>", opts.commit_sha),
    };
    format!("<sub>🤖 This report was generated against {target}</sub>\n")
}

/// Renders the pull-request comment markdown for a compared report.
pub fn render_markdown(report: &ComparedReport, opts: &ReportOptions) -> String {
    let entries = get_changed_entries_in_report(report.clone());

    let mut s = String::new();
    s.push_str("## 📊 Bundle size report\n\n");

    if entries.changed_entries.is_empty() {
        s.push_str("✅ No changes found\n\n");
    } else {
        s.push_str("| Package & Exports | Baseline (minified/GZIP) | PR | Change |\n");
        s.push_str("| :---------------- | -----------------------: | ----: | ---------: |\n");
        for entry in &entries.changed_entries {
            s.push_str(&changed_row(entry, opts));
        }
        s.push('\n');
    }

    if opts.show_unchanged && !entries.unchanged_entries.is_empty() {
        s.push_str("<details>\n");
        s.push_str("<summary>Unchanged fixtures</summary>\n\n");
        s.push_str("| Package & Exports | Size (minified/GZIP) |\n");
        s.push_str("| ----------------- | -------------------: |\n");
        for entry in &entries.unchanged_entries {
            s.push_str(&format!(
                "| {} | {} |\n",
                title(entry),
                sizes(signed_size(entry.minified_size), signed_size(entry.gzipped_size))
            ));
        }
        s.push_str("\n</details>\n\n");
    }

    s.push_str(&footer(opts));
    s
}
