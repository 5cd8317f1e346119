use std::cmp::Ordering;

use crate::{
    diff::calculate_diff,
    types::{ComparedReport, ComparedReportEntry, DiffForEntry, Report, ThresholdValue},
};

/// Annotates every local entry with its diff against the matching remote
/// entry, keyed by `(package_name, path)`.
///
/// Local entries without a remote counterpart get [`DiffForEntry::NoBaseline`].
/// Remote-only entries (removed fixtures) do not appear in the output.
pub fn compare_results_in_reports(
    local_report: &Report,
    remote_report: &Report,
    threshold: &ThresholdValue,
) -> ComparedReport {
    local_report
        .iter()
        .map(|local| {
            let remote = remote_report
                .iter()
                .find(|r| r.package_name == local.package_name && r.path == local.path);

            let diff = match remote {
                Some(remote) => calculate_diff(local, remote, threshold),
                None => DiffForEntry::NoBaseline,
            };

            ComparedReportEntry::new(local, diff)
        })
        .collect()
}

pub fn has_threshold_violations(report: &ComparedReport) -> bool {
    report.iter().any(|e| e.diff.exceeds_threshold())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntriesInReport {
    pub changed_entries: ComparedReport,
    pub unchanged_entries: ComparedReport,
}

fn is_unchanged(diff: &DiffForEntry) -> bool {
    match diff {
        DiffForEntry::NoBaseline => false,
        DiffForEntry::Measured { minified, gzip, .. } => minified.delta == 0 && gzip.delta == 0,
    }
}

/// Splits a compared report into changed and unchanged entries, each sorted
/// by package name then path.
pub fn get_changed_entries_in_report(report: ComparedReport) -> EntriesInReport {
    let (unchanged_entries, changed_entries): (ComparedReport, ComparedReport) =
        report.into_iter().partition(|e| is_unchanged(&e.diff));

    EntriesInReport {
        changed_entries: sort_compared_report(changed_entries),
        unchanged_entries: sort_compared_report(unchanged_entries),
    }
}

fn compare_entries(a: &ComparedReportEntry, b: &ComparedReportEntry) -> Ordering {
    a.package_name
        .cmp(&b.package_name)
        .then_with(|| a.path.cmp(&b.path))
}

pub fn sort_compared_report(mut report: ComparedReport) -> ComparedReport {
    report.sort_by(compare_entries);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ReportEntry, ThresholdKind};

    fn entry(package_name: &str, path: &str, minified_size: u64, gzipped_size: u64) -> ReportEntry {
        ReportEntry {
            package_name: package_name.to_string(),
            name: path.trim_end_matches(".js").to_uppercase(),
            path: path.to_string(),
            minified_size,
            gzipped_size,
        }
    }

    fn threshold() -> ThresholdValue {
        ThresholdValue {
            size: 10.0,
            kind: ThresholdKind::Percent,
        }
    }

    #[test]
    fn missing_remote_entry_has_no_baseline() {
        let local = vec![entry("a", "x.js", 10, 5)];
        let compared = compare_results_in_reports(&local, &Report::new(), &threshold());

        assert_eq!(compared.len(), 1);
        assert!(compared[0].diff.is_empty());
        assert_eq!(compared[0].name, "X");
    }

    #[test]
    fn matching_requires_package_and_path() {
        let local = vec![entry("a", "x.js", 10, 5)];
        let remote = vec![entry("b", "x.js", 10, 5), entry("a", "y.js", 10, 5)];

        let compared = compare_results_in_reports(&local, &remote, &threshold());
        assert!(compared[0].diff.is_empty());
    }

    #[test]
    fn first_remote_match_wins() {
        let local = vec![entry("a", "x.js", 10, 5)];
        let remote = vec![entry("a", "x.js", 10, 5), entry("a", "x.js", 1, 1)];

        let compared = compare_results_in_reports(&local, &remote, &threshold());
        assert_eq!(compared[0].diff.minified().unwrap().delta, 0);
    }

    #[test]
    fn output_preserves_local_order() {
        let local = vec![entry("b", "x.js", 1, 1), entry("a", "x.js", 1, 1)];
        let compared = compare_results_in_reports(&local, &local, &threshold());

        assert_eq!(compared[0].package_name, "b");
        assert_eq!(compared[1].package_name, "a");
    }

    // Current behavior, not necessarily desired: deleted fixtures produce no signal.
    #[test]
    fn remote_only_entries_are_dropped() {
        let local = vec![entry("a", "x.js", 10, 5)];
        let remote = vec![entry("a", "x.js", 10, 5), entry("a", "removed.js", 99, 9)];

        let compared = compare_results_in_reports(&local, &remote, &threshold());
        assert_eq!(compared.len(), 1);
        assert_eq!(compared[0].path, "x.js");
    }

    #[test]
    fn violations_are_detected() {
        let local = vec![entry("a", "x.js", 200, 5), entry("a", "y.js", 10, 5)];
        let remote = vec![entry("a", "x.js", 100, 5), entry("a", "y.js", 10, 5)];

        let compared = compare_results_in_reports(&local, &remote, &threshold());
        assert!(has_threshold_violations(&compared));
        assert!(!has_threshold_violations(&compared[1..].to_vec()));
    }

    #[test]
    fn partitions_and_sorts_entries() {
        let local = vec![
            entry("b", "z.js", 10, 5),
            entry("a", "y.js", 11, 5),
            entry("a", "new.js", 1, 1),
            entry("a", "x.js", 10, 5),
        ];
        let remote = vec![
            entry("b", "z.js", 10, 5),
            entry("a", "y.js", 10, 5),
            entry("a", "x.js", 10, 5),
        ];

        let split = get_changed_entries_in_report(compare_results_in_reports(
            &local,
            &remote,
            &threshold(),
        ));

        let changed: Vec<_> = split.changed_entries.iter().map(|e| e.path.as_str()).collect();
        let unchanged: Vec<_> = split
            .unchanged_entries
            .iter()
            .map(|e| (e.package_name.as_str(), e.path.as_str()))
            .collect();

        assert_eq!(changed, vec!["new.js", "y.js"]);
        assert_eq!(unchanged, vec![("a", "x.js"), ("b", "z.js")]);
    }

    #[test]
    fn gzip_only_change_is_changed() {
        let local = vec![entry("a", "x.js", 10, 6)];
        let remote = vec![entry("a", "x.js", 10, 5)];

        let split =
            get_changed_entries_in_report(compare_results_in_reports(&local, &remote, &threshold()));
        assert_eq!(split.changed_entries.len(), 1);
        assert!(split.unchanged_entries.is_empty());
    }
}
