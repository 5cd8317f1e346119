pub mod compare;
pub mod config;
pub mod diff;
pub mod local_report;
pub mod reporter;
pub mod storage;
pub mod threshold;
pub mod types;
pub mod units;

use anyhow::Context;
use log::info;

use crate::{
    compare::compare_results_in_reports,
    storage::{RemoteReport, StorageAdapter, StorageError},
    types::{ComparedReport, Report, ThresholdValue},
};

pub use compare::{get_changed_entries_in_report, has_threshold_violations, EntriesInReport};
pub use diff::calculate_diff;
pub use threshold::{parse_threshold, ThresholdError};
pub use units::{format_bytes, format_percent};

#[derive(Debug, Clone)]
pub struct Comparison {
    /// Commit of the baseline; empty when the branch had no stored report.
    pub commit_sha: String,
    pub report: ComparedReport,
}

impl Comparison {
    pub fn has_threshold_violations(&self) -> bool {
        has_threshold_violations(&self.report)
    }
}

/// Fetches the baseline for `branch`, treating a missing one as empty.
pub fn fetch_baseline(storage: &dyn StorageAdapter, branch: &str) -> anyhow::Result<RemoteReport> {
    match storage.get_remote_report(branch) {
        Ok(remote) => {
            info!(
                "remote report for \"{}\" commit fetched ({} entries)",
                remote.commit_sha,
                remote.report.len()
            );
            Ok(remote)
        }
        Err(StorageError::NotFound { .. }) => {
            info!("remote report for \"{branch}\" branch was not found");
            Ok(RemoteReport {
                commit_sha: String::new(),
                report: Report::new(),
            })
        }
        Err(e) => {
            Err(e).with_context(|| format!("failed to fetch remote report for branch {branch}"))
        }
    }
}

/// Compares `local` against the stored baseline of `branch`.
pub fn compare_with_remote(
    local: &Report,
    storage: &dyn StorageAdapter,
    branch: &str,
    threshold: &ThresholdValue,
) -> anyhow::Result<Comparison> {
    let remote = fetch_baseline(storage, branch)?;

    Ok(Comparison {
        commit_sha: remote.commit_sha,
        report: compare_results_in_reports(local, &remote.report, threshold),
    })
}
