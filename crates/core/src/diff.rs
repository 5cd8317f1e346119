use crate::{
    types::{DiffByMetric, DiffForEntry, SizedEntry, ThresholdKind, ThresholdValue},
    units::{format_percent, signed_size},
};

struct MetricDiff {
    delta: i64,
    fraction: f64,
}

impl MetricDiff {
    fn new(local: u64, remote: u64) -> Self {
        let delta = signed_size(local).saturating_sub(signed_size(remote));
        let fraction = if remote == 0 {
            0.0
        } else {
            delta as f64 / remote as f64
        };
        Self { delta, fraction }
    }

    fn to_metric(&self) -> DiffByMetric {
        DiffByMetric {
            delta: self.delta,
            percent: format_percent(self.fraction),
        }
    }
}

/// Computes per-metric deltas of `local` against `remote`.
///
/// Only the minified size is checked against `threshold`; a shrinking
/// entry never exceeds it.
pub fn calculate_diff(
    local: &impl SizedEntry,
    remote: &impl SizedEntry,
    threshold: &ThresholdValue,
) -> DiffForEntry {
    let minified = MetricDiff::new(local.minified_size(), remote.minified_size());
    let gzip = MetricDiff::new(local.gzipped_size(), remote.gzipped_size());

    let exceeds_threshold = match threshold.kind {
        ThresholdKind::Size => minified.delta > 0 && minified.delta as f64 >= threshold.size,
        ThresholdKind::Percent => {
            minified.fraction > 0.0 && minified.fraction >= threshold.size / 100.0
        }
    };

    DiffForEntry::Measured {
        exceeds_threshold,
        minified: minified.to_metric(),
        gzip: gzip.to_metric(),
    }
}
