use serde::{Deserialize, Serialize};

/// One measured fixture, owned by a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub package_name: String,
    pub name: String,
    pub path: String,
    pub minified_size: u64,
    pub gzipped_size: u64,
}

pub type Report = Vec<ReportEntry>;

/// A row of a per-package `monosize.json`, before the package name is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResult {
    pub name: String,
    pub path: String,
    pub minified_size: u64,
    pub gzipped_size: u64,
}

impl BuildResult {
    pub fn into_entry(self, package_name: &str) -> ReportEntry {
        ReportEntry {
            package_name: package_name.to_string(),
            name: self.name,
            path: self.path,
            minified_size: self.minified_size,
            gzipped_size: self.gzipped_size,
        }
    }
}

/// Sizes a diff is computed over.
pub trait SizedEntry {
    fn minified_size(&self) -> u64;
    fn gzipped_size(&self) -> u64;
}

impl SizedEntry for ReportEntry {
    fn minified_size(&self) -> u64 {
        self.minified_size
    }

    fn gzipped_size(&self) -> u64 {
        self.gzipped_size
    }
}

impl SizedEntry for BuildResult {
    fn minified_size(&self) -> u64 {
        self.minified_size
    }

    fn gzipped_size(&self) -> u64 {
        self.gzipped_size
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdKind {
    Size,
    Percent,
}

/// Maximum allowed regression of the minified size.
///
/// `size` is in bytes for [`ThresholdKind::Size`] and in percentage points
/// (`0 < size <= 100`) for [`ThresholdKind::Percent`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdValue {
    pub size: f64,
    #[serde(rename = "type")]
    pub kind: ThresholdKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffByMetric {
    pub delta: i64,
    pub percent: String,
}

/// Diff annotation for one entry.
///
/// Entries without a baseline carry no numbers at all, so a placeholder can
/// never be read back as a real change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffForEntry {
    NoBaseline,
    #[serde(rename_all = "camelCase")]
    Measured {
        exceeds_threshold: bool,
        minified: DiffByMetric,
        gzip: DiffByMetric,
    },
}

impl DiffForEntry {
    pub fn is_empty(&self) -> bool {
        matches!(self, DiffForEntry::NoBaseline)
    }

    pub fn exceeds_threshold(&self) -> bool {
        match self {
            DiffForEntry::NoBaseline => false,
            DiffForEntry::Measured {
                exceeds_threshold, ..
            } => *exceeds_threshold,
        }
    }

    pub fn minified(&self) -> Option<&DiffByMetric> {
        match self {
            DiffForEntry::NoBaseline => None,
            DiffForEntry::Measured { minified, .. } => Some(minified),
        }
    }

    pub fn gzip(&self) -> Option<&DiffByMetric> {
        match self {
            DiffForEntry::NoBaseline => None,
            DiffForEntry::Measured { gzip, .. } => Some(gzip),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedReportEntry {
    pub package_name: String,
    pub name: String,
    pub path: String,
    pub minified_size: u64,
    pub gzipped_size: u64,
    pub diff: DiffForEntry,
}

impl ComparedReportEntry {
    pub fn new(entry: &ReportEntry, diff: DiffForEntry) -> Self {
        Self {
            package_name: entry.package_name.clone(),
            name: entry.name.clone(),
            path: entry.path.clone(),
            minified_size: entry.minified_size,
            gzipped_size: entry.gzipped_size,
            diff,
        }
    }
}

pub type ComparedReport = Vec<ComparedReportEntry>;

/// Which column of a [`DiffByMetric`] renderers display.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeltaFormat {
    #[default]
    Delta,
    Percent,
}
