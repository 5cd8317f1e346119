use std::path::{Path, PathBuf};

use anyhow::Context;
use log::debug;
use walkdir::{DirEntry, WalkDir};

use crate::types::{BuildResult, Report};

pub const REPORT_FILE_NAME: &str = "monosize.json";

const PACKAGE_MANIFEST: &str = "package.json";

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map(|name| name == "node_modules" || name.starts_with('.'))
            .unwrap_or(false)
}

/// Finds every per-package report file under `root`, sorted by path.
pub fn find_report_files(root: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
    {
        let entry = entry.with_context(|| format!("walk {}", root.display()))?;
        if entry.file_type().is_file() && entry.file_name() == REPORT_FILE_NAME {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

/// Name of the nearest ancestor directory holding a `package.json`.
pub fn find_package_name(report_file: &Path) -> Option<String> {
    report_file
        .ancestors()
        .skip(1)
        .find(|dir| dir.join(PACKAGE_MANIFEST).is_file())
        .and_then(|dir| dir.file_name())
        .map(|name| name.to_string_lossy().into_owned())
}

pub fn read_package_report(report_file: &Path) -> anyhow::Result<Report> {
    let package_name = find_package_name(report_file).with_context(|| {
        format!(
            "failed to find a package root (directory that contains \"{PACKAGE_MANIFEST}\") for {}",
            report_file.display()
        )
    })?;

    let bytes =
        std::fs::read(report_file).with_context(|| format!("read {}", report_file.display()))?;
    let rows: Vec<BuildResult> = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to read JSON from {}", report_file.display()))?;

    debug!(
        "{} fixture(s) of package {package_name} from {}",
        rows.len(),
        report_file.display()
    );

    Ok(rows
        .into_iter()
        .map(|row| row.into_entry(&package_name))
        .collect())
}

/// Collects all per-package reports under `root` into a single report.
pub fn collect_local_report(root: &Path) -> anyhow::Result<Report> {
    let mut report = Report::new();

    for file in find_report_files(root)? {
        report.extend(read_package_report(&file)?);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_package(root: &Path, package: &str, json: &str) {
        let dir = root.join("packages").join(package);
        std::fs::create_dir_all(dir.join("dist/bundle-size")).unwrap();
        std::fs::write(dir.join(PACKAGE_MANIFEST), "{}").unwrap();
        std::fs::write(dir.join("dist/bundle-size").join(REPORT_FILE_NAME), json).unwrap();
    }

    #[test]
    fn collects_reports_with_package_names() {
        let tmp = tempfile::tempdir().unwrap();
        write_package(
            tmp.path(),
            "react-button",
            r#"[{"name":"Button","path":"button.fixture.js","minifiedSize":10,"gzippedSize":5}]"#,
        );
        write_package(
            tmp.path(),
            "react-avatar",
            r#"[{"name":"Avatar","path":"avatar.fixture.js","minifiedSize":20,"gzippedSize":7}]"#,
        );

        let report = collect_local_report(tmp.path()).unwrap();

        assert_eq!(report.len(), 2);
        assert_eq!(report[0].package_name, "react-avatar");
        assert_eq!(report[1].package_name, "react-button");
        assert_eq!(report[1].minified_size, 10);
    }

    #[test]
    fn skips_node_modules() {
        let tmp = tempfile::tempdir().unwrap();
        write_package(&tmp.path().join("node_modules"), "dep", "[]");

        let files = find_report_files(tmp.path()).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_package_root_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join(REPORT_FILE_NAME), "[]").unwrap();

        let err = collect_local_report(tmp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to find a package root"));
    }

    #[test]
    fn malformed_entries_are_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        write_package(tmp.path(), "broken", r#"[{"name":"X","path":"x.js"}]"#);

        let err = collect_local_report(tmp.path()).unwrap_err();
        assert!(format!("{err:#}").contains("failed to read JSON"));
    }
}
