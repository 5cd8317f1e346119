use std::path::{Path, PathBuf};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::{RemoteReport, StorageAdapter, StorageError};
use crate::types::Report;

const META_FILE: &str = "meta.json";

// `%` followed by non-hex letters never appears in an escaped branch key.
const STAGING_SUFFIX: &str = "%staging";
const PREVIOUS_SUFFIX: &str = "%previous";

#[derive(Debug, Serialize, Deserialize)]
struct BranchMeta {
    #[serde(rename = "commitSHA")]
    commit_sha: String,
    chunks: usize,
}

/// Directory-backed table storage.
///
/// Each branch gets its own directory with a `meta.json` and the report
/// split into `chunk-NNNN.json` files of at most `chunk_size` entries.
/// Uploads are staged in a sibling directory and swapped in with renames,
/// so a failed upload leaves the previous report readable.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    chunk_size: usize,
}

impl FileStorage {
    pub fn new(dir: PathBuf, chunk_size: usize) -> Self {
        Self {
            dir,
            chunk_size: chunk_size.max(1),
        }
    }

    fn branch_dir(&self, branch: &str) -> PathBuf {
        self.branch_sibling(branch, "")
    }

    fn branch_sibling(&self, branch: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{suffix}", branch_key(branch)))
    }
}

/// Maps a branch name to a single file-safe path component.
fn branch_key(branch: &str) -> String {
    let mut key = String::with_capacity(branch.len());
    for b in branch.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.') {
            key.push(b as char);
        } else {
            key.push_str(&format!("%{b:02X}"));
        }
    }
    key
}

fn chunk_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("chunk-{index:04}.json"))
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), StorageError> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn write_branch(
    dir: &Path,
    commit_sha: &str,
    report: &Report,
    chunk_size: usize,
) -> Result<usize, StorageError> {
    std::fs::create_dir(dir)?;

    let mut chunks = 0;
    for (index, chunk) in report.chunks(chunk_size).enumerate() {
        std::fs::write(chunk_path(dir, index), serde_json::to_vec(chunk)?)?;
        chunks += 1;
    }

    let meta = BranchMeta {
        commit_sha: commit_sha.to_string(),
        chunks,
    };
    std::fs::write(dir.join(META_FILE), serde_json::to_vec_pretty(&meta)?)?;
    Ok(chunks)
}

impl StorageAdapter for FileStorage {
    fn get_remote_report(&self, branch: &str) -> Result<RemoteReport, StorageError> {
        // An upload interrupted between its two renames leaves only the previous report.
        let dir = [
            self.branch_dir(branch),
            self.branch_sibling(branch, PREVIOUS_SUFFIX),
        ]
        .into_iter()
        .find(|dir| dir.join(META_FILE).is_file())
        .ok_or_else(|| StorageError::NotFound {
            branch: branch.to_string(),
        })?;

        let meta: BranchMeta = serde_json::from_slice(&std::fs::read(dir.join(META_FILE))?)?;

        let mut report = Report::new();
        for index in 0..meta.chunks {
            let chunk: Report = serde_json::from_slice(&std::fs::read(chunk_path(&dir, index))?)?;
            report.extend(chunk);
        }

        debug!(
            "read {} entries for branch {branch} from {}",
            report.len(),
            dir.display()
        );

        Ok(RemoteReport {
            commit_sha: meta.commit_sha,
            report,
        })
    }

    fn upload_report_to_remote(
        &self,
        branch: &str,
        commit_sha: &str,
        report: &Report,
    ) -> Result<(), StorageError> {
        let dir = self.branch_dir(branch);
        let staging = self.branch_sibling(branch, STAGING_SUFFIX);
        let previous = self.branch_sibling(branch, PREVIOUS_SUFFIX);

        std::fs::create_dir_all(&self.dir)?;
        remove_dir_if_exists(&staging)?;
        let chunks = write_branch(&staging, commit_sha, report, self.chunk_size)?;

        if dir.exists() {
            remove_dir_if_exists(&previous)?;
            std::fs::rename(&dir, &previous)?;
        }
        std::fs::rename(&staging, &dir)?;
        if let Err(e) = remove_dir_if_exists(&previous) {
            warn!("failed to remove {}: {e}", previous.display());
        }

        debug!(
            "wrote {} entries in {chunks} chunk(s) for branch {branch} to {}",
            report.len(),
            dir.display()
        );
        Ok(())
    }
}
