//! Remote report storage.
//!
//! A storage adapter keeps one report per branch together with the commit it
//! was measured at. Fetch failures caused by the network are retried with
//! exponential backoff; everything else fails on the first attempt.

mod file;
mod upstash;

use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use log::warn;
use thiserror::Error;

use crate::{config::StorageConfig, types::Report};

pub use file::FileStorage;
pub use upstash::{UpstashStorage, WRITE_TOKEN_VAR};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("remote report for branch \"{branch}\" was not found")]
    NotFound { branch: String },

    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage responded with HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("invalid storage URL \"{0}\"")]
    InvalidUrl(String),

    #[error("malformed stored report: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("{var} environment variable is required to upload reports")]
    MissingWriteToken { var: &'static str },
}

impl StorageError {
    /// Whether another attempt may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Http(_) => true,
            StorageError::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            StorageError::NotFound { .. }
            | StorageError::Io(_)
            | StorageError::InvalidUrl(_)
            | StorageError::Malformed(_)
            | StorageError::MissingWriteToken { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteReport {
    pub commit_sha: String,
    pub report: Report,
}

pub trait StorageAdapter {
    fn get_remote_report(&self, branch: &str) -> Result<RemoteReport, StorageError>;

    fn upload_report_to_remote(
        &self,
        branch: &str,
        commit_sha: &str,
        report: &Report,
    ) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_interval: Duration::from_millis(200),
        }
    }
}

/// Runs `op` until it succeeds, fails permanently, or `policy.max_attempts` is spent.
pub fn retry<T>(
    policy: &RetryPolicy,
    what: &str,
    mut op: impl FnMut() -> Result<T, StorageError>,
) -> Result<T, StorageError> {
    let schedule = ExponentialBackoffBuilder::default()
        .with_initial_interval(policy.initial_interval)
        .with_max_elapsed_time(None)
        .build();

    let mut attempt = 0;
    let result = ::backoff::retry(schedule, || {
        attempt += 1;
        op().map_err(|e| {
            if e.is_transient() && attempt < policy.max_attempts {
                warn!(
                    "{what} failed (attempt {attempt}/{}): {e}",
                    policy.max_attempts
                );
                backoff::Error::transient(e)
            } else {
                backoff::Error::permanent(e)
            }
        })
    });

    result.map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}

/// Wraps an adapter so that transient failures are retried.
pub struct Retrying<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: StorageAdapter> Retrying<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

impl<S: StorageAdapter> StorageAdapter for Retrying<S> {
    fn get_remote_report(&self, branch: &str) -> Result<RemoteReport, StorageError> {
        retry(&self.policy, "fetching remote report", || {
            self.inner.get_remote_report(branch)
        })
    }

    fn upload_report_to_remote(
        &self,
        branch: &str,
        commit_sha: &str,
        report: &Report,
    ) -> Result<(), StorageError> {
        retry(&self.policy, "uploading report", || {
            self.inner.upload_report_to_remote(branch, commit_sha, report)
        })
    }
}

/// Builds the adapter described by `config`, with the default retry policy.
pub fn storage_from_config(config: &StorageConfig) -> Box<dyn StorageAdapter> {
    let policy = RetryPolicy::default();
    match config {
        StorageConfig::File { path, chunk_size } => Box::new(Retrying::new(
            FileStorage::new(path.clone(), *chunk_size),
            policy,
        )),
        StorageConfig::Upstash {
            url,
            readonly_token,
        } => Box::new(Retrying::new(
            UpstashStorage::new(url.clone(), readonly_token.clone())
                .with_write_token(std::env::var(WRITE_TOKEN_VAR).ok()),
            policy,
        )),
    }
}
