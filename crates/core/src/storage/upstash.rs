use log::{debug, info};
use reqwest::{blocking::Client, Url};
use serde::{Deserialize, Serialize};

use super::{RemoteReport, StorageAdapter, StorageError};
use crate::types::Report;

pub const WRITE_TOKEN_VAR: &str = "UPSTASH_WRITE_TOKEN";

#[derive(Debug, Serialize, Deserialize)]
struct StoredReport {
    #[serde(rename = "commitSHA")]
    commit_sha: String,
    data: Report,
}

#[derive(Debug, Deserialize)]
struct UpstashResponse {
    result: Option<String>,
}

/// Upstash Redis REST storage; one key per branch.
pub struct UpstashStorage {
    client: Client,
    url: String,
    readonly_token: String,
    write_token: Option<String>,
}

impl UpstashStorage {
    pub fn new(url: impl Into<String>, readonly_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
            readonly_token: readonly_token.into(),
            write_token: None,
        }
    }

    pub fn with_write_token(mut self, token: Option<String>) -> Self {
        self.write_token = token;
        self
    }

    fn command_url(&self, command: &str, branch: &str) -> Result<Url, StorageError> {
        let mut url =
            Url::parse(&self.url).map_err(|_| StorageError::InvalidUrl(self.url.clone()))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::InvalidUrl(self.url.clone()))?
            .pop_if_empty()
            .push(command)
            .push(branch);
        Ok(url)
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    Err(StorageError::HttpStatus {
        status: status.as_u16(),
        body: response.text().unwrap_or_default(),
    })
}

impl StorageAdapter for UpstashStorage {
    fn get_remote_report(&self, branch: &str) -> Result<RemoteReport, StorageError> {
        let url = self.command_url("get", branch)?;
        debug!("GET {url}");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.readonly_token)
            .send()?;
        let body: UpstashResponse = check_status(response)?.json()?;

        let raw = body.result.ok_or_else(|| StorageError::NotFound {
            branch: branch.to_string(),
        })?;
        let stored: StoredReport = serde_json::from_str(&raw)?;

        Ok(RemoteReport {
            commit_sha: stored.commit_sha,
            report: stored.data,
        })
    }

    fn upload_report_to_remote(
        &self,
        branch: &str,
        commit_sha: &str,
        report: &Report,
    ) -> Result<(), StorageError> {
        let token = self
            .write_token
            .as_deref()
            .ok_or(StorageError::MissingWriteToken {
                var: WRITE_TOKEN_VAR,
            })?;

        let data = serde_json::to_string(&StoredReport {
            commit_sha: commit_sha.to_string(),
            data: report.clone(),
        })?;

        let url = self.command_url("set", branch)?;
        debug!("POST {url} ({} bytes)", data.len());

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .body(data)
            .send()?;
        check_status(response)?;

        info!("uploaded {} entries for branch {branch}", report.len());
        Ok(())
    }
}
