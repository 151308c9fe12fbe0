//! Cloud Manager log-download client.
//!
//! The endpoint answers an authenticated GET with a JSON body holding a
//! short-lived `redirect` URL; the redirect serves the gzip archive itself.
//! Payloads whose content length matches an earlier download are treated as
//! duplicate polls and never touch the disk.

use crate::error::TailError;
use crate::pipeline::ARCHIVE_FILE_NAME;
use chrono::Utc;
use futures::StreamExt;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    #[serde(default)]
    redirect: String,
}

/// Everything needed to address one log of one service in one environment.
pub struct LogClientConfig {
    pub base_url: String,
    pub org_id: String,
    pub client_id: String,
    pub access_token: String,
    pub service: String,
    pub log_name: String,
    pub environment_id: String,
    pub program_id: String,
    /// Directory the archive is written into.
    pub work_dir: PathBuf,
}

/// Per-pipeline fetcher. The seen-size set lives here rather than in
/// process-wide state so several pipelines can coexist in one process.
pub struct LogClient {
    client: reqwest::Client,
    config: LogClientConfig,
    archive_path: PathBuf,
    // Content lengths of payloads already written. Byte length is a weak
    // fingerprint: a same-length-but-different-content update is treated
    // as a duplicate. Accepted approximation, inherited behavior.
    seen_sizes: HashSet<u64>,
}

impl LogClient {
    pub fn new(config: LogClientConfig) -> Self {
        let archive_path = config.work_dir.join(ARCHIVE_FILE_NAME);
        Self {
            client: reqwest::Client::new(),
            config,
            archive_path,
            seen_sizes: HashSet::new(),
        }
    }

    pub fn archive_path(&self) -> &Path {
        &self.archive_path
    }

    /// Fetch the current archive. Returns the archive path whether the
    /// payload was freshly written or a duplicate of an earlier poll.
    pub async fn download_log(&mut self) -> Result<PathBuf, TailError> {
        let redirect = self.resolve_redirect().await?;

        let response = self.client.get(&redirect).send().await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(TailError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let content_length = response.content_length().unwrap_or(0);
        if self.seen_sizes.insert(content_length) {
            self.write_archive(response).await?;
            tracing::debug!(bytes = content_length, "archive downloaded");
        } else {
            tracing::trace!(bytes = content_length, "duplicate payload, skipping write");
        }

        Ok(self.archive_path.clone())
    }

    async fn resolve_redirect(&self) -> Result<String, TailError> {
        let url = format!(
            "{}/api/program/{}/environment/{}/logs/download",
            self.config.base_url, self.config.program_id, self.config.environment_id
        );
        let date = Utc::now().format("%Y-%m-%d").to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("service", self.config.service.as_str()),
                ("name", self.config.log_name.as_str()),
                ("date", date.as_str()),
            ])
            .header("x-gw-ims-org-id", &self.config.org_id)
            .header("Authorization", format!("Bearer {}", self.config.access_token))
            .header("x-api-key", &self.config.client_id)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(TailError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: DownloadResponse = response.json().await?;
        if body.redirect.is_empty() {
            return Err(TailError::MissingRedirect);
        }
        Ok(body.redirect)
    }

    async fn write_archive(&self, response: reqwest::Response) -> Result<(), TailError> {
        let mut file = File::create(&self.archive_path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        Ok(())
    }
}
