// SPDX-License-Identifier: PMPL-1.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Canvas LMS course export
//!
//! Requests a Common Cartridge export, polls until Canvas has built it,
//! then streams the package to disk.

pub mod archive;

use crate::config::CanvasConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub use archive::{extract_archive, is_archive};

/// Export state values reported by Canvas
const STATE_EXPORTED: &str = "exported";
const STATE_FAILED: &str = "failed";

#[derive(Debug, Deserialize)]
struct ExportCreated {
    id: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExportStatus {
    workflow_state: String,
    attachment: Option<Attachment>,
}

#[derive(Debug, Deserialize)]
struct Attachment {
    url: Option<String>,
}

/// Client for the Canvas content export API
pub struct CanvasExporter {
    client: Client,
    config: CanvasConfig,
}

impl CanvasExporter {
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("remediationbot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::Http)?;

        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    fn api_url(&self, endpoint: &str) -> String {
        let base = self.config.url.trim_end_matches('/');
        format!("{}/api/v1/{}", base, endpoint.trim_start_matches('/'))
    }

    /// Export the configured course into `output_dir`.
    ///
    /// Returns the path of the downloaded `.imscc` package.
    pub async fn export_course(&self, output_dir: &Path) -> Result<PathBuf> {
        if !self.config.is_complete() {
            return Err(Error::Config(
                "Canvas url, token and course_id are required for export".to_string(),
            ));
        }

        let course_id = &self.config.course_id;
        info!(course_id = %course_id, "Starting course export");

        let created: ExportCreated = self
            .client
            .post(self.api_url(&format!("courses/{}/content_exports", course_id)))
            .bearer_auth(&self.config.token)
            .form(&[("export_type", "common_cartridge")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        info!(export_id = created.id, "Export started");

        let download_url = self.wait_for_export(created.id).await?;

        tokio::fs::create_dir_all(output_dir).await?;
        let output_file = output_dir.join(format!("course_{}_export.imscc", course_id));
        self.download(&download_url, &output_file).await?;

        info!(path = %output_file.display(), "Export saved");
        Ok(output_file)
    }

    /// Poll the export until it is downloadable
    async fn wait_for_export(&self, export_id: u64) -> Result<String> {
        let status_url = self.api_url(&format!(
            "courses/{}/content_exports/{}",
            self.config.course_id, export_id
        ));

        for attempt in 1..=self.config.max_attempts {
            let status: ExportStatus = self
                .client
                .get(&status_url)
                .bearer_auth(&self.config.token)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;

            debug!(attempt, state = %status.workflow_state, "Export state");

            match status.workflow_state.as_str() {
                STATE_EXPORTED => {
                    if let Some(url) = status.attachment.and_then(|a| a.url) {
                        return Ok(url);
                    }
                }
                STATE_FAILED => {
                    return Err(Error::ExportFailed(format!(
                        "Canvas reported export {} as failed",
                        export_id
                    )));
                }
                _ => {}
            }

            if attempt < self.config.max_attempts {
                tokio::time::sleep(self.config.poll_interval()).await;
            }
        }

        Err(Error::ExportTimedOut(self.config.max_attempts))
    }

    /// Stream `url` into `path`
    async fn download(&self, url: &str, path: &Path) -> Result<()> {
        info!("Downloading export");
        let mut response = self
            .client
            .get(url)
            .bearer_auth(&self.config.token)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(path).await?;
        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len();
        }
        file.flush().await?;

        debug!(path = %path.display(), bytes = written, "Download complete");
        Ok(())
    }
}
