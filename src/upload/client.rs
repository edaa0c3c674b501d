use crate::config::Config;
use crate::error::{PollError, UploadError};
use crate::upload::types::{ProgressResponse, SelectedFile, UploadId};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, info};

/// HTTP side of the migration service: `POST /upload` and
/// `GET /progress/<id>`.
#[derive(Clone)]
pub struct UploadClient {
    http: reqwest::Client,
    base_url: String,
    request_timeout: Duration,
}

impl UploadClient {
    pub fn new(config: &Config) -> Result<Self, UploadError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: config.base_url().to_string(),
            request_timeout: config.request_timeout(),
        })
    }

    pub fn upload_url(&self) -> String {
        format!("{}/upload", self.base_url)
    }

    pub fn progress_url(&self, upload_id: &UploadId) -> String {
        format!("{}/progress/{}", self.base_url, upload_id)
    }

    /// Sends the workbook and returns the processed artifact bytes.
    ///
    /// Exactly one request is issued; there is no retry.
    pub async fn upload(
        &self,
        file: SelectedFile,
        upload_id: &UploadId,
    ) -> Result<Vec<u8>, UploadError> {
        let url = self.upload_url();
        info!(
            "Uploading '{}' ({} bytes) to {} as {}",
            file.name,
            file.len(),
            url,
            upload_id
        );

        let part = Part::bytes(file.bytes).file_name(file.name);
        let form = Form::new()
            .part("file", part)
            .text("upload_id", upload_id.to_string());

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .timeout(self.request_timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(server_error(status, body));
        }

        let bytes = response.bytes().await?;
        info!("Upload {} finished with {} ({} bytes)", upload_id, status, bytes.len());
        Ok(bytes.to_vec())
    }

    /// Fetches the reported percentage for `upload_id`.
    pub async fn fetch_progress(&self, upload_id: &UploadId) -> Result<i64, PollError> {
        let url = self.progress_url(upload_id);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(PollError::Request)?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(PollError::Request)?;
        let progress = decode_progress(&body)?;
        debug!("Progress for {}: {}", upload_id, progress);
        Ok(progress)
    }
}

fn decode_progress(body: &[u8]) -> Result<i64, PollError> {
    serde_json::from_slice::<ProgressResponse>(body)
        .map(|parsed| parsed.progress)
        .map_err(|e| PollError::Decode(e.to_string()))
}

fn server_error(status: StatusCode, body: String) -> UploadError {
    let message = if body.is_empty() {
        status
            .canonical_reason()
            .map(|reason| format!("HTTP {} {}", status.as_u16(), reason))
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
    } else {
        body
    };
    UploadError::Server {
        status: status.as_u16(),
        message,
    }
}
