use crate::config::Config;
use crate::upload::{spawn_upload, SelectedFile, UploadEvent};
use crate::utils::format_size;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Uploads `path` without a window and returns where the result was saved.
pub fn run(config: Config, path: &Path) -> Result<PathBuf> {
    let file = SelectedFile::from_path(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    info!("Selected {} ({})", file.name, format_size(file.len() as u64));

    let receiver = spawn_upload(config, file, CancellationToken::new());

    let mut saved = None;
    for event in receiver {
        match event {
            UploadEvent::Started { upload_id, .. } => info!("Upload started ({})", upload_id),
            UploadEvent::Progress(percent) => info!("{}% complete...", percent),
            UploadEvent::PollFailed(message) => warn!("Progress request failed: {}", message),
            UploadEvent::PollAbandoned(message) => warn!("Progress unavailable: {}", message),
            UploadEvent::Saved(path) => saved = Some(path),
            UploadEvent::Failed(message) => bail!(message),
        }
    }

    saved.context("upload ended without a result")
}
