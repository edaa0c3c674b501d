use crate::config::Config;
use crate::error::UploadError;
use crate::upload::artifact::{ArtifactSaver, SaveArtifact};
use crate::upload::client::UploadClient;
use crate::upload::poller::{PollOutcome, PollerHandle, ProgressPoller};
use crate::upload::types::{Artifact, SelectedFile, UploadEvent, UploadId};
use std::path::PathBuf;
use std::sync::mpsc::{self as std_mpsc, Receiver, Sender};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Runs uploads one at a time and owns the progress poller of the current one.
pub struct UploadSession<S = ArtifactSaver> {
    client: UploadClient,
    saver: S,
    config: Config,
    poller: Option<PollerHandle>,
}

impl UploadSession<ArtifactSaver> {
    pub fn new(config: Config) -> Result<Self, UploadError> {
        let saver = ArtifactSaver::new(config.download_dir.clone());
        Self::with_saver(config, saver)
    }
}

impl<S: SaveArtifact> UploadSession<S> {
    pub fn with_saver(config: Config, saver: S) -> Result<Self, UploadError> {
        Ok(Self {
            client: UploadClient::new(&config)?,
            saver,
            config,
            poller: None,
        })
    }

    pub fn saver(&self) -> &S {
        &self.saver
    }

    /// Uploads `file`, polls its progress meanwhile and saves the result.
    ///
    /// Any poller left over from a previous upload is cancelled first, and
    /// this upload's poller is stopped once the request settles.
    pub async fn begin_upload(
        &mut self,
        file: SelectedFile,
        events: &Sender<UploadEvent>,
    ) -> Result<PathBuf, UploadError> {
        if let Some(previous) = self.poller.take() {
            previous.cancel();
        }

        let result = self.run_upload(file, events).await;

        match &result {
            Ok(path) => {
                let _ = events.send(UploadEvent::Saved(path.clone()));
            }
            Err(err) => {
                error!("Upload failed: {}", err);
                let _ = events.send(UploadEvent::Failed(err.user_message()));
            }
        }
        result
    }

    async fn run_upload(
        &mut self,
        file: SelectedFile,
        events: &Sender<UploadEvent>,
    ) -> Result<PathBuf, UploadError> {
        if file.is_empty() {
            return Err(UploadError::EmptyFile { name: file.name });
        }

        let upload_id = UploadId::new();
        let _ = events.send(UploadEvent::Started {
            upload_id: upload_id.to_string(),
            file_name: file.name.clone(),
        });

        if self.config.poll_progress {
            let poller = ProgressPoller::new(
                self.client.clone(),
                upload_id.clone(),
                self.config.poll_interval(),
                self.config.max_poll_failures,
            );
            self.poller = Some(poller.spawn(events.clone()));
        }

        let uploaded = self.client.upload(file, &upload_id).await;
        self.settle_poller().await;
        let bytes = uploaded?;

        self.save_artifact(bytes)
    }

    // The poller reports its own abandonment while the upload is running.
    async fn settle_poller(&mut self) {
        let Some(poller) = self.poller.take() else {
            return;
        };
        match poller.stop().await {
            Ok(PollOutcome::Completed) | Ok(PollOutcome::Cancelled) => {}
            Err(err) => warn!("Progress polling had stopped: {}", err),
        }
    }

    pub fn save_artifact(&self, bytes: Vec<u8>) -> Result<PathBuf, UploadError> {
        let artifact = Artifact {
            file_name: self.config.artifact_name.clone(),
            bytes,
        };
        self.saver.save(&artifact)
    }
}

/// Terminal message of an upload abandoned through its cancellation token.
pub const CANCELLED_MESSAGE: &str = "Upload cancelled";

/// Runs one upload on a background thread with its own tokio runtime.
///
/// Events arrive on the returned receiver; the channel closes when the
/// thread exits. Cancelling `cancel` abandons the upload and its poller and
/// ends the stream with `Failed(CANCELLED_MESSAGE)`.
pub fn spawn_upload(
    config: Config,
    file: SelectedFile,
    cancel: CancellationToken,
) -> Receiver<UploadEvent> {
    let (sender, receiver) = std_mpsc::channel();

    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                error!("Failed to start async runtime: {}", e);
                let _ = sender.send(UploadEvent::Failed(format!("Upload failed: {}", e)));
                return;
            }
        };

        rt.block_on(async move {
            let mut session = match UploadSession::new(config) {
                Ok(session) => session,
                Err(err) => {
                    let _ = sender.send(UploadEvent::Failed(err.user_message()));
                    return;
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Upload cancelled");
                    let _ = sender.send(UploadEvent::Failed(CANCELLED_MESSAGE.to_string()));
                }
                _ = session.begin_upload(file, &sender) => {}
            }
        });
    });

    receiver
}
