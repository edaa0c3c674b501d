use crate::upload::UploadEvent;
use derivative::Derivative;
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActionProgress {
    #[default]
    NotStarted,
    Uploading {
        percent: u8,
    },
    Completed {
        saved_to: PathBuf,
    },
    Failed {
        message: String,
    },
}

#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct UploadState {
    pub progress: ActionProgress,
    pub upload_id: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub poll_warning: Option<String>,
    #[derivative(Debug = "ignore")]
    pub event_receiver: Option<Receiver<UploadEvent>>,
    #[derivative(Debug = "ignore")]
    pub cancel: Option<CancellationToken>,
}

impl UploadState {
    pub fn clear(&mut self) {
        self.cancel_active();
        *self = UploadState::default();
    }

    /// Abandons the running upload, if any. Events it may still emit are
    /// dropped along with the receiver.
    pub fn cancel_active(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
        self.event_receiver = None;
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self.progress, ActionProgress::Uploading { .. })
    }

    pub fn apply_event(&mut self, event: UploadEvent) {
        match event {
            UploadEvent::Started {
                upload_id,
                file_name,
            } => {
                self.upload_id = Some(upload_id);
                self.file_name = Some(file_name);
                self.progress = ActionProgress::Uploading { percent: 0 };
                self.poll_warning = None;
            }
            UploadEvent::Progress(percent) => {
                if let ActionProgress::Uploading { percent: current } = &mut self.progress {
                    *current = percent;
                }
                self.poll_warning = None;
            }
            UploadEvent::PollFailed(message) | UploadEvent::PollAbandoned(message) => {
                if self.is_uploading() {
                    self.poll_warning = Some(format!("Progress unavailable: {}", message));
                }
            }
            UploadEvent::Saved(path) => {
                self.progress = ActionProgress::Completed { saved_to: path };
                self.poll_warning = None;
                self.finish();
            }
            UploadEvent::Failed(message) => {
                self.progress = ActionProgress::Failed { message };
                self.poll_warning = None;
                self.finish();
            }
        }
    }

    fn finish(&mut self) {
        self.cancel = None;
    }

    pub fn get_progress_fraction(&self) -> f32 {
        match &self.progress {
            ActionProgress::NotStarted => 0.0,
            ActionProgress::Uploading { percent } => f32::from(*percent) / 100.0,
            ActionProgress::Completed { .. } => 1.0,
            ActionProgress::Failed { .. } => 0.0,
        }
    }

    pub fn get_status_text(&self) -> String {
        match &self.progress {
            ActionProgress::NotStarted => String::new(),
            ActionProgress::Uploading { percent: 0 } => "Uploading...".to_string(),
            ActionProgress::Uploading { percent } => format!("{}% complete...", percent),
            ActionProgress::Completed { .. } => "Download ready!".to_string(),
            ActionProgress::Failed { message } => message.clone(),
        }
    }
}
