mod state;
mod ui;

use crate::config::Config;
use crate::upload::{spawn_upload, SelectedFile};
use eframe::{egui, App};
use std::path::{Path, PathBuf};
use std::sync::mpsc::TryRecvError;
pub use state::{ActionProgress, UploadState};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub struct MigratorApp {
    config: Config,
    selected_path: Option<PathBuf>,
    state: UploadState,
}

impl MigratorApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: Config) -> Self {
        info!("Initializing Workbook Migrator ({})", config.base_url());
        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            selected_path: None,
            state: UploadState::default(),
        }
    }

    pub fn reset_upload_state(&mut self) {
        info!("Resetting application state");
        self.selected_path = None;
        self.state.clear();
    }

    /// Opens the native file picker. Closing it without a choice is a no-op.
    pub fn select_file(&mut self) {
        let picked = rfd::FileDialog::new()
            .set_title("Select workbook")
            .add_filter("Excel workbook", &["xlsx", "xlsm", "xls"])
            .add_filter("All files", &["*"])
            .pick_file();

        if let Some(path) = picked {
            info!("File selected: {}", path.display());
            self.start_upload(&path);
        }
    }

    /// Reads `path` and starts uploading it, replacing any upload in flight.
    pub fn start_upload(&mut self, path: &Path) {
        self.state.clear();
        self.selected_path = Some(path.to_path_buf());

        let file = match SelectedFile::from_path(path) {
            Ok(file) => file,
            Err(e) => {
                let message = format!("Could not read {}: {}", path.display(), e);
                error!("{}", message);
                self.state.progress = ActionProgress::Failed { message };
                return;
            }
        };

        self.state.file_name = Some(file.name.clone());
        self.state.file_size = Some(file.len() as u64);
        self.state.progress = ActionProgress::Uploading { percent: 0 };

        let cancel = CancellationToken::new();
        let receiver = spawn_upload(self.config.clone(), file, cancel.clone());
        self.state.cancel = Some(cancel);
        self.state.event_receiver = Some(receiver);
    }

    /// Drains pending upload events into the UI state.
    pub fn update_state(&mut self, ctx: &egui::Context) {
        let Some(receiver) = &self.state.event_receiver else {
            return;
        };
        ctx.request_repaint();

        let mut events = Vec::new();
        let mut disconnected = false;
        loop {
            match receiver.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        for event in events {
            self.state.apply_event(event);
        }

        if disconnected {
            self.state.event_receiver = None;
        }
    }
}

impl App for MigratorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
