mod artifact;
mod client;
mod poller;
mod progress;
mod session;
mod types;

pub use artifact::{ArtifactSaver, SaveArtifact};
pub use client::UploadClient;
pub use poller::{PollOutcome, PollerHandle, ProgressPoller};
pub use progress::ProgressState;
pub use session::{spawn_upload, UploadSession, CANCELLED_MESSAGE};
pub use types::{Artifact, ProgressResponse, SelectedFile, UploadEvent, UploadId};
