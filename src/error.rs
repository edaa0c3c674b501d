use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures of a single upload, as shown to the user.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File '{name}' is empty")]
    EmptyFile { name: String },

    /// Non-2xx answer from the upload endpoint; `message` is the response body.
    #[error("Server error: {message}")]
    Server { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Failed to save artifact to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl UploadError {
    /// Text written into the status line of the UI.
    pub fn user_message(&self) -> String {
        format!("Upload failed: {}", self)
    }
}

/// Failures of the progress poller.
#[derive(Debug, Error)]
pub enum PollError {
    #[error("progress request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("progress endpoint returned HTTP {0}")]
    Status(u16),

    #[error("invalid progress payload: {0}")]
    Decode(String),

    #[error("gave up after {attempts} consecutive failures (last: {last})")]
    TooManyFailures { attempts: u32, last: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
