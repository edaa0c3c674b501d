//! Desktop client for the workbook migration service.
//!
//! Picks a workbook, uploads it to `POST /upload`, polls
//! `GET /progress/<id>` while the service works on it and saves the
//! migrated workbook it sends back.

pub mod app;
pub mod config;
pub mod error;
pub mod headless;
pub mod logging;
pub mod upload;
pub mod utils;

pub use config::Config;
pub use error::{ConfigError, PollError, UploadError};
