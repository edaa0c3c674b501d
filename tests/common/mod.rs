#![allow(dead_code)]

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// One scripted answer of the progress endpoint.
#[derive(Clone, Copy, Debug)]
pub enum ProgressReply {
    Percent(i64),
    Delayed(Duration, i64),
    Status(u16),
}

#[derive(Clone, Debug, Default)]
pub struct ReceivedUpload {
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
    pub upload_id: Option<String>,
}

/// In-process stand-in for the migration service.
#[derive(Clone)]
pub struct MockBackend {
    upload_status: StatusCode,
    upload_body: Arc<Vec<u8>>,
    upload_delay: Duration,
    progress_script: Arc<Vec<ProgressReply>>,
    pub uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    pub polls: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            upload_status: StatusCode::OK,
            upload_body: Arc::new(b"migrated".to_vec()),
            upload_delay: Duration::ZERO,
            progress_script: Arc::new(vec![ProgressReply::Percent(100)]),
            uploads: Arc::default(),
            polls: Arc::default(),
        }
    }

    pub fn respond_with(mut self, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.upload_status = StatusCode::from_u16(status).unwrap();
        self.upload_body = Arc::new(body.into());
        self
    }

    pub fn upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    /// The n-th progress request gets the n-th reply; the last one repeats.
    pub fn progress_script(mut self, script: Vec<ProgressReply>) -> Self {
        self.progress_script = Arc::new(script);
        self
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }

    pub fn poll_count(&self) -> usize {
        self.polls.lock().unwrap().len()
    }

    /// Serves on a random local port and returns the base URL.
    pub async fn start(self) -> String {
        let app = Router::new()
            .route("/upload", post(upload))
            .route("/progress/:upload_id", get(progress))
            .with_state(self);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }
}

async fn upload(State(backend): State<MockBackend>, mut multipart: Multipart) -> Response {
    let mut received = ReceivedUpload::default();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                received.file_name = field.file_name().map(str::to_string);
                received.bytes = field.bytes().await.unwrap().to_vec();
            }
            Some("upload_id") => {
                received.upload_id = Some(field.text().await.unwrap());
            }
            _ => {}
        }
    }
    backend.uploads.lock().unwrap().push(received);

    tokio::time::sleep(backend.upload_delay).await;
    (backend.upload_status, backend.upload_body.as_ref().clone()).into_response()
}

async fn progress(
    State(backend): State<MockBackend>,
    Path(upload_id): Path<String>,
) -> Response {
    let reply = {
        let mut polls = backend.polls.lock().unwrap();
        let index = polls.len();
        polls.push(upload_id);
        let script = &backend.progress_script;
        script[index.min(script.len() - 1)]
    };

    match reply {
        ProgressReply::Percent(p) => Json(json!({ "progress": p })).into_response(),
        ProgressReply::Delayed(delay, p) => {
            tokio::time::sleep(delay).await;
            Json(json!({ "progress": p })).into_response()
        }
        ProgressReply::Status(code) => StatusCode::from_u16(code).unwrap().into_response(),
    }
}

/// A base URL nothing listens on.
pub async fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}
