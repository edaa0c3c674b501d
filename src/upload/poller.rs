use crate::error::PollError;
use crate::upload::client::UploadClient;
use crate::upload::progress::ProgressState;
use crate::upload::types::{UploadEvent, UploadId};
use std::sync::mpsc::Sender;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The service reported 100%.
    Completed,
    Cancelled,
}

/// Periodically asks the service how far along an upload is.
///
/// A request is dispatched on every tick without waiting for the previous
/// one, so responses may overlap; [`ProgressState`] drops the stale ones.
pub struct ProgressPoller {
    client: UploadClient,
    upload_id: UploadId,
    interval: Duration,
    max_failures: u32,
}

impl ProgressPoller {
    pub fn new(
        client: UploadClient,
        upload_id: UploadId,
        interval: Duration,
        max_failures: u32,
    ) -> Self {
        Self {
            client,
            upload_id,
            interval,
            max_failures: max_failures.max(1),
        }
    }

    /// Starts polling on the current tokio runtime.
    pub fn spawn(self, events: Sender<UploadEvent>) -> PollerHandle {
        let cancel = CancellationToken::new();
        let task = tokio::spawn(self.run(cancel.clone(), events));
        PollerHandle {
            cancel,
            task: Some(task),
        }
    }

    async fn run(
        self,
        cancel: CancellationToken,
        events: Sender<UploadEvent>,
    ) -> Result<PollOutcome, PollError> {
        let mut ticker = time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut in_flight = JoinSet::new();
        let mut state = ProgressState::default();
        let mut next_seq: u64 = 0;
        let mut failures: u32 = 0;

        debug!("Polling progress of {} every {:?}", self.upload_id, self.interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("Progress polling of {} cancelled", self.upload_id);
                    return Ok(PollOutcome::Cancelled);
                }
                _ = ticker.tick() => {
                    let seq = next_seq;
                    next_seq += 1;
                    let client = self.client.clone();
                    let upload_id = self.upload_id.clone();
                    in_flight.spawn(async move { (seq, client.fetch_progress(&upload_id).await) });
                }
                Some(joined) = in_flight.join_next() => {
                    let (seq, result) = match joined {
                        Ok(reply) => reply,
                        Err(e) => {
                            warn!("Progress request task failed: {}", e);
                            continue;
                        }
                    };

                    match result {
                        Ok(reported) => {
                            failures = 0;
                            if !state.apply(seq, reported) {
                                debug!("Discarding stale progress response #{} ({}%)", seq, reported);
                                continue;
                            }
                            let _ = events.send(UploadEvent::Progress(state.percent()));
                            if state.is_complete() {
                                info!("Upload {} reported complete", self.upload_id);
                                return Ok(PollOutcome::Completed);
                            }
                        }
                        Err(err) => {
                            failures += 1;
                            warn!(
                                "Progress request #{} for {} failed ({}/{}): {}",
                                seq, self.upload_id, failures, self.max_failures, err
                            );
                            let _ = events.send(UploadEvent::PollFailed(err.to_string()));
                            if failures >= self.max_failures {
                                let gave_up = PollError::TooManyFailures {
                                    attempts: failures,
                                    last: err.to_string(),
                                };
                                warn!("Giving up on progress for {}: {}", self.upload_id, gave_up);
                                let _ = events
                                    .send(UploadEvent::PollAbandoned(gave_up.to_string()));
                                return Err(gave_up);
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Owner of a running poller. Dropping the handle stops polling.
pub struct PollerHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<Result<PollOutcome, PollError>>>,
}

impl PollerHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Cancels the poller if it is still running and waits for it to stop.
    pub async fn stop(mut self) -> Result<PollOutcome, PollError> {
        self.cancel.cancel();
        self.wait().await
    }

    /// Waits for the poller to stop on its own.
    pub async fn wait(&mut self) -> Result<PollOutcome, PollError> {
        match self.task.take() {
            Some(task) => match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("Progress poller task ended abnormally: {}", e);
                    Ok(PollOutcome::Cancelled)
                }
            },
            None => Ok(PollOutcome::Cancelled),
        }
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
