mod common;

use common::{MockBackend, ProgressReply};
use std::sync::mpsc;
use std::time::Duration;
use workbook_migrator::upload::{PollOutcome, ProgressPoller, UploadClient, UploadEvent, UploadId};
use workbook_migrator::{Config, PollError};

fn client_for(base_url: String) -> UploadClient {
    let config = Config {
        base_url,
        ..Config::default()
    };
    UploadClient::new(&config).unwrap()
}

fn percents(rx: &mpsc::Receiver<UploadEvent>) -> Vec<u8> {
    rx.try_iter()
        .filter_map(|e| match e {
            UploadEvent::Progress(p) => Some(p),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn completes_when_service_reports_full_progress() {
    let backend = MockBackend::new().progress_script(vec![
        ProgressReply::Percent(30),
        ProgressReply::Percent(70),
        ProgressReply::Percent(100),
    ]);
    let base_url = backend.clone().start().await;
    let (tx, rx) = mpsc::channel();

    let poller = ProgressPoller::new(
        client_for(base_url),
        UploadId::new(),
        Duration::from_millis(40),
        5,
    );
    let mut handle = poller.spawn(tx);

    let outcome = handle.wait().await.unwrap();

    assert_eq!(outcome, PollOutcome::Completed);
    assert_eq!(percents(&rx), vec![30, 70, 100]);
    assert!(handle.is_finished());
}

#[tokio::test]
async fn stale_responses_never_move_the_indicator_back() {
    // The first reply is held back long enough for newer ones to overtake it.
    let backend = MockBackend::new().progress_script(vec![
        ProgressReply::Delayed(Duration::from_millis(150), 20),
        ProgressReply::Percent(50),
        ProgressReply::Percent(60),
        ProgressReply::Percent(60),
        ProgressReply::Percent(100),
    ]);
    let base_url = backend.clone().start().await;
    let (tx, rx) = mpsc::channel();

    let mut handle = ProgressPoller::new(
        client_for(base_url),
        UploadId::new(),
        Duration::from_millis(50),
        5,
    )
    .spawn(tx);

    assert_eq!(handle.wait().await.unwrap(), PollOutcome::Completed);

    let seen = percents(&rx);
    assert!(!seen.contains(&20), "stale response applied: {seen:?}");
    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "not monotonic: {seen:?}");
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn cancelling_stops_further_requests() {
    let backend = MockBackend::new().progress_script(vec![ProgressReply::Percent(10)]);
    let base_url = backend.clone().start().await;
    let (tx, _rx) = mpsc::channel();

    let handle = ProgressPoller::new(
        client_for(base_url),
        UploadId::new(),
        Duration::from_millis(30),
        5,
    )
    .spawn(tx);

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(handle.stop().await.unwrap(), PollOutcome::Cancelled);

    let polls = backend.poll_count();
    assert!(polls >= 1);
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.poll_count(), polls);
}

#[tokio::test]
async fn dropping_the_handle_stops_polling() {
    let backend = MockBackend::new().progress_script(vec![ProgressReply::Percent(10)]);
    let base_url = backend.clone().start().await;
    let (tx, _rx) = mpsc::channel();

    let handle = ProgressPoller::new(
        client_for(base_url),
        UploadId::new(),
        Duration::from_millis(30),
        5,
    )
    .spawn(tx);
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(handle);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let polls = backend.poll_count();
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(backend.poll_count(), polls);
}

#[tokio::test]
async fn gives_up_after_consecutive_failures() {
    let backend = MockBackend::new().progress_script(vec![ProgressReply::Status(502)]);
    let base_url = backend.clone().start().await;
    let (tx, rx) = mpsc::channel();

    let mut handle = ProgressPoller::new(
        client_for(base_url),
        UploadId::new(),
        Duration::from_millis(20),
        2,
    )
    .spawn(tx);

    let err = handle.wait().await.unwrap_err();

    match err {
        PollError::TooManyFailures { attempts, last } => {
            assert_eq!(attempts, 2);
            assert!(last.contains("502"));
        }
        other => panic!("unexpected error: {other}"),
    }
    let events: Vec<_> = rx.try_iter().collect();
    let failed = events
        .iter()
        .filter(|e| matches!(e, UploadEvent::PollFailed(_)))
        .count();
    assert_eq!(failed, 2);
    match events.last() {
        Some(UploadEvent::PollAbandoned(message)) => {
            assert!(message.contains("gave up after 2 consecutive failures"), "{message}");
        }
        other => panic!("expected the poller to report giving up, got {other:?}"),
    }
}

#[tokio::test]
async fn a_success_resets_the_failure_budget() {
    let backend = MockBackend::new().progress_script(vec![
        ProgressReply::Status(500),
        ProgressReply::Percent(40),
        ProgressReply::Status(500),
        ProgressReply::Percent(100),
    ]);
    let base_url = backend.clone().start().await;
    let (tx, rx) = mpsc::channel();

    let mut handle = ProgressPoller::new(
        client_for(base_url),
        UploadId::new(),
        Duration::from_millis(30),
        2,
    )
    .spawn(tx);

    assert_eq!(handle.wait().await.unwrap(), PollOutcome::Completed);
    assert_eq!(percents(&rx), vec![40, 100]);
}

#[tokio::test]
async fn malformed_payload_is_a_decode_error() {
    let backend = MockBackend::new().progress_script(vec![ProgressReply::Status(200)]);
    let base_url = backend.clone().start().await;
    let client = client_for(base_url);

    let err = client.fetch_progress(&UploadId::new()).await.unwrap_err();

    assert!(matches!(err, PollError::Decode(_)), "got {err:?}");
}
