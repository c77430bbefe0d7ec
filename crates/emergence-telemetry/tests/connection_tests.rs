//! Integration tests for the connection task.
//!
//! A scripted transport stands in for the WebSocket: each connect attempt
//! pops the next scripted outcome, and opened streams are fed by channels
//! the test controls. The Tokio clock is paused so backoff delays are
//! observed exactly.

#![allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use emergence_telemetry::connection::{Backoff, ConnectionPhase};
use emergence_telemetry::error::TransportError;
use emergence_telemetry::stream::{ConnectionHandle, ConnectionManager};
use emergence_telemetry::transport::Transport;
use futures::channel::mpsc;
use tokio::time::Instant;

type Feed = mpsc::UnboundedSender<Result<String, TransportError>>;
type FeedStream = mpsc::UnboundedReceiver<Result<String, TransportError>>;

/// One scripted connect outcome.
enum Script {
    /// The connect attempt fails.
    Fail,
    /// The connect attempt succeeds with this stream.
    Open(FeedStream),
}

/// Transport that replays a script and records when it was asked to connect.
#[derive(Clone, Default)]
struct ScriptedTransport {
    script: Arc<Mutex<VecDeque<Script>>>,
    attempts: Arc<Mutex<Vec<Instant>>>,
}

impl ScriptedTransport {
    /// Queue a stream that opens successfully. Returns its feed.
    fn open(&self) -> Feed {
        let (tx, rx) = mpsc::unbounded();
        self.script.lock().unwrap().push_back(Script::Open(rx));
        tx
    }

    fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

impl Transport for ScriptedTransport {
    type Stream = FeedStream;

    fn connect(&self, _url: &str) -> impl Future<Output = Result<Self::Stream, TransportError>> + Send {
        self.attempts.lock().unwrap().push(Instant::now());
        let next = self.script.lock().unwrap().pop_front().unwrap_or(Script::Fail);
        async move {
            match next {
                Script::Fail => Err(TransportError::Connect("scripted failure".to_owned())),
                Script::Open(stream) => Ok(stream),
            }
        }
    }
}

fn spawn(transport: &ScriptedTransport) -> (ConnectionHandle, tokio::task::JoinHandle<()>) {
    ConnectionManager::new(transport.clone(), "ws://observer.test/ws/ticks", Backoff::default())
        .spawn()
}

fn frame_json(tick: u64) -> String {
    format!(
        r#"{{"tick":{tick},"season":"Spring","weather":"Clear","agents_alive":3,"deaths_this_tick":0,"actions_resolved":3}}"#
    )
}

/// Poll `check` on the paused clock until it holds.
async fn wait_until(mut check: impl FnMut() -> bool) {
    let mut polls = 0;
    while !check() && polls < 10_000 {
        tokio::time::sleep(Duration::from_millis(10)).await;
        polls += 1;
    }
    assert!(check(), "condition never became true");
}

/// Gap between attempt `i` and the instant `since`.
fn gap(attempts: &[Instant], i: usize, since: Instant) -> Option<Duration> {
    attempts.get(i).map(|at| at.duration_since(since))
}

async fn wait_for_phase(handle: &ConnectionHandle, phase: ConnectionPhase) {
    let mut changes = handle.phase_changes();
    tokio::time::timeout(Duration::from_secs(300), changes.wait_for(|p| *p == phase))
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test(start_paused = true)]
async fn failed_connects_back_off_exponentially() {
    let transport = ScriptedTransport::default();
    let (handle, _task) = spawn(&transport);

    wait_until(|| transport.attempt_count() >= 4).await;
    handle.shutdown();

    let attempts = transport.attempts();
    let gaps: Vec<u128> = attempts
        .iter()
        .zip(attempts.iter().skip(1))
        .take(3)
        .map(|(earlier, later)| later.duration_since(*earlier).as_millis())
        .collect();
    assert_eq!(gaps, vec![1_000, 2_000, 4_000]);
}

#[tokio::test(start_paused = true)]
async fn frames_reach_history_and_subscribers() {
    let transport = ScriptedTransport::default();
    let feed = transport.open();
    let (handle, _task) = spawn(&transport);
    let mut frames = handle.subscribe();

    wait_for_phase(&handle, ConnectionPhase::Connected).await;
    feed.unbounded_send(Ok(frame_json(1))).unwrap();
    feed.unbounded_send(Ok(frame_json(2))).unwrap();

    assert_eq!(frames.recv().await.unwrap().tick, 1);
    assert_eq!(frames.recv().await.unwrap().tick, 2);

    let ticks: Vec<u64> = handle.history().await.iter().map(|f| f.tick).collect();
    assert_eq!(ticks, vec![2, 1]);
    assert_eq!(handle.latest().await.map(|f| f.tick), Some(2));
}

#[tokio::test(start_paused = true)]
async fn undecodable_frame_is_dropped_without_reconnecting() {
    let transport = ScriptedTransport::default();
    let feed = transport.open();
    let hook_calls = Arc::new(AtomicU32::new(0));
    let hook_counter = Arc::clone(&hook_calls);
    let (handle, _task) =
        ConnectionManager::new(transport.clone(), "ws://observer.test/ws/ticks", Backoff::default())
            .with_decode_hook(move |_| {
                hook_counter.fetch_add(1, Ordering::SeqCst);
            })
            .spawn();
    let mut frames = handle.subscribe();

    wait_for_phase(&handle, ConnectionPhase::Connected).await;
    feed.unbounded_send(Ok(frame_json(1))).unwrap();
    feed.unbounded_send(Ok(r#"{"tick":-1,"season":"Spring"}"#.to_owned())).unwrap();
    feed.unbounded_send(Ok(r#"{"tick":2,"season":"Monsoon","weather":"Clear","agents_alive":3,"deaths_this_tick":0,"actions_resolved":3}"#.to_owned())).unwrap();
    feed.unbounded_send(Ok(frame_json(3))).unwrap();

    assert_eq!(frames.recv().await.unwrap().tick, 1);
    assert_eq!(frames.recv().await.unwrap().tick, 3);

    assert_eq!(handle.dropped_frames(), 2);
    assert_eq!(hook_calls.load(Ordering::SeqCst), 2);
    assert_eq!(handle.phase(), ConnectionPhase::Connected);
    assert_eq!(transport.attempt_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn server_close_retries_after_floor_delay() {
    let transport = ScriptedTransport::default();
    let first = transport.open();
    let _second = transport.open();
    let (handle, _task) = spawn(&transport);

    wait_for_phase(&handle, ConnectionPhase::Connected).await;
    let closed_at = Instant::now();
    drop(first);

    wait_for_phase(&handle, ConnectionPhase::Reconnecting).await;
    wait_until(|| transport.attempt_count() == 2).await;
    wait_for_phase(&handle, ConnectionPhase::Connected).await;

    let attempts = transport.attempts();
    assert_eq!(gap(&attempts, 1, closed_at), Some(Duration::from_millis(1_000)));
}

#[tokio::test(start_paused = true)]
async fn manual_reconnect_replaces_the_subscription() {
    let transport = ScriptedTransport::default();
    let first = transport.open();
    let second = transport.open();
    let (handle, _task) = spawn(&transport);
    let mut frames = handle.subscribe();

    wait_for_phase(&handle, ConnectionPhase::Connected).await;
    handle.reconnect();
    handle.reconnect();
    wait_until(|| transport.attempt_count() >= 2).await;
    wait_for_phase(&handle, ConnectionPhase::Connected).await;

    // The superseded stream was dropped, so its feed is closed.
    assert!(first.is_closed());
    assert!(first.unbounded_send(Ok(frame_json(99))).is_err());

    second.unbounded_send(Ok(frame_json(5))).unwrap();
    assert_eq!(frames.recv().await.unwrap().tick, 5);
}

#[tokio::test(start_paused = true)]
async fn manual_reconnect_resets_backoff() {
    let transport = ScriptedTransport::default();
    let (handle, _task) = spawn(&transport);

    // Three failures: the next delay would be 8s.
    wait_until(|| transport.attempt_count() >= 4).await;
    wait_for_phase(&handle, ConnectionPhase::Reconnecting).await;

    handle.reconnect();
    wait_until(|| transport.attempt_count() >= 6).await;
    handle.shutdown();

    let attempts = transport.attempts();
    let reset_at = attempts.get(4).copied().unwrap();
    assert_eq!(gap(&attempts, 5, reset_at), Some(Duration::from_millis(1_000)));
}

#[tokio::test(start_paused = true)]
async fn shutdown_is_final() {
    let transport = ScriptedTransport::default();
    let (handle, task) = spawn(&transport);

    wait_for_phase(&handle, ConnectionPhase::Reconnecting).await;
    handle.shutdown();
    task.await.unwrap();

    assert_eq!(handle.phase(), ConnectionPhase::Disconnected);
    tokio::time::sleep(Duration::from_secs(120)).await;
    handle.reconnect();
    assert_eq!(transport.attempt_count(), 1);
    assert_eq!(handle.phase(), ConnectionPhase::Disconnected);
}
