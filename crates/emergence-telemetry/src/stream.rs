//! The connection task that owns the tick stream subscription.
//!
//! A single spawned task holds the transport, the pending connect, and the
//! retry timer. Because it is the only place any of them live, there is
//! never more than one subscription or one timer, and a superseded
//! subscription is simply dropped rather than left to call back.
//!
//! Accepted frames update the shared [`StreamState`] and are published on a
//! [`broadcast`] channel, which is what drives the sync coordinator.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use emergence_types::StreamFrame;
use futures::StreamExt;
use futures::future::BoxFuture;
use tokio::sync::{RwLock, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec::decode_frame;
use crate::connection::{Backoff, ConnectionEvent, ConnectionMachine, ConnectionPhase, Effect};
use crate::error::{DecodeError, TransportError};
use crate::history::{HISTORY_CAPACITY, HistoryBuffer};
use crate::transport::Transport;

/// Capacity of the broadcast channel for accepted frames.
///
/// A subscriber that falls further behind than this receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest frame.
pub const FRAME_BROADCAST_CAPACITY: usize = 256;

/// Callback invoked for every frame that fails to decode.
pub type DecodeHook = Arc<dyn Fn(&DecodeError) + Send + Sync>;

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Latest frame and recent history, shared between the task and handles.
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    /// The most recently accepted frame.
    pub latest: Option<StreamFrame>,
    /// Accepted frames, newest first.
    pub history: HistoryBuffer,
}

impl StreamState {
    /// Record an accepted frame.
    pub fn accept(&mut self, frame: StreamFrame) {
        self.latest = Some(frame);
        self.history.push(frame);
    }
}

/// Requests from handles to the task.
#[derive(Debug, Clone, Copy)]
enum Command {
    /// Drop the current subscription and open a fresh one.
    Reconnect,
}

/// Cheap, cloneable view of a running connection task.
#[derive(Clone)]
pub struct ConnectionHandle {
    /// Current phase, published by the task.
    phase: watch::Receiver<ConnectionPhase>,
    /// Latest frame and history.
    state: Arc<RwLock<StreamState>>,
    /// Accepted frames.
    frames: broadcast::Sender<StreamFrame>,
    /// Requests to the task.
    commands: mpsc::UnboundedSender<Command>,
    /// Teardown.
    cancel: CancellationToken,
    /// Frames dropped because they failed to decode.
    dropped: Arc<AtomicU64>,
}

impl ConnectionHandle {
    /// The current phase.
    pub fn phase(&self) -> ConnectionPhase {
        *self.phase.borrow()
    }

    /// A receiver that observes every phase change.
    pub fn phase_changes(&self) -> watch::Receiver<ConnectionPhase> {
        self.phase.clone()
    }

    /// The most recently accepted frame.
    pub async fn latest(&self) -> Option<StreamFrame> {
        self.state.read().await.latest
    }

    /// Accepted frames, newest first.
    pub async fn history(&self) -> Vec<StreamFrame> {
        self.state.read().await.history.to_vec()
    }

    /// Subscribe to accepted frames.
    pub fn subscribe(&self) -> broadcast::Receiver<StreamFrame> {
        self.frames.subscribe()
    }

    /// Drop the current subscription, reset backoff, and reconnect now.
    ///
    /// Safe to call any number of times; ignored after shutdown.
    pub fn reconnect(&self) {
        if self.commands.send(Command::Reconnect).is_err() {
            debug!("reconnect requested after the connection task exited");
        }
    }

    /// Tear the connection down. The phase becomes
    /// [`ConnectionPhase::Disconnected`] and stays there.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// The token that tears this connection down.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of frames dropped because they failed to decode.
    pub fn dropped_frames(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

/// Configures and spawns the connection task.
pub struct ConnectionManager<T: Transport> {
    /// How to open a subscription.
    transport: T,
    /// Where to subscribe.
    url: String,
    /// Retry delay policy.
    backoff: Backoff,
    /// History bound.
    history_capacity: usize,
    /// Optional decode-failure callback.
    decode_hook: Option<DecodeHook>,
    /// Teardown token.
    cancel: CancellationToken,
}

impl<T: Transport> ConnectionManager<T> {
    /// Create a manager for `url` with the given transport and backoff.
    pub fn new(transport: T, url: impl Into<String>, backoff: Backoff) -> Self {
        Self {
            transport,
            url: url.into(),
            backoff,
            history_capacity: HISTORY_CAPACITY,
            decode_hook: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Call `hook` for every frame that fails to decode.
    #[must_use]
    pub fn with_decode_hook(mut self, hook: impl Fn(&DecodeError) + Send + Sync + 'static) -> Self {
        self.decode_hook = Some(Arc::new(hook));
        self
    }

    /// Tear down when `token` is cancelled.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Keep at most `capacity` frames of history.
    #[must_use]
    pub const fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Start the connection task.
    ///
    /// The task subscribes immediately and runs until the handle's
    /// [`ConnectionHandle::shutdown`] is called or the token is cancelled.
    pub fn spawn(self) -> (ConnectionHandle, JoinHandle<()>) {
        let (phase_tx, phase_rx) = watch::channel(ConnectionPhase::Connecting);
        let (frames_tx, _) = broadcast::channel(FRAME_BROADCAST_CAPACITY);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let state = Arc::new(RwLock::new(StreamState {
            latest: None,
            history: HistoryBuffer::with_capacity(self.history_capacity),
        }));
        let dropped = Arc::new(AtomicU64::new(0));

        let handle = ConnectionHandle {
            phase: phase_rx,
            state: Arc::clone(&state),
            frames: frames_tx.clone(),
            commands: commands_tx,
            cancel: self.cancel.clone(),
            dropped: Arc::clone(&dropped),
        };

        let sinks = Sinks {
            phase: phase_tx,
            state,
            frames: frames_tx,
            dropped,
            decode_hook: self.decode_hook,
        };

        let task = tokio::spawn(run(
            self.transport,
            self.url,
            self.backoff,
            self.cancel,
            commands_rx,
            sinks,
        ));
        (handle, task)
    }
}

/// Everything the task writes to.
struct Sinks {
    /// Phase publisher.
    phase: watch::Sender<ConnectionPhase>,
    /// Latest frame and history.
    state: Arc<RwLock<StreamState>>,
    /// Frame publisher.
    frames: broadcast::Sender<StreamFrame>,
    /// Decode-failure counter.
    dropped: Arc<AtomicU64>,
    /// Decode-failure callback.
    decode_hook: Option<DecodeHook>,
}

impl Sinks {
    /// Decode one raw message and publish it, or count it as dropped.
    async fn deliver(&self, raw: &str) {
        match decode_frame(raw) {
            Ok(frame) => {
                self.state.write().await.accept(frame);
                // Err only means nobody is subscribed right now.
                let receivers = self.frames.send(frame).unwrap_or(0);
                debug!(tick = frame.tick, receivers, "stream frame accepted");
            }
            Err(e) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed).saturating_add(1);
                warn!(error = %e, dropped_total = total, "dropping undecodable stream frame");
                if let Some(hook) = &self.decode_hook {
                    hook(&e);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Task
// ---------------------------------------------------------------------------

/// What the subscription slot currently holds. Exactly one at a time.
enum Link<'a, S> {
    /// A connect attempt is in flight.
    Opening(BoxFuture<'a, Result<S, TransportError>>),
    /// The transport is open.
    Open(S),
    /// Waiting out the retry delay.
    Waiting(Pin<Box<Sleep>>),
    /// Torn down.
    Idle,
}

/// Why the task woke up.
enum Wake<S> {
    /// A connect attempt finished.
    Opened(Result<S, TransportError>),
    /// A raw message arrived.
    Frame(String),
    /// The open transport ended, cleanly (`None`) or not.
    Closed(Option<TransportError>),
    /// The retry delay passed.
    RetryElapsed,
    /// A caller request or cancellation.
    Control(ConnectionEvent),
}

impl<S> Link<'_, S>
where
    S: futures::Stream<Item = Result<String, TransportError>> + Unpin,
{
    /// Wait for whatever the current slot produces next.
    ///
    /// Cancel-safe: dropping this future leaves the slot untouched.
    async fn next(&mut self) -> Wake<S> {
        match self {
            Self::Opening(connect) => Wake::Opened(connect.await),
            Self::Open(stream) => match stream.next().await {
                Some(Ok(raw)) => Wake::Frame(raw),
                Some(Err(e)) => Wake::Closed(Some(e)),
                None => Wake::Closed(None),
            },
            Self::Waiting(sleep) => {
                sleep.as_mut().await;
                Wake::RetryElapsed
            }
            Self::Idle => std::future::pending().await,
        }
    }
}

/// The connection loop.
async fn run<T: Transport>(
    transport: T,
    url: String,
    backoff: Backoff,
    cancel: CancellationToken,
    mut commands: mpsc::UnboundedReceiver<Command>,
    sinks: Sinks,
) {
    let mut machine = ConnectionMachine::new(backoff);
    info!(url = %url, "subscribing to tick stream");
    let mut link: Link<'_, T::Stream> = Link::Opening(Box::pin(transport.connect(&url)));

    loop {
        let wake = tokio::select! {
            biased;
            () = cancel.cancelled() => Wake::Control(ConnectionEvent::Shutdown),
            Some(Command::Reconnect) = commands.recv() => {
                // Requests that piled up meanwhile collapse into this one.
                while let Ok(Command::Reconnect) = commands.try_recv() {}
                Wake::Control(ConnectionEvent::ManualReconnect)
            }
            wake = link.next() => wake,
        };

        let (event, opened) = match wake {
            Wake::Frame(raw) => {
                sinks.deliver(&raw).await;
                continue;
            }
            Wake::Opened(Ok(stream)) => (ConnectionEvent::TransportOpened, Some(stream)),
            Wake::Opened(Err(e)) => {
                warn!(error = %e, "tick stream connect failed");
                (ConnectionEvent::TransportClosed, None)
            }
            Wake::Closed(Some(e)) => {
                warn!(error = %e, "tick stream broke");
                (ConnectionEvent::TransportClosed, None)
            }
            Wake::Closed(None) => {
                info!("tick stream closed by server");
                (ConnectionEvent::TransportClosed, None)
            }
            Wake::RetryElapsed => (ConnectionEvent::RetryElapsed, None),
            Wake::Control(event) => (event, None),
        };

        let Some(effect) = machine.apply(event) else {
            debug!(?event, phase = %machine.phase(), "ignoring connection event");
            continue;
        };

        match effect {
            Effect::AwaitFrames => {
                if let Some(stream) = opened {
                    link = Link::Open(stream);
                }
            }
            Effect::ScheduleRetry(delay) => {
                info!(delay_ms = duration_ms(delay), failures = machine.failures(), "scheduling reconnect");
                link = Link::Waiting(Box::pin(tokio::time::sleep(delay)));
            }
            Effect::Subscribe => {
                debug!(url = %url, "opening new subscription");
                link = Link::Opening(Box::pin(transport.connect(&url)));
            }
            Effect::Teardown => {
                link = Link::Idle;
            }
        }

        let phase = machine.phase();
        let previous = sinks.phase.send_replace(phase);
        if previous != phase {
            info!(from = %previous, to = %phase, "stream phase changed");
        }

        if matches!(link, Link::Idle) {
            break;
        }
    }

    info!("tick stream task stopped");
}

/// Whole milliseconds in `delay`, saturating.
fn duration_ms(delay: Duration) -> u64 {
    u64::try_from(delay.as_millis()).unwrap_or(u64::MAX)
}
