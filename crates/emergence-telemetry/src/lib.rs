//! Live telemetry client for the Emergence observer.
//!
//! This crate keeps a local, continuously refreshed picture of a running
//! simulation by combining two channels the observer exposes:
//!
//! - **Tick stream** (`/ws/ticks`): one small frame per tick, held open by
//!   a reconnecting connection task with exponential backoff
//! - **Query API** (`/api/*`): full snapshots, pulled whenever the stream
//!   reports a new tick
//!
//! On top of the pulled data it derives toast notifications from the event
//! log, override-streak and cost analytics from the decision log, and a
//! civilization milestone timeline from the social snapshots.
//!
//! # Architecture
//!
//! The connection task is the only owner of the transport and the retry
//! timer; everything else observes it through a [`ConnectionHandle`].
//! Accepted frames are broadcast to the [`SyncCoordinator`], which spawns
//! one independent refresh task per endpoint. Teardown is a single
//! [`tokio_util::sync::CancellationToken`] shared by all of them.
//!
//! # Modules
//!
//! - [`codec`] -- Strict decoding of frames and response bodies
//! - [`connection`] -- Phase machine and backoff policy
//! - [`transport`] -- Transport trait and the WebSocket implementation
//! - [`stream`] -- The connection task and its handle
//! - [`history`] -- Bounded newest-first frame history
//! - [`api`] -- Typed HTTP query client
//! - [`sync`] -- Push-triggers-pull coordinator and synced state
//! - [`alerts`] -- Event deduplication and toasts
//! - [`decisions`] -- Override streaks and cost statistics
//! - [`milestones`] -- Civilization timeline
//! - [`client`] -- One-call startup
//! - [`config`] -- YAML configuration
//! - [`error`] -- Error types

pub mod alerts;
pub mod api;
pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod decisions;
pub mod error;
pub mod history;
pub mod milestones;
pub mod stream;
pub mod sync;
pub mod transport;

// Re-export primary types for convenience.
pub use alerts::{TargetView, ToastAlert, ToastCategory, ToastCenter};
pub use api::{AgentFilter, ApiClient, DecisionFilter, EventFilter, Queries};
pub use client::TelemetryClient;
pub use codec::{decode_frame, decode_response};
pub use config::{ConfigError, TelemetryConfig};
pub use connection::{Backoff, ConnectionEvent, ConnectionMachine, ConnectionPhase, Effect};
pub use decisions::{DecisionReport, DecisionStats, OverrideStreak, detect_override_streaks};
pub use error::{ApiError, ClientError, DecodeError, TransportError};
pub use history::HistoryBuffer;
pub use milestones::{CivilizationMilestone, MilestoneCategory, build_milestones};
pub use stream::{ConnectionHandle, ConnectionManager};
pub use sync::{Slot, SyncCoordinator, SyncHandle, SyncUpdate, SyncedState};
pub use transport::{Transport, WsTransport, stream_url};
