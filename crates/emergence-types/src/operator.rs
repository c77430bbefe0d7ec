//! Operator control surface under `/api/operator/*`.

use serde::{Deserialize, Serialize};

use crate::enums::SimulationEndReason;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Request body for `POST /api/operator/speed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetSpeedRequest {
    /// New tick interval in milliseconds. The server rejects values below 100.
    pub tick_interval_ms: u64,
}

/// Request body for `POST /api/operator/inject-event`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InjectEventRequest {
    /// The kind of event to inject, e.g. `"plague"`.
    pub event_type: String,
    /// Region to target.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_region: Option<String>,
    /// Severity label.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    /// Free-form description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Generic acknowledgement returned by pause, resume, stop, and inject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAck {
    /// Whether the operation succeeded.
    pub ok: bool,
    /// Human-readable message.
    pub message: String,
}

/// Response of `POST /api/operator/speed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeedChange {
    /// Whether the change was applied.
    pub ok: bool,
    /// Human-readable message.
    pub message: String,
    /// Interval before the change.
    pub previous_interval_ms: u64,
    /// Interval after the change.
    pub new_interval_ms: u64,
}

/// Response of `GET /api/operator/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStatus {
    /// Current tick number.
    pub tick: u64,
    /// Whether the simulation is paused.
    pub paused: bool,
    /// Whether a stop has been requested.
    pub stop_requested: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Elapsed wall-clock seconds since start.
    pub elapsed_seconds: u64,
    /// Configured maximum ticks (0 = unlimited).
    pub max_ticks: u64,
    /// Configured maximum real-time seconds (0 = unlimited).
    pub max_real_time_seconds: u64,
    /// Number of agents currently alive.
    pub agents_alive: u64,
    /// Total agents ever created.
    pub agents_total: u64,
    /// Why the run ended, if it has.
    pub end_reason: Option<SimulationEndReason>,
    /// ISO 8601 start timestamp.
    pub started_at: String,
}
