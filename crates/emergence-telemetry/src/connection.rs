//! Reconnect state machine for the tick stream.
//!
//! The machine is pure: [`next_phase`] is the transition table and
//! [`ConnectionMachine::apply`] pairs each accepted transition with the one
//! side effect the connection task must perform. The task in
//! [`crate::stream`] owns the transport and the timer and only ever acts on
//! the effects returned here.
//!
//! ```text
//!   Connecting --opened--> Connected --closed--> Reconnecting
//!       |  ^                                        |
//!       |  +----------------retry elapsed-----------+
//!       +--closed (failed open)--> Reconnecting
//!   any live phase --manual reconnect--> Connecting (backoff reset)
//!   any live phase --shutdown--> Disconnected (terminal)
//! ```

use core::fmt;
use std::time::Duration;

use crate::config::ReconnectConfig;

// ---------------------------------------------------------------------------
// Phases and events
// ---------------------------------------------------------------------------

/// Lifecycle phase of the stream subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    /// A subscription attempt is in flight.
    Connecting,
    /// The transport is open and frames are flowing.
    Connected,
    /// The transport closed; a retry is scheduled.
    Reconnecting,
    /// Torn down for good. No further transitions happen.
    Disconnected,
}

impl ConnectionPhase {
    /// Lowercase label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Reconnecting => "reconnecting",
            Self::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to the subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionEvent {
    /// The transport finished its handshake.
    TransportOpened,
    /// The transport closed, or failed to open.
    TransportClosed,
    /// The scheduled retry delay has passed.
    RetryElapsed,
    /// The caller asked for a fresh subscription.
    ManualReconnect,
    /// The caller asked to stop.
    Shutdown,
}

/// The transition table.
///
/// Returns `None` for every pair not listed, which the machine treats as
/// "ignore the event".
pub const fn next_phase(phase: ConnectionPhase, event: ConnectionEvent) -> Option<ConnectionPhase> {
    use ConnectionEvent as E;
    use ConnectionPhase as P;

    match (phase, event) {
        (P::Connecting, E::TransportOpened) => Some(P::Connected),
        (P::Connecting | P::Connected, E::TransportClosed) => Some(P::Reconnecting),
        (P::Reconnecting, E::RetryElapsed) => Some(P::Connecting),
        (P::Connecting | P::Connected | P::Reconnecting, E::ManualReconnect) => Some(P::Connecting),
        (P::Connecting | P::Connected | P::Reconnecting, E::Shutdown) => Some(P::Disconnected),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Backoff
// ---------------------------------------------------------------------------

/// Exponential retry delay bounded by a floor and a ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    /// Delay after the first failure.
    floor_ms: u64,
    /// Largest delay ever returned.
    ceiling_ms: u64,
}

impl Backoff {
    /// Build a backoff from millisecond bounds. A floor above the ceiling is
    /// clamped down to it, and both are at least one millisecond.
    pub fn new(floor_ms: u64, ceiling_ms: u64) -> Self {
        let ceiling_ms = ceiling_ms.max(1);
        Self {
            floor_ms: floor_ms.clamp(1, ceiling_ms),
            ceiling_ms,
        }
    }

    /// Delay before the retry that follows `failures` consecutive failed
    /// cycles: `min(floor * 2^failures, ceiling)`.
    pub fn delay_for(&self, failures: u32) -> Duration {
        let shift = failures.min(32);
        let multiplier = 1u64.checked_shl(shift).unwrap_or(u64::MAX);
        let ms = self.floor_ms.saturating_mul(multiplier).min(self.ceiling_ms);
        Duration::from_millis(ms)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::from(ReconnectConfig::default())
    }
}

impl From<ReconnectConfig> for Backoff {
    fn from(config: ReconnectConfig) -> Self {
        Self::new(config.initial_delay_ms, config.max_delay_ms)
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// The side effect that accompanies an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Keep the open transport and wait for frames.
    AwaitFrames,
    /// Drop the transport and sleep for the given delay.
    ScheduleRetry(Duration),
    /// Drop any transport or pending retry and open a new subscription.
    Subscribe,
    /// Drop everything and stop.
    Teardown,
}

/// Current phase plus the consecutive-failure count that drives backoff.
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    /// Current phase.
    phase: ConnectionPhase,
    /// Failed cycles since the last successful open or manual reset.
    failures: u32,
    /// Delay policy.
    backoff: Backoff,
}

impl ConnectionMachine {
    /// Start in [`ConnectionPhase::Connecting`]; the caller is expected to
    /// subscribe immediately.
    pub const fn new(backoff: Backoff) -> Self {
        Self {
            phase: ConnectionPhase::Connecting,
            failures: 0,
            backoff,
        }
    }

    /// The current phase.
    pub const fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Consecutive failed cycles since the last open or reset.
    pub const fn failures(&self) -> u32 {
        self.failures
    }

    /// Feed an event. Returns the effect to perform, or `None` if the event
    /// is not valid in the current phase and was ignored.
    pub fn apply(&mut self, event: ConnectionEvent) -> Option<Effect> {
        let next = next_phase(self.phase, event)?;
        let effect = match event {
            ConnectionEvent::TransportOpened => {
                self.failures = 0;
                Effect::AwaitFrames
            }
            ConnectionEvent::TransportClosed => {
                let delay = self.backoff.delay_for(self.failures);
                self.failures = self.failures.saturating_add(1);
                Effect::ScheduleRetry(delay)
            }
            ConnectionEvent::RetryElapsed => Effect::Subscribe,
            ConnectionEvent::ManualReconnect => {
                self.failures = 0;
                Effect::Subscribe
            }
            ConnectionEvent::Shutdown => Effect::Teardown,
        };
        self.phase = next;
        Some(effect)
    }
}
