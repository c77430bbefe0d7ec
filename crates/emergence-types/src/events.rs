//! Event log rows returned by `GET /api/events`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Era, EventType, Season, Weather};
use crate::ids::{AgentId, EventId, LocationId};

/// World-level context recorded alongside an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldContext {
    /// Tick number.
    pub tick: u64,
    /// Civilizational era.
    pub era: Era,
    /// Season.
    pub season: Season,
    /// Weather.
    pub weather: Weather,
    /// Number of living agents.
    pub population: u32,
}

/// An immutable entry in the simulation's event log.
///
/// Identity is [`Event::id`]; two rows with the same id are the same event
/// no matter how many times a refresh returns them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier.
    pub id: EventId,
    /// The tick when this event occurred.
    pub tick: u64,
    /// The category of event.
    pub event_type: EventType,
    /// The primary agent involved, if any.
    #[serde(default)]
    pub agent_id: Option<AgentId>,
    /// The location where the event occurred, if any.
    #[serde(default)]
    pub location_id: Option<LocationId>,
    /// Type-specific payload.
    #[serde(default)]
    pub details: serde_json::Value,
    /// Agent state captured at event time, kept opaque.
    #[serde(default)]
    pub agent_state_snapshot: Option<serde_json::Value>,
    /// World context captured at event time.
    #[serde(default)]
    pub world_context: Option<WorldContext>,
    /// Real-world timestamp of the event.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Look up a string field in [`Event::details`].
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(serde_json::Value::as_str)
    }

    /// Look up an unsigned integer field in [`Event::details`].
    pub fn detail_u64(&self, key: &str) -> Option<u64> {
        self.details.get(key).and_then(serde_json::Value::as_u64)
    }
}

/// Body of `GET /api/events`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventList {
    /// Number of rows returned.
    pub count: u32,
    /// The rows.
    pub events: Vec<Event>,
}
