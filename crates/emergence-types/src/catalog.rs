//! Agent, location, and route listings.
//!
//! The list endpoints return trimmed rows; the detail endpoints return the
//! full records. Only the fields the client reads are modelled, and unknown
//! fields are ignored.

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::PathType;
use crate::ids::{AgentId, LocationId, RouteId};

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Vital signs attached to an agent row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentVitals {
    /// Current energy (0--100).
    pub energy: u32,
    /// Current health (0--100).
    pub health: u32,
    /// Current hunger (0--100).
    pub hunger: u32,
    /// Age in ticks.
    pub age: u32,
}

/// One row of `GET /api/agents`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Tick the agent entered the world.
    pub born_at_tick: u64,
    /// Tick the agent died, if dead.
    pub died_at_tick: Option<u64>,
    /// Generation number (0 for seed agents).
    pub generation: u32,
    /// Whether the agent is alive.
    pub alive: bool,
    /// Vital signs, when the agent has live state.
    pub vitals: Option<AgentVitals>,
    /// Current location, when the agent has live state.
    pub location_id: Option<LocationId>,
}

/// Body of `GET /api/agents`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentList {
    /// Number of rows returned.
    pub count: u32,
    /// The rows.
    pub agents: Vec<AgentSummary>,
}

/// Immutable identity of an agent, as returned by the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentIdentity {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Tick the agent entered the world.
    pub born_at_tick: u64,
    /// Tick the agent died, if dead.
    pub died_at_tick: Option<u64>,
    /// How the agent died.
    #[serde(default)]
    pub cause_of_death: Option<String>,
    /// First parent.
    #[serde(default)]
    pub parent_a: Option<AgentId>,
    /// Second parent.
    #[serde(default)]
    pub parent_b: Option<AgentId>,
    /// Generation number.
    pub generation: u32,
}

/// Mutable per-tick state of an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStateView {
    /// Current energy.
    pub energy: u32,
    /// Current health.
    pub health: u32,
    /// Current hunger.
    pub hunger: u32,
    /// Age in ticks.
    pub age: u32,
    /// Current location.
    pub location_id: LocationId,
    /// Travel destination, if in transit.
    #[serde(default)]
    pub destination_id: Option<LocationId>,
    /// Carried resources by name.
    #[serde(default)]
    pub inventory: BTreeMap<String, u32>,
    /// Known concepts.
    #[serde(default)]
    pub knowledge: BTreeSet<String>,
    /// Skill levels by name.
    #[serde(default)]
    pub skills: BTreeMap<String, u32>,
    /// Active goals.
    #[serde(default)]
    pub goals: Vec<String>,
}

/// Body of `GET /api/agents/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDetail {
    /// Identity record.
    pub agent: AgentIdentity,
    /// Live state, absent for dead agents.
    pub state: Option<AgentStateView>,
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// One row of `GET /api/locations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSummary {
    /// Location identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Region the location belongs to.
    pub region: String,
    /// Category (natural, settlement, ...).
    pub location_type: String,
    /// Maximum number of agents.
    pub capacity: u32,
}

/// Body of `GET /api/locations`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationList {
    /// Number of rows returned.
    pub count: u32,
    /// The rows.
    pub locations: Vec<LocationSummary>,
}

/// A resource deposit at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceNode {
    /// Resource name.
    pub resource: String,
    /// Currently available quantity.
    pub available: u32,
    /// Units regenerated per tick.
    #[serde(default)]
    pub regen_per_tick: u32,
    /// Maximum quantity.
    #[serde(default)]
    pub max_capacity: u32,
}

/// Full location record from the detail endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Location identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Region.
    pub region: String,
    /// Category.
    pub location_type: String,
    /// Narrative description.
    #[serde(default)]
    pub description: String,
    /// Maximum number of agents.
    pub capacity: u32,
    /// Resource deposits keyed by resource name.
    #[serde(default)]
    pub base_resources: BTreeMap<String, ResourceNode>,
    /// Agents who know about this location.
    #[serde(default)]
    pub discovered_by: BTreeSet<AgentId>,
}

/// An agent present at a location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occupant {
    /// Agent identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
}

/// Body of `GET /api/locations/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationDetail {
    /// The location.
    pub location: LocationRecord,
    /// Agents currently there.
    pub agents_here: Vec<Occupant>,
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// A directed edge connecting two locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Route identifier.
    pub id: RouteId,
    /// Origin location.
    pub from_location: LocationId,
    /// Destination location.
    pub to_location: LocationId,
    /// Travel time in ticks.
    pub cost_ticks: u32,
    /// Road quality.
    pub path_type: PathType,
    /// Current condition.
    pub durability: u32,
    /// Maximum condition.
    pub max_durability: u32,
    /// Degradation per tick.
    pub decay_per_tick: Decimal,
    /// Whether the route works in both directions.
    pub bidirectional: bool,
    /// Agent who built the route, if not natural.
    #[serde(default)]
    pub built_by: Option<AgentId>,
    /// Tick the route was built, if not natural.
    #[serde(default)]
    pub built_at_tick: Option<u64>,
}

/// Body of `GET /api/routes`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RouteList {
    /// Number of rows returned.
    pub count: u32,
    /// The rows.
    pub routes: Vec<Route>,
}
