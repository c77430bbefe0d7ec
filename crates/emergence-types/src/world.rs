//! World snapshot shapes returned by `GET /api/world`.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{Era, Season, Weather};
use crate::ids::AgentId;

// ---------------------------------------------------------------------------
// Full snapshot
// ---------------------------------------------------------------------------

/// End-of-tick summary of the world state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// The tick this snapshot represents.
    pub tick: u64,
    /// Current civilizational era.
    pub era: Era,
    /// Current season.
    pub season: Season,
    /// Current weather.
    pub weather: Weather,
    /// Population metrics.
    pub population: PopulationStats,
    /// Economic metrics.
    pub economy: EconomyStats,
    /// All discoveries made to date.
    #[serde(default)]
    pub discoveries: Vec<String>,
    /// Narrative summary of the tick.
    #[serde(default)]
    pub summary: String,
}

/// Population metrics for a world snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Number of living agents.
    pub total_alive: u32,
    /// Number of deceased agents.
    pub total_dead: u32,
    /// Agents born this tick.
    pub births_this_tick: u32,
    /// Agents who died this tick.
    pub deaths_this_tick: u32,
    /// Mean age of living agents.
    pub average_age: Decimal,
    /// Identifier of the longest-lived agent.
    pub oldest_agent: Option<AgentId>,
}

/// Economic metrics for a world snapshot.
///
/// Resource maps are keyed by the resource name as the server spells it
/// (`"Water"`, `"FoodBerry"`). The client only displays them, so the keys
/// are kept as strings rather than a closed enum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomyStats {
    /// Total resources across the entire simulation.
    pub total_resources: BTreeMap<String, u32>,
    /// Resources currently held by agents.
    pub resources_in_circulation: BTreeMap<String, u32>,
    /// Resources at location nodes.
    pub resources_at_nodes: BTreeMap<String, u32>,
    /// Number of trades completed this tick.
    pub trades_this_tick: u32,
    /// Wealth inequality coefficient in `[0, 1]`.
    pub gini_coefficient: Decimal,
}

// ---------------------------------------------------------------------------
// Fallback before the first snapshot
// ---------------------------------------------------------------------------

/// The reduced world view served before any tick has produced a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinimalWorld {
    /// Current tick.
    pub tick: u64,
    /// Current era.
    pub era: Era,
    /// Current season.
    pub season: Season,
    /// Current weather.
    pub weather: Weather,
    /// Number of agents with state.
    pub agents_count: u32,
    /// Number of known locations.
    pub locations_count: u32,
}

/// Either shape that `GET /api/world` may return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WorldResponse {
    /// A complete end-of-tick snapshot.
    Snapshot(Box<WorldSnapshot>),
    /// The minimal fallback.
    Minimal(MinimalWorld),
}

impl WorldResponse {
    /// The tick the response describes.
    pub const fn tick(&self) -> u64 {
        match self {
            Self::Snapshot(snapshot) => snapshot.tick,
            Self::Minimal(minimal) => minimal.tick,
        }
    }

    /// The season the response describes.
    pub const fn season(&self) -> Season {
        match self {
            Self::Snapshot(snapshot) => snapshot.season,
            Self::Minimal(minimal) => minimal.season,
        }
    }

    /// The era the response describes.
    pub const fn era(&self) -> Era {
        match self {
            Self::Snapshot(snapshot) => snapshot.era,
            Self::Minimal(minimal) => minimal.era,
        }
    }
}
