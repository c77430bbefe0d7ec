//! Social construct snapshots served under `/api/social/*`.
//!
//! Each endpoint summarizes one emergent institution: belief systems,
//! governance, families, the economy, and crime. The snapshots are the
//! inputs to the client's milestone timeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::{EconomicModel, GovernanceType, JusticeType};
use crate::ids::{AgentId, LocationId};

// ---------------------------------------------------------------------------
// Beliefs
// ---------------------------------------------------------------------------

/// A belief system shared by a group of agents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefSystem {
    /// Server-assigned identifier, e.g. `"belief-0"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Concepts the belief is built around.
    #[serde(default)]
    pub themes: Vec<String>,
    /// Number of agents holding it.
    pub adherent_count: u32,
    /// Tick the belief first appeared.
    pub founded_at_tick: u64,
}

/// Something that happened to a belief system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeliefEvent {
    /// Tick of the event.
    pub tick: u64,
    /// Kind of event: `"founded"`, `"schism"`, ...
    pub event_type: String,
    /// The belief system concerned.
    pub belief_system_id: String,
    /// Its display name.
    pub belief_system_name: String,
    /// Narrative description.
    #[serde(default)]
    pub description: String,
    /// The agent most associated with the event.
    #[serde(default)]
    pub agent_id: Option<AgentId>,
}

/// Body of `GET /api/social/beliefs`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeliefSnapshot {
    /// Known belief systems.
    pub belief_systems: Vec<BeliefSystem>,
    /// Belief history.
    pub belief_events: Vec<BeliefEvent>,
}

// ---------------------------------------------------------------------------
// Governance
// ---------------------------------------------------------------------------

/// An agent in a leadership role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leader {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Display name.
    pub agent_name: String,
    /// Role title, e.g. `"Chief"`.
    pub role: String,
    /// Tick since which the agent has held the role.
    pub since_tick: u64,
}

/// A governance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceEvent {
    /// Tick of the change.
    pub tick: u64,
    /// Kind of change.
    pub event_type: String,
    /// Narrative description.
    #[serde(default)]
    pub description: String,
}

/// Body of `GET /api/social/governance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceSnapshot {
    /// Inferred governance structure.
    pub governance_type: GovernanceType,
    /// Current leaders.
    #[serde(default)]
    pub leaders: Vec<Leader>,
    /// Shared rules in force.
    #[serde(default)]
    pub rules: Vec<String>,
    /// Stability in `[0, 1]`.
    pub stability_score: Decimal,
    /// Recent governance changes.
    #[serde(default)]
    pub recent_events: Vec<GovernanceEvent>,
}

// ---------------------------------------------------------------------------
// Families
// ---------------------------------------------------------------------------

/// A family unit formed around a parent pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyUnit {
    /// Server-assigned identifier, e.g. `"family-1"`.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Parents and children.
    pub members: Vec<AgentId>,
    /// Head of the family.
    pub head: AgentId,
    /// Tick the first child was born.
    pub formed_at_tick: u64,
}

/// One node of the lineage tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageNode {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Display name.
    pub agent_name: String,
    /// First parent.
    pub parent_a: Option<AgentId>,
    /// Second parent.
    pub parent_b: Option<AgentId>,
    /// Generation number.
    pub generation: u32,
    /// Whether the agent is alive.
    pub alive: bool,
    /// Children of this agent.
    #[serde(default)]
    pub children: Vec<AgentId>,
}

/// Body of `GET /api/social/families`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilySnapshot {
    /// Number of family units.
    pub unit_count: u32,
    /// Mean family size.
    pub avg_size: Decimal,
    /// Number of parent pairs.
    pub marriage_count: u32,
    /// Number of separations.
    pub divorce_count: u32,
    /// Orphaned non-seed agents.
    pub orphan_count: u32,
    /// Deepest generation reached.
    pub longest_lineage: u32,
    /// Family units.
    #[serde(default)]
    pub families: Vec<FamilyUnit>,
    /// Lineage tree.
    #[serde(default)]
    pub lineage: Vec<LineageNode>,
}

// ---------------------------------------------------------------------------
// Economy
// ---------------------------------------------------------------------------

/// A location where trade concentrates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketLocation {
    /// Location identifier.
    pub location_id: LocationId,
    /// Display name.
    pub location_name: String,
    /// Trade volume there.
    pub trade_volume: u32,
    /// Most abundant resource there.
    pub primary_resource: String,
}

/// Body of `GET /api/social/economy`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EconomySnapshot {
    /// Inferred economic model.
    pub model_type: EconomicModel,
    /// Resource acting as currency, if one emerged.
    #[serde(default)]
    pub currency_resource: Option<String>,
    /// Share of agents holding the currency.
    pub currency_adoption_pct: Decimal,
    /// Total completed trades.
    pub trade_volume: u32,
    /// Trade volume per recent tick.
    #[serde(default)]
    pub trade_volume_history: Vec<u32>,
    /// Trade hubs.
    #[serde(default)]
    pub market_locations: Vec<MarketLocation>,
}

// ---------------------------------------------------------------------------
// Crime
// ---------------------------------------------------------------------------

/// Count of one kind of crime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeCount {
    /// Crime kind, e.g. `"Steal"`.
    pub crime_type: String,
    /// Number of occurrences.
    pub count: u32,
}

/// An agent with repeated offenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialOffender {
    /// Agent identifier.
    pub agent_id: AgentId,
    /// Display name.
    pub agent_name: String,
    /// Number of offenses.
    pub offense_count: u32,
    /// Tick of the latest offense.
    pub last_offense_tick: u64,
}

/// A location with many crimes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrimeHotspot {
    /// Location identifier.
    pub location_id: LocationId,
    /// Display name.
    pub location_name: String,
    /// Crimes recorded there.
    pub crime_count: u32,
}

/// Body of `GET /api/social/crime`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeSnapshot {
    /// Crimes per living agent.
    pub crime_rate: Decimal,
    /// Crime rate per recent tick.
    #[serde(default)]
    pub crime_rate_history: Vec<Decimal>,
    /// Share of crimes detected.
    pub detection_rate: f64,
    /// Share of detected crimes punished.
    pub punishment_rate: f64,
    /// How justice is administered.
    pub justice_type: JusticeType,
    /// Crime counts by kind.
    #[serde(default)]
    pub common_crimes: Vec<CrimeCount>,
    /// Repeat offenders.
    #[serde(default)]
    pub serial_offenders: Vec<SerialOffender>,
    /// Crime hotspots.
    #[serde(default)]
    pub hotspots: Vec<CrimeHotspot>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn governance_decodes_observer_body() {
        let raw = r#"{"governance_type": "Council", "leaders": [{
            "agent_id": "01945c2a-3b4f-7def-8a12-bc34567890ab", "agent_name": "Ada",
            "role": "Elder", "since_tick": 14}], "rules": [], "stability_score": "0.6",
            "recent_events": []}"#;
        let gov: Option<GovernanceSnapshot> = serde_json::from_str(raw).ok();
        assert_eq!(gov.as_ref().map(|g| g.governance_type), Some(GovernanceType::Council));
        assert_eq!(gov.map(|g| g.leaders.len()), Some(1));
    }

    #[test]
    fn crime_accepts_float_rates() {
        let raw = r#"{"crime_rate": "0.25", "crime_rate_history": [], "detection_rate": 0.0,
            "punishment_rate": 0.0, "justice_type": "Vigilante", "common_crimes": [],
            "serial_offenders": [], "hotspots": []}"#;
        let crime: Option<CrimeSnapshot> = serde_json::from_str(raw).ok();
        assert_eq!(crime.map(|c| c.justice_type), Some(JusticeType::Vigilante));
    }

    #[test]
    fn economy_rejects_unknown_model() {
        let raw = r#"{"model_type": "Feudal", "currency_resource": null,
            "currency_adoption_pct": "0", "trade_volume": 0}"#;
        assert!(serde_json::from_str::<EconomySnapshot>(raw).is_err());
    }
}
