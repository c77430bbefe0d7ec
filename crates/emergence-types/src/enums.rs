//! Enumerations that appear on the observer wire.
//!
//! Variant spellings match what the observer serializes: simulation enums
//! use their Rust variant names verbatim (`"Spring"`, `"TradeCompleted"`),
//! the decision source uses `snake_case`, and the social classifications
//! use the display strings the social endpoints emit. Any other spelling
//! is a schema violation and fails to decode.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// A season in the simulation's annual cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    /// Regeneration bonus.
    Spring,
    /// Baseline rates.
    Summer,
    /// Harvest bonus.
    Autumn,
    /// Scarcity.
    Winter,
}

/// Current weather conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weather {
    /// No weather effects.
    Clear,
    /// Slower travel, faster farm growth.
    Rain,
    /// Travel blocked.
    Storm,
    /// Farm growth stopped.
    Drought,
    /// Slow travel, structure decay.
    Snow,
}

/// The civilizational era reported in world snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Era {
    /// No organized society yet.
    Primitive,
    /// Groups have formed.
    Tribal,
    /// Farming discovered.
    Agricultural,
    /// Permanent structures established.
    Settlement,
    /// Metalworking discovered.
    Bronze,
    /// Advanced metalworking.
    Iron,
    /// Writing and governance.
    Classical,
    /// Complex institutions.
    Medieval,
    /// Manufacturing.
    Industrial,
    /// Full technology.
    Modern,
}

/// The quality of a route between two locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PathType {
    /// Wilderness.
    None,
    /// Cleared path.
    DirtTrail,
    /// Established foot traffic.
    WornPath,
    /// Constructed road.
    Road,
    /// Major infrastructure.
    Highway,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The category of an event in the observer's event log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventType {
    /// Beginning of a tick.
    TickStart,
    /// End of a tick.
    TickEnd,
    /// An agent entered the world.
    AgentBorn,
    /// An agent died.
    AgentDied,
    /// An agent submitted an action.
    ActionSubmitted,
    /// An action resolved successfully.
    ActionSucceeded,
    /// An action failed validation.
    ActionRejected,
    /// Resources were collected from a location.
    ResourceGathered,
    /// Resources were consumed.
    ResourceConsumed,
    /// Two agents exchanged resources.
    TradeCompleted,
    /// A trade fell through.
    TradeFailed,
    /// A structure was built.
    StructureBuilt,
    /// A structure collapsed or was demolished.
    StructureDestroyed,
    /// A structure was repaired.
    StructureRepaired,
    /// A route was upgraded.
    RouteImproved,
    /// A route degraded.
    RouteDegraded,
    /// A previously unknown location was found.
    LocationDiscovered,
    /// An agent learned a new concept.
    KnowledgeDiscovered,
    /// A concept was taught between agents.
    KnowledgeTaught,
    /// A message was sent.
    MessageSent,
    /// A social group was formed.
    GroupFormed,
    /// A relationship score changed.
    RelationshipChanged,
    /// A structure was claimed.
    StructureClaimed,
    /// A governance rule was created.
    RuleCreated,
    /// A governance rule was enforced.
    EnforcementApplied,
    /// The weather changed.
    WeatherChanged,
    /// The season changed.
    SeasonChanged,
    /// A theft succeeded.
    TheftOccurred,
    /// A theft attempt failed.
    TheftFailed,
    /// A fight started.
    CombatInitiated,
    /// A fight was resolved.
    CombatResolved,
    /// The ledger conservation check failed.
    LedgerAnomaly,
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

/// Which mechanism produced an agent decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionSource {
    /// The LLM backend decided.
    Llm,
    /// The routine-action rule engine decided instead of the LLM.
    RuleEngine,
    /// The night-cycle optimization put the agent to rest.
    NightCycle,
    /// The agent missed its deadline and was given `NoAction`.
    Timeout,
}

impl DecisionSource {
    /// The wire label for this source.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Llm => "llm",
            Self::RuleEngine => "rule_engine",
            Self::NightCycle => "night_cycle",
            Self::Timeout => "timeout",
        }
    }
}

// ---------------------------------------------------------------------------
// Social classifications
// ---------------------------------------------------------------------------

/// Governance structure inferred by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GovernanceType {
    /// No government. The baseline classification.
    Anarchy,
    /// A single chief.
    Chieftainship,
    /// A small council of elders.
    Council,
    /// Rule by a larger few.
    Oligarchy,
}

/// Economic model inferred by the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EconomicModel {
    /// No exchange. The baseline classification.
    Subsistence,
    /// Occasional one-way giving.
    Gift,
    /// Direct goods-for-goods exchange.
    Barter,
    /// A currency resource has majority adoption.
    Currency,
}

/// How justice is administered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum JusticeType {
    /// No justice mechanism.
    None,
    /// Victims retaliate on their own.
    Vigilante,
    /// Elders arbitrate.
    Elder,
    /// Written law.
    Codified,
}

// ---------------------------------------------------------------------------
// Operator
// ---------------------------------------------------------------------------

/// Why the simulation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimulationEndReason {
    /// The configured tick limit was reached.
    MaxTicksReached,
    /// The configured wall-clock limit was reached.
    MaxRealTimeReached,
    /// An operator stopped the run.
    OperatorStop,
    /// Every agent died.
    Extinction,
}

/// Alive/dead filter accepted by the agent list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Only living agents.
    Alive,
    /// Only dead agents.
    Dead,
    /// Everyone.
    #[default]
    All,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_source_uses_snake_case() {
        let json = serde_json::to_string(&DecisionSource::RuleEngine).unwrap_or_default();
        assert_eq!(json, "\"rule_engine\"");
        assert_eq!(DecisionSource::NightCycle.as_str(), "night_cycle");
    }

    #[test]
    fn out_of_enum_season_is_rejected() {
        let season: Result<Season, _> = serde_json::from_str("\"Monsoon\"");
        assert!(season.is_err());
        let lower: Result<Season, _> = serde_json::from_str("\"spring\"");
        assert!(lower.is_err());
    }

    #[test]
    fn social_classifications_use_display_strings() {
        let gov: Result<GovernanceType, _> = serde_json::from_str("\"Chieftainship\"");
        assert_eq!(gov.ok(), Some(GovernanceType::Chieftainship));
        let justice: Result<JusticeType, _> = serde_json::from_str("\"None\"");
        assert_eq!(justice.ok(), Some(JusticeType::None));
    }
}
