//! Wire types for the Emergence observer API.
//!
//! Every record the telemetry client receives, from the per-tick stream
//! frame to the social construct snapshots, is defined here with the exact
//! shape the observer serializes. Decoding is strict about field types and
//! enum membership and lenient about unknown extra fields.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for entity identifiers
//! - [`enums`] -- Enumerations (environment, events, decisions, social)
//! - [`stream`] -- The per-tick stream frame
//! - [`world`] -- World snapshots
//! - [`catalog`] -- Agents, locations, and routes
//! - [`events`] -- Event log rows
//! - [`decisions`] -- Decision log rows
//! - [`social`] -- Social construct snapshots
//! - [`operator`] -- Operator status and control bodies

pub mod catalog;
pub mod decisions;
pub mod enums;
pub mod events;
pub mod ids;
pub mod operator;
pub mod social;
pub mod stream;
pub mod world;

// Re-export all public types at crate root for convenience.
pub use catalog::{
    AgentDetail, AgentIdentity, AgentList, AgentStateView, AgentSummary, AgentVitals,
    LocationDetail, LocationList, LocationRecord, LocationSummary, Occupant, ResourceNode, Route,
    RouteList,
};
pub use decisions::{DecisionList, DecisionRecord};
pub use enums::{
    AgentStatus, DecisionSource, EconomicModel, Era, EventType, GovernanceType, JusticeType,
    PathType, Season, SimulationEndReason, Weather,
};
pub use events::{Event, EventList, WorldContext};
pub use ids::{AgentId, EventId, LocationId, RouteId};
pub use operator::{InjectEventRequest, OperatorAck, SetSpeedRequest, SimulationStatus, SpeedChange};
pub use social::{
    BeliefEvent, BeliefSnapshot, BeliefSystem, CrimeCount, CrimeHotspot, CrimeSnapshot,
    EconomySnapshot, FamilySnapshot, FamilyUnit, GovernanceEvent, GovernanceSnapshot, Leader,
    LineageNode, MarketLocation, SerialOffender,
};
pub use stream::StreamFrame;
pub use world::{EconomyStats, MinimalWorld, PopulationStats, WorldResponse, WorldSnapshot};
