//! Toast notifications derived from the event log.
//!
//! Refreshes of `/api/events` return overlapping windows, so the same event
//! is seen many times. [`ToastCenter`] raises at most one toast per event
//! identity, only for notable event types, and keeps a small bounded set of
//! live toasts that expire on their own.
//!
//! # Categories
//!
//! Every [`EventType`] maps to exactly one [`ToastCategory`]; each category
//! except `System` points at the view a user would open to follow up.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use emergence_types::{Event, EventId, EventType};
use serde::Serialize;
use tokio::time::Instant;

use crate::config::AlertConfig;

/// Maximum toasts live at once.
pub const MAX_LIVE_TOASTS: usize = 5;

/// The seen-identity set is pruned once it grows beyond this size.
pub const SEEN_PRUNE_THRESHOLD: usize = 2000;

/// Identities kept after a prune (the most recently inserted).
pub const SEEN_RETAIN: usize = 1000;

/// How long a toast stays live unless dismissed.
pub const TOAST_TTL: Duration = Duration::from_secs(6);

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// Where a toast sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetView {
    /// Agent roster.
    Agents,
    /// Economy dashboard.
    Economy,
    /// World map.
    Map,
    /// Knowledge and discoveries.
    Knowledge,
    /// Social constructs.
    Social,
    /// Raw event log.
    Events,
}

/// Broad grouping of event types for notification purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastCategory {
    /// Births and deaths.
    Lifecycle,
    /// Gathering, consumption, trade.
    Economy,
    /// Structures and routes.
    Construction,
    /// New places and knowledge.
    Discovery,
    /// Messages, groups, relationships.
    Social,
    /// Rules and enforcement.
    Governance,
    /// Theft and combat.
    Conflict,
    /// Tick bookkeeping, actions, environment.
    System,
    /// Integrity violations.
    Anomaly,
}

impl ToastCategory {
    /// The category of an event type.
    pub const fn for_event(event_type: EventType) -> Self {
        match event_type {
            EventType::AgentBorn | EventType::AgentDied => Self::Lifecycle,
            EventType::ResourceGathered
            | EventType::ResourceConsumed
            | EventType::TradeCompleted
            | EventType::TradeFailed => Self::Economy,
            EventType::StructureBuilt
            | EventType::StructureDestroyed
            | EventType::StructureRepaired
            | EventType::StructureClaimed
            | EventType::RouteImproved
            | EventType::RouteDegraded => Self::Construction,
            EventType::LocationDiscovered
            | EventType::KnowledgeDiscovered
            | EventType::KnowledgeTaught => Self::Discovery,
            EventType::MessageSent | EventType::GroupFormed | EventType::RelationshipChanged => {
                Self::Social
            }
            EventType::RuleCreated | EventType::EnforcementApplied => Self::Governance,
            EventType::TheftOccurred
            | EventType::TheftFailed
            | EventType::CombatInitiated
            | EventType::CombatResolved => Self::Conflict,
            EventType::TickStart
            | EventType::TickEnd
            | EventType::ActionSubmitted
            | EventType::ActionSucceeded
            | EventType::ActionRejected
            | EventType::WeatherChanged
            | EventType::SeasonChanged => Self::System,
            EventType::LedgerAnomaly => Self::Anomaly,
        }
    }

    /// The view this category links to. `System` has none.
    pub const fn target_view(self) -> Option<TargetView> {
        match self {
            Self::Lifecycle => Some(TargetView::Agents),
            Self::Economy => Some(TargetView::Economy),
            Self::Construction => Some(TargetView::Map),
            Self::Discovery => Some(TargetView::Knowledge),
            Self::Social | Self::Governance => Some(TargetView::Social),
            Self::Conflict | Self::Anomaly => Some(TargetView::Events),
            Self::System => None,
        }
    }

    /// Lowercase label for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lifecycle => "lifecycle",
            Self::Economy => "economy",
            Self::Construction => "construction",
            Self::Discovery => "discovery",
            Self::Social => "social",
            Self::Governance => "governance",
            Self::Conflict => "conflict",
            Self::System => "system",
            Self::Anomaly => "anomaly",
        }
    }
}

/// Whether an event type is worth a toast.
pub const fn is_notable(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::AgentBorn
            | EventType::AgentDied
            | EventType::TradeCompleted
            | EventType::StructureBuilt
            | EventType::StructureDestroyed
            | EventType::LocationDiscovered
            | EventType::KnowledgeDiscovered
            | EventType::GroupFormed
            | EventType::RuleCreated
            | EventType::TheftOccurred
            | EventType::CombatResolved
            | EventType::LedgerAnomaly
    )
}

// ---------------------------------------------------------------------------
// Toasts
// ---------------------------------------------------------------------------

/// A user-facing notification for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToastAlert {
    /// Monotonic identifier, starting at 1.
    pub id: u64,
    /// Category of the underlying event.
    pub category: ToastCategory,
    /// Human-readable text.
    pub message: String,
    /// Where to follow up.
    pub target_view: Option<TargetView>,
    /// Tick of the underlying event.
    pub tick: u64,
    /// The underlying event.
    pub event_id: EventId,
}

/// A toast plus its deadline.
#[derive(Debug, Clone)]
struct LiveToast {
    /// The toast.
    alert: ToastAlert,
    /// When it stops being live.
    expires_at: Instant,
}

/// Deduplicates events and tracks live toasts.
#[derive(Debug, Clone)]
pub struct ToastCenter {
    /// Identities already observed.
    seen: HashSet<EventId>,
    /// Insertion order of `seen`, oldest at the front.
    seen_order: VecDeque<EventId>,
    /// Live toasts, oldest at the front.
    live: VecDeque<LiveToast>,
    /// Next toast id.
    next_id: u64,
    /// Bound on `live`.
    max_live: usize,
    /// Toast lifetime.
    ttl: Duration,
}

impl ToastCenter {
    /// Create a center with the default limits.
    pub fn new() -> Self {
        Self::with_limits(MAX_LIVE_TOASTS, TOAST_TTL)
    }

    /// Create a center with custom limits. A zero live bound is treated as one.
    pub fn with_limits(max_live: usize, ttl: Duration) -> Self {
        Self {
            seen: HashSet::new(),
            seen_order: VecDeque::new(),
            live: VecDeque::new(),
            next_id: 1,
            max_live: max_live.max(1),
            ttl,
        }
    }

    /// Create a center from the `alerts` config section.
    pub fn from_config(config: &AlertConfig) -> Self {
        Self::with_limits(config.max_live, config.ttl())
    }

    /// Observe an event at time `now`.
    ///
    /// Returns the new toast if the event is unseen and notable. Raising a
    /// toast beyond the live bound evicts the oldest live toast.
    pub fn observe(&mut self, event: &Event, now: Instant) -> Option<ToastAlert> {
        if !self.remember(event.id) {
            return None;
        }
        if !is_notable(event.event_type) {
            return None;
        }

        self.expire(now);

        let category = ToastCategory::for_event(event.event_type);
        let alert = ToastAlert {
            id: self.next_id,
            category,
            message: toast_message(event),
            target_view: category.target_view(),
            tick: event.tick,
            event_id: event.id,
        };
        self.next_id = self.next_id.saturating_add(1);

        self.live.push_back(LiveToast {
            alert: alert.clone(),
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        });
        while self.live.len() > self.max_live {
            self.live.pop_front();
        }

        Some(alert)
    }

    /// Dismiss a toast before it expires. Returns whether it was live.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.live.len();
        self.live.retain(|toast| toast.alert.id != id);
        self.live.len() != before
    }

    /// Drop toasts whose deadline has passed. Returns how many were dropped.
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.live.len();
        self.live.retain(|toast| toast.expires_at > now);
        before.saturating_sub(self.live.len())
    }

    /// Toasts still live at `now`, oldest first.
    pub fn live(&self, now: Instant) -> Vec<ToastAlert> {
        self.live
            .iter()
            .filter(|toast| toast.expires_at > now)
            .map(|toast| toast.alert.clone())
            .collect()
    }

    /// Number of identities currently remembered.
    pub fn seen_len(&self) -> usize {
        self.seen.len()
    }

    /// Record an identity. Returns `false` if it was already known.
    fn remember(&mut self, id: EventId) -> bool {
        if !self.seen.insert(id) {
            return false;
        }
        self.seen_order.push_back(id);

        if self.seen_order.len() > SEEN_PRUNE_THRESHOLD {
            while self.seen_order.len() > SEEN_RETAIN {
                if let Some(oldest) = self.seen_order.pop_front() {
                    self.seen.remove(&oldest);
                }
            }
        }
        true
    }
}

impl Default for ToastCenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Human-readable text for a notable event.
fn toast_message(event: &Event) -> String {
    match event.event_type {
        EventType::AgentBorn => "A new agent was born".to_owned(),
        EventType::AgentDied => match (event.detail_str("cause"), event.detail_u64("final_age")) {
            (Some(cause), Some(age)) => format!("An agent died of {cause} at age {age}"),
            (Some(cause), None) => format!("An agent died of {cause}"),
            _ => "An agent died".to_owned(),
        },
        EventType::TradeCompleted => "A trade was completed".to_owned(),
        EventType::StructureBuilt => event.detail_str("structure_type").map_or_else(
            || "A structure was built".to_owned(),
            |kind| format!("A {kind} was built"),
        ),
        EventType::StructureDestroyed => event.detail_str("structure_type").map_or_else(
            || "A structure was destroyed".to_owned(),
            |kind| format!("A {kind} was destroyed"),
        ),
        EventType::LocationDiscovered => "A new location was discovered".to_owned(),
        EventType::KnowledgeDiscovered => event.detail_str("knowledge").map_or_else(
            || "New knowledge was discovered".to_owned(),
            |knowledge| format!("Discovered: {knowledge}"),
        ),
        EventType::GroupFormed => event.detail_str("group_name").map_or_else(
            || "A group was formed".to_owned(),
            |name| format!("Group formed: {name}"),
        ),
        EventType::RuleCreated => event.detail_str("rule_name").map_or_else(
            || "A rule was created".to_owned(),
            |name| format!("Rule created: {name}"),
        ),
        EventType::TheftOccurred => "A theft occurred".to_owned(),
        EventType::CombatResolved => "A fight was resolved".to_owned(),
        EventType::LedgerAnomaly => "LEDGER_ANOMALY: conservation law violated".to_owned(),
        other => format!("{other:?}"),
    }
}
