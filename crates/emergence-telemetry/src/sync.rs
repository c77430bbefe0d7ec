//! Push-triggers-pull synchronization.
//!
//! The tick stream only carries coarse counters. Everything else is pulled
//! from the query API, and the stream decides when: every accepted frame
//! with a new tick fires a fixed set of snapshot refreshes. Every
//! `analytics_every_ticks` new ticks the decision window and the five
//! social snapshots are refreshed as well.
//!
//! Refreshes are independent spawned tasks. They never block the stream,
//! run concurrently with each other, and write into their own slot of
//! [`SyncedState`]; the last write wins. A failed refresh is logged and
//! leaves the previous value in place until the next trigger.

use std::future::Future;
use std::sync::Arc;

use emergence_types::{
    AgentList, BeliefSnapshot, CrimeSnapshot, DecisionList, EconomySnapshot, Event, EventList,
    FamilySnapshot, GovernanceSnapshot, LocationList, RouteList, StreamFrame, WorldResponse,
};
use serde::Serialize;
use tokio::sync::{RwLock, RwLockReadGuard, broadcast};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::alerts::{ToastAlert, ToastCenter};
use crate::api::{AgentFilter, DecisionFilter, EventFilter, Queries};
use crate::config::{AlertConfig, SyncConfig};
use crate::decisions::DecisionReport;
use crate::error::ApiError;
use crate::milestones::{CivilizationMilestone, build_milestones};

/// Capacity of the broadcast channel for sync updates.
pub const UPDATE_BROADCAST_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// One refreshable slot of [`SyncedState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    /// `/api/world`.
    World,
    /// `/api/agents`.
    Agents,
    /// `/api/locations`.
    Locations,
    /// `/api/routes`.
    Routes,
    /// `/api/events`.
    Events,
    /// `/api/decisions`, with the derived report.
    Decisions,
    /// `/api/social/beliefs`.
    Beliefs,
    /// `/api/social/governance`.
    Governance,
    /// `/api/social/families`.
    Families,
    /// `/api/social/economy`.
    Economy,
    /// `/api/social/crime`.
    Crime,
}

impl Slot {
    /// Slots refreshed on every new tick.
    pub const PER_TICK: [Self; 5] = [
        Self::World,
        Self::Agents,
        Self::Locations,
        Self::Routes,
        Self::Events,
    ];

    /// Slots refreshed on the analytics cadence.
    pub const ANALYTICS: [Self; 6] = [
        Self::Decisions,
        Self::Beliefs,
        Self::Governance,
        Self::Families,
        Self::Economy,
        Self::Crime,
    ];

    /// The endpoint path, for logs.
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::World => "/api/world",
            Self::Agents => "/api/agents",
            Self::Locations => "/api/locations",
            Self::Routes => "/api/routes",
            Self::Events => "/api/events",
            Self::Decisions => "/api/decisions",
            Self::Beliefs => "/api/social/beliefs",
            Self::Governance => "/api/social/governance",
            Self::Families => "/api/social/families",
            Self::Economy => "/api/social/economy",
            Self::Crime => "/api/social/crime",
        }
    }
}

/// Something observable that the coordinator produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncUpdate {
    /// A slot received a fresh value.
    Refreshed(Slot),
    /// A new toast was raised.
    Toast(ToastAlert),
}

/// Latest query results and everything derived from them.
///
/// Each field is `None` until its first successful refresh.
#[derive(Debug, Clone, Default)]
pub struct SyncedState {
    /// World snapshot.
    pub world: Option<WorldResponse>,
    /// Agent roster.
    pub agents: Option<AgentList>,
    /// Locations.
    pub locations: Option<LocationList>,
    /// Routes.
    pub routes: Option<RouteList>,
    /// Recent events.
    pub events: Option<EventList>,
    /// Recent decisions.
    pub decisions: Option<DecisionList>,
    /// Streaks, badges and cost statistics over [`SyncedState::decisions`].
    pub decision_report: Option<DecisionReport>,
    /// Belief systems.
    pub beliefs: Option<BeliefSnapshot>,
    /// Governance.
    pub governance: Option<GovernanceSnapshot>,
    /// Families.
    pub families: Option<FamilySnapshot>,
    /// Economy.
    pub economy: Option<EconomySnapshot>,
    /// Crime.
    pub crime: Option<CrimeSnapshot>,
    /// Timeline rebuilt from the social snapshots.
    pub milestones: Vec<CivilizationMilestone>,
    /// Toast deduplication and live set.
    pub toasts: ToastCenter,
}

impl SyncedState {
    /// Create empty state with the given toast limits.
    pub fn new(alerts: &AlertConfig) -> Self {
        Self {
            toasts: ToastCenter::from_config(alerts),
            ..Self::default()
        }
    }

    /// Store a decision window and rebuild its report.
    pub fn set_decisions(&mut self, decisions: DecisionList) {
        self.decision_report = Some(DecisionReport::build(&decisions.decisions));
        self.decisions = Some(decisions);
    }

    /// Rebuild the milestone timeline from whatever social snapshots exist.
    pub fn rebuild_milestones(&mut self) {
        self.milestones = build_milestones(
            self.beliefs.as_ref(),
            self.governance.as_ref(),
            self.families.as_ref(),
            self.economy.as_ref(),
            self.crime.as_ref(),
        );
    }

    /// Store an event window and run it through the toast center.
    ///
    /// Events are observed oldest first so toast ids follow event order.
    /// Returns the toasts raised.
    pub fn set_events(&mut self, events: EventList, now: Instant) -> Vec<ToastAlert> {
        let mut ordered: Vec<&Event> = events.events.iter().collect();
        ordered.sort_by_key(|event| event.tick);

        let raised = ordered
            .into_iter()
            .filter_map(|event| self.toasts.observe(event, now))
            .collect();
        self.events = Some(events);
        raised
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Cheap, cloneable view of the coordinator's state.
#[derive(Clone)]
pub struct SyncHandle {
    /// Shared state.
    state: Arc<RwLock<SyncedState>>,
    /// Update feed.
    updates: broadcast::Sender<SyncUpdate>,
}

impl SyncHandle {
    /// Read access to the synced state.
    pub async fn read(&self) -> RwLockReadGuard<'_, SyncedState> {
        self.state.read().await
    }

    /// Subscribe to refresh and toast notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncUpdate> {
        self.updates.subscribe()
    }

    /// The current milestone timeline.
    pub async fn milestones(&self) -> Vec<CivilizationMilestone> {
        self.state.read().await.milestones.clone()
    }

    /// The latest decision report, if decisions were fetched.
    pub async fn decision_report(&self) -> Option<DecisionReport> {
        self.state.read().await.decision_report.clone()
    }

    /// Toasts that have not expired.
    pub async fn live_toasts(&self) -> Vec<ToastAlert> {
        self.state.read().await.toasts.live(Instant::now())
    }

    /// Dismiss a toast. Returns whether it was live.
    pub async fn dismiss_toast(&self, id: u64) -> bool {
        self.state.write().await.toasts.dismiss(id)
    }
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Fires query refreshes in response to accepted stream frames.
pub struct SyncCoordinator<Q: Queries> {
    /// Query backend.
    queries: Arc<Q>,
    /// Shared results.
    state: Arc<RwLock<SyncedState>>,
    /// Update feed.
    updates: broadcast::Sender<SyncUpdate>,
    /// Limits and cadence.
    config: SyncConfig,
    /// Teardown.
    cancel: CancellationToken,
    /// Tick of the last frame that fired refreshes.
    last_tick: Option<u64>,
    /// Number of distinct ticks seen so far.
    ticks_seen: u64,
}

impl<Q: Queries> SyncCoordinator<Q> {
    /// Create a coordinator over `queries`.
    pub fn new(queries: Arc<Q>, config: SyncConfig, alerts: &AlertConfig) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_BROADCAST_CAPACITY);
        Self {
            queries,
            state: Arc::new(RwLock::new(SyncedState::new(alerts))),
            updates,
            config,
            cancel: CancellationToken::new(),
            last_tick: None,
            ticks_seen: 0,
        }
    }

    /// Share a teardown token with other tasks.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle onto this coordinator's state.
    pub fn handle(&self) -> SyncHandle {
        SyncHandle {
            state: Arc::clone(&self.state),
            updates: self.updates.clone(),
        }
    }

    /// React to one accepted frame.
    ///
    /// Returns the slots whose refresh was spawned; empty when the tick
    /// repeats the previous one.
    pub fn on_frame(&mut self, frame: &StreamFrame) -> Vec<Slot> {
        if self.last_tick == Some(frame.tick) {
            return Vec::new();
        }
        self.last_tick = Some(frame.tick);

        let analytics = self.config.analytics_every_ticks > 0
            && self
                .ticks_seen
                .checked_rem(self.config.analytics_every_ticks)
                .is_some_and(|r| r == 0);
        self.ticks_seen = self.ticks_seen.saturating_add(1);

        let mut slots = Slot::PER_TICK.to_vec();
        if analytics {
            slots.extend(Slot::ANALYTICS);
        }
        debug!(tick = frame.tick, analytics, "firing refreshes");
        for slot in &slots {
            self.spawn_slot(*slot);
        }
        slots
    }

    /// Run until cancelled or the frame feed closes.
    pub async fn run(mut self, mut frames: broadcast::Receiver<StreamFrame>) {
        info!("sync coordinator started");
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => break,
                received = frames.recv() => match received {
                    Ok(frame) => {
                        self.on_frame(&frame);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        debug!(skipped = n, "sync coordinator lagged behind the frame feed");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
        info!("sync coordinator stopped");
    }

    /// Spawn [`SyncCoordinator::run`] on the current runtime.
    pub fn spawn(self, frames: broadcast::Receiver<StreamFrame>) -> (SyncHandle, JoinHandle<()>) {
        let handle = self.handle();
        let task = tokio::spawn(self.run(frames));
        (handle, task)
    }

    /// Spawn the refresh for one slot.
    fn spawn_slot(&self, slot: Slot) {
        let q = Arc::clone(&self.queries);
        match slot {
            Slot::World => self.spawn_refresh(slot, async move { q.world().await }, |s, v| {
                s.world = Some(v);
            }),
            Slot::Agents => self.spawn_refresh(
                slot,
                async move { q.agents(&AgentFilter::default()).await },
                |s, v| s.agents = Some(v),
            ),
            Slot::Locations => {
                self.spawn_refresh(slot, async move { q.locations().await }, |s, v| {
                    s.locations = Some(v);
                });
            }
            Slot::Routes => self.spawn_refresh(slot, async move { q.routes().await }, |s, v| {
                s.routes = Some(v);
            }),
            Slot::Events => self.spawn_events(),
            Slot::Decisions => {
                let filter = DecisionFilter {
                    limit: Some(self.config.decision_limit),
                    ..DecisionFilter::default()
                };
                self.spawn_refresh(
                    slot,
                    async move { q.decisions(&filter).await },
                    SyncedState::set_decisions,
                );
            }
            Slot::Beliefs => self.spawn_refresh(slot, async move { q.beliefs().await }, |s, v| {
                s.beliefs = Some(v);
                s.rebuild_milestones();
            }),
            Slot::Governance => {
                self.spawn_refresh(slot, async move { q.governance().await }, |s, v| {
                    s.governance = Some(v);
                    s.rebuild_milestones();
                });
            }
            Slot::Families => {
                self.spawn_refresh(slot, async move { q.families().await }, |s, v| {
                    s.families = Some(v);
                    s.rebuild_milestones();
                });
            }
            Slot::Economy => self.spawn_refresh(slot, async move { q.economy().await }, |s, v| {
                s.economy = Some(v);
                s.rebuild_milestones();
            }),
            Slot::Crime => self.spawn_refresh(slot, async move { q.crime().await }, |s, v| {
                s.crime = Some(v);
                s.rebuild_milestones();
            }),
        }
    }

    /// Spawn the events refresh, which also raises toasts.
    fn spawn_events(&self) {
        let q = Arc::clone(&self.queries);
        let filter = EventFilter {
            limit: Some(self.config.event_limit),
            ..EventFilter::default()
        };
        let updates = self.updates.clone();
        self.spawn_refresh(
            Slot::Events,
            async move { q.events(&filter).await },
            move |state, events| {
                for toast in state.set_events(events, Instant::now()) {
                    info!(
                        toast_id = toast.id,
                        category = toast.category.as_str(),
                        tick = toast.tick,
                        "{}",
                        toast.message
                    );
                    // Err only means nobody is subscribed right now.
                    updates.send(SyncUpdate::Toast(toast)).ok();
                }
            },
        );
    }

    /// Spawn one fetch-then-store task.
    ///
    /// The store runs under the write lock and only if the coordinator has
    /// not been torn down in the meantime.
    fn spawn_refresh<T, F>(
        &self,
        slot: Slot,
        fetch: F,
        store: impl FnOnce(&mut SyncedState, T) + Send + 'static,
    ) where
        T: Send + 'static,
        F: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let state = Arc::clone(&self.state);
        let updates = self.updates.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                result = fetch => result,
            };

            match result {
                Ok(value) => {
                    let mut guard = state.write().await;
                    if cancel.is_cancelled() {
                        return;
                    }
                    store(&mut guard, value);
                    drop(guard);
                    updates.send(SyncUpdate::Refreshed(slot)).ok();
                }
                Err(e) => {
                    warn!(endpoint = slot.endpoint(), error = %e, "refresh failed, keeping previous value");
                }
            }
        });
    }
}
