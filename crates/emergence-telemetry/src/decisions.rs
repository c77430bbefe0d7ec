//! Analytics over a window of decision records.
//!
//! Two derived products are computed from the same slice:
//!
//! - **Override streaks.** For each agent, the number of newest decisions in
//!   a row that came from the rule engine rather than the LLM. A long streak
//!   means the agent is looping on a routine action; at
//!   [`STUCK_THRESHOLD`] it is reported as stuck.
//! - **Cost statistics.** Total spend, token usage, per-source counts, and
//!   averages. Money stays in [`Decimal`] throughout.

use std::collections::{BTreeMap, BTreeSet};

use emergence_types::{AgentId, DecisionRecord, DecisionSource};
use rust_decimal::Decimal;
use serde::Serialize;

/// Streaks shorter than this are not recorded.
pub const MIN_STREAK: u32 = 2;

/// A streak at or above this length marks the agent as stuck.
pub const STUCK_THRESHOLD: u32 = 10;

/// Rule name used when a streak's newest decision carries none.
const UNKNOWN_RULE: &str = "unknown";

// ---------------------------------------------------------------------------
// Override streaks
// ---------------------------------------------------------------------------

/// Consecutive rule engine decisions for one agent, counted from the newest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverrideStreak {
    /// Length of the streak.
    pub count: u32,
    /// Rule matched by the newest decision in the streak.
    pub rule: String,
}

impl OverrideStreak {
    /// Whether the agent is looping.
    pub const fn is_stuck(&self) -> bool {
        self.count >= STUCK_THRESHOLD
    }
}

/// Compute override streaks for every agent in `decisions`.
///
/// Input order does not matter except between decisions of the same agent
/// at the same tick, where earlier input is treated as newer. Agents whose
/// streak is shorter than [`MIN_STREAK`] are absent from the result.
pub fn detect_override_streaks(decisions: &[DecisionRecord]) -> BTreeMap<AgentId, OverrideStreak> {
    let mut by_agent: BTreeMap<AgentId, Vec<&DecisionRecord>> = BTreeMap::new();
    for decision in decisions {
        by_agent.entry(decision.agent_id).or_default().push(decision);
    }

    let mut streaks = BTreeMap::new();
    for (agent_id, mut records) in by_agent {
        records.sort_by(|a, b| b.tick.cmp(&a.tick));

        let count = records
            .iter()
            .take_while(|d| d.decision_source == DecisionSource::RuleEngine)
            .count();
        let count = u32::try_from(count).unwrap_or(u32::MAX);
        if count < MIN_STREAK {
            continue;
        }

        let rule = records
            .first()
            .and_then(|d| d.rule_matched.clone())
            .unwrap_or_else(|| UNKNOWN_RULE.to_owned());
        streaks.insert(agent_id, OverrideStreak { count, rule });
    }
    streaks
}

/// Place each agent's streak on its single most recent decision.
///
/// The result is aligned with `decisions`: position `i` holds the badge for
/// `decisions[i]`, and every other decision of that agent gets `None`.
pub fn streak_badges(
    decisions: &[DecisionRecord],
    streaks: &BTreeMap<AgentId, OverrideStreak>,
) -> Vec<Option<OverrideStreak>> {
    let mut newest: BTreeMap<AgentId, (usize, u64)> = BTreeMap::new();
    for (index, decision) in decisions.iter().enumerate() {
        newest
            .entry(decision.agent_id)
            .and_modify(|slot| {
                if decision.tick > slot.1 {
                    *slot = (index, decision.tick);
                }
            })
            .or_insert((index, decision.tick));
    }

    let mut badges = vec![None; decisions.len()];
    for (agent_id, (index, _)) in newest {
        if let (Some(streak), Some(badge)) = (streaks.get(&agent_id), badges.get_mut(index)) {
            *badge = Some(streak.clone());
        }
    }
    badges
}

// ---------------------------------------------------------------------------
// Cost statistics
// ---------------------------------------------------------------------------

/// Decision counts per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SourceCounts {
    /// LLM decisions.
    pub llm: u32,
    /// Rule engine decisions.
    pub rule_engine: u32,
    /// Night-cycle rests.
    pub night_cycle: u32,
    /// Deadline misses.
    pub timeout: u32,
}

impl SourceCounts {
    /// Count one decision from `source`.
    pub const fn record(&mut self, source: DecisionSource) {
        let slot = match source {
            DecisionSource::Llm => &mut self.llm,
            DecisionSource::RuleEngine => &mut self.rule_engine,
            DecisionSource::NightCycle => &mut self.night_cycle,
            DecisionSource::Timeout => &mut self.timeout,
        };
        *slot = slot.saturating_add(1);
    }

    /// Count for one source.
    pub const fn get(&self, source: DecisionSource) -> u32 {
        match source {
            DecisionSource::Llm => self.llm,
            DecisionSource::RuleEngine => self.rule_engine,
            DecisionSource::NightCycle => self.night_cycle,
            DecisionSource::Timeout => self.timeout,
        }
    }
}

/// Aggregate statistics over a decision window.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DecisionStats {
    /// Number of decisions in the window.
    pub decision_count: u32,
    /// Sum of reported costs.
    pub total_cost: Decimal,
    /// Sum of prompt tokens.
    pub prompt_tokens: u64,
    /// Sum of completion tokens.
    pub completion_tokens: u64,
    /// Decisions per source.
    pub sources: SourceCounts,
    /// Number of distinct ticks in the window.
    pub distinct_ticks: u32,
    /// `total_cost / distinct_ticks`, zero when the window is empty.
    pub avg_cost_per_tick: Decimal,
    /// Mean latency over decisions that reported one.
    pub avg_latency_ms: Option<f64>,
}

impl DecisionStats {
    /// Aggregate a window of decisions.
    pub fn compute(decisions: &[DecisionRecord]) -> Self {
        let mut stats = Self::default();
        let mut ticks = BTreeSet::new();
        let mut latency_sum = 0.0_f64;
        let mut latency_count = 0_u32;

        for decision in decisions {
            stats.decision_count = stats.decision_count.saturating_add(1);
            stats.sources.record(decision.decision_source);
            ticks.insert(decision.tick);

            if let Some(cost) = decision.cost_usd {
                stats.total_cost = stats.total_cost.saturating_add(cost);
            }
            if let Some(tokens) = decision.prompt_tokens {
                stats.prompt_tokens = stats.prompt_tokens.saturating_add(u64::from(tokens));
            }
            if let Some(tokens) = decision.completion_tokens {
                stats.completion_tokens = stats.completion_tokens.saturating_add(u64::from(tokens));
            }
            if let Some(latency) = decision.latency_ms {
                latency_sum += latency;
                latency_count = latency_count.saturating_add(1);
            }
        }

        stats.distinct_ticks = u32::try_from(ticks.len()).unwrap_or(u32::MAX);
        stats.avg_cost_per_tick = stats
            .total_cost
            .checked_div(Decimal::from(stats.distinct_ticks))
            .unwrap_or(Decimal::ZERO);
        if latency_count > 0 {
            stats.avg_latency_ms = Some(latency_sum / f64::from(latency_count));
        }
        stats
    }

    /// Share of decisions made by the LLM, as a fraction in `[0, 1]`.
    pub fn llm_share(&self) -> Decimal {
        Decimal::from(self.sources.llm)
            .checked_div(Decimal::from(self.decision_count))
            .unwrap_or(Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Everything derived from one decision refresh.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DecisionReport {
    /// Aggregate statistics.
    pub stats: DecisionStats,
    /// Override streaks by agent.
    pub streaks: BTreeMap<AgentId, OverrideStreak>,
    /// Streak badges aligned with the decision window, see [`streak_badges`].
    pub badges: Vec<Option<OverrideStreak>>,
}

impl DecisionReport {
    /// Build a report from a window of decisions.
    pub fn build(decisions: &[DecisionRecord]) -> Self {
        let streaks = detect_override_streaks(decisions);
        Self {
            stats: DecisionStats::compute(decisions),
            badges: streak_badges(decisions, &streaks),
            streaks,
        }
    }

    /// Badge for the decision at `index` in the window, if it carries one.
    pub fn badge(&self, index: usize) -> Option<&OverrideStreak> {
        self.badges.get(index).and_then(Option::as_ref)
    }

    /// Agents whose streak has reached [`STUCK_THRESHOLD`].
    pub fn stuck_agents(&self) -> Vec<(AgentId, &OverrideStreak)> {
        self.streaks
            .iter()
            .filter(|(_, streak)| streak.is_stuck())
            .map(|(agent_id, streak)| (*agent_id, streak))
            .collect()
    }
}
