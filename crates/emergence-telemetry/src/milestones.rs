//! Civilization timeline built from the five social snapshots.
//!
//! Each snapshot is fetched independently and any of them may be missing
//! (never fetched yet, or the last fetch failed). [`build_milestones`] is a
//! pure function of whatever is available: a missing snapshot contributes
//! nothing, and the output order depends only on the inputs.
//!
//! Milestones that cannot be dated from the snapshot carry tick `0`.

use emergence_types::{
    BeliefSnapshot, CrimeSnapshot, EconomicModel, EconomySnapshot, FamilySnapshot,
    GovernanceSnapshot, GovernanceType, JusticeType,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Tick used for milestones the snapshots do not date.
pub const UNDATED: u64 = 0;

/// Belief event kind that duplicates the belief system itself.
const FOUNDED_EVENT: &str = "founded";

/// The institution a milestone belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneCategory {
    /// Shared beliefs.
    Belief,
    /// Crime and justice.
    Crime,
    /// Exchange and currency.
    Economy,
    /// Families and lineage.
    Family,
    /// Leadership and rules.
    Governance,
}

impl MilestoneCategory {
    /// Lowercase name, also the tie-break key when sorting.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Belief => "belief",
            Self::Crime => "crime",
            Self::Economy => "economy",
            Self::Family => "family",
            Self::Governance => "governance",
        }
    }
}

/// A dated first occurrence in the civilization's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CivilizationMilestone {
    /// Tick of the occurrence, [`UNDATED`] if unknown.
    pub tick: u64,
    /// Institution concerned.
    pub category: MilestoneCategory,
    /// Short title.
    pub label: String,
    /// One-sentence description.
    pub description: String,
}

impl CivilizationMilestone {
    fn new(
        tick: u64,
        category: MilestoneCategory,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            tick,
            category,
            label: label.into(),
            description: description.into(),
        }
    }
}

/// Merge the available social snapshots into one ordered timeline.
///
/// Sorted by tick ascending, then by category name; milestones that tie on
/// both keep the order in which they were derived.
pub fn build_milestones(
    beliefs: Option<&BeliefSnapshot>,
    governance: Option<&GovernanceSnapshot>,
    families: Option<&FamilySnapshot>,
    economy: Option<&EconomySnapshot>,
    crime: Option<&CrimeSnapshot>,
) -> Vec<CivilizationMilestone> {
    let mut milestones = Vec::new();

    if let Some(beliefs) = beliefs {
        belief_milestones(beliefs, &mut milestones);
    }
    if let Some(governance) = governance {
        governance_milestones(governance, &mut milestones);
    }
    if let Some(families) = families {
        family_milestones(families, &mut milestones);
    }
    if let Some(economy) = economy {
        economy_milestones(economy, &mut milestones);
    }
    if let Some(crime) = crime {
        crime_milestones(crime, &mut milestones);
    }

    milestones.sort_by(|a, b| {
        a.tick
            .cmp(&b.tick)
            .then_with(|| a.category.as_str().cmp(b.category.as_str()))
    });
    milestones
}

// ---------------------------------------------------------------------------
// Per-source rules
// ---------------------------------------------------------------------------

fn belief_milestones(snapshot: &BeliefSnapshot, out: &mut Vec<CivilizationMilestone>) {
    for system in &snapshot.belief_systems {
        out.push(CivilizationMilestone::new(
            system.founded_at_tick,
            MilestoneCategory::Belief,
            format!("{} founded", system.name),
            format!(
                "A belief system emerged with {} adherents",
                system.adherent_count
            ),
        ));
    }
    for event in snapshot
        .belief_events
        .iter()
        .filter(|e| e.event_type != FOUNDED_EVENT)
    {
        let description = if event.description.is_empty() {
            format!("{} ({})", event.belief_system_name, event.event_type)
        } else {
            event.description.clone()
        };
        out.push(CivilizationMilestone::new(
            event.tick,
            MilestoneCategory::Belief,
            format!("{}: {}", event.belief_system_name, event.event_type),
            description,
        ));
    }
}

fn governance_milestones(snapshot: &GovernanceSnapshot, out: &mut Vec<CivilizationMilestone>) {
    if snapshot.governance_type != GovernanceType::Anarchy {
        let since = snapshot
            .leaders
            .iter()
            .map(|leader| leader.since_tick)
            .min()
            .unwrap_or(UNDATED);
        out.push(CivilizationMilestone::new(
            since,
            MilestoneCategory::Governance,
            format!("{:?} established", snapshot.governance_type),
            format!(
                "Agents organized under {} leader(s)",
                snapshot.leaders.len()
            ),
        ));
    }
    for event in &snapshot.recent_events {
        let description = if event.description.is_empty() {
            event.event_type.clone()
        } else {
            event.description.clone()
        };
        out.push(CivilizationMilestone::new(
            event.tick,
            MilestoneCategory::Governance,
            event.event_type.clone(),
            description,
        ));
    }
}

fn family_milestones(snapshot: &FamilySnapshot, out: &mut Vec<CivilizationMilestone>) {
    let Some(first) = snapshot.families.iter().min_by_key(|f| f.formed_at_tick) else {
        return;
    };
    out.push(CivilizationMilestone::new(
        first.formed_at_tick,
        MilestoneCategory::Family,
        "First family",
        format!("{} formed with {} members", first.name, first.members.len()),
    ));
    if snapshot.marriage_count > 0 {
        out.push(CivilizationMilestone::new(
            first.formed_at_tick,
            MilestoneCategory::Family,
            "First marriage",
            format!("{} marriages recorded", snapshot.marriage_count),
        ));
    }
    if snapshot.longest_lineage > 1 {
        out.push(CivilizationMilestone::new(
            UNDATED,
            MilestoneCategory::Family,
            "Multi-generation lineage",
            format!("Longest lineage spans {} generations", snapshot.longest_lineage),
        ));
    }
}

fn economy_milestones(snapshot: &EconomySnapshot, out: &mut Vec<CivilizationMilestone>) {
    if snapshot.model_type == EconomicModel::Subsistence {
        return;
    }
    out.push(CivilizationMilestone::new(
        UNDATED,
        MilestoneCategory::Economy,
        format!("{:?} economy", snapshot.model_type),
        format!("Trade volume reached {}", snapshot.trade_volume),
    ));
    // Currency only counts once the economy has left subsistence.
    if let Some(currency) = &snapshot.currency_resource {
        out.push(CivilizationMilestone::new(
            UNDATED,
            MilestoneCategory::Economy,
            "Currency adopted",
            format!(
                "{currency} is used as currency by {}% of traders",
                snapshot.currency_adoption_pct
            ),
        ));
    }
}

fn crime_milestones(snapshot: &CrimeSnapshot, out: &mut Vec<CivilizationMilestone>) {
    if snapshot.crime_rate != Decimal::ZERO {
        out.push(CivilizationMilestone::new(
            UNDATED,
            MilestoneCategory::Crime,
            "Crime appears",
            format!("Crime rate is {}", snapshot.crime_rate),
        ));
    }
    if snapshot.justice_type != JusticeType::None {
        out.push(CivilizationMilestone::new(
            UNDATED,
            MilestoneCategory::Crime,
            format!("{:?} justice", snapshot.justice_type),
            "A justice mechanism has emerged",
        ));
    }
}

#[cfg(test)]
mod tests {
    use emergence_types::{AgentId, BeliefEvent, BeliefSystem, FamilyUnit, GovernanceEvent, Leader};

    use super::*;

    fn belief(name: &str, tick: u64) -> BeliefSystem {
        BeliefSystem {
            id: format!("belief-{tick}"),
            name: name.to_owned(),
            themes: vec!["sun".to_owned()],
            adherent_count: 4,
            founded_at_tick: tick,
        }
    }

    fn economy(model_type: EconomicModel, currency: Option<&str>) -> EconomySnapshot {
        EconomySnapshot {
            model_type,
            currency_resource: currency.map(str::to_owned),
            currency_adoption_pct: Decimal::new(55, 0),
            trade_volume: 12,
            trade_volume_history: Vec::new(),
            market_locations: Vec::new(),
        }
    }

    fn crime(rate: Decimal, justice_type: JusticeType) -> CrimeSnapshot {
        CrimeSnapshot {
            crime_rate: rate,
            crime_rate_history: Vec::new(),
            detection_rate: 0.0,
            punishment_rate: 0.0,
            justice_type,
            common_crimes: Vec::new(),
            serial_offenders: Vec::new(),
            hotspots: Vec::new(),
        }
    }

    #[test]
    fn single_belief_yields_single_milestone() {
        let beliefs = BeliefSnapshot {
            belief_systems: vec![belief("Sun Path", 45)],
            belief_events: vec![BeliefEvent {
                tick: 45,
                event_type: "founded".to_owned(),
                belief_system_id: "belief-45".to_owned(),
                belief_system_name: "Sun Path".to_owned(),
                description: String::new(),
                agent_id: None,
            }],
        };
        let milestones = build_milestones(Some(&beliefs), None, None, None, None);
        assert_eq!(milestones.len(), 1);
        assert_eq!(milestones.first().map(|m| (m.tick, m.category)), Some((45, MilestoneCategory::Belief)));
    }

    #[test]
    fn nothing_available_yields_nothing() {
        assert!(build_milestones(None, None, None, None, None).is_empty());
    }

    #[test]
    fn anarchy_without_events_yields_nothing() {
        let governance = GovernanceSnapshot {
            governance_type: GovernanceType::Anarchy,
            leaders: Vec::new(),
            rules: Vec::new(),
            stability_score: Decimal::ZERO,
            recent_events: Vec::new(),
        };
        assert!(build_milestones(None, Some(&governance), None, None, None).is_empty());
    }

    #[test]
    fn governance_dates_from_earliest_leader() {
        let leader = |since_tick| Leader {
            agent_id: AgentId::new(),
            agent_name: "Ada".to_owned(),
            role: "Elder".to_owned(),
            since_tick,
        };
        let governance = GovernanceSnapshot {
            governance_type: GovernanceType::Council,
            leaders: vec![leader(30), leader(12)],
            rules: Vec::new(),
            stability_score: Decimal::new(6, 1),
            recent_events: vec![GovernanceEvent {
                tick: 40,
                event_type: "rule_enacted".to_owned(),
                description: "No theft at the well".to_owned(),
            }],
        };
        let ticks: Vec<u64> = build_milestones(None, Some(&governance), None, None, None)
            .iter()
            .map(|m| m.tick)
            .collect();
        assert_eq!(ticks, vec![12, 40]);
    }

    #[test]
    fn families_yield_first_family_marriage_and_lineage() {
        let head = AgentId::new();
        let family = |tick| FamilyUnit {
            id: format!("family-{tick}"),
            name: "House Reed".to_owned(),
            members: vec![head, AgentId::new()],
            head,
            formed_at_tick: tick,
        };
        let families = FamilySnapshot {
            unit_count: 2,
            avg_size: Decimal::new(2, 0),
            marriage_count: 1,
            divorce_count: 0,
            orphan_count: 0,
            longest_lineage: 3,
            families: vec![family(80), family(20)],
            lineage: Vec::new(),
        };
        let milestones = build_milestones(None, None, Some(&families), None, None);
        let ticks: Vec<u64> = milestones.iter().map(|m| m.tick).collect();
        assert_eq!(ticks, vec![0, 20, 20]);
        assert!(milestones.iter().all(|m| m.category == MilestoneCategory::Family));
    }

    #[test]
    fn undated_ties_break_by_category_name() {
        let economy = economy(EconomicModel::Currency, Some("CurrencyToken"));
        let crime = crime(Decimal::new(25, 2), JusticeType::Vigilante);
        let milestones = build_milestones(None, None, None, Some(&economy), Some(&crime));

        let order: Vec<(MilestoneCategory, &str)> = milestones
            .iter()
            .map(|m| (m.category, m.label.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (MilestoneCategory::Crime, "Crime appears"),
                (MilestoneCategory::Crime, "Vigilante justice"),
                (MilestoneCategory::Economy, "Currency economy"),
                (MilestoneCategory::Economy, "Currency adopted"),
            ]
        );
    }

    #[test]
    fn quiet_economy_and_crime_yield_nothing() {
        let economy = economy(EconomicModel::Subsistence, None);
        let crime = crime(Decimal::ZERO, JusticeType::None);
        assert!(build_milestones(None, None, None, Some(&economy), Some(&crime)).is_empty());
    }

    #[test]
    fn subsistence_with_currency_yields_nothing() {
        let economy = economy(EconomicModel::Subsistence, Some("CurrencyToken"));
        assert!(build_milestones(None, None, None, Some(&economy), None).is_empty());
    }

    #[test]
    fn output_is_deterministic() {
        let beliefs = BeliefSnapshot {
            belief_systems: vec![belief("B", 5), belief("A", 5)],
            belief_events: Vec::new(),
        };
        let economy = economy(EconomicModel::Barter, None);
        let first = build_milestones(Some(&beliefs), None, None, Some(&economy), None);
        let second = build_milestones(Some(&beliefs), None, None, Some(&economy), None);
        assert_eq!(first, second);
        assert_eq!(first.first().map(|m| m.category), Some(MilestoneCategory::Economy));
    }
}
