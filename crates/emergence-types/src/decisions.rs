//! Decision log rows returned by `GET /api/decisions`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::enums::DecisionSource;
use crate::ids::AgentId;

/// One logged agent decision.
///
/// Every decision carries its [`DecisionSource`]. LLM decisions also carry
/// token counts, cost, and latency when the backend reported them; rule
/// engine decisions carry the name of the rule that matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    /// The agent that decided.
    pub agent_id: AgentId,
    /// The tick the decision applies to.
    pub tick: u64,
    /// Which mechanism produced the decision.
    pub decision_source: DecisionSource,
    /// The chosen action, e.g. `"Gather"`.
    pub action_type: String,
    /// Action parameters.
    #[serde(default)]
    pub action_params: serde_json::Value,
    /// LLM backend name.
    #[serde(default)]
    pub llm_backend: Option<String>,
    /// Model identifier.
    #[serde(default)]
    pub model: Option<String>,
    /// Prompt tokens consumed.
    #[serde(default)]
    pub prompt_tokens: Option<u32>,
    /// Completion tokens produced.
    #[serde(default)]
    pub completion_tokens: Option<u32>,
    /// Cost of the call in USD.
    #[serde(default)]
    pub cost_usd: Option<Decimal>,
    /// Backend latency in milliseconds.
    #[serde(default)]
    pub latency_ms: Option<f64>,
    /// Raw model output.
    #[serde(default)]
    pub raw_llm_response: Option<String>,
    /// Prompt sent to the model.
    #[serde(default)]
    pub prompt_sent: Option<String>,
    /// Name of the rule that matched, for rule engine decisions.
    #[serde(default)]
    pub rule_matched: Option<String>,
    /// When the decision was recorded.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Body of `GET /api/decisions`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DecisionList {
    /// Number of rows returned.
    pub count: u32,
    /// The rows.
    pub decisions: Vec<DecisionRecord>,
}
