//! Agent descriptors, goals, and execution results.
//!
//! Agent parameters are a closed set of typed variants keyed by
//! [`AgentType`]. On the wire a descriptor still carries a `type` string next
//! to a plain `parameters` object, so descriptors deserialize through
//! [`RawDescriptor`] and pick their variant from `type`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// The kinds of agent the scheduler can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AgentType {
    ForgetAgent,
    HebbianAgent,
    ImportanceSpreadingAgent,
    GoalAgent,
    PlanningAgent,
    ReasoningAgent,
    LearningAgent,
    PerceptionAgent,
}

impl AgentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForgetAgent => "ForgetAgent",
            Self::HebbianAgent => "HebbianAgent",
            Self::ImportanceSpreadingAgent => "ImportanceSpreadingAgent",
            Self::GoalAgent => "GoalAgent",
            Self::PlanningAgent => "PlanningAgent",
            Self::ReasoningAgent => "ReasoningAgent",
            Self::LearningAgent => "LearningAgent",
            Self::PerceptionAgent => "PerceptionAgent",
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attention decay and removal of atoms that sink too low.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ForgetParameters {
    /// Atoms with `sti` at or below this are decayed; below twice this they are removed.
    #[serde(rename = "minSTI")]
    pub min_sti: i64,
    pub decay_rate: f64,
    /// Atoms examined per run.
    pub batch_size: u32,
}

impl Default for ForgetParameters {
    fn default() -> Self {
        Self {
            min_sti: -100,
            decay_rate: 0.1,
            batch_size: 100,
        }
    }
}

/// One-hop diffusion of attention from high-`sti` atoms to their incoming links.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpreadingParameters {
    pub spread_factor: f64,
    /// Atoms at or above this `sti` act as sources.
    #[serde(rename = "minSTI")]
    pub min_sti: i64,
    /// Sources examined per run, highest `sti` first.
    pub source_limit: u32,
    /// Stored with the descriptor; each run spreads exactly one hop.
    pub max_hops: u32,
}

impl Default for SpreadingParameters {
    fn default() -> Self {
        Self {
            spread_factor: 0.1,
            min_sti: 50,
            source_limit: 20,
            max_hops: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GoalParameters {
    pub max_concurrent_goals: usize,
}

impl Default for GoalParameters {
    fn default() -> Self {
        Self {
            max_concurrent_goals: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HebbianParameters {
    pub learning_rate: f64,
    pub threshold: f64,
}

impl Default for HebbianParameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            threshold: 0.7,
        }
    }
}

/// Parameters for agents without a behavior of their own. Kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StubParameters {
    #[serde(skip)]
    pub agent_type: AgentType,
    #[serde(flatten)]
    pub values: Map<String, Value>,
}

/// Typed parameters, one variant per behavior.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AgentParameters {
    Forget(ForgetParameters),
    ImportanceSpreading(SpreadingParameters),
    Goal(GoalParameters),
    Hebbian(HebbianParameters),
    Stub(StubParameters),
}

impl AgentParameters {
    pub fn agent_type(&self) -> AgentType {
        match self {
            Self::Forget(_) => AgentType::ForgetAgent,
            Self::ImportanceSpreading(_) => AgentType::ImportanceSpreadingAgent,
            Self::Goal(_) => AgentType::GoalAgent,
            Self::Hebbian(_) => AgentType::HebbianAgent,
            Self::Stub(p) => p.agent_type,
        }
    }

    /// Decode a JSON parameter object for `agent_type`. Missing fields take
    /// their defaults.
    pub fn from_json(agent_type: AgentType, value: Value) -> serde_json::Result<Self> {
        let value = if value.is_null() {
            Value::Object(Map::new())
        } else {
            value
        };
        Ok(match agent_type {
            AgentType::ForgetAgent => Self::Forget(serde_json::from_value(value)?),
            AgentType::ImportanceSpreadingAgent => {
                Self::ImportanceSpreading(serde_json::from_value(value)?)
            }
            AgentType::GoalAgent => Self::Goal(serde_json::from_value(value)?),
            AgentType::HebbianAgent => Self::Hebbian(serde_json::from_value(value)?),
            AgentType::PlanningAgent
            | AgentType::ReasoningAgent
            | AgentType::LearningAgent
            | AgentType::PerceptionAgent => Self::Stub(StubParameters {
                agent_type,
                values: serde_json::from_value(value)?,
            }),
        })
    }
}

/// A registered agent. `agent_type` always agrees with `parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDescriptor")]
pub struct AgentDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    /// Milliseconds between scheduled runs.
    pub frequency: u64,
    /// Higher runs first when two executions fall due together.
    pub priority: i64,
    pub enabled: bool,
    pub parameters: AgentParameters,
}

impl AgentDescriptor {
    pub fn new(name: &str, frequency: u64, priority: i64, parameters: AgentParameters) -> Self {
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            name: name.to_string(),
            agent_type: parameters.agent_type(),
            frequency,
            priority,
            enabled: true,
            parameters,
        }
    }
}

/// Wire shape of a descriptor before its parameters are typed.
#[derive(Debug, Deserialize)]
pub struct RawDescriptor {
    id: String,
    name: String,
    #[serde(rename = "type")]
    agent_type: AgentType,
    frequency: u64,
    priority: i64,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    parameters: Value,
}

fn enabled_by_default() -> bool {
    true
}

impl TryFrom<RawDescriptor> for AgentDescriptor {
    type Error = serde_json::Error;

    fn try_from(raw: RawDescriptor) -> Result<Self, Self::Error> {
        let parameters = AgentParameters::from_json(raw.agent_type, raw.parameters)?;
        Ok(Self {
            id: raw.id,
            name: raw.name,
            agent_type: raw.agent_type,
            frequency: raw.frequency,
            priority: raw.priority,
            enabled: raw.enabled,
            parameters,
        })
    }
}

/// Partial update applied by `configure_agent`. Absent fields are unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentPatch {
    pub enabled: Option<bool>,
    pub frequency: Option<u64>,
    pub priority: Option<i64>,
}

impl AgentPatch {
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none() && self.frequency.is_none() && self.priority.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalType {
    #[default]
    Explicit,
    Implicit,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    Active,
    Paused,
    Completed,
    Failed,
    Cancelled,
}

impl GoalStatus {
    /// Completed, failed and cancelled goals never change again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    AtomExists,
    AtomTruthValue,
    AtomAttention,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalCondition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atom_id: Option<String>,
    /// Comparator for threshold conditions: `>=` (default), `>`, `<=`, `<`, `==`.
    #[serde(default)]
    pub predicate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateAtom,
    ModifyAtom,
    ExecuteAgent,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalAction {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: String,
    #[serde(rename = "type")]
    pub goal_type: GoalType,
    pub description: String,
    pub priority: i64,
    pub status: GoalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_atom: Option<String>,
    #[serde(default)]
    pub conditions: Vec<GoalCondition>,
    #[serde(default)]
    pub actions: Vec<GoalAction>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

/// Caller-supplied goal fields; id and timestamps are assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGoal {
    #[serde(rename = "type", default)]
    pub goal_type: GoalType,
    pub description: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default)]
    pub status: Option<GoalStatus>,
    #[serde(default)]
    pub target_atom: Option<String>,
    #[serde(default)]
    pub conditions: Vec<GoalCondition>,
    #[serde(default)]
    pub actions: Vec<GoalAction>,
}

impl NewGoal {
    pub fn new(goal_type: GoalType, description: impl Into<String>, priority: i64) -> Self {
        Self {
            goal_type,
            description: description.into(),
            priority,
            status: None,
            target_atom: None,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }
}

/// Outcome of one agent execution. Never mutated once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub agent_id: String,
    /// Wall-clock milliseconds spent in the behavior.
    pub execution_time: u64,
    pub atoms_processed: u64,
    pub atoms_created: u64,
    pub atoms_modified: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub instance: String,
    pub state: SchedulerState,
    /// Executions waiting in the queue.
    pub pending: usize,
    /// Executions run since activation.
    pub executions: u64,
    pub agents: usize,
    pub enabled_agents: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total_executions: u64,
    pub average_execution_time: f64,
    /// Most recent first.
    pub recent_results: Vec<ExecutionResult>,
}
