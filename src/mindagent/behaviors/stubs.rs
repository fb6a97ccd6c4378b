//! Agents that hold a slot in the scheduler without a cognitive algorithm yet.

use super::Metrics;
use crate::mindagent::types::{AgentType, HebbianParameters};

/// Hebbian learning placeholder. Reports its learning rate and touches nothing.
pub fn hebbian(params: &HebbianParameters) -> Metrics {
    Metrics::from([("learningRate".to_string(), params.learning_rate)])
}

/// Reasoning, learning, planning and perception placeholders.
pub fn run(agent_type: AgentType) -> Option<Metrics> {
    tracing::trace!(agent_type = %agent_type, "placeholder agent run");
    None
}
