//! Agent behaviors and the wrapper that turns one run into an [`ExecutionResult`].
//!
//! Behaviors touch knowledge only through an [`AtomSpaceHandle`]. They count
//! their work into [`RunCounters`] as they go, so a run that fails halfway
//! still reports what it did before the failure.

pub mod forget;
pub mod goal;
pub mod spreading;
pub mod stubs;

use std::collections::BTreeMap;
use std::time::Instant;

use super::error::MindAgentResult;
use super::registry::MindState;
use super::types::{AgentDescriptor, AgentParameters, ExecutionResult};
use crate::atomspace::AtomSpaceHandle;

pub type Metrics = BTreeMap<String, f64>;

/// Work done so far in one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunCounters {
    pub processed: u64,
    pub created: u64,
    pub modified: u64,
    /// The goal ledger changed and must be written back.
    pub ledger_changed: bool,
}

/// Run the behavior selected by the descriptor's parameters.
async fn dispatch(
    agent: &AgentDescriptor,
    atomspace: &AtomSpaceHandle,
    state: &mut MindState,
    counters: &mut RunCounters,
) -> MindAgentResult<Option<Metrics>> {
    match &agent.parameters {
        AgentParameters::Forget(p) => forget::run(p, atomspace, counters).await.map(Some),
        AgentParameters::ImportanceSpreading(p) => {
            spreading::run(p, atomspace, counters).await.map(Some)
        }
        AgentParameters::Goal(p) => goal::run(p, atomspace, state, counters).await.map(Some),
        AgentParameters::Hebbian(p) => Ok(Some(stubs::hebbian(p))),
        AgentParameters::Stub(p) => Ok(stubs::run(p.agent_type)),
    }
}

/// Execute `agent` once. Failures are contained in the returned result and
/// never propagate. The flag reports whether the goal ledger changed.
pub async fn execute(
    agent: &AgentDescriptor,
    atomspace: &AtomSpaceHandle,
    state: &mut MindState,
) -> (ExecutionResult, bool) {
    let started = Instant::now();
    let mut counters = RunCounters::default();

    let outcome = dispatch(agent, atomspace, state, &mut counters).await;
    let execution_time = started.elapsed().as_millis() as u64;

    let (success, error, metrics) = match outcome {
        Ok(metrics) => (true, None, metrics),
        Err(e) => {
            tracing::warn!(
                agent_id = %agent.id,
                agent_type = %agent.agent_type,
                error = %e,
                "agent execution failed"
            );
            (false, Some(e.to_string()), None)
        }
    };

    let result = ExecutionResult {
        agent_id: agent.id.clone(),
        execution_time,
        atoms_processed: counters.processed,
        atoms_created: counters.created,
        atoms_modified: counters.modified,
        success,
        error,
        metrics,
    };
    (result, counters.ledger_changed)
}
