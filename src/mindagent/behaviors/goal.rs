//! Goal pursuit: complete active goals whose conditions hold, and keep at
//! least one implicit goal alive while there is room under the ceiling.
//!
//! Condition evaluation is a placeholder policy. All conditions must hold. A
//! goal without conditions is ongoing and never completes on its own.

use std::str::FromStr;

use super::{Metrics, RunCounters};
use crate::atomspace::store::now_millis;
use crate::atomspace::{Atom, AtomSpaceHandle};
use crate::mindagent::error::MindAgentResult;
use crate::mindagent::registry::MindState;
use crate::mindagent::types::{ActionType, ConditionType, GoalCondition, GoalParameters, GoalStatus};

pub async fn run(
    params: &GoalParameters,
    atomspace: &AtomSpaceHandle,
    state: &mut MindState,
    counters: &mut RunCounters,
) -> MindAgentResult<Metrics> {
    // The ledger is written back after every run, completed goals or not.
    counters.ledger_changed = true;

    for goal in state.goals.iter_mut().filter(|g| g.status == GoalStatus::Active) {
        counters.processed += 1;
        if !conditions_hold(&goal.conditions, atomspace).await? {
            continue;
        }

        for action in &goal.actions {
            match action.action_type {
                ActionType::CreateAtom => counters.created += 1,
                ActionType::ModifyAtom => counters.modified += 1,
                ActionType::ExecuteAgent | ActionType::Custom => {}
            }
        }

        let now = now_millis();
        goal.status = GoalStatus::Completed;
        goal.completed_at = Some(now);
        goal.updated_at = now;
        tracing::info!(goal_id = %goal.id, description = %goal.description, "goal completed");
    }

    if state.count_goals(GoalStatus::Active) < params.max_concurrent_goals {
        let goal = state.implicit_goal();
        counters.created += 1;
        tracing::debug!(goal_id = %goal.id, "implicit goal created");
    }

    Ok(Metrics::from([
        (
            "activeGoals".to_string(),
            state.count_goals(GoalStatus::Active) as f64,
        ),
        (
            "completedGoals".to_string(),
            state.count_goals(GoalStatus::Completed) as f64,
        ),
    ]))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparator {
    Ge,
    Gt,
    Le,
    Lt,
    Eq,
}

impl Comparator {
    fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Ge => value >= threshold,
            Self::Gt => value > threshold,
            Self::Le => value <= threshold,
            Self::Lt => value < threshold,
            Self::Eq => (value - threshold).abs() < f64::EPSILON,
        }
    }
}

impl FromStr for Comparator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" | ">=" => Ok(Self::Ge),
            ">" => Ok(Self::Gt),
            "<=" => Ok(Self::Le),
            "<" => Ok(Self::Lt),
            "==" | "=" => Ok(Self::Eq),
            other => Err(format!("unknown comparator: {other}")),
        }
    }
}

async fn conditions_hold(
    conditions: &[GoalCondition],
    atomspace: &AtomSpaceHandle,
) -> MindAgentResult<bool> {
    if conditions.is_empty() {
        return Ok(false);
    }
    for condition in conditions {
        if !condition_holds(condition, atomspace).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn condition_holds(
    condition: &GoalCondition,
    atomspace: &AtomSpaceHandle,
) -> MindAgentResult<bool> {
    let Some(atom_id) = condition.atom_id.as_deref() else {
        return Ok(false);
    };

    let measure: fn(&Atom) -> f64 = match condition.condition_type {
        ConditionType::Custom => return Ok(false),
        ConditionType::AtomExists => {
            return Ok(atomspace.get_atom(atom_id).await?.is_some());
        }
        ConditionType::AtomTruthValue => |a| a.truth_value.strength,
        ConditionType::AtomAttention => |a| a.attention_value.sti as f64,
    };

    let (Some(threshold), Ok(comparator)) = (condition.threshold, condition.predicate.parse::<Comparator>())
    else {
        tracing::debug!(predicate = %condition.predicate, "condition lacks a usable threshold or comparator");
        return Ok(false);
    };

    Ok(atomspace
        .get_atom(atom_id)
        .await?
        .is_some_and(|atom| comparator.holds(measure(&atom), threshold)))
}
