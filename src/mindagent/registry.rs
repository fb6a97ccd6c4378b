//! Agent registry and goal ledger: the in-memory state a scheduler instance owns.

use serde::{Deserialize, Serialize};

use super::error::{MindAgentError, MindAgentResult};
use super::types::{
    AgentDescriptor, AgentParameters, AgentPatch, ForgetParameters, Goal, GoalParameters,
    GoalStatus, GoalType, HebbianParameters, NewGoal, SpreadingParameters,
};
use crate::atomspace::store::now_millis;

/// The four agents every fresh instance starts with.
pub fn default_agents() -> Vec<AgentDescriptor> {
    vec![
        AgentDescriptor::new(
            "ForgetAgent",
            30_000,
            1,
            AgentParameters::Forget(ForgetParameters::default()),
        ),
        AgentDescriptor::new(
            "ImportanceSpreadingAgent",
            10_000,
            2,
            AgentParameters::ImportanceSpreading(SpreadingParameters::default()),
        ),
        AgentDescriptor::new(
            "GoalAgent",
            5_000,
            3,
            AgentParameters::Goal(GoalParameters::default()),
        ),
        AgentDescriptor::new(
            "HebbianAgent",
            20_000,
            2,
            AgentParameters::Hebbian(HebbianParameters::default()),
        ),
    ]
}

/// Descriptors and goals in creation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MindState {
    pub agents: Vec<AgentDescriptor>,
    pub goals: Vec<Goal>,
}

impl MindState {
    /// Install the default agents if none are registered. Returns whether it did.
    pub fn seed_defaults(&mut self) -> bool {
        if !self.agents.is_empty() {
            return false;
        }
        self.agents = default_agents();
        true
    }

    pub fn agent(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// The descriptor for `id`, provided it exists and is enabled.
    pub fn runnable_agent(&self, id: &str) -> MindAgentResult<&AgentDescriptor> {
        let agent = self
            .agent(id)
            .ok_or_else(|| MindAgentError::NotFound(id.to_string()))?;
        if !agent.enabled {
            return Err(MindAgentError::AgentDisabled(id.to_string()));
        }
        Ok(agent)
    }

    pub fn enabled_agents(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.iter().filter(|a| a.enabled)
    }

    /// Apply a partial update to one descriptor and return the result.
    pub fn configure_agent(&mut self, id: &str, patch: &AgentPatch) -> MindAgentResult<AgentDescriptor> {
        if patch.is_empty() {
            return Err(MindAgentError::Validation(
                "agent patch must set at least one of enabled, frequency, priority".into(),
            ));
        }
        if patch.frequency == Some(0) {
            return Err(MindAgentError::Validation("frequency must be positive".into()));
        }

        let agent = self
            .agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| MindAgentError::NotFound(id.to_string()))?;

        if let Some(enabled) = patch.enabled {
            agent.enabled = enabled;
        }
        if let Some(frequency) = patch.frequency {
            agent.frequency = frequency;
        }
        if let Some(priority) = patch.priority {
            agent.priority = priority;
        }
        Ok(agent.clone())
    }

    /// Add a goal. Status defaults to active; a goal created in a terminal
    /// status is stamped completed at creation time.
    pub fn create_goal(&mut self, data: NewGoal) -> MindAgentResult<Goal> {
        if data.description.trim().is_empty() {
            return Err(MindAgentError::Validation(
                "goal description must not be empty".into(),
            ));
        }

        let now = now_millis();
        let status = data.status.unwrap_or(GoalStatus::Active);
        let goal = Goal {
            id: uuid::Uuid::now_v7().to_string(),
            goal_type: data.goal_type,
            description: data.description,
            priority: data.priority,
            status,
            target_atom: data.target_atom,
            conditions: data.conditions,
            actions: data.actions,
            created_at: now,
            updated_at: now,
            completed_at: status.is_terminal().then_some(now),
        };
        self.goals.push(goal.clone());
        Ok(goal)
    }

    /// The goal the goal agent synthesizes when too few are active.
    pub fn implicit_goal(&mut self) -> Goal {
        let now = now_millis();
        let goal = Goal {
            id: uuid::Uuid::now_v7().to_string(),
            goal_type: GoalType::Implicit,
            description: "Maintain cognitive coherence".into(),
            priority: 1,
            status: GoalStatus::Active,
            target_atom: None,
            conditions: Vec::new(),
            actions: Vec::new(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.goals.push(goal.clone());
        goal
    }

    pub fn count_goals(&self, status: GoalStatus) -> usize {
        self.goals.iter().filter(|g| g.status == status).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mindagent::types::AgentType;

    #[test]
    fn defaults_match_the_standard_roster() {
        let mut state = MindState::default();
        assert!(state.seed_defaults());
        assert!(!state.seed_defaults());

        let roster: Vec<(AgentType, u64, i64)> = state
            .agents
            .iter()
            .map(|a| (a.agent_type, a.frequency, a.priority))
            .collect();
        assert_eq!(
            roster,
            vec![
                (AgentType::ForgetAgent, 30_000, 1),
                (AgentType::ImportanceSpreadingAgent, 10_000, 2),
                (AgentType::GoalAgent, 5_000, 3),
                (AgentType::HebbianAgent, 20_000, 2),
            ]
        );
        assert!(state.agents.iter().all(|a| a.enabled));
    }

    #[test]
    fn runnable_agent_checks_presence_and_enabled() {
        let mut state = MindState::default();
        state.seed_defaults();
        let id = state.agents[0].id.clone();

        assert!(state.runnable_agent(&id).is_ok());
        assert!(matches!(
            state.runnable_agent("nope"),
            Err(MindAgentError::NotFound(_))
        ));

        state
            .configure_agent(&id, &AgentPatch { enabled: Some(false), ..AgentPatch::default() })
            .unwrap();
        assert!(matches!(
            state.runnable_agent(&id),
            Err(MindAgentError::AgentDisabled(_))
        ));
        assert_eq!(state.enabled_agents().count(), 3);
    }

    #[test]
    fn configure_agent_validates_patch() {
        let mut state = MindState::default();
        state.seed_defaults();
        let id = state.agents[1].id.clone();

        assert!(matches!(
            state.configure_agent(&id, &AgentPatch::default()),
            Err(MindAgentError::Validation(_))
        ));
        assert!(matches!(
            state.configure_agent(&id, &AgentPatch { frequency: Some(0), ..AgentPatch::default() }),
            Err(MindAgentError::Validation(_))
        ));

        let updated = state
            .configure_agent(&id, &AgentPatch { frequency: Some(250), priority: Some(7), ..AgentPatch::default() })
            .unwrap();
        assert_eq!(updated.frequency, 250);
        assert_eq!(updated.priority, 7);
        assert!(updated.enabled);
    }

    #[test]
    fn create_goal_assigns_identity_and_status() {
        let mut state = MindState::default();

        let goal = state
            .create_goal(NewGoal::new(GoalType::Explicit, "learn about cats", 5))
            .unwrap();
        assert_eq!(goal.status, GoalStatus::Active);
        assert!(goal.completed_at.is_none());
        assert_eq!(goal.created_at, goal.updated_at);

        let mut done = NewGoal::new(GoalType::System, "already done", 1);
        done.status = Some(GoalStatus::Completed);
        let goal = state.create_goal(done).unwrap();
        assert_eq!(goal.completed_at, Some(goal.created_at));

        assert_eq!(state.goals.len(), 2);
        assert_eq!(state.count_goals(GoalStatus::Active), 1);

        assert!(state.create_goal(NewGoal::new(GoalType::Explicit, "  ", 1)).is_err());
    }
}
