//! Per-instance scheduler actor.
//!
//! One tokio task owns the registry, the goal ledger and the execution queue.
//! It `select!`s between its mailbox and the next due instant, so behaviors of
//! one instance never overlap and API commands that arrive mid-run wait their
//! turn. Dropping every [`MindAgentHandle`] stops the task; the queue is lost,
//! the persisted registry and ledger are not.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};

use super::behaviors;
use super::error::{MindAgentError, MindAgentResult};
use super::persist::MindStore;
use super::queue::ExecutionQueue;
use super::registry::MindState;
use super::types::{
    AgentDescriptor, AgentPatch, ExecutionResult, ExecutionSummary, Goal, NewGoal,
    SchedulerState, SchedulerStatus,
};
use crate::atomspace::AtomSpaceHandle;

const MAILBOX_CAPACITY: usize = 64;

type Reply<T> = oneshot::Sender<MindAgentResult<T>>;

enum Command {
    Start { reply: Reply<bool> },
    Status { reply: Reply<SchedulerStatus> },
    ListAgents { reply: Reply<Vec<AgentDescriptor>> },
    ListGoals { reply: Reply<Vec<Goal>> },
    CreateGoal { goal: NewGoal, reply: Reply<Goal> },
    ConfigureAgent { id: String, patch: AgentPatch, reply: Reply<AgentDescriptor> },
    Execute { id: String, reply: Reply<ExecutionResult> },
    Summary { limit: usize, reply: Reply<ExecutionSummary> },
}

/// Cloneable async handle to one scheduler instance.
#[derive(Clone)]
pub struct MindAgentHandle {
    name: Arc<str>,
    tx: mpsc::Sender<Command>,
}

impl MindAgentHandle {
    /// Load persisted state, install the default agents on first activation,
    /// and start the actor task. With `autostart` the scheduler begins in the
    /// running state.
    pub async fn spawn(
        name: &str,
        store: MindStore,
        atomspace: AtomSpaceHandle,
        rescan_interval: Duration,
        autostart: bool,
    ) -> MindAgentResult<Self> {
        let mut state = store.load_state().await?;
        if state.seed_defaults() {
            store.save_state(state.clone()).await?;
            tracing::info!(instance = %name, agents = state.agents.len(), "default agents installed");
        }

        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        let mut scheduler = Scheduler {
            name: name.to_string(),
            state,
            store,
            atomspace,
            queue: ExecutionQueue::new(),
            run_state: SchedulerState::Idle,
            executions: 0,
            rescan_interval,
            rescan_at: None,
        };
        if autostart {
            scheduler.start();
        }
        tokio::spawn(scheduler.run(rx));

        Ok(Self {
            name: Arc::from(name),
            tx,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True once the actor task has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(Reply<T>) -> Command) -> MindAgentResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| MindAgentError::Unavailable(self.name.to_string()))?;
        rx.await
            .map_err(|_| MindAgentError::Unavailable(self.name.to_string()))?
    }

    /// Move to the running state. Returns `false` if it was already running.
    pub async fn start(&self) -> MindAgentResult<bool> {
        self.request(|reply| Command::Start { reply }).await
    }

    pub async fn status(&self) -> MindAgentResult<SchedulerStatus> {
        self.request(|reply| Command::Status { reply }).await
    }

    pub async fn list_agents(&self) -> MindAgentResult<Vec<AgentDescriptor>> {
        self.request(|reply| Command::ListAgents { reply }).await
    }

    pub async fn list_goals(&self) -> MindAgentResult<Vec<Goal>> {
        self.request(|reply| Command::ListGoals { reply }).await
    }

    pub async fn create_goal(&self, goal: NewGoal) -> MindAgentResult<Goal> {
        self.request(|reply| Command::CreateGoal { goal, reply }).await
    }

    pub async fn configure_agent(
        &self,
        id: impl Into<String>,
        patch: AgentPatch,
    ) -> MindAgentResult<AgentDescriptor> {
        let id = id.into();
        self.request(|reply| Command::ConfigureAgent { id, patch, reply })
            .await
    }

    /// Run one agent now, outside the queue.
    pub async fn execute_agent(&self, id: impl Into<String>) -> MindAgentResult<ExecutionResult> {
        let id = id.into();
        self.request(|reply| Command::Execute { id, reply }).await
    }

    pub async fn execution_summary(&self, limit: usize) -> MindAgentResult<ExecutionSummary> {
        self.request(|reply| Command::Summary { limit, reply }).await
    }
}

struct Scheduler {
    name: String,
    state: MindState,
    store: MindStore,
    atomspace: AtomSpaceHandle,
    queue: ExecutionQueue,
    run_state: SchedulerState,
    executions: u64,
    rescan_interval: Duration,
    /// When an empty queue is refilled.
    rescan_at: Option<Instant>,
}

impl Scheduler {
    async fn run(mut self, mut rx: mpsc::Receiver<Command>) {
        tracing::info!(instance = %self.name, state = ?self.run_state, "scheduler started");

        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                command = rx.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.tick().await;
                }
            }
        }

        tracing::info!(
            instance = %self.name,
            pending = self.queue.len(),
            "scheduler stopped; pending executions dropped"
        );
    }

    fn next_deadline(&self) -> Option<Instant> {
        match self.run_state {
            SchedulerState::Idle => None,
            SchedulerState::Running => self.queue.next_due().or(self.rescan_at),
        }
    }

    fn start(&mut self) -> bool {
        if self.run_state == SchedulerState::Running {
            return false;
        }
        self.run_state = SchedulerState::Running;
        self.replenish();
        tracing::info!(instance = %self.name, "scheduler running");
        true
    }

    /// Enqueue one execution per enabled agent, each due one period from now.
    fn replenish(&mut self) {
        let now = Instant::now();
        for agent in self.state.enabled_agents() {
            self.queue.push(
                agent.id.clone(),
                now + Duration::from_millis(agent.frequency),
                agent.priority,
            );
        }
        self.rescan_at = self
            .queue
            .is_empty()
            .then(|| now + self.rescan_interval);
        tracing::debug!(instance = %self.name, pending = self.queue.len(), "queue replenished");
    }

    async fn tick(&mut self) {
        let now = Instant::now();
        match self.queue.next_due() {
            Some(due) if due <= now => self.run_next().await,
            Some(_) => {}
            None => {
                if self.rescan_at.map_or(true, |at| at <= now) {
                    self.replenish();
                }
            }
        }
    }

    async fn run_next(&mut self) {
        let Some(entry) = self.queue.pop() else {
            return;
        };
        if self.queue.is_empty() {
            self.rescan_at = Some(Instant::now() + self.rescan_interval);
        }

        let agent = match self.state.runnable_agent(&entry.agent_id).cloned() {
            Ok(agent) => agent,
            Err(e) => {
                tracing::debug!(
                    instance = %self.name,
                    agent_id = %entry.agent_id,
                    reason = %e,
                    "skipping scheduled execution"
                );
                return;
            }
        };

        if let Err(e) = self.run_agent(&agent).await {
            tracing::warn!(
                instance = %self.name,
                agent_id = %agent.id,
                error = %e,
                "failed to persist execution"
            );
        }
    }

    /// Execute, record the result, and write the ledger back if it changed.
    async fn run_agent(&mut self, agent: &AgentDescriptor) -> MindAgentResult<ExecutionResult> {
        let (result, ledger_changed) =
            behaviors::execute(agent, &self.atomspace, &mut self.state).await;
        self.executions += 1;

        tracing::debug!(
            instance = %self.name,
            agent = %agent.name,
            success = result.success,
            execution_time_ms = result.execution_time,
            "agent executed"
        );

        self.store.record_execution(result.clone()).await?;
        if ledger_changed {
            self.save().await?;
        }
        Ok(result)
    }

    async fn save(&self) -> MindAgentResult<()> {
        self.store.save_state(self.state.clone()).await
    }

    async fn handle(&mut self, command: Command) {
        // A dropped reply receiver only means the caller gave up waiting.
        match command {
            Command::Start { reply } => {
                let _ = reply.send(Ok(self.start()));
            }
            Command::Status { reply } => {
                let _ = reply.send(Ok(self.status()));
            }
            Command::ListAgents { reply } => {
                let _ = reply.send(Ok(self.state.agents.clone()));
            }
            Command::ListGoals { reply } => {
                let _ = reply.send(Ok(self.state.goals.clone()));
            }
            Command::CreateGoal { goal, reply } => {
                let result = match self.state.create_goal(goal) {
                    Ok(goal) => self.save().await.map(|()| goal),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            Command::ConfigureAgent { id, patch, reply } => {
                let result = match self.state.configure_agent(&id, &patch) {
                    Ok(agent) => self.save().await.map(|()| agent),
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            Command::Execute { id, reply } => {
                let result = match self.state.runnable_agent(&id).cloned() {
                    Ok(agent) => self.run_agent(&agent).await,
                    Err(e) => Err(e),
                };
                let _ = reply.send(result);
            }
            Command::Summary { limit, reply } => {
                let _ = reply.send(self.store.execution_summary(limit).await);
            }
        }
    }

    fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            instance: self.name.clone(),
            state: self.run_state,
            pending: self.queue.len(),
            executions: self.executions,
            agents: self.state.agents.len(),
            enabled_agents: self.state.enabled_agents().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_memory_database, DbKind};
    use crate::mindagent::behaviors::test_support::{dead_atomspace, memory_atomspace};
    use crate::mindagent::types::{AgentType, GoalStatus, GoalType};

    async fn spawn_memory(name: &str, rescan: Duration, autostart: bool) -> MindAgentHandle {
        let store = MindStore::new(open_memory_database(DbKind::MindAgent).unwrap());
        MindAgentHandle::spawn(name, store, memory_atomspace(name), rescan, autostart)
            .await
            .unwrap()
    }

    async fn agent_id(handle: &MindAgentHandle, agent_type: AgentType) -> String {
        handle
            .list_agents()
            .await
            .unwrap()
            .into_iter()
            .find(|a| a.agent_type == agent_type)
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn first_activation_installs_defaults_and_idles() {
        let handle = spawn_memory("sched-defaults", Duration::from_secs(1), false).await;
        assert_eq!(handle.name(), "sched-defaults");

        let status = handle.status().await.unwrap();
        assert_eq!(status.state, SchedulerState::Idle);
        assert_eq!(status.agents, 4);
        assert_eq!(status.enabled_agents, 4);
        assert_eq!(status.pending, 0);
    }

    #[tokio::test]
    async fn start_is_idempotent() {
        let handle = spawn_memory("sched-start", Duration::from_secs(1), false).await;

        assert!(handle.start().await.unwrap());
        assert!(!handle.start().await.unwrap());

        let status = handle.status().await.unwrap();
        assert_eq!(status.state, SchedulerState::Running);
        assert_eq!(status.pending, 4);
    }

    #[tokio::test]
    async fn failed_runs_do_not_stop_the_loop() {
        let store = MindStore::new(open_memory_database(DbKind::MindAgent).unwrap());
        let handle = MindAgentHandle::spawn(
            "sched-failing",
            store,
            dead_atomspace(),
            Duration::from_millis(10),
            false,
        )
        .await
        .unwrap();

        // Only the forget agent, which needs the atomspace on every run.
        for agent in handle.list_agents().await.unwrap() {
            let patch = if agent.agent_type == AgentType::ForgetAgent {
                AgentPatch { frequency: Some(15), ..AgentPatch::default() }
            } else {
                AgentPatch { enabled: Some(false), ..AgentPatch::default() }
            };
            handle.configure_agent(agent.id, patch).await.unwrap();
        }
        handle.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        let first = handle.status().await.unwrap().executions;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let status = handle.status().await.unwrap();

        assert_eq!(status.state, SchedulerState::Running);
        assert!(first >= 1, "no executions before the first sample");
        assert!(status.executions > first, "loop stalled at {first}");

        let summary = handle.execution_summary(10).await.unwrap();
        assert!(!summary.recent_results.is_empty());
        assert!(summary
            .recent_results
            .iter()
            .all(|r| !r.success && r.error.is_some()));
    }

    #[tokio::test]
    async fn running_scheduler_keeps_executing() {
        let handle = spawn_memory("sched-live", Duration::from_millis(10), false).await;

        // Leave only the goal agent on, with a short period.
        for agent in handle.list_agents().await.unwrap() {
            let patch = if agent.agent_type == AgentType::GoalAgent {
                AgentPatch { frequency: Some(20), ..AgentPatch::default() }
            } else {
                AgentPatch { enabled: Some(false), ..AgentPatch::default() }
            };
            handle.configure_agent(agent.id, patch).await.unwrap();
        }

        handle.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(400)).await;

        let status = handle.status().await.unwrap();
        assert!(status.executions >= 2, "only {} executions", status.executions);

        let summary = handle.execution_summary(5).await.unwrap();
        assert_eq!(summary.total_executions, status.executions);
        assert!(summary.recent_results.iter().all(|r| r.success));

        let goals = handle.list_goals().await.unwrap();
        assert!(goals.iter().any(|g| g.goal_type == GoalType::Implicit));
    }

    #[tokio::test]
    async fn execute_checks_the_registry() {
        let handle = spawn_memory("sched-execute", Duration::from_secs(1), false).await;

        let err = handle.execute_agent("no-such-agent").await.unwrap_err();
        assert!(matches!(err, MindAgentError::NotFound(_)));

        let forget = agent_id(&handle, AgentType::ForgetAgent).await;
        handle
            .configure_agent(forget.clone(), AgentPatch { enabled: Some(false), ..AgentPatch::default() })
            .await
            .unwrap();
        let err = handle.execute_agent(forget).await.unwrap_err();
        assert!(matches!(err, MindAgentError::AgentDisabled(_)));
    }

    #[tokio::test]
    async fn forced_goal_run_persists_the_ledger() {
        let handle = spawn_memory("sched-goal", Duration::from_secs(1), false).await;
        let goal_agent = agent_id(&handle, AgentType::GoalAgent).await;

        let result = handle.execute_agent(goal_agent.clone()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.atoms_created, 1);

        let goals = handle.list_goals().await.unwrap();
        assert_eq!(goals.len(), 1);
        assert_eq!(goals[0].status, GoalStatus::Active);

        let summary = handle.execution_summary(10).await.unwrap();
        assert_eq!(summary.total_executions, 1);
        assert_eq!(summary.recent_results[0].agent_id, goal_agent);
    }

    #[tokio::test]
    async fn goal_creation_is_validated() {
        let handle = spawn_memory("sched-goals", Duration::from_secs(1), false).await;

        let err = handle
            .create_goal(NewGoal::new(GoalType::Explicit, "  ", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, MindAgentError::Validation(_)));

        let goal = handle
            .create_goal(NewGoal::new(GoalType::Explicit, "learn about cats", 4))
            .await
            .unwrap();
        assert_eq!(handle.list_goals().await.unwrap(), vec![goal]);
    }

    #[tokio::test]
    async fn state_survives_reactivation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mind.db");
        let space = memory_atomspace("sched-reload");

        let first = MindStore::new(crate::db::open_database(&path, DbKind::MindAgent).unwrap());
        let handle = MindAgentHandle::spawn("reload", first, space.clone(), Duration::from_secs(1), false)
            .await
            .unwrap();
        let forget = agent_id(&handle, AgentType::ForgetAgent).await;
        handle
            .configure_agent(forget.clone(), AgentPatch { priority: Some(9), ..AgentPatch::default() })
            .await
            .unwrap();
        drop(handle);

        let second = MindStore::new(crate::db::open_database(&path, DbKind::MindAgent).unwrap());
        let handle = MindAgentHandle::spawn("reload", second, space, Duration::from_secs(1), false)
            .await
            .unwrap();
        let agents = handle.list_agents().await.unwrap();
        assert_eq!(agents.len(), 4);
        let reloaded = agents.iter().find(|a| a.id == forget).unwrap();
        assert_eq!(reloaded.priority, 9);
    }
}
