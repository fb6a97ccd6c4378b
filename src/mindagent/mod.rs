//! Attention-driven agent scheduler.
//!
//! A scheduler instance owns a registry of agent descriptors, a goal ledger
//! and a queue of pending executions. Agents act on knowledge through an
//! [`AtomSpaceHandle`](crate::atomspace::AtomSpaceHandle); registry, ledger
//! and execution history persist in the instance's own SQLite database.
//!
//! - [`types`]: Descriptors, goals, execution results
//! - [`registry`]: In-memory registry and ledger with the default roster
//! - [`queue`]: Due-time ordered execution queue
//! - [`behaviors`]: Forget, importance spreading, goal pursuit and placeholders
//! - [`persist`]: Snapshot and execution-history storage
//! - [`scheduler`]: The per-instance actor and its [`MindAgentHandle`]

pub mod behaviors;
pub mod error;
pub mod persist;
pub mod queue;
pub mod registry;
pub mod scheduler;
pub mod types;

pub use error::{MindAgentError, MindAgentResult};
pub use persist::MindStore;
pub use scheduler::MindAgentHandle;
pub use types::{
    AgentDescriptor, AgentPatch, AgentType, ExecutionResult, ExecutionSummary, Goal, GoalStatus,
    GoalType, NewGoal, SchedulerState, SchedulerStatus,
};
