//! Platform-level endpoints that span both components: status, dashboard,
//! perception and reasoning. They act on the configured default instances.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use super::response::{ok, ApiError, ApiResult};
use super::AppState;
use crate::atomspace::store::now_millis;
use crate::atomspace::{Atom, AtomType, AttentionValue, Statistics, TruthValue};
use crate::mindagent::{ExecutionResult, Goal, GoalStatus};
use crate::reasoning::reasoning_prompt;

const PLATFORM: &str = "Cogflare";
const RECENT: usize = 5;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(platform_status))
        .route("/health", get(health))
        .route("/api/dashboard", get(dashboard))
        .route("/api/cognitive/perceive", post(perceive))
        .route("/api/cognitive/reason", post(reason))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    platform: &'static str,
    version: &'static str,
}

async fn health() -> ApiResult<Health> {
    ok(Health {
        status: "healthy",
        platform: PLATFORM,
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Serialize)]
struct Tally {
    total: usize,
    active: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlatformStatus {
    platform: &'static str,
    version: &'static str,
    status: &'static str,
    atom_space: Statistics,
    mind_agents: Tally,
    goals: Tally,
}

async fn platform_status(State(state): State<AppState>) -> ApiResult<PlatformStatus> {
    let config = state.instances.config();
    let space = state
        .instances
        .atomspace(&config.atomspace.default_instance)
        .await?;
    let mind = state
        .instances
        .mindagent(&config.scheduler.default_instance)
        .await?;

    let agents = mind.list_agents().await?;
    let goals = mind.list_goals().await?;

    ok(PlatformStatus {
        platform: PLATFORM,
        version: env!("CARGO_PKG_VERSION"),
        status: "active",
        atom_space: space.statistics().await?,
        mind_agents: Tally {
            total: agents.len(),
            active: agents.iter().filter(|a| a.enabled).count(),
        },
        goals: Tally {
            total: goals.len(),
            active: goals.iter().filter(|g| g.status == GoalStatus::Active).count(),
        },
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AgentOverview {
    active_agents: usize,
    total_executions: u64,
    average_execution_time: f64,
    recent_results: Vec<ExecutionResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GoalOverview {
    active_goals: usize,
    completed_goals: usize,
    average_priority: f64,
    /// Most recently created last.
    recent_goals: Vec<Goal>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dashboard {
    atom_space: Statistics,
    mind_agents: AgentOverview,
    goals: GoalOverview,
}

fn goal_overview(mut goals: Vec<Goal>) -> GoalOverview {
    let count = |status| goals.iter().filter(|g| g.status == status).count();
    let active_goals = count(GoalStatus::Active);
    let completed_goals = count(GoalStatus::Completed);
    let average_priority = if goals.is_empty() {
        0.0
    } else {
        goals.iter().map(|g| g.priority as f64).sum::<f64>() / goals.len() as f64
    };
    let recent_goals = goals.split_off(goals.len().saturating_sub(RECENT));
    GoalOverview {
        active_goals,
        completed_goals,
        average_priority,
        recent_goals,
    }
}

async fn dashboard(State(state): State<AppState>) -> ApiResult<Dashboard> {
    let config = state.instances.config();
    let space = state
        .instances
        .atomspace(&config.atomspace.default_instance)
        .await?;
    let mind = state
        .instances
        .mindagent(&config.scheduler.default_instance)
        .await?;

    let agents = mind.list_agents().await?;
    let summary = mind.execution_summary(RECENT).await?;

    ok(Dashboard {
        atom_space: space.statistics().await?,
        mind_agents: AgentOverview {
            active_agents: agents.iter().filter(|a| a.enabled).count(),
            total_executions: summary.total_executions,
            average_execution_time: summary.average_execution_time,
            recent_results: summary.recent_results,
        },
        goals: goal_overview(mind.list_goals().await?),
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PerceiveRequest {
    input: String,
    #[serde(default)]
    input_type: Option<String>,
}

async fn perceive(
    State(state): State<AppState>,
    payload: Result<Json<PerceiveRequest>, JsonRejection>,
) -> ApiResult<Atom> {
    let Json(req) = payload?;
    if req.input.trim().is_empty() {
        return Err(ApiError::validation("input must not be empty"));
    }

    let space = state
        .instances
        .atomspace(&state.instances.config().atomspace.default_instance)
        .await?;
    let atom = space
        .create_node(
            AtomType::ConceptNode,
            format!("input_{}", uuid::Uuid::now_v7()),
            Some(TruthValue::new(0.8, 0.9)),
            Some(AttentionValue::with_sti(100)),
        )
        .await?;

    tracing::info!(
        atom_id = %atom.id,
        input_type = req.input_type.as_deref().unwrap_or("text"),
        input_len = req.input.len(),
        "input perceived"
    );
    ok(atom)
}

#[derive(Debug, Deserialize)]
struct ReasonRequest {
    query: String,
    #[serde(default)]
    context: Option<String>,
}

#[derive(Debug, Serialize)]
struct Reasoning {
    reasoning: String,
    atom: Atom,
}

async fn reason(
    State(state): State<AppState>,
    payload: Result<Json<ReasonRequest>, JsonRejection>,
) -> ApiResult<Reasoning> {
    let Json(req) = payload?;
    if req.query.trim().is_empty() {
        return Err(ApiError::validation("query must not be empty"));
    }

    let config = state.instances.config();
    let started = now_millis();
    let reasoning = state
        .completion
        .complete(
            &config.reasoning.system_prompt,
            &reasoning_prompt(&req.query, req.context.as_deref()),
        )
        .await
        .map_err(ApiError::upstream)?;
    tracing::debug!(
        provider = state.completion.name(),
        elapsed_ms = now_millis() - started,
        "reasoning complete"
    );

    let space = state
        .instances
        .atomspace(&config.atomspace.default_instance)
        .await?;
    let atom = space
        .create_node(
            AtomType::ConceptNode,
            format!("reasoning_{}", uuid::Uuid::now_v7()),
            Some(TruthValue::new(0.7, 0.8)),
            Some(AttentionValue {
                sti: 80,
                lti: 10,
                vlti: 0,
            }),
        )
        .await?;

    ok(Reasoning { reasoning, atom })
}
