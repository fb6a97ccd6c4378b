//! `/mindagent/{instance}/...` routes.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use super::response::{ok, ApiError, ApiResult};
use super::AppState;
use crate::mindagent::{
    AgentDescriptor, AgentPatch, ExecutionResult, ExecutionSummary, Goal, MindAgentHandle,
    NewGoal, SchedulerStatus,
};

const DEFAULT_EXECUTIONS_LIMIT: usize = 10;
const MAX_EXECUTIONS_LIMIT: usize = 100;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/mindagent/{instance}/agents", get(list_agents))
        .route("/mindagent/{instance}/goals", get(list_goals))
        .route("/mindagent/{instance}/goal", post(create_goal))
        .route("/mindagent/{instance}/execute/{agent_id}", post(execute_agent))
        .route("/mindagent/{instance}/agent/{agent_id}", put(configure_agent))
        .route("/mindagent/{instance}/status", get(status))
        .route("/mindagent/{instance}/start", post(start))
        .route("/mindagent/{instance}/executions", get(executions))
}

#[derive(Debug, Deserialize)]
struct ExecutionsParams {
    limit: Option<usize>,
}

async fn mind(state: &AppState, instance: &str) -> Result<MindAgentHandle, ApiError> {
    Ok(state.instances.mindagent(instance).await?)
}

async fn list_agents(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> ApiResult<Vec<AgentDescriptor>> {
    ok(mind(&state, &instance).await?.list_agents().await?)
}

async fn list_goals(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> ApiResult<Vec<Goal>> {
    ok(mind(&state, &instance).await?.list_goals().await?)
}

async fn create_goal(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    payload: Result<Json<NewGoal>, JsonRejection>,
) -> ApiResult<Goal> {
    let Json(goal) = payload?;
    ok(mind(&state, &instance).await?.create_goal(goal).await?)
}

async fn execute_agent(
    State(state): State<AppState>,
    Path((instance, agent_id)): Path<(String, String)>,
) -> ApiResult<ExecutionResult> {
    ok(mind(&state, &instance).await?.execute_agent(agent_id).await?)
}

async fn configure_agent(
    State(state): State<AppState>,
    Path((instance, agent_id)): Path<(String, String)>,
    payload: Result<Json<AgentPatch>, JsonRejection>,
) -> ApiResult<AgentDescriptor> {
    let Json(patch) = payload?;
    ok(mind(&state, &instance)
        .await?
        .configure_agent(agent_id, patch)
        .await?)
}

async fn status(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> ApiResult<SchedulerStatus> {
    ok(mind(&state, &instance).await?.status().await?)
}

async fn start(State(state): State<AppState>, Path(instance): Path<String>) -> ApiResult<bool> {
    ok(mind(&state, &instance).await?.start().await?)
}

async fn executions(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    params: Result<Query<ExecutionsParams>, QueryRejection>,
) -> ApiResult<ExecutionSummary> {
    let Query(params) = params?;
    let limit = params
        .limit
        .unwrap_or(DEFAULT_EXECUTIONS_LIMIT)
        .min(MAX_EXECUTIONS_LIMIT);
    ok(mind(&state, &instance).await?.execution_summary(limit).await?)
}
