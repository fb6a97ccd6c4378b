//! `/atomspace/{instance}/...` routes.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::response::{ok, ApiError, ApiResult};
use super::AppState;
use crate::atomspace::{
    Atom, AtomQuery, AtomSpaceHandle, AtomType, AttentionValue, Statistics, TruthValue,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/atomspace/{instance}/node", post(create_node))
        .route("/atomspace/{instance}/link", post(create_link))
        .route(
            "/atomspace/{instance}/atom/{id}",
            get(get_atom).put(update_atom).delete(delete_atom),
        )
        .route("/atomspace/{instance}/query", post(query_atoms))
        .route("/atomspace/{instance}/incoming/{id}", get(incoming))
        .route("/atomspace/{instance}/stats", get(stats))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRequest {
    #[serde(rename = "type")]
    atom_type: AtomType,
    name: String,
    truth_value: Option<TruthValue>,
    attention_value: Option<AttentionValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkRequest {
    #[serde(rename = "type")]
    atom_type: AtomType,
    outgoing: Vec<String>,
    truth_value: Option<TruthValue>,
    attention_value: Option<AttentionValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateRequest {
    truth_value: Option<TruthValue>,
    attention_value: Option<AttentionValue>,
}

async fn space(state: &AppState, instance: &str) -> Result<AtomSpaceHandle, ApiError> {
    Ok(state.instances.atomspace(instance).await?)
}

async fn create_node(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    payload: Result<Json<NodeRequest>, JsonRejection>,
) -> ApiResult<Atom> {
    let Json(req) = payload?;
    let atom = space(&state, &instance)
        .await?
        .create_node(req.atom_type, req.name, req.truth_value, req.attention_value)
        .await?;
    ok(atom)
}

async fn create_link(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    payload: Result<Json<LinkRequest>, JsonRejection>,
) -> ApiResult<Atom> {
    let Json(req) = payload?;
    let atom = space(&state, &instance)
        .await?
        .create_link(req.atom_type, req.outgoing, req.truth_value, req.attention_value)
        .await?;
    ok(atom)
}

async fn get_atom(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
) -> ApiResult<Option<Atom>> {
    ok(space(&state, &instance).await?.get_atom(id).await?)
}

async fn update_atom(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
    payload: Result<Json<UpdateRequest>, JsonRejection>,
) -> ApiResult<bool> {
    let Json(req) = payload?;
    let updated = space(&state, &instance)
        .await?
        .update_atom(id, req.truth_value, req.attention_value)
        .await?;
    ok(updated)
}

async fn delete_atom(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
) -> ApiResult<bool> {
    ok(space(&state, &instance).await?.delete_atom(id).await?)
}

async fn query_atoms(
    State(state): State<AppState>,
    Path(instance): Path<String>,
    payload: Result<Json<AtomQuery>, JsonRejection>,
) -> ApiResult<Vec<Atom>> {
    let Json(query) = payload?;
    ok(space(&state, &instance).await?.query_atoms(query).await?)
}

async fn incoming(
    State(state): State<AppState>,
    Path((instance, id)): Path<(String, String)>,
) -> ApiResult<Vec<Atom>> {
    ok(space(&state, &instance).await?.get_incoming(id).await?)
}

async fn stats(
    State(state): State<AppState>,
    Path(instance): Path<String>,
) -> ApiResult<Statistics> {
    ok(space(&state, &instance).await?.statistics().await?)
}
