//! HTTP front door.
//!
//! Routes requests to named atomspace and scheduler instances and serves the
//! platform endpoints. [`serve`] binds the configured address; [`router`] is
//! exposed so tests can mount the same routes on an ephemeral port.

mod atomspace;
mod cognitive;
mod mindagent;
pub mod response;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::CogflareConfig;
use crate::instances::Instances;
use crate::reasoning::{self, TextCompletion};

pub use response::{ApiError, Envelope};

#[derive(Clone)]
pub struct AppState {
    pub instances: Arc<Instances>,
    pub completion: Arc<dyn TextCompletion>,
}

impl AppState {
    /// Build state from config, with the completion client it names.
    pub fn from_config(config: CogflareConfig) -> Result<Self> {
        let completion: Arc<dyn TextCompletion> =
            Arc::from(reasoning::create_completion(&config.reasoning)?);
        Ok(Self::new(config, completion))
    }

    pub fn new(config: CogflareConfig, completion: Arc<dyn TextCompletion>) -> Self {
        Self {
            instances: Arc::new(Instances::new(Arc::new(config))),
            completion,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .merge(cognitive::routes())
        .merge(atomspace::routes())
        .merge(mindagent::routes())
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Activate the default instances and serve HTTP until ctrl-c.
pub async fn serve(config: CogflareConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::from_config(config)?;
    tracing::info!(provider = state.completion.name(), "reasoning provider ready");

    // Bring the default scheduler up now so its timer loop runs without waiting for a request.
    let scheduler_instance = state.instances.config().scheduler.default_instance.clone();
    state
        .instances
        .mindagent(&scheduler_instance)
        .await
        .with_context(|| format!("failed to activate scheduler instance '{scheduler_instance}'"))?;

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "cogflare listening at http://{bind_addr}/");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("shutting down HTTP server"),
        Err(e) => {
            tracing::error!(error = %e, "failed to listen for ctrl-c; serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
