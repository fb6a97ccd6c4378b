#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cogflare::atomspace::{AtomSpaceHandle, AtomStore, AtomType};
use cogflare::config::CogflareConfig;
use cogflare::db::{self, DbKind};
use cogflare::reasoning::TextCompletion;
use cogflare::server::{self, AppState};

/// A synchronous atom store over a fresh in-memory database.
pub fn test_store() -> AtomStore {
    AtomStore::new(db::open_memory_database(DbKind::AtomSpace).unwrap(), true)
}

/// An atomspace actor over a fresh in-memory database.
pub fn spawn_space(name: &str) -> AtomSpaceHandle {
    AtomSpaceHandle::spawn(name, test_store()).unwrap()
}

/// Insert a ConceptNode with default values. Returns the atom ID.
pub fn concept(store: &mut AtomStore, name: &str) -> String {
    store
        .create_node(AtomType::ConceptNode, name, None, None)
        .unwrap()
        .id
}

/// Echoes the prompt back so tests can check what was sent.
pub struct EchoCompletion;

#[async_trait]
impl TextCompletion for EchoCompletion {
    async fn complete(&self, _system: &str, prompt: &str) -> Result<String> {
        Ok(format!("echo: {prompt}"))
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Serve the full router on an ephemeral port. Returns the base URL.
pub async fn spawn_server(mut config: CogflareConfig) -> String {
    config.storage.in_memory = true;
    let state = AppState::new(config, Arc::new(EchoCompletion));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

/// An in-memory config whose scheduler stays idle until started.
pub fn idle_config() -> CogflareConfig {
    let mut config = CogflareConfig::ephemeral();
    config.scheduler.autostart = false;
    config
}
