//! Named atomspace and scheduler instances, activated on first use.
//!
//! Each atomspace name maps to one actor thread over its own database file
//! (or an in-memory database when `storage.in_memory` is set). Each scheduler
//! name maps to one actor task whose behaviors act on the atomspace named by
//! `scheduler.atomspace_instance`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;

use crate::atomspace::{AtomSpaceHandle, AtomStore};
use crate::config::CogflareConfig;
use crate::db::{self, DbKind};
use crate::mindagent::{MindAgentError, MindAgentHandle, MindStore};

const MAX_NAME_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("invalid instance name '{0}': expected 1-64 characters from [A-Za-z0-9_-]")]
    InvalidName(String),

    #[error("failed to activate instance '{name}': {message}")]
    Activation { name: String, message: String },

    #[error(transparent)]
    MindAgent(#[from] MindAgentError),
}

pub type InstanceResult<T> = std::result::Result<T, InstanceError>;

/// Instance names become file names, so they are kept to a safe alphabet.
pub fn validate_name(name: &str) -> InstanceResult<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(InstanceError::InvalidName(name.to_string()))
    }
}

pub struct Instances {
    config: Arc<CogflareConfig>,
    atomspaces: Mutex<HashMap<String, AtomSpaceHandle>>,
    mindagents: Mutex<HashMap<String, MindAgentHandle>>,
}

impl Instances {
    pub fn new(config: Arc<CogflareConfig>) -> Self {
        Self {
            config,
            atomspaces: Mutex::new(HashMap::new()),
            mindagents: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &CogflareConfig {
        &self.config
    }

    /// The handle for `name`, activating the instance if needed.
    pub async fn atomspace(&self, name: &str) -> InstanceResult<AtomSpaceHandle> {
        validate_name(name)?;
        let mut atomspaces = self.atomspaces.lock().await;
        match atomspaces.get(name) {
            Some(handle) if !handle.is_closed() => return Ok(handle.clone()),
            Some(_) => tracing::warn!(instance = %name, "atomspace actor exited; reactivating"),
            None => {}
        }

        let conn = if self.config.storage.in_memory {
            db::open_memory_database(DbKind::AtomSpace)
        } else {
            db::open_database(self.config.atomspace_db_path(name), DbKind::AtomSpace)
        }
        .map_err(|e| activation_error(name, e))?;

        let store = AtomStore::new(conn, self.config.atomspace.strict_truth_values);
        let handle = AtomSpaceHandle::spawn(name, store).map_err(|e| activation_error(name, e))?;
        tracing::info!(instance = %name, "atomspace instance activated");

        atomspaces.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// The handle for scheduler `name`, activating it (and its atomspace) if needed.
    pub async fn mindagent(&self, name: &str) -> InstanceResult<MindAgentHandle> {
        validate_name(name)?;
        let mut mindagents = self.mindagents.lock().await;
        match mindagents.get(name) {
            Some(handle) if !handle.is_closed() => return Ok(handle.clone()),
            Some(_) => tracing::warn!(instance = %name, "mindagent actor exited; reactivating"),
            None => {}
        }

        let atomspace = self.atomspace(&self.config.scheduler.atomspace_instance).await?;

        let conn = if self.config.storage.in_memory {
            db::open_memory_database(DbKind::MindAgent)
        } else {
            db::open_database(self.config.mindagent_db_path(name), DbKind::MindAgent)
        }
        .map_err(|e| activation_error(name, e))?;

        let handle = MindAgentHandle::spawn(
            name,
            MindStore::new(conn),
            atomspace,
            Duration::from_millis(self.config.scheduler.rescan_interval_ms),
            self.config.scheduler.autostart,
        )
        .await?;
        tracing::info!(instance = %name, "mindagent instance activated");

        mindagents.insert(name.to_string(), handle.clone());
        Ok(handle)
    }

    /// Names of the instances activated so far, sorted.
    pub async fn active(&self) -> (Vec<String>, Vec<String>) {
        let mut atomspaces: Vec<String> = self.atomspaces.lock().await.keys().cloned().collect();
        let mut mindagents: Vec<String> = self.mindagents.lock().await.keys().cloned().collect();
        atomspaces.sort();
        mindagents.sort();
        (atomspaces, mindagents)
    }
}

fn activation_error(name: &str, error: impl std::fmt::Display) -> InstanceError {
    InstanceError::Activation {
        name: name.to_string(),
        message: format!("{error:#}"),
    }
}
