//! Durable state for a scheduler instance.
//!
//! The registry and ledger are stored as whole JSON snapshots under the keys
//! `agents` and `goals` in `mind_state`, rewritten together in one
//! transaction. Execution results are append-only rows in `agent_executions`.
//! The connection sits behind `Arc<Mutex<_>>`; async callers go through
//! `spawn_blocking`.

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use super::error::{MindAgentError, MindAgentResult};
use super::registry::MindState;
use super::types::{ExecutionResult, ExecutionSummary};
use crate::atomspace::store::now_millis;

#[derive(Clone)]
pub struct MindStore {
    db: Arc<Mutex<Connection>>,
}

impl MindStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> MindAgentResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> MindAgentResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|e| MindAgentError::Background(format!("db lock poisoned: {e}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| MindAgentError::Background(format!("db task failed: {e}")))?
    }

    pub async fn load_state(&self) -> MindAgentResult<MindState> {
        self.with_conn(|conn| load_state(conn)).await
    }

    pub async fn save_state(&self, state: MindState) -> MindAgentResult<()> {
        self.with_conn(move |conn| save_state(conn, &state)).await
    }

    pub async fn record_execution(&self, result: ExecutionResult) -> MindAgentResult<()> {
        self.with_conn(move |conn| record_execution(conn, &result, now_millis()))
            .await
    }

    pub async fn execution_summary(&self, limit: usize) -> MindAgentResult<ExecutionSummary> {
        self.with_conn(move |conn| execution_summary(conn, limit)).await
    }
}

fn read_key<T: serde::de::DeserializeOwned + Default>(
    conn: &Connection,
    key: &str,
) -> MindAgentResult<T> {
    let value: Option<String> = conn
        .query_row(
            "SELECT value FROM mind_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()?;
    match value {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => Ok(T::default()),
    }
}

/// Load the registry and ledger. A fresh database yields empty collections.
pub fn load_state(conn: &Connection) -> MindAgentResult<MindState> {
    Ok(MindState {
        agents: read_key(conn, "agents")?,
        goals: read_key(conn, "goals")?,
    })
}

/// Replace both snapshots atomically.
pub fn save_state(conn: &mut Connection, state: &MindState) -> MindAgentResult<()> {
    let agents = serde_json::to_string(&state.agents)?;
    let goals = serde_json::to_string(&state.goals)?;
    let now = now_millis();

    let tx = conn.transaction()?;
    for (key, value) in [("agents", agents), ("goals", goals)] {
        tx.execute(
            "INSERT INTO mind_state (key, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
    }
    tx.commit()?;
    Ok(())
}

pub fn record_execution(
    conn: &Connection,
    result: &ExecutionResult,
    executed_at: i64,
) -> MindAgentResult<()> {
    conn.execute(
        "INSERT INTO agent_executions (agent_id, executed_at, success, execution_time, result) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            result.agent_id,
            executed_at,
            result.success,
            result.execution_time as i64,
            serde_json::to_string(result)?,
        ],
    )?;
    Ok(())
}

/// Totals over every recorded execution plus the `limit` most recent results.
pub fn execution_summary(conn: &Connection, limit: usize) -> MindAgentResult<ExecutionSummary> {
    let (total, average): (i64, f64) = conn.query_row(
        "SELECT COUNT(*), COALESCE(AVG(execution_time), 0) FROM agent_executions",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let mut stmt = conn.prepare(
        "SELECT result FROM agent_executions ORDER BY executed_at DESC, id DESC LIMIT ?1",
    )?;
    let rows = stmt
        .query_map(params![limit as i64], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let recent_results = rows
        .iter()
        .map(|json| serde_json::from_str(json))
        .collect::<Result<Vec<ExecutionResult>, _>>()?;

    Ok(ExecutionSummary {
        total_executions: total as u64,
        average_execution_time: average,
        recent_results,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{open_memory_database, DbKind};
    use crate::mindagent::types::{GoalType, NewGoal};

    fn test_db() -> Connection {
        open_memory_database(DbKind::MindAgent).unwrap()
    }

    fn result(agent_id: &str, execution_time: u64, success: bool) -> ExecutionResult {
        ExecutionResult {
            agent_id: agent_id.into(),
            execution_time,
            atoms_processed: 1,
            atoms_created: 0,
            atoms_modified: 0,
            success,
            error: (!success).then(|| "boom".to_string()),
            metrics: None,
        }
    }

    #[test]
    fn fresh_database_loads_empty_state() {
        let conn = test_db();
        let state = load_state(&conn).unwrap();
        assert!(state.agents.is_empty());
        assert!(state.goals.is_empty());
    }

    #[test]
    fn state_round_trips_through_snapshots() {
        let mut conn = test_db();
        let mut state = MindState::default();
        state.seed_defaults();
        state
            .create_goal(NewGoal::new(GoalType::Explicit, "understand cats", 4))
            .unwrap();

        save_state(&mut conn, &state).unwrap();
        // second save overwrites rather than duplicating
        save_state(&mut conn, &state).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM mind_state", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 2);
        assert_eq!(load_state(&conn).unwrap(), state);
    }

    #[test]
    fn summary_reports_totals_and_recent_first() {
        let conn = test_db();
        record_execution(&conn, &result("a", 10, true), 1_000).unwrap();
        record_execution(&conn, &result("b", 30, false), 2_000).unwrap();
        record_execution(&conn, &result("c", 20, true), 3_000).unwrap();

        let summary = execution_summary(&conn, 2).unwrap();
        assert_eq!(summary.total_executions, 3);
        assert!((summary.average_execution_time - 20.0).abs() < 1e-9);

        let ids: Vec<&str> = summary.recent_results.iter().map(|r| r.agent_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b"]);
        assert_eq!(summary.recent_results[1].error.as_deref(), Some("boom"));
    }

    #[test]
    fn empty_summary() {
        let conn = test_db();
        let summary = execution_summary(&conn, 10).unwrap();
        assert_eq!(summary.total_executions, 0);
        assert_eq!(summary.average_execution_time, 0.0);
        assert!(summary.recent_results.is_empty());
    }

    #[tokio::test]
    async fn async_store_wraps_blocking_calls() {
        let store = MindStore::new(test_db());
        let mut state = MindState::default();
        state.seed_defaults();

        store.save_state(state.clone()).await.unwrap();
        store.record_execution(result("x", 5, true)).await.unwrap();

        assert_eq!(store.load_state().await.unwrap().agents.len(), 4);
        assert_eq!(store.execution_summary(10).await.unwrap().total_executions, 1);
    }
}
