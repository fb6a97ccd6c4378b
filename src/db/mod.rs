pub mod migrations;
pub mod schema;

pub use schema::DbKind;

use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Milliseconds SQLite waits on a locked database before giving up.
const BUSY_TIMEOUT_MS: u64 = 5000;

/// Open (or create) an instance database at the given path with schema
/// initialized and migrations applied.
pub fn open_database(path: impl AsRef<Path>, kind: DbKind) -> Result<Connection> {
    let path = path.as_ref();

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let mut conn = Connection::open(path)
        .with_context(|| format!("failed to open database at {}", path.display()))?;

    // Enable WAL mode for better concurrent read performance
    conn.pragma_update(None, "journal_mode", "WAL")?;
    configure(&mut conn, kind)?;

    tracing::info!(path = %path.display(), kind = kind.as_str(), "database initialized");
    Ok(conn)
}

/// Open an in-memory database with schema and migrations applied.
pub fn open_memory_database(kind: DbKind) -> Result<Connection> {
    let mut conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    configure(&mut conn, kind)?;
    Ok(conn)
}

fn configure(conn: &mut Connection, kind: DbKind) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_millis(BUSY_TIMEOUT_MS))?;
    schema::init_schema(conn, kind).context("failed to initialize schema")?;
    migrations::run_migrations(conn, kind).context("failed to run migrations")?;
    Ok(())
}

/// Diagnostics gathered by `cogflare doctor`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub kind: String,
    pub schema_version: u32,
    pub integrity_ok: bool,
    pub integrity_details: String,
    /// Row counts per table, in schema order.
    pub row_counts: Vec<(String, i64)>,
}

/// Run `PRAGMA integrity_check` and count rows in each table owned by `kind`.
pub fn check_database_health(conn: &Connection, kind: DbKind) -> Result<HealthReport> {
    let schema_version = migrations::get_schema_version(conn)?;

    let integrity: String = conn.query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
    let integrity_ok = integrity == "ok";

    let tables: &[&str] = match kind {
        DbKind::AtomSpace => &["atoms", "links", "atom_log"],
        DbKind::MindAgent => &["mind_state", "agent_executions"],
    };

    let mut row_counts = Vec::with_capacity(tables.len());
    for table in tables {
        // Table names come from the fixed list above, never from input.
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        row_counts.push((table.to_string(), count));
    }

    Ok(HealthReport {
        kind: kind.as_str().to_string(),
        schema_version,
        integrity_ok,
        integrity_details: integrity,
        row_counts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_database_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("atomspace").join("primary.db");

        let conn = open_database(&path, DbKind::AtomSpace).unwrap();
        assert!(path.exists());

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }

    #[test]
    fn health_report_on_fresh_database() {
        let conn = open_memory_database(DbKind::AtomSpace).unwrap();
        let report = check_database_health(&conn, DbKind::AtomSpace).unwrap();

        assert!(report.integrity_ok);
        assert_eq!(report.schema_version, migrations::CURRENT_SCHEMA_VERSION);
        assert_eq!(report.kind, "atomspace");
        assert_eq!(report.row_counts.len(), 3);
        assert!(report.row_counts.iter().all(|(_, n)| *n == 0));
    }

    #[test]
    fn foreign_keys_are_enforced() {
        let conn = open_memory_database(DbKind::AtomSpace).unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
