//! SQL DDL for both kinds of instance database.
//!
//! An atomspace database holds `atoms`, `links` (ordered outgoing membership)
//! and the `atom_log` audit table. A mind-agent database holds `mind_state`
//! (full snapshots of the agent registry and goal ledger) and
//! `agent_executions`. Both carry `schema_meta`. All DDL uses `IF NOT EXISTS`
//! for idempotent initialization.

use rusqlite::Connection;

/// Which subsystem owns a database file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbKind {
    AtomSpace,
    MindAgent,
}

impl DbKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AtomSpace => "atomspace",
            Self::MindAgent => "mindagent",
        }
    }
}

const META_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

const ATOMSPACE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS atoms (
    id TEXT PRIMARY KEY,
    type TEXT NOT NULL,
    name TEXT,
    truth_strength REAL NOT NULL DEFAULT 0.5,
    truth_confidence REAL NOT NULL DEFAULT 0.5,
    sti INTEGER NOT NULL DEFAULT 0,
    lti INTEGER NOT NULL DEFAULT 0,
    vlti INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

-- Ordered outgoing sets: one row per (link, position)
CREATE TABLE IF NOT EXISTS links (
    link_id TEXT NOT NULL REFERENCES atoms(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    target_id TEXT NOT NULL REFERENCES atoms(id) ON DELETE CASCADE,
    PRIMARY KEY (link_id, position)
);

CREATE INDEX IF NOT EXISTS idx_atoms_type ON atoms(type);
CREATE INDEX IF NOT EXISTS idx_atoms_name ON atoms(name);
CREATE INDEX IF NOT EXISTS idx_atoms_sti ON atoms(sti);
CREATE INDEX IF NOT EXISTS idx_links_target_id ON links(target_id);

-- Audit log
CREATE TABLE IF NOT EXISTS atom_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    operation TEXT NOT NULL CHECK(operation IN ('create','update','delete')),
    atom_id TEXT NOT NULL,
    details TEXT,
    created_at INTEGER NOT NULL
);
"#;

const MINDAGENT_SQL: &str = r#"
-- Full-snapshot state: key 'agents' and key 'goals', JSON arrays
CREATE TABLE IF NOT EXISTS mind_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS agent_executions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_id TEXT NOT NULL,
    executed_at INTEGER NOT NULL,
    success INTEGER NOT NULL,
    execution_time INTEGER NOT NULL,
    result TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_executions_agent ON agent_executions(agent_id, executed_at);
"#;

/// Initialize all schema tables for `kind`. Idempotent (uses IF NOT EXISTS).
pub fn init_schema(conn: &Connection, kind: DbKind) -> rusqlite::Result<()> {
    conn.execute_batch(META_SQL)?;
    match kind {
        DbKind::AtomSpace => conn.execute_batch(ATOMSPACE_SQL)?,
        DbKind::MindAgent => conn.execute_batch(MINDAGENT_SQL)?,
    }

    // Set initial schema version if not already present
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', '1')",
        [],
    )?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('kind', ?1)",
        [kind.as_str()],
    )?;

    Ok(())
}
