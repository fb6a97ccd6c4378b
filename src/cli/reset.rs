//! CLI `reset` command: wipe one instance after user confirmation.

use anyhow::{bail, Result};
use std::io::Write;

use cogflare::config::CogflareConfig;
use cogflare::db::{self, DbKind};

/// Delete every atom, agent descriptor, goal and execution record of an instance.
pub fn reset(config: &CogflareConfig, instance: &str) -> Result<()> {
    let atomspace_path = config.atomspace_db_path(instance);
    let mindagent_path = config.mindagent_db_path(instance);

    println!("WARNING: This will permanently delete ALL atoms, goals, agent settings and execution history.");
    println!("AtomSpace:  {}", atomspace_path.display());
    println!("MindAgent:  {}", mindagent_path.display());
    print!("\nType YES to confirm: ");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim() != "YES" {
        bail!("reset cancelled");
    }

    if atomspace_path.exists() {
        let conn = db::open_database(&atomspace_path, DbKind::AtomSpace)?;
        // links go with their atoms through the foreign keys
        conn.execute_batch(
            "DELETE FROM atoms;
             DELETE FROM atom_log;",
        )?;
    }
    if mindagent_path.exists() {
        let conn = db::open_database(&mindagent_path, DbKind::MindAgent)?;
        conn.execute_batch(
            "DELETE FROM mind_state;
             DELETE FROM agent_executions;",
        )?;
    }

    println!("Instance '{instance}' reset. Default agents are reinstalled on next start.");
    Ok(())
}
