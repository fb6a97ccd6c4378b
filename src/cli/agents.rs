use anyhow::Result;

use cogflare::config::CogflareConfig;
use cogflare::db::{self, DbKind};
use cogflare::mindagent::persist;

const RECENT: usize = 5;

/// List the agent registry and recent executions of a scheduler instance.
pub fn agents(config: &CogflareConfig, instance: &str) -> Result<()> {
    let db_path = config.mindagent_db_path(instance);
    if !db_path.exists() {
        println!("MindAgent '{instance}': no database at {}", db_path.display());
        println!("Run `cogflare serve` to install the default agents.");
        return Ok(());
    }

    let conn = db::open_database(&db_path, DbKind::MindAgent)?;
    let state = persist::load_state(&conn)?;
    let summary = persist::execution_summary(&conn, RECENT)?;

    println!("Agents ({instance})");
    println!("{}", "=".repeat(72));
    println!(
        "  {:<26} {:<8} {:>10} {:>8}  {}",
        "TYPE", "ENABLED", "EVERY (ms)", "PRIORITY", "ID"
    );
    for agent in &state.agents {
        println!(
            "  {:<26} {:<8} {:>10} {:>8}  {}",
            agent.agent_type.as_str(),
            if agent.enabled { "yes" } else { "no" },
            agent.frequency,
            agent.priority,
            agent.id
        );
    }
    println!();

    println!("Goals:                 {}", state.goals.len());
    println!("Executions recorded:   {}", summary.total_executions);
    println!("Average run time:      {:.1} ms", summary.average_execution_time);

    if !summary.recent_results.is_empty() {
        println!();
        println!("Recent executions:");
        for result in &summary.recent_results {
            let name = state
                .agent(&result.agent_id)
                .map(|a| a.name.as_str())
                .unwrap_or("(removed)");
            let outcome = match &result.error {
                Some(error) => format!("FAILED: {error}"),
                None => "ok".to_string(),
            };
            println!(
                "  {:<26} {:>5} ms  processed {:<4} created {:<4} modified {:<4} {}",
                name,
                result.execution_time,
                result.atoms_processed,
                result.atoms_created,
                result.atoms_modified,
                outcome
            );
        }
    }

    Ok(())
}
