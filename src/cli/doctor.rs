//! CLI `doctor` command: run database diagnostics and print a health report.

use std::path::Path;

use anyhow::{Context, Result};

use cogflare::config::CogflareConfig;
use cogflare::db::{self, DbKind};

/// Check both databases of an instance and print a health report.
pub fn doctor(config: &CogflareConfig, instance: &str) -> Result<()> {
    println!("Cogflare Health Report ({instance})");
    println!("==================================");

    let healthy_atoms = check(&config.atomspace_db_path(instance), DbKind::AtomSpace)?;
    let healthy_agents = check(&config.mindagent_db_path(instance), DbKind::MindAgent)?;

    if !(healthy_atoms && healthy_agents) {
        println!();
        println!("Recovery steps:");
        println!("  1. Stop the server and restore the damaged file from a backup.");
        println!("  2. Or export what is still readable and start fresh:");
        println!("     cogflare export --instance {instance} > backup.json");
        println!("     cogflare reset --instance {instance}");
    }

    Ok(())
}

/// Print the report for one database. Returns false if the integrity check failed.
fn check(db_path: &Path, kind: DbKind) -> Result<bool> {
    println!();
    if !db_path.exists() {
        println!("{}: not found at {}", kind.as_str(), db_path.display());
        println!("  Run `cogflare serve` to initialize.");
        return Ok(true);
    }

    let file_size = std::fs::metadata(db_path).map(|m| m.len()).unwrap_or(0);
    let conn = db::open_database(db_path, kind)
        .context("failed to open database (may be corrupt)")?;
    let report = db::check_database_health(&conn, kind).context("failed to run health check")?;

    println!("{}:", kind.as_str());
    println!("  Database:        {}", db_path.display());
    println!("  File size:       {}", format_bytes(file_size));
    println!("  Schema version:  {}", report.schema_version);
    println!("  Row counts:");
    for (table, count) in &report.row_counts {
        println!("    {table:<16} {count}");
    }
    if report.integrity_ok {
        println!("  Integrity check: PASSED");
    } else {
        println!("  Integrity check: FAILED ({})", report.integrity_details);
    }

    Ok(report.integrity_ok)
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
