use anyhow::Result;

use cogflare::atomspace::{AtomStore, AtomType};
use cogflare::config::CogflareConfig;
use cogflare::db::{self, DbKind};

/// Display atomspace statistics in the terminal.
pub fn stats(config: &CogflareConfig, instance: &str) -> Result<()> {
    let db_path = config.atomspace_db_path(instance);
    if !db_path.exists() {
        println!("AtomSpace '{instance}': no database at {}", db_path.display());
        return Ok(());
    }

    let store = AtomStore::new(
        db::open_database(&db_path, DbKind::AtomSpace)?,
        config.atomspace.strict_truth_values,
    );
    let stats = store.statistics()?;

    println!("AtomSpace Statistics ({instance})");
    println!("{}", "=".repeat(40));
    println!("  Total atoms:         {}", stats.total_atoms);
    println!("  Nodes:               {}", stats.node_count);
    println!("  Links:               {}", stats.link_count);
    println!();

    println!("By Type:");
    for atom_type in AtomType::ALL {
        let count = stats.by_type.get(atom_type.as_str()).copied().unwrap_or(0);
        if count > 0 {
            println!("  {:<22} {}", atom_type.as_str(), count);
        }
    }
    println!();

    println!(
        "Average truth value:   strength {:.3}, confidence {:.3}",
        stats.average_truth_value.strength, stats.average_truth_value.confidence
    );
    println!(
        "Average attention:     sti {:.1}, lti {:.1}, vlti {:.1}",
        stats.average_attention_value.sti,
        stats.average_attention_value.lti,
        stats.average_attention_value.vlti
    );

    Ok(())
}
