use anyhow::Result;
use serde::Serialize;

use cogflare::atomspace::{Atom, AtomStore};
use cogflare::config::CogflareConfig;
use cogflare::db::{self, DbKind};
use cogflare::mindagent::persist;
use cogflare::mindagent::{AgentDescriptor, Goal};

/// Export format: one instance's atoms, agent registry and goal ledger.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportData {
    instance: String,
    atoms: Vec<Atom>,
    agents: Vec<AgentDescriptor>,
    goals: Vec<Goal>,
}

/// Export an instance as JSON to stdout.
pub fn export(config: &CogflareConfig, instance: &str) -> Result<()> {
    let atoms = {
        let path = config.atomspace_db_path(instance);
        if path.exists() {
            let store = AtomStore::new(
                db::open_database(&path, DbKind::AtomSpace)?,
                config.atomspace.strict_truth_values,
            );
            store.all_atoms()?
        } else {
            Vec::new()
        }
    };

    let state = {
        let path = config.mindagent_db_path(instance);
        if path.exists() {
            persist::load_state(&db::open_database(&path, DbKind::MindAgent)?)?
        } else {
            Default::default()
        }
    };

    let data = ExportData {
        instance: instance.to_string(),
        atoms,
        agents: state.agents,
        goals: state.goals,
    };

    let json = serde_json::to_string_pretty(&data)?;
    println!("{json}");

    eprintln!(
        "Exported {} atoms, {} agents and {} goals.",
        data.atoms.len(),
        data.agents.len(),
        data.goals.len()
    );

    Ok(())
}
