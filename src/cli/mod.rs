//! Offline maintenance commands. Each opens the instance database directly,
//! so they are meant for a stopped server or a read-only look at a live one.

pub mod agents;
pub mod doctor;
pub mod export;
pub mod reset;
pub mod stats;

use anyhow::Result;

use cogflare::config::CogflareConfig;
use cogflare::instances::validate_name;

/// The named instance, or the configured default.
pub fn instance_name(config: &CogflareConfig, instance: Option<String>) -> Result<String> {
    let name = instance.unwrap_or_else(|| config.atomspace.default_instance.clone());
    validate_name(&name)?;
    Ok(name)
}
