//! Attention decay: atoms at or below `minSTI` lose a fraction of their `sti`
//! each run, and atoms that would sink below twice `minSTI` are deleted.

use super::{Metrics, RunCounters};
use crate::atomspace::{AtomQuery, AtomSpaceHandle, AttentionValue};
use crate::mindagent::error::MindAgentResult;
use crate::mindagent::types::ForgetParameters;

pub async fn run(
    params: &ForgetParameters,
    atomspace: &AtomSpaceHandle,
    counters: &mut RunCounters,
) -> MindAgentResult<Metrics> {
    let candidates = atomspace
        .query_atoms(AtomQuery::sti_at_most(params.min_sti).limit(params.batch_size))
        .await?;

    let removal_floor = params.min_sti as f64 * 2.0;
    let mut removed = 0u64;

    for atom in candidates {
        counters.processed += 1;
        let decayed = atom.attention_value.sti as f64 * (1.0 - params.decay_rate);

        if decayed < removal_floor {
            // false when an earlier deletion in this batch already cascaded to it
            if atomspace.delete_atom(atom.id).await? {
                removed += 1;
            }
        } else {
            let attention = AttentionValue {
                sti: decayed.round() as i64,
                ..atom.attention_value
            };
            if atomspace.update_atom(atom.id, None, Some(attention)).await? {
                counters.modified += 1;
            }
        }
    }

    tracing::debug!(processed = counters.processed, removed, "forget pass complete");

    Ok(Metrics::from([
        ("decayRate".to_string(), params.decay_rate),
        ("atomsRemoved".to_string(), removed as f64),
    ]))
}
