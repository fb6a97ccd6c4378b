//! Importance spreading: each high-`sti` atom passes a share of its `sti` to
//! every link that contains it. One hop per run.

use std::collections::HashMap;

use super::{Metrics, RunCounters};
use crate::atomspace::{AtomQuery, AtomSpaceHandle, AttentionValue};
use crate::mindagent::error::MindAgentResult;
use crate::mindagent::types::SpreadingParameters;

pub async fn run(
    params: &SpreadingParameters,
    atomspace: &AtomSpaceHandle,
    counters: &mut RunCounters,
) -> MindAgentResult<Metrics> {
    let sources = atomspace
        .query_atoms(AtomQuery::sti_at_least(params.min_sti).limit(params.source_limit))
        .await?;

    // Increments per link, summed over every source that reaches it.
    let mut order: Vec<String> = Vec::new();
    let mut increments: HashMap<String, i64> = HashMap::new();

    for source in &sources {
        counters.processed += 1;
        let amount = (source.attention_value.sti as f64 * params.spread_factor).round() as i64;
        if amount == 0 {
            continue;
        }
        for link in atomspace.get_incoming(source.id.clone()).await? {
            let total = increments.entry(link.id.clone()).or_insert_with(|| {
                order.push(link.id.clone());
                0
            });
            *total = total.saturating_add(amount);
        }
    }

    for link_id in order {
        let increment = increments[&link_id];
        // Re-read so the increment lands on the current value.
        let Some(link) = atomspace.get_atom(link_id.clone()).await? else {
            continue;
        };
        let attention = AttentionValue {
            sti: link.attention_value.sti.saturating_add(increment),
            ..link.attention_value
        };
        if atomspace.update_atom(link_id, None, Some(attention)).await? {
            counters.modified += 1;
        }
    }

    Ok(Metrics::from([
        ("spreadFactor".to_string(), params.spread_factor),
        ("sourceAtoms".to_string(), sources.len() as f64),
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomspace::AtomType;
    use crate::mindagent::behaviors::test_support::memory_atomspace;

    #[tokio::test]
    async fn increments_accumulate_per_link() {
        let space = memory_atomspace("spread");
        let a = space
            .create_node(AtomType::ConceptNode, "a", None, Some(AttentionValue::with_sti(100)))
            .await
            .unwrap();
        let b = space
            .create_node(AtomType::ConceptNode, "b", None, Some(AttentionValue::with_sti(60)))
            .await
            .unwrap();
        let quiet = space
            .create_node(AtomType::ConceptNode, "quiet", None, Some(AttentionValue::with_sti(10)))
            .await
            .unwrap();
        let ab = space
            .create_link(AtomType::SimilarityLink, vec![a.id.clone(), b.id.clone()], None, None)
            .await
            .unwrap();
        let bq = space
            .create_link(AtomType::ListLink, vec![b.id.clone(), quiet.id.clone()], None, None)
            .await
            .unwrap();

        let mut counters = RunCounters::default();
        let metrics = run(&SpreadingParameters::default(), &space, &mut counters)
            .await
            .unwrap();

        // a gives 10, b gives 6
        let ab = space.get_atom(ab.id).await.unwrap().unwrap();
        assert_eq!(ab.attention_value.sti, 16);
        let bq = space.get_atom(bq.id).await.unwrap().unwrap();
        assert_eq!(bq.attention_value.sti, 6);

        // sources keep their own sti
        let a = space.get_atom(a.id).await.unwrap().unwrap();
        assert_eq!(a.attention_value.sti, 100);

        assert_eq!(counters.processed, 2);
        assert_eq!(counters.modified, 2);
        assert_eq!(metrics["sourceAtoms"], 2.0);
        assert_eq!(metrics["spreadFactor"], 0.1);
    }

    #[tokio::test]
    async fn huge_sti_saturates_instead_of_overflowing() {
        let space = memory_atomspace("spread-huge");
        let loud = space
            .create_node(
                AtomType::ConceptNode,
                "loud",
                None,
                Some(AttentionValue::with_sti(i64::MAX / 2)),
            )
            .await
            .unwrap();
        let other = space
            .create_node(AtomType::ConceptNode, "other", None, None)
            .await
            .unwrap();
        let link = space
            .create_link(
                AtomType::ListLink,
                vec![loud.id, other.id],
                None,
                Some(AttentionValue::with_sti(i64::MAX - 10)),
            )
            .await
            .unwrap();

        let mut counters = RunCounters::default();
        run(&SpreadingParameters::default(), &space, &mut counters)
            .await
            .unwrap();

        let link = space.get_atom(link.id).await.unwrap().unwrap();
        assert_eq!(link.attention_value.sti, i64::MAX);
        assert_eq!(counters.modified, 1);
    }

    #[tokio::test]
    async fn nothing_to_spread() {
        let space = memory_atomspace("spread-empty");
        let mut counters = RunCounters::default();
        let metrics = run(&SpreadingParameters::default(), &space, &mut counters)
            .await
            .unwrap();
        assert_eq!(counters, RunCounters::default());
        assert_eq!(metrics["sourceAtoms"], 0.0);
    }
}
