use rusqlite::Connection;
use std::collections::BTreeMap;

use super::error::AtomSpaceResult;
use super::types::{AtomType, AverageAttention, Statistics, TruthValue};

/// Compute atom counts and mean annotations. Averages are zero when empty.
pub fn statistics(conn: &Connection) -> AtomSpaceResult<Statistics> {
    let by_type = count_by_type(conn)?;

    let mut node_count = 0;
    let mut link_count = 0;
    for (type_name, count) in &by_type {
        match type_name.parse::<AtomType>() {
            Ok(t) if t.is_link() => link_count += count,
            Ok(_) => node_count += count,
            Err(_) => tracing::warn!(atom_type = %type_name, "unknown atom type in store"),
        }
    }

    let (tv, av) = conn.query_row(
        "SELECT COALESCE(AVG(truth_strength), 0), COALESCE(AVG(truth_confidence), 0), \
                COALESCE(AVG(sti), 0), COALESCE(AVG(lti), 0), COALESCE(AVG(vlti), 0) \
         FROM atoms",
        [],
        |row| {
            Ok((
                TruthValue::new(row.get(0)?, row.get(1)?),
                AverageAttention {
                    sti: row.get(2)?,
                    lti: row.get(3)?,
                    vlti: row.get(4)?,
                },
            ))
        },
    )?;

    Ok(Statistics {
        total_atoms: by_type.values().sum(),
        node_count,
        link_count,
        average_truth_value: tv,
        average_attention_value: av,
        by_type,
    })
}

/// Count by atom type. Every known type is present, zero if unused.
fn count_by_type(conn: &Connection) -> AtomSpaceResult<BTreeMap<String, u64>> {
    let mut map: BTreeMap<String, u64> = AtomType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), 0))
        .collect();

    let mut stmt = conn.prepare("SELECT type, COUNT(*) FROM atoms GROUP BY type")?;
    let rows: Vec<(String, i64)> = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    for (t, count) in rows {
        map.insert(t, count as u64);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomspace::store::{create_link, create_node};
    use crate::atomspace::types::AttentionValue;
    use crate::db::{open_memory_database, DbKind};

    #[test]
    fn empty_store_reports_zeros() {
        let conn = open_memory_database(DbKind::AtomSpace).unwrap();
        let stats = statistics(&conn).unwrap();

        assert_eq!(stats.total_atoms, 0);
        assert_eq!(stats.node_count, 0);
        assert_eq!(stats.link_count, 0);
        assert_eq!(stats.average_truth_value, TruthValue::new(0.0, 0.0));
        assert_eq!(stats.average_attention_value, AverageAttention::default());
        assert_eq!(stats.by_type.len(), AtomType::ALL.len());
    }

    #[test]
    fn counts_and_averages() {
        let mut conn = open_memory_database(DbKind::AtomSpace).unwrap();
        let a = create_node(
            &mut conn,
            AtomType::ConceptNode,
            "a",
            Some(TruthValue::new(1.0, 1.0)),
            Some(AttentionValue::with_sti(100)),
            true,
        )
        .unwrap();
        let b = create_node(
            &mut conn,
            AtomType::Node,
            "b",
            Some(TruthValue::new(0.0, 0.5)),
            Some(AttentionValue::with_sti(-40)),
            true,
        )
        .unwrap();
        create_link(&mut conn, AtomType::Link, &[a.id, b.id], None, None, true).unwrap();

        let stats = statistics(&conn).unwrap();
        assert_eq!(stats.total_atoms, 3);
        assert_eq!(stats.node_count, 2);
        assert_eq!(stats.link_count, 1);
        assert_eq!(stats.by_type["Link"], 1);
        assert!((stats.average_truth_value.strength - 0.5).abs() < 1e-9);
        assert!((stats.average_attention_value.sti - 20.0).abs() < 1e-9);
    }
}
