//! Read path: point lookup, filtered queries, and reverse-link lookup.
//!
//! All results are hydrated: link atoms come back with their outgoing set in
//! position order.

use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::error::AtomSpaceResult;
use super::types::{Atom, AtomQuery, AtomType, AttentionValue, TruthValue};

const ATOM_COLUMNS: &str = "id, type, name, truth_strength, truth_confidence, sti, lti, vlti, created_at, updated_at";

fn atom_from_row(row: &Row) -> rusqlite::Result<Atom> {
    let type_str: String = row.get(1)?;
    let atom_type: AtomType = type_str
        .parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;
    Ok(Atom {
        id: row.get(0)?,
        atom_type,
        name: row.get(2)?,
        truth_value: TruthValue::new(row.get(3)?, row.get(4)?),
        attention_value: AttentionValue {
            sti: row.get(5)?,
            lti: row.get(6)?,
            vlti: row.get(7)?,
        },
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
        outgoing: None,
    })
}

/// Fill in `outgoing` for link atoms.
fn hydrate(conn: &Connection, mut atom: Atom) -> AtomSpaceResult<Atom> {
    if atom.is_link() {
        let mut stmt =
            conn.prepare_cached("SELECT target_id FROM links WHERE link_id = ?1 ORDER BY position")?;
        let targets = stmt
            .query_map(params![atom.id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        atom.outgoing = Some(targets);
    }
    Ok(atom)
}

fn hydrate_all(conn: &Connection, atoms: Vec<Atom>) -> AtomSpaceResult<Vec<Atom>> {
    atoms.into_iter().map(|a| hydrate(conn, a)).collect()
}

/// Fetch one atom by id, or `None` if it does not exist.
pub fn get_atom(conn: &Connection, id: &str) -> AtomSpaceResult<Option<Atom>> {
    let atom = conn
        .query_row(
            &format!("SELECT {ATOM_COLUMNS} FROM atoms WHERE id = ?1"),
            params![id],
            atom_from_row,
        )
        .optional()?;
    atom.map(|a| hydrate(conn, a)).transpose()
}

/// Atoms matching every predicate present in `query`, highest `sti` first.
///
/// Ties are broken by creation time, then insertion order. A `limit` of zero
/// means no limit.
pub fn query_atoms(conn: &Connection, query: &AtomQuery) -> AtomSpaceResult<Vec<Atom>> {
    let mut sql = format!("SELECT {ATOM_COLUMNS} FROM atoms WHERE 1=1");
    let mut values: Vec<Value> = Vec::new();

    if let Some(atom_type) = query.atom_type {
        sql.push_str(" AND type = ?");
        values.push(Value::Text(atom_type.as_str().to_string()));
    }
    if let Some(name) = &query.name {
        sql.push_str(" AND name = ?");
        values.push(Value::Text(name.clone()));
    }
    if let Some(tv) = &query.truth_value_min {
        sql.push_str(" AND truth_strength >= ? AND truth_confidence >= ?");
        values.push(Value::Real(tv.strength));
        values.push(Value::Real(tv.confidence));
    }
    if let Some(min) = &query.attention_value_min {
        sql.push_str(" AND sti >= ?");
        values.push(Value::Integer(min.sti));
    }
    if let Some(max) = &query.attention_value_max {
        sql.push_str(" AND sti <= ?");
        values.push(Value::Integer(max.sti));
    }

    sql.push_str(" ORDER BY sti DESC, created_at ASC, rowid ASC");

    let limit = query.limit.filter(|&l| l > 0);
    let offset = query.offset.filter(|&o| o > 0);
    match (limit, offset) {
        (Some(limit), _) => {
            sql.push_str(" LIMIT ?");
            values.push(Value::Integer(limit.into()));
        }
        // SQLite needs a LIMIT clause before OFFSET
        (None, Some(_)) => sql.push_str(" LIMIT -1"),
        (None, None) => {}
    }
    if let Some(offset) = offset {
        sql.push_str(" OFFSET ?");
        values.push(Value::Integer(offset.into()));
    }

    let mut stmt = conn.prepare(&sql)?;
    let atoms = stmt
        .query_map(rusqlite::params_from_iter(values.iter()), atom_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    hydrate_all(conn, atoms)
}

/// Distinct links that list `id` anywhere in their outgoing set.
pub fn get_incoming(conn: &Connection, id: &str) -> AtomSpaceResult<Vec<Atom>> {
    let sql = format!(
        "SELECT {ATOM_COLUMNS} FROM atoms \
         WHERE id IN (SELECT DISTINCT link_id FROM links WHERE target_id = ?1) \
         ORDER BY created_at ASC, rowid ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let atoms = stmt
        .query_map(params![id], atom_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    hydrate_all(conn, atoms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomspace::store::{create_link, create_node, update_atom};
    use crate::db::{open_memory_database, DbKind};

    fn test_db() -> Connection {
        open_memory_database(DbKind::AtomSpace).unwrap()
    }

    fn node_with_sti(conn: &mut Connection, name: &str, sti: i64) -> Atom {
        create_node(
            conn,
            AtomType::ConceptNode,
            name,
            None,
            Some(AttentionValue::with_sti(sti)),
            true,
        )
        .unwrap()
    }

    fn names(atoms: &[Atom]) -> Vec<&str> {
        atoms.iter().filter_map(|a| a.name.as_deref()).collect()
    }

    #[test]
    fn get_atom_round_trips_a_node() {
        let mut conn = test_db();
        let created = create_node(
            &mut conn,
            AtomType::ConceptNode,
            "cat",
            Some(TruthValue::new(0.8, 0.9)),
            Some(AttentionValue { sti: 10, lti: 2, vlti: 1 }),
            true,
        )
        .unwrap();

        let fetched = get_atom(&conn, &created.id).unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(get_atom(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn links_keep_outgoing_order() {
        let mut conn = test_db();
        let a = node_with_sti(&mut conn, "a", 0);
        let b = node_with_sti(&mut conn, "b", 0);
        let ids = vec![b.id.clone(), a.id.clone(), b.id.clone()];
        let link = create_link(&mut conn, AtomType::ListLink, &ids, None, None, true).unwrap();

        let fetched = get_atom(&conn, &link.id).unwrap().unwrap();
        assert_eq!(fetched.outgoing.as_deref(), Some(ids.as_slice()));
        assert!(fetched.name.is_none());
    }

    #[test]
    fn query_orders_by_sti_descending() {
        let mut conn = test_db();
        node_with_sti(&mut conn, "low", 1);
        node_with_sti(&mut conn, "high", 90);
        node_with_sti(&mut conn, "mid", 50);

        let all = query_atoms(&conn, &AtomQuery::default()).unwrap();
        assert_eq!(names(&all), vec!["high", "mid", "low"]);

        let page = query_atoms(
            &conn,
            &AtomQuery {
                limit: Some(1),
                offset: Some(1),
                ..AtomQuery::default()
            },
        )
        .unwrap();
        assert_eq!(names(&page), vec!["mid"]);

        let tail = query_atoms(
            &conn,
            &AtomQuery {
                offset: Some(2),
                ..AtomQuery::default()
            },
        )
        .unwrap();
        assert_eq!(names(&tail), vec!["low"]);
    }

    #[test]
    fn query_sti_bounds() {
        let mut conn = test_db();
        for (name, sti) in [("a", -250), ("b", -100), ("c", 0), ("d", 49), ("e", 50), ("f", 300)] {
            node_with_sti(&mut conn, name, sti);
        }

        let hot = query_atoms(&conn, &AtomQuery::sti_at_least(50)).unwrap();
        assert_eq!(names(&hot), vec!["f", "e"]);
        assert!(hot.iter().all(|a| a.attention_value.sti >= 50));

        let cold = query_atoms(&conn, &AtomQuery::sti_at_most(-100)).unwrap();
        assert_eq!(names(&cold), vec!["b", "a"]);
    }

    #[test]
    fn query_truth_minimum_needs_both_components() {
        let mut conn = test_db();
        create_node(&mut conn, AtomType::ConceptNode, "strong", Some(TruthValue::new(0.9, 0.9)), None, true)
            .unwrap();
        create_node(&mut conn, AtomType::ConceptNode, "unsure", Some(TruthValue::new(0.9, 0.1)), None, true)
            .unwrap();

        let q = AtomQuery {
            truth_value_min: Some(TruthValue::new(0.5, 0.5)),
            ..AtomQuery::default()
        };
        assert_eq!(names(&query_atoms(&conn, &q).unwrap()), vec!["strong"]);
    }

    #[test]
    fn query_by_type_and_name() {
        let mut conn = test_db();
        let cat = node_with_sti(&mut conn, "cat", 0);
        create_node(&mut conn, AtomType::PredicateNode, "cat", None, None, true).unwrap();

        let q = AtomQuery {
            atom_type: Some(AtomType::ConceptNode),
            name: Some("cat".into()),
            ..AtomQuery::default()
        };
        let found = query_atoms(&conn, &q).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, cat.id);
    }

    #[test]
    fn incoming_is_distinct() {
        let mut conn = test_db();
        let a = node_with_sti(&mut conn, "a", 0);
        let b = node_with_sti(&mut conn, "b", 0);
        let aa = create_link(&mut conn, AtomType::ListLink, &[a.id.clone(), a.id.clone()], None, None, true)
            .unwrap();
        let ab = create_link(&mut conn, AtomType::SimilarityLink, &[a.id.clone(), b.id.clone()], None, None, true)
            .unwrap();

        let incoming = get_incoming(&conn, &a.id).unwrap();
        let ids: Vec<&str> = incoming.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![aa.id.as_str(), ab.id.as_str()]);
        assert!(incoming.iter().all(|l| l.outgoing.is_some()));

        assert_eq!(get_incoming(&conn, &b.id).unwrap().len(), 1);
    }

    #[test]
    fn updates_are_visible_to_queries() {
        let mut conn = test_db();
        let cat = node_with_sti(&mut conn, "cat", 0);
        update_atom(&mut conn, &cat.id, None, Some(AttentionValue::with_sti(75)), true).unwrap();

        let hot = query_atoms(&conn, &AtomQuery::sti_at_least(50)).unwrap();
        assert_eq!(hot.len(), 1);
        assert!(hot[0].updated_at >= cat.updated_at);
    }
}
