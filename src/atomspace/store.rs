//! Write path: node and link creation, annotation updates, cascading deletes,
//! and audit logging.
//!
//! Every mutation runs inside one transaction together with its `atom_log`
//! row, so a failed write leaves neither atoms nor membership rows behind.

use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::collections::BTreeSet;

use super::error::{AtomSpaceError, AtomSpaceResult};
use super::types::{Atom, AtomType, AttentionValue, TruthValue};

/// Current wall-clock time in epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn check_truth_value(tv: &TruthValue, strict: bool) -> AtomSpaceResult<()> {
    if strict && !tv.is_bounded() {
        return Err(AtomSpaceError::Validation(format!(
            "truth value out of range: strength={}, confidence={} (both must be within [0, 1])",
            tv.strength, tv.confidence
        )));
    }
    Ok(())
}

/// Create a node. Fails with `DuplicateName` if a node of the same type and
/// name already exists.
pub fn create_node(
    conn: &mut Connection,
    atom_type: AtomType,
    name: &str,
    truth_value: Option<TruthValue>,
    attention_value: Option<AttentionValue>,
    strict: bool,
) -> AtomSpaceResult<Atom> {
    if atom_type.is_link() {
        return Err(AtomSpaceError::Validation(format!(
            "{atom_type} is a link type; use create_link"
        )));
    }
    if name.is_empty() {
        return Err(AtomSpaceError::Validation("node name must not be empty".into()));
    }
    let truth_value = truth_value.unwrap_or_default();
    let attention_value = attention_value.unwrap_or_default();
    check_truth_value(&truth_value, strict)?;

    let tx = conn.transaction()?;

    let existing: Option<String> = tx
        .query_row(
            "SELECT id FROM atoms WHERE type = ?1 AND name = ?2",
            params![atom_type.as_str(), name],
            |row| row.get(0),
        )
        .optional()?;
    if existing.is_some() {
        return Err(AtomSpaceError::DuplicateName {
            atom_type,
            name: name.to_string(),
        });
    }

    let now = now_millis();
    let atom = Atom {
        id: uuid::Uuid::now_v7().to_string(),
        atom_type,
        name: Some(name.to_string()),
        truth_value,
        attention_value,
        created_at: now,
        updated_at: now,
        outgoing: None,
    };
    insert_atom(&tx, &atom)?;
    write_audit_log(
        &tx,
        "create",
        &atom.id,
        Some(&serde_json::json!({"type": atom_type.as_str(), "name": name})),
    )?;
    tx.commit()?;

    tracing::debug!(id = %atom.id, atom_type = %atom_type, name, "node created");
    Ok(atom)
}

/// Create a link over `outgoing`, preserving order. Every target must already
/// exist; all targets are checked in one query before anything is written.
pub fn create_link(
    conn: &mut Connection,
    atom_type: AtomType,
    outgoing: &[String],
    truth_value: Option<TruthValue>,
    attention_value: Option<AttentionValue>,
    strict: bool,
) -> AtomSpaceResult<Atom> {
    if atom_type.is_node() {
        return Err(AtomSpaceError::Validation(format!(
            "{atom_type} is a node type; use create_node"
        )));
    }
    if outgoing.is_empty() {
        return Err(AtomSpaceError::EmptyOutgoing);
    }
    let truth_value = truth_value.unwrap_or_default();
    let attention_value = attention_value.unwrap_or_default();
    check_truth_value(&truth_value, strict)?;

    let tx = conn.transaction()?;

    let missing = missing_targets(&tx, outgoing)?;
    if !missing.is_empty() {
        return Err(AtomSpaceError::DanglingReference { missing });
    }

    let now = now_millis();
    let atom = Atom {
        id: uuid::Uuid::now_v7().to_string(),
        atom_type,
        name: None,
        truth_value,
        attention_value,
        created_at: now,
        updated_at: now,
        outgoing: Some(outgoing.to_vec()),
    };
    insert_atom(&tx, &atom)?;
    {
        let mut stmt =
            tx.prepare("INSERT INTO links (link_id, position, target_id) VALUES (?1, ?2, ?3)")?;
        for (position, target) in outgoing.iter().enumerate() {
            stmt.execute(params![atom.id, position as i64, target])?;
        }
    }
    write_audit_log(
        &tx,
        "create",
        &atom.id,
        Some(&serde_json::json!({"type": atom_type.as_str(), "arity": outgoing.len()})),
    )?;
    tx.commit()?;

    tracing::debug!(id = %atom.id, atom_type = %atom_type, arity = outgoing.len(), "link created");
    Ok(atom)
}

/// Ids from `outgoing` that do not resolve to an atom, in first-seen order.
fn missing_targets(tx: &Transaction, outgoing: &[String]) -> AtomSpaceResult<Vec<String>> {
    let distinct: BTreeSet<&str> = outgoing.iter().map(String::as_str).collect();
    let placeholders = vec!["?"; distinct.len()].join(", ");
    let sql = format!("SELECT id FROM atoms WHERE id IN ({placeholders})");

    let mut stmt = tx.prepare(&sql)?;
    let found: BTreeSet<String> = stmt
        .query_map(rusqlite::params_from_iter(distinct.iter()), |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    let mut missing: Vec<String> = Vec::new();
    for id in outgoing {
        if !found.contains(id) && !missing.contains(id) {
            missing.push(id.clone());
        }
    }
    Ok(missing)
}

fn insert_atom(tx: &Transaction, atom: &Atom) -> AtomSpaceResult<()> {
    tx.execute(
        "INSERT INTO atoms (id, type, name, truth_strength, truth_confidence, sti, lti, vlti, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            atom.id,
            atom.atom_type.as_str(),
            atom.name,
            atom.truth_value.strength,
            atom.truth_value.confidence,
            atom.attention_value.sti,
            atom.attention_value.lti,
            atom.attention_value.vlti,
            atom.created_at,
            atom.updated_at,
        ],
    )?;
    Ok(())
}

/// Replace the truth and/or attention value of an atom.
///
/// Returns `false` when neither value is given or the atom does not exist.
pub fn update_atom(
    conn: &mut Connection,
    id: &str,
    truth_value: Option<TruthValue>,
    attention_value: Option<AttentionValue>,
    strict: bool,
) -> AtomSpaceResult<bool> {
    if truth_value.is_none() && attention_value.is_none() {
        return Ok(false);
    }
    if let Some(tv) = &truth_value {
        check_truth_value(tv, strict)?;
    }

    let tx = conn.transaction()?;
    let now = now_millis();
    let mut changed = 0;

    if let Some(tv) = &truth_value {
        changed = tx.execute(
            "UPDATE atoms SET truth_strength = ?1, truth_confidence = ?2, updated_at = ?3 WHERE id = ?4",
            params![tv.strength, tv.confidence, now, id],
        )?;
    }
    if let Some(av) = &attention_value {
        changed = tx.execute(
            "UPDATE atoms SET sti = ?1, lti = ?2, vlti = ?3, updated_at = ?4 WHERE id = ?5",
            params![av.sti, av.lti, av.vlti, now, id],
        )?;
    }

    if changed == 0 {
        return Ok(false);
    }

    write_audit_log(
        &tx,
        "update",
        id,
        Some(&serde_json::json!({
            "truthValue": truth_value,
            "attentionValue": attention_value,
        })),
    )?;
    tx.commit()?;
    Ok(true)
}

/// Delete an atom and, transitively, every link whose outgoing set contains a
/// deleted atom. Returns `false` if `id` does not exist.
pub fn delete_atom(conn: &mut Connection, id: &str) -> AtomSpaceResult<bool> {
    let tx = conn.transaction()?;

    let doomed: Vec<String> = {
        let mut stmt = tx.prepare(
            "WITH RECURSIVE doomed(id) AS ( \
                 SELECT id FROM atoms WHERE id = ?1 \
                 UNION \
                 SELECT l.link_id FROM links l JOIN doomed d ON l.target_id = d.id \
             ) SELECT id FROM doomed",
        )?;
        let rows = stmt
            .query_map(params![id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };

    if doomed.is_empty() {
        return Ok(false);
    }

    {
        // Membership rows go with their atoms via ON DELETE CASCADE.
        let mut stmt = tx.prepare("DELETE FROM atoms WHERE id = ?1")?;
        for atom_id in &doomed {
            stmt.execute(params![atom_id])?;
        }
    }

    let cascaded = doomed.len() - 1;
    write_audit_log(
        &tx,
        "delete",
        id,
        Some(&serde_json::json!({"cascaded": cascaded})),
    )?;
    tx.commit()?;

    tracing::debug!(id, cascaded, "atom deleted");
    Ok(true)
}

/// Write an entry to the atom_log audit table.
pub(crate) fn write_audit_log(
    conn: &Connection,
    operation: &str,
    atom_id: &str,
    details: Option<&serde_json::Value>,
) -> AtomSpaceResult<()> {
    let details_json = details.map(|d| d.to_string());
    conn.execute(
        "INSERT INTO atom_log (operation, atom_id, details, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![operation, atom_id, details_json, now_millis()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atomspace::query::get_atom;
    use crate::db::{open_memory_database, DbKind};

    fn test_db() -> Connection {
        open_memory_database(DbKind::AtomSpace).unwrap()
    }

    fn node(conn: &mut Connection, name: &str) -> Atom {
        create_node(conn, AtomType::ConceptNode, name, None, None, true).unwrap()
    }

    fn count(conn: &Connection, sql: &str) -> i64 {
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }

    #[test]
    fn create_node_applies_defaults() {
        let mut conn = test_db();
        let cat = node(&mut conn, "cat");

        assert_eq!(cat.name.as_deref(), Some("cat"));
        assert_eq!(cat.truth_value, TruthValue::new(0.5, 0.5));
        assert_eq!(cat.attention_value, AttentionValue::default());
        assert!(cat.outgoing.is_none());
        assert_eq!(cat.created_at, cat.updated_at);
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let mut conn = test_db();
        node(&mut conn, "cat");

        let err = create_node(&mut conn, AtomType::ConceptNode, "cat", None, None, true)
            .unwrap_err();
        assert!(matches!(err, AtomSpaceError::DuplicateName { .. }));

        // Same name under another node type is a different atom
        create_node(&mut conn, AtomType::PredicateNode, "cat", None, None, true).unwrap();
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM atoms"), 2);
    }

    #[test]
    fn node_validation() {
        let mut conn = test_db();
        let err = create_node(&mut conn, AtomType::ListLink, "x", None, None, true).unwrap_err();
        assert!(matches!(err, AtomSpaceError::Validation(_)));

        let err = create_node(&mut conn, AtomType::ConceptNode, "", None, None, true).unwrap_err();
        assert!(matches!(err, AtomSpaceError::Validation(_)));
    }

    #[test]
    fn strict_truth_values_can_be_relaxed() {
        let mut conn = test_db();
        let tv = Some(TruthValue::new(1.5, 0.2));

        let err = create_node(&mut conn, AtomType::ConceptNode, "a", tv, None, true).unwrap_err();
        assert!(matches!(err, AtomSpaceError::Validation(_)));

        let atom = create_node(&mut conn, AtomType::ConceptNode, "a", tv, None, false).unwrap();
        assert_eq!(atom.truth_value.strength, 1.5);
    }

    #[test]
    fn dangling_link_writes_nothing() {
        let mut conn = test_db();
        let cat = node(&mut conn, "cat");

        let err = create_link(
            &mut conn,
            AtomType::ListLink,
            &[cat.id.clone(), "ghost".into(), "ghost".into()],
            None,
            None,
            true,
        )
        .unwrap_err();

        match err {
            AtomSpaceError::DanglingReference { missing } => assert_eq!(missing, vec!["ghost"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM atoms"), 1);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM links"), 0);
    }

    #[test]
    fn empty_outgoing_is_rejected() {
        let mut conn = test_db();
        let err = create_link(&mut conn, AtomType::AndLink, &[], None, None, true).unwrap_err();
        assert!(matches!(err, AtomSpaceError::EmptyOutgoing));
    }

    #[test]
    fn link_may_repeat_a_target() {
        let mut conn = test_db();
        let a = node(&mut conn, "a");
        let link = create_link(
            &mut conn,
            AtomType::ListLink,
            &[a.id.clone(), a.id.clone()],
            None,
            None,
            true,
        )
        .unwrap();
        assert_eq!(link.outgoing.as_ref().unwrap().len(), 2);
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM links"), 2);
    }

    #[test]
    fn update_requires_a_value_and_an_atom() {
        let mut conn = test_db();
        let cat = node(&mut conn, "cat");

        assert!(!update_atom(&mut conn, &cat.id, None, None, true).unwrap());
        assert!(!update_atom(&mut conn, "missing", None, Some(AttentionValue::with_sti(5)), true)
            .unwrap());
        assert!(update_atom(&mut conn, &cat.id, None, Some(AttentionValue::with_sti(5)), true)
            .unwrap());

        let sti: i64 = conn
            .query_row("SELECT sti FROM atoms WHERE id = ?1", [&cat.id], |r| r.get(0))
            .unwrap();
        assert_eq!(sti, 5);
    }

    #[test]
    fn delete_cascades_through_links_of_links() {
        let mut conn = test_db();
        let a = node(&mut conn, "a");
        let b = node(&mut conn, "b");
        let ab = create_link(&mut conn, AtomType::ListLink, &[a.id.clone(), b.id.clone()], None, None, true)
            .unwrap();
        let outer = create_link(&mut conn, AtomType::ListLink, &[ab.id.clone(), b.id.clone()], None, None, true)
            .unwrap();

        assert!(delete_atom(&mut conn, &a.id).unwrap());

        assert!(get_atom(&conn, &ab.id).unwrap().is_none());
        assert!(get_atom(&conn, &outer.id).unwrap().is_none());
        assert!(get_atom(&conn, &b.id).unwrap().is_some());
        assert_eq!(count(&conn, "SELECT COUNT(*) FROM links"), 0);

        let details: String = conn
            .query_row(
                "SELECT details FROM atom_log WHERE operation = 'delete' AND atom_id = ?1",
                [&a.id],
                |r| r.get(0),
            )
            .unwrap();
        assert!(details.contains("\"cascaded\":2"));
    }

    #[test]
    fn delete_is_idempotent() {
        let mut conn = test_db();
        let cat = node(&mut conn, "cat");
        assert!(delete_atom(&mut conn, &cat.id).unwrap());
        assert!(!delete_atom(&mut conn, &cat.id).unwrap());
    }

    #[test]
    fn writes_are_audited() {
        let mut conn = test_db();
        let cat = node(&mut conn, "cat");
        update_atom(&mut conn, &cat.id, Some(TruthValue::new(0.9, 0.9)), None, true).unwrap();
        delete_atom(&mut conn, &cat.id).unwrap();

        assert_eq!(count(&conn, "SELECT COUNT(*) FROM atom_log"), 3);
    }
}
