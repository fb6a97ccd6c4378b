//! The atom store: a persisted hypergraph of typed nodes and links annotated
//! with truth and attention values.
//!
//! [`AtomStore`] is the synchronous core over one SQLite connection.
//! [`AtomSpaceHandle`] is the async face: one actor thread per instance owns
//! the store and serves requests in arrival order.

pub mod actor;
pub mod error;
pub mod query;
pub mod stats;
pub mod store;
pub mod types;

pub use actor::AtomSpaceHandle;
pub use error::{AtomSpaceError, AtomSpaceResult};
pub use types::{Atom, AtomQuery, AtomType, AttentionValue, Statistics, StiBound, TruthValue};

use rusqlite::Connection;

/// One atom store over an owned connection.
pub struct AtomStore {
    conn: Connection,
    strict_truth_values: bool,
}

impl AtomStore {
    pub fn new(conn: Connection, strict_truth_values: bool) -> Self {
        Self {
            conn,
            strict_truth_values,
        }
    }

    pub fn create_node(
        &mut self,
        atom_type: AtomType,
        name: &str,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
    ) -> AtomSpaceResult<Atom> {
        store::create_node(
            &mut self.conn,
            atom_type,
            name,
            truth_value,
            attention_value,
            self.strict_truth_values,
        )
    }

    pub fn create_link(
        &mut self,
        atom_type: AtomType,
        outgoing: &[String],
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
    ) -> AtomSpaceResult<Atom> {
        store::create_link(
            &mut self.conn,
            atom_type,
            outgoing,
            truth_value,
            attention_value,
            self.strict_truth_values,
        )
    }

    pub fn get_atom(&self, id: &str) -> AtomSpaceResult<Option<Atom>> {
        query::get_atom(&self.conn, id)
    }

    pub fn query_atoms(&self, query: &AtomQuery) -> AtomSpaceResult<Vec<Atom>> {
        query::query_atoms(&self.conn, query)
    }

    pub fn get_incoming(&self, id: &str) -> AtomSpaceResult<Vec<Atom>> {
        query::get_incoming(&self.conn, id)
    }

    pub fn update_atom(
        &mut self,
        id: &str,
        truth_value: Option<TruthValue>,
        attention_value: Option<AttentionValue>,
    ) -> AtomSpaceResult<bool> {
        store::update_atom(
            &mut self.conn,
            id,
            truth_value,
            attention_value,
            self.strict_truth_values,
        )
    }

    pub fn delete_atom(&mut self, id: &str) -> AtomSpaceResult<bool> {
        store::delete_atom(&mut self.conn, id)
    }

    pub fn statistics(&self) -> AtomSpaceResult<Statistics> {
        stats::statistics(&self.conn)
    }

    /// Every atom, oldest first. Used by `cogflare export`.
    pub fn all_atoms(&self) -> AtomSpaceResult<Vec<Atom>> {
        let mut atoms = self.query_atoms(&AtomQuery::default())?;
        atoms.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(atoms)
    }
}
