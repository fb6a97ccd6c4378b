//! Atom type definitions.
//!
//! Defines [`AtomType`] (the closed set of node and link kinds), the
//! [`TruthValue`] / [`AttentionValue`] annotations, the hydrated [`Atom`]
//! record, the [`AtomQuery`] filter, and [`Statistics`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Every kind of atom the store accepts. Node-like and link-like kinds are
/// disjoint; [`AtomType::is_link`] tells them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtomType {
    Node,
    ConceptNode,
    PredicateNode,
    VariableNode,
    Link,
    EvaluationLink,
    InheritanceLink,
    SimilarityLink,
    ImplicationLink,
    ListLink,
    AndLink,
    OrLink,
    NotLink,
}

impl AtomType {
    pub const ALL: [AtomType; 13] = [
        Self::Node,
        Self::ConceptNode,
        Self::PredicateNode,
        Self::VariableNode,
        Self::Link,
        Self::EvaluationLink,
        Self::InheritanceLink,
        Self::SimilarityLink,
        Self::ImplicationLink,
        Self::ListLink,
        Self::AndLink,
        Self::OrLink,
        Self::NotLink,
    ];

    /// SQL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "Node",
            Self::ConceptNode => "ConceptNode",
            Self::PredicateNode => "PredicateNode",
            Self::VariableNode => "VariableNode",
            Self::Link => "Link",
            Self::EvaluationLink => "EvaluationLink",
            Self::InheritanceLink => "InheritanceLink",
            Self::SimilarityLink => "SimilarityLink",
            Self::ImplicationLink => "ImplicationLink",
            Self::ListLink => "ListLink",
            Self::AndLink => "AndLink",
            Self::OrLink => "OrLink",
            Self::NotLink => "NotLink",
        }
    }

    /// `true` for link-like kinds, which carry an outgoing set and no name.
    pub fn is_link(&self) -> bool {
        matches!(
            self,
            Self::Link
                | Self::EvaluationLink
                | Self::InheritanceLink
                | Self::SimilarityLink
                | Self::ImplicationLink
                | Self::ListLink
                | Self::AndLink
                | Self::OrLink
                | Self::NotLink
        )
    }

    pub fn is_node(&self) -> bool {
        !self.is_link()
    }
}

impl std::fmt::Display for AtomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AtomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown atom type: {s}"))
    }
}

/// Probabilistic truth annotation. Both components are conventionally in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TruthValue {
    pub strength: f64,
    pub confidence: f64,
}

impl TruthValue {
    pub fn new(strength: f64, confidence: f64) -> Self {
        Self {
            strength,
            confidence,
        }
    }

    /// Both components finite and within `[0, 1]`.
    pub fn is_bounded(&self) -> bool {
        let ok = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
        ok(self.strength) && ok(self.confidence)
    }
}

impl Default for TruthValue {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Economic attention annotation. `sti` may go negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AttentionValue {
    /// Short-term importance.
    pub sti: i64,
    /// Long-term importance.
    pub lti: i64,
    /// Very long-term importance.
    pub vlti: i64,
}

impl AttentionValue {
    pub fn with_sti(sti: i64) -> Self {
        Self {
            sti,
            ..Self::default()
        }
    }
}

/// A stored atom. Nodes carry `name`; links carry `outgoing` in position order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Atom {
    /// UUID v7 (time-sortable) primary key.
    pub id: String,
    #[serde(rename = "type")]
    pub atom_type: AtomType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub truth_value: TruthValue,
    pub attention_value: AttentionValue,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outgoing: Option<Vec<String>>,
}

impl Atom {
    pub fn is_link(&self) -> bool {
        self.atom_type.is_link()
    }
}

/// An `sti` bound in a query filter (`{"sti": 50}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StiBound {
    pub sti: i64,
}

/// Conjunctive filter for [`query_atoms`](super::query::query_atoms).
/// Absent fields do not constrain the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AtomQuery {
    #[serde(alias = "type", skip_serializing_if = "Option::is_none")]
    pub atom_type: Option<AtomType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Both strength and confidence must clear their minimums.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truth_value_min: Option<TruthValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention_value_min: Option<StiBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attention_value_max: Option<StiBound>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl AtomQuery {
    pub fn by_type(atom_type: AtomType) -> Self {
        Self {
            atom_type: Some(atom_type),
            ..Self::default()
        }
    }

    pub fn sti_at_least(sti: i64) -> Self {
        Self {
            attention_value_min: Some(StiBound { sti }),
            ..Self::default()
        }
    }

    pub fn sti_at_most(sti: i64) -> Self {
        Self {
            attention_value_max: Some(StiBound { sti }),
            ..Self::default()
        }
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Mean attention across all atoms. Fractional, unlike [`AttentionValue`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AverageAttention {
    pub sti: f64,
    pub lti: f64,
    pub vlti: f64,
}

/// Aggregate counts and averages. Averages are zero on an empty store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_atoms: u64,
    pub node_count: u64,
    pub link_count: u64,
    pub average_truth_value: TruthValue,
    pub average_attention_value: AverageAttention,
    /// Count per atom type name, every known type present.
    pub by_type: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atom_type_families_are_disjoint() {
        let links: Vec<_> = AtomType::ALL.iter().filter(|t| t.is_link()).collect();
        let nodes: Vec<_> = AtomType::ALL.iter().filter(|t| t.is_node()).collect();
        assert_eq!(links.len(), 9);
        assert_eq!(nodes.len(), 4);
        assert!(AtomType::ConceptNode.is_node());
        assert!(AtomType::InheritanceLink.is_link());
    }

    #[test]
    fn atom_type_parses_its_own_name() {
        for t in AtomType::ALL {
            assert_eq!(t.as_str().parse::<AtomType>().unwrap(), t);
        }
        assert!("GroundedSchemaNode".parse::<AtomType>().is_err());
    }

    #[test]
    fn truth_value_bounds() {
        assert!(TruthValue::new(0.0, 1.0).is_bounded());
        assert!(!TruthValue::new(1.5, 0.5).is_bounded());
        assert!(!TruthValue::new(0.5, f64::NAN).is_bounded());
    }

    #[test]
    fn node_serializes_without_outgoing() {
        let atom = Atom {
            id: "a".into(),
            atom_type: AtomType::ConceptNode,
            name: Some("cat".into()),
            truth_value: TruthValue::default(),
            attention_value: AttentionValue::default(),
            created_at: 1,
            updated_at: 1,
            outgoing: None,
        };
        let json = serde_json::to_value(&atom).unwrap();
        assert_eq!(json["type"], "ConceptNode");
        assert_eq!(json["truthValue"]["strength"], 0.5);
        assert!(json.get("outgoing").is_none());
    }

    #[test]
    fn query_accepts_wire_field_names() {
        let q: AtomQuery = serde_json::from_str(
            r#"{"atomType":"ConceptNode","attentionValueMin":{"sti":50},"limit":10}"#,
        )
        .unwrap();
        assert_eq!(q.atom_type, Some(AtomType::ConceptNode));
        assert_eq!(q.attention_value_min, Some(StiBound { sti: 50 }));
        assert_eq!(q.limit, Some(10));

        let q: AtomQuery = serde_json::from_str(r#"{"type":"ListLink"}"#).unwrap();
        assert_eq!(q.atom_type, Some(AtomType::ListLink));
    }
}
