//! Edge ("Vínculo") - typed directed relationship between two nodes
//!
//! Edges have no identifier of their own. They are addressed by any
//! combination of source, destination and type through [`EdgeCriteria`].
//! Two edges with the same triple may coexist.

use serde::{Deserialize, Serialize};

/// An edge as stored and returned over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Source node identifier
    #[serde(rename = "origemId")]
    pub source_id: String,
    /// Destination node identifier
    #[serde(rename = "destinoId")]
    pub destination_id: String,
    /// Free-form relationship label
    #[serde(rename = "tipo")]
    pub kind: String,
}

impl Edge {
    pub fn new(
        source_id: impl Into<String>,
        destination_id: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            destination_id: destination_id.into(),
            kind: kind.into(),
        }
    }
}

/// Conjunctive filter over edges.
///
/// A `None` field is not filtered on. Empty strings are treated as absent,
/// so `{origemId: "", tipo: ""}` carries no criteria at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EdgeCriteria {
    #[serde(rename = "origemId", default)]
    pub source_id: Option<String>,
    #[serde(rename = "destinoId", default)]
    pub destination_id: Option<String>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<String>,
}

impl EdgeCriteria {
    pub fn new(
        source_id: Option<String>,
        destination_id: Option<String>,
        kind: Option<String>,
    ) -> Self {
        Self {
            source_id,
            destination_id,
            kind,
        }
        .normalized()
    }

    /// Drop empty-string criteria
    pub fn normalized(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }
        Self {
            source_id: keep(self.source_id),
            destination_id: keep(self.destination_id),
            kind: keep(self.kind),
        }
    }

    /// True when no criterion constrains the match
    pub fn is_empty(&self) -> bool {
        [&self.source_id, &self.destination_id, &self.kind]
            .iter()
            .all(|c| c.as_deref().is_none_or(str::is_empty))
    }
}
