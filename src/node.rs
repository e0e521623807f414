//! Node ("Ativo") - an instance belonging to exactly one class

use serde::{Deserialize, Serialize};
use crate::attributes::AttributeBag;

/// A node as stored and returned over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    #[serde(rename = "identificador")]
    pub identifier: String,
    /// Identifier of the owning class
    #[serde(rename = "classeId")]
    pub class_id: String,
    /// Free-form instance data
    #[serde(rename = "atributos")]
    pub attributes: AttributeBag,
}

impl Node {
    pub fn new(
        identifier: impl Into<String>,
        class_id: impl Into<String>,
        attributes: AttributeBag,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            class_id: class_id.into(),
            attributes,
        }
    }
}
