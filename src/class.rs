//! Class - named schema template
//!
//! A class is identified by a unique string and carries an attribute bag
//! describing its template. The template is illustrative only: nodes of the
//! class may hold any attributes.

use serde::{Deserialize, Serialize};
use crate::attributes::AttributeBag;

/// A class definition as stored and returned over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    /// Unique class identifier
    #[serde(rename = "identificador")]
    pub identifier: String,
    /// Attribute template
    #[serde(rename = "atributos")]
    pub attributes: AttributeBag,
}

impl Class {
    pub fn new(identifier: impl Into<String>, attributes: AttributeBag) -> Self {
        Self {
            identifier: identifier.into(),
            attributes,
        }
    }
}
