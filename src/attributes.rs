//! Attribute Bag - free-form payload of classes and nodes
//!
//! A bag maps attribute names to arbitrary JSON values (strings, numbers,
//! booleans, nested objects, arrays). Class templates and node instances both
//! use it, and their shapes are never checked against each other.

use serde_json::Value;
use crate::{Error, Result};

/// String-keyed map of JSON values
pub type AttributeBag = serde_json::Map<String, Value>;

/// Accept a JSON payload only if it is an object.
///
/// `None`, `null`, arrays and scalars are all rejected with `message`.
pub fn require_object(value: Option<Value>, message: &str) -> Result<AttributeBag> {
    match value {
        Some(Value::Object(map)) => Ok(map),
        _ => Err(Error::invalid(message)),
    }
}

/// Serialize a bag for storage
pub fn to_json(bag: &AttributeBag) -> Result<String> {
    Ok(serde_json::to_string(bag)?)
}

/// Deserialize a stored bag
pub fn from_json(text: &str) -> Result<AttributeBag> {
    Ok(serde_json::from_str(text)?)
}
