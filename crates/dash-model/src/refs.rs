//! Object references

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reference to a metadata object (widget, insight, display form, data set, dashboard)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ObjRef {
    /// Reference by URI
    Uri(String),
    /// Reference by identifier
    Identifier(String),
}

impl ObjRef {
    pub fn uri(uri: impl Into<String>) -> Self {
        ObjRef::Uri(uri.into())
    }

    pub fn identifier(identifier: impl Into<String>) -> Self {
        ObjRef::Identifier(identifier.into())
    }

    /// Create a fresh temporary identity for an object that was never persisted
    pub fn temporary() -> Self {
        ObjRef::Identifier(format!("{}{}", TEMPORARY_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Whether this reference was created by [`ObjRef::temporary`]
    pub fn is_temporary(&self) -> bool {
        matches!(self, ObjRef::Identifier(id) if id.starts_with(TEMPORARY_PREFIX))
    }

    /// The raw value regardless of kind
    pub fn value(&self) -> &str {
        match self {
            ObjRef::Uri(v) | ObjRef::Identifier(v) => v,
        }
    }
}

const TEMPORARY_PREFIX: &str = "tmp-";

impl fmt::Display for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjRef::Uri(uri) => write!(f, "uri:{}", uri),
            ObjRef::Identifier(id) => write!(f, "id:{}", id),
        }
    }
}
