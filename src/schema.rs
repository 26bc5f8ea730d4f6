//! Schema document types
//!
//! A registry schema is a self-describing tree. Only the keys that drive
//! normalization are modelled; everything else (`default`, `logicalType`,
//! `symbols`, `aliases`, ...) is ignored on deserialization.

use serde::{Deserialize, Serialize};

use crate::error::{ExtractError, Result};

/// A node in a schema document
///
/// The top-level document is itself a node, as is every entry of `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    /// Declared type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeDecl>,

    /// Ordered sub-nodes of a record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SchemaNode>>,

    /// Element type of an array
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<TypeDecl>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

/// The shape of a `type` (or `items`) value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeDecl {
    /// A bare type name: `"string"`, `"record"`, `"array"`, ...
    Name(String),
    /// Alternatives of a union, in declaration order
    Union(Vec<TypeDecl>),
    /// A nested type descriptor object
    Nested(Box<SchemaNode>),
}

/// The top-level schema stored under a subject version
pub type SchemaDocument = SchemaNode;

impl SchemaNode {
    /// Parse a schema document from its JSON text
    ///
    /// The subject is only used to label the error.
    pub fn parse(subject: &str, text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ExtractError::malformed(subject, e.to_string()))
    }
}

#[cfg(test)]
impl SchemaNode {
    /// A node with only a type name set
    pub(crate) fn named_type(name: impl Into<String>) -> Self {
        Self {
            kind: Some(TypeDecl::Name(name.into())),
            ..Self::default()
        }
    }

    pub(crate) fn is_type(&self, name: &str) -> bool {
        matches!(&self.kind, Some(TypeDecl::Name(n)) if n == name)
    }
}
