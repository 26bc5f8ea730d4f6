//! Schema Normalization
//!
//! Flattens a nested schema tree into canonical type strings:
//!
//! | node                                  | canonical type             |
//! |---------------------------------------|----------------------------|
//! | no `type`                             | `object`                   |
//! | `type` is a nested descriptor         | type of the descriptor     |
//! | `type` is a union                     | alternatives joined by `\|` |
//! | `record` with fields, named           | `name:struct<f:t,...>`     |
//! | `record` with fields, unnamed         | `struct<f:t,...>`          |
//! | `record` without fields               | `struct<object>`           |
//! | `array` with a descriptor in `items`  | `array<items>`             |
//! | `array` with no descriptor in `items` | `array<object>`            |
//! | any other name                        | the name, verbatim         |
//!
//! Output depends only on the node being typed. Descent is capped at
//! `max_depth` levels so hostile documents fail with an error instead of
//! exhausting the stack.

use thiserror::Error;

use crate::error::ExtractError;
use crate::schema::{SchemaDocument, SchemaNode, TypeDecl};
use crate::table::{FieldRecord, TableRecord, DATABASE, DEFAULT_CLUSTER};

/// Default nesting limit
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Why a document could not be normalized
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("schema nesting exceeds maximum depth of {0}")]
    TooDeep(usize),

    #[error("field {index} of record '{record}' has no name")]
    UnnamedField { record: String, index: usize },

    #[error("schema has no field list")]
    MissingFields,
}

impl NormalizeError {
    /// Attach the subject being processed
    pub fn for_subject(self, subject: &str) -> ExtractError {
        match self {
            NormalizeError::TooDeep(max_depth) => ExtractError::SchemaTooDeep { max_depth },
            other => ExtractError::malformed(subject, other.to_string()),
        }
    }
}

/// Converts schema documents into table records
#[derive(Debug, Clone)]
pub struct Normalizer {
    max_depth: usize,
    default_cluster: String,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            default_cluster: DEFAULT_CLUSTER.to_string(),
        }
    }
}

impl Normalizer {
    pub fn new(max_depth: usize, default_cluster: impl Into<String>) -> Self {
        Self {
            max_depth,
            default_cluster: default_cluster.into(),
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Canonical type string of a node
    pub fn type_of(&self, node: &SchemaNode) -> Result<String, NormalizeError> {
        let mut out = String::new();
        self.write_node(node, 0, &mut out)?;
        Ok(out)
    }

    /// Columns of a record document, in source order
    pub fn fields_of(&self, doc: &SchemaDocument) -> Result<Vec<FieldRecord>, NormalizeError> {
        let fields = doc.fields.as_ref().ok_or(NormalizeError::MissingFields)?;

        let mut columns = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let name = field_name(doc, field, index)?;
            let col_type = self.type_of(field)?;
            let description = field.doc.clone().unwrap_or_default();
            columns.push(FieldRecord::new(name, description, col_type, index));
        }
        Ok(columns)
    }

    /// Build the table record for a subject's schema
    pub fn normalize(&self, doc: &SchemaDocument, subject: &str) -> crate::Result<TableRecord> {
        let columns = self.fields_of(doc).map_err(|e| e.for_subject(subject))?;

        Ok(TableRecord {
            database: DATABASE.to_string(),
            cluster: doc
                .namespace
                .clone()
                .unwrap_or_else(|| self.default_cluster.clone()),
            schema: subject.to_string(),
            name: doc.name.clone().unwrap_or_default(),
            description: doc.doc.clone().unwrap_or_default(),
            columns,
        })
    }

    fn write_node(&self, node: &SchemaNode, depth: usize, out: &mut String) -> Result<(), NormalizeError> {
        if depth > self.max_depth {
            return Err(NormalizeError::TooDeep(self.max_depth));
        }

        match &node.kind {
            None => out.push_str("object"),
            Some(TypeDecl::Nested(inner)) => self.write_node(inner, depth + 1, out)?,
            Some(TypeDecl::Union(alternatives)) => self.write_union(alternatives, depth, out)?,
            Some(TypeDecl::Name(name)) => match name.as_str() {
                "record" => self.write_record(node, depth, out)?,
                "array" => {
                    out.push_str("array<");
                    // Only a descriptor object is typed; a bare name or list has no `type` key
                    match &node.items {
                        Some(TypeDecl::Nested(items)) => self.write_node(items, depth + 1, out)?,
                        _ => out.push_str("object"),
                    }
                    out.push('>');
                }
                scalar => out.push_str(scalar),
            },
        }

        Ok(())
    }

    /// One alternative of a union
    fn write_decl(&self, decl: &TypeDecl, depth: usize, out: &mut String) -> Result<(), NormalizeError> {
        match decl {
            TypeDecl::Name(name) => {
                out.push_str(name);
                Ok(())
            }
            TypeDecl::Union(alternatives) => self.write_union(alternatives, depth, out),
            TypeDecl::Nested(node) => self.write_node(node, depth, out),
        }
    }

    fn write_union(&self, alternatives: &[TypeDecl], depth: usize, out: &mut String) -> Result<(), NormalizeError> {
        for (i, alternative) in alternatives.iter().enumerate() {
            if i > 0 {
                out.push('|');
            }
            self.write_decl(alternative, depth + 1, out)?;
        }
        Ok(())
    }

    fn write_record(&self, node: &SchemaNode, depth: usize, out: &mut String) -> Result<(), NormalizeError> {
        let fields = match node.fields.as_deref() {
            Some(fields) if !fields.is_empty() => fields,
            _ => {
                out.push_str("struct<object>");
                return Ok(());
            }
        };

        if let Some(name) = &node.name {
            out.push_str(name);
            out.push(':');
        }
        out.push_str("struct<");
        for (index, field) in fields.iter().enumerate() {
            if index > 0 {
                out.push(',');
            }
            out.push_str(field_name(node, field, index)?);
            out.push(':');
            self.write_node(field, depth + 1, out)?;
        }
        out.push('>');

        Ok(())
    }
}

fn field_name<'a>(record: &SchemaNode, field: &'a SchemaNode, index: usize) -> Result<&'a str, NormalizeError> {
    field.name.as_deref().ok_or_else(|| NormalizeError::UnnamedField {
        record: record.name.clone().unwrap_or_default(),
        index,
    })
}

/// Canonical type string using the default depth limit
pub fn type_of(node: &SchemaNode) -> Result<String, NormalizeError> {
    Normalizer::default().type_of(node)
}

/// Columns of a record document using the default depth limit
pub fn fields_of(doc: &SchemaDocument) -> Result<Vec<FieldRecord>, NormalizeError> {
    Normalizer::default().fields_of(doc)
}

/// Table record for a subject using default settings
pub fn normalize(doc: &SchemaDocument, subject: &str) -> crate::Result<TableRecord> {
    Normalizer::default().normalize(doc, subject)
}
