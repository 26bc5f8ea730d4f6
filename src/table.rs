//! Tabular metadata records produced from registry schemas

use serde::{Deserialize, Serialize};

/// Database identifier every extracted table is filed under
pub const DATABASE: &str = "kafka_schema_registry";

/// Cluster used when a schema declares no namespace
pub const DEFAULT_CLUSTER: &str = "kafka-schema-registry";

/// A single column of an extracted table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub name: String,
    /// Field `doc`, empty when absent
    pub description: String,
    /// Canonical type string
    #[serde(rename = "type")]
    pub col_type: String,
    /// Zero-based position in the source field list
    pub sort_order: usize,
}

impl FieldRecord {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        col_type: impl Into<String>,
        sort_order: usize,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            col_type: col_type.into(),
            sort_order,
        }
    }
}

/// One schema subject rendered as a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Always [`DATABASE`]
    pub database: String,
    /// Schema namespace
    pub cluster: String,
    /// Registry subject name
    pub schema: String,
    /// Schema name, empty when absent
    pub name: String,
    /// Schema `doc`, empty when absent
    pub description: String,
    pub columns: Vec<FieldRecord>,
}

impl TableRecord {
    /// Fully qualified key, `database://cluster.schema/name`
    pub fn key(&self) -> String {
        format!("{}://{}.{}/{}", self.database, self.cluster, self.schema, self.name)
    }

    /// Reshape into a plain JSON document for downstream sinks
    pub fn to_document(&self) -> serde_json::Value {
        serde_json::json!({
            "database": self.database,
            "cluster": self.cluster,
            "schema": self.schema,
            "name": self.name,
            "description": self.description,
            "columns": self.columns,
        })
    }
}
