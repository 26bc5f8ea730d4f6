//! Kafka Schema Registry Extractor
//!
//! Reads the latest version of every subject in a schema registry and turns
//! each schema into tabular metadata: a named table with ordered, typed
//! columns.
//!
//! ## Features
//!
//! - **Canonical types**: nested records, arrays and unions are flattened into a
//!   single type string per column (`array<Point:struct<x:int,y:int>>`)
//! - **Fault isolation**: a subject whose schema cannot be fetched or parsed is
//!   logged and skipped; the rest of the run continues
//! - **Lazy extraction**: records are produced one pull at a time, in registry
//!   order, with no concurrent requests
//!
//! ## Architecture
//!
//! ```text
//! RegistryClient ──▶ SchemaExtractor ──▶ TableRecord
//!   (client.rs)       (extractor.rs)      (table.rs)
//!                          │
//!                          ▼
//!                     Normalizer
//!                   (normalize.rs)
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod extractor;
pub mod normalize;
pub mod schema;
pub mod table;
pub mod version;

pub use client::{RegistryApi, RegistryClient, RegistryConnection};
pub use config::{ExtractorConfig, OutputFormat};
pub use error::{ExtractError, Result};
pub use extractor::{CancelToken, ExtractStats, SchemaExtractor, SkippedSubject};
pub use normalize::{fields_of, normalize, type_of, NormalizeError, Normalizer};
pub use schema::{SchemaDocument, SchemaNode, TypeDecl};
pub use table::{FieldRecord, TableRecord};
pub use version::{SubjectVersion, VersionId};
