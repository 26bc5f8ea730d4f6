//! Extraction Tests
//!
//! Drives `SchemaExtractor` against a scripted in-memory registry.

use std::cell::RefCell;
use std::collections::HashMap;

use kafka_schema_extractor::{
    CancelToken, ExtractError, RegistryApi, Result, SchemaExtractor, TableRecord, VersionId,
};

/// Registry double that serves canned responses and records every call
#[derive(Default)]
struct ScriptedRegistry {
    subjects: Vec<String>,
    versions: HashMap<String, Vec<VersionId>>,
    schemas: HashMap<(String, String), String>,
    /// Error returned by every subject listing
    unreachable: Option<fn() -> ExtractError>,
    /// Subjects whose version listing fails with a registry error
    broken_versions: Vec<String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedRegistry {
    fn subject(mut self, name: &str, versions: &[&str], schema: &str) -> Self {
        self.subjects.push(name.to_string());
        self.versions.insert(
            name.to_string(),
            versions.iter().map(|v| VersionId::from(*v)).collect(),
        );
        let latest = VersionId::max_of(versions.iter().map(|v| VersionId::from(*v)));
        if let Some(latest) = latest {
            self.schemas.insert((name.to_string(), latest.to_string()), schema.to_string());
        }
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }
}

impl RegistryApi for ScriptedRegistry {
    fn list_subjects(&self) -> Result<Vec<String>> {
        self.record("subjects".to_string());
        if let Some(err) = self.unreachable {
            return Err(err());
        }
        Ok(self.subjects.clone())
    }

    fn list_versions(&self, subject: &str) -> Result<Vec<VersionId>> {
        self.record(format!("versions:{}", subject));
        if self.broken_versions.iter().any(|s| s == subject) {
            return Err(ExtractError::Registry {
                code: 50001,
                message: "Error in the backend data store".to_string(),
            });
        }
        Ok(self.versions.get(subject).cloned().unwrap_or_default())
    }

    fn fetch_schema_text(&self, subject: &str, version: &VersionId) -> Result<String> {
        self.record(format!("fetch:{}@{}", subject, version));
        self.schemas
            .get(&(subject.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| ExtractError::NotFound {
                subject: subject.to_string(),
                version: version.to_string(),
            })
    }
}

const DEPLOYMENT: &str = include_str!("fixtures/avro_deployment.json");
const NESTED: &str = include_str!("fixtures/nested_options.json");
const MILANO: &str = include_str!("fixtures/milano_grid.json");

fn drain(extractor: &mut SchemaExtractor<ScriptedRegistry>) -> Vec<TableRecord> {
    let mut records = Vec::new();
    while let Some(record) = extractor.extract().unwrap() {
        records.push(record);
    }
    records
}

#[test]
fn test_extracts_all_subjects_in_order() {
    let registry = ScriptedRegistry::default()
        .subject("subject1", &["1"], DEPLOYMENT)
        .subject("subject2", &["1"], NESTED)
        .subject("subject3", &["3", "5", "4"], MILANO);
    let mut extractor = SchemaExtractor::new(registry);

    let records = drain(&mut extractor);
    let names: Vec<(&str, &str)> = records.iter().map(|r| (r.schema.as_str(), r.name.as_str())).collect();
    assert_eq!(
        names,
        vec![
            ("subject1", "AvroDeployment"),
            ("subject2", "myrecord"),
            ("subject3", "milanoRecord"),
        ]
    );

    assert_eq!(
        extractor.client().calls(),
        vec![
            "subjects",
            "subjects",
            "versions:subject1",
            "fetch:subject1@1",
            "versions:subject2",
            "fetch:subject2@1",
            "versions:subject3",
            "fetch:subject3@5",
        ]
    );

    let stats = extractor.stats();
    assert_eq!(stats.subjects, 3);
    assert_eq!(stats.extracted, 3);
    assert_eq!(stats.skipped_count(), 0);
}

#[test]
fn test_empty_registry() {
    let mut extractor = SchemaExtractor::new(ScriptedRegistry::default());

    assert!(extractor.extract().unwrap().is_none());
    assert_eq!(extractor.client().calls(), vec!["subjects", "subjects"]);

    assert!(extractor.extract().unwrap().is_none());
    assert_eq!(extractor.client().calls().len(), 2);
}

#[test]
fn test_picks_greatest_version() {
    let registry = ScriptedRegistry::default().subject("SAMPLE_SUBJECT", &["3", "4", "1", "2"], DEPLOYMENT);
    assert_eq!(registry.max_version("SAMPLE_SUBJECT").unwrap(), VersionId::from("4"));

    let mut extractor = SchemaExtractor::new(registry);
    assert!(extractor.extract().unwrap().is_some());
    assert!(extractor
        .client()
        .calls()
        .contains(&"fetch:SAMPLE_SUBJECT@4".to_string()));
}

#[test]
fn test_invalid_schema_json_is_skipped() {
    let registry = ScriptedRegistry::default()
        .subject("broken", &["1"], "{\"type\": \"record\", \"fields\": [")
        .subject("subject1", &["1"], DEPLOYMENT);
    let mut extractor = SchemaExtractor::new(registry);

    let records = drain(&mut extractor);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].schema, "subject1");

    let skipped = &extractor.stats().skipped;
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].subject, "broken");
    assert_eq!(skipped[0].kind, "malformed_schema");
}

#[test]
fn test_per_subject_failures_are_isolated() {
    let mut registry = ScriptedRegistry::default()
        .subject("no-versions", &[], DEPLOYMENT)
        .subject("backend-down", &["1"], DEPLOYMENT)
        .subject("no-fields", &["1"], r#"{"type": "enum", "name": "Color", "symbols": ["RED"]}"#)
        .subject("subject3", &["1"], MILANO);
    registry.broken_versions.push("backend-down".to_string());
    let mut extractor = SchemaExtractor::new(registry);

    let records = drain(&mut extractor);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].schema, "subject3");

    let kinds: Vec<(&str, &str)> = extractor
        .stats()
        .skipped
        .iter()
        .map(|s| (s.subject.as_str(), s.kind.as_str()))
        .collect();
    assert_eq!(
        kinds,
        vec![
            ("no-versions", "not_found"),
            ("backend-down", "registry"),
            ("no-fields", "malformed_schema"),
        ]
    );
}

#[test]
fn test_schema_too_deep_is_skipped() {
    let mut deep = String::from(r#"{"type": "string"}"#);
    for _ in 0..8 {
        deep = format!(r#"{{"type": "array", "items": {}}}"#, deep);
    }
    let schema = format!(r#"{{"type": "record", "fields": [{{"name": "deep", "type": {}}}]}}"#, deep);

    let registry = ScriptedRegistry::default()
        .subject("deep", &["1"], &schema)
        .subject("subject1", &["1"], DEPLOYMENT);
    let normalizer = kafka_schema_extractor::Normalizer::new(4, "kafka-schema-registry");
    let mut extractor = SchemaExtractor::new(registry).with_normalizer(normalizer);

    let records = drain(&mut extractor);
    assert_eq!(records.len(), 1);
    assert_eq!(extractor.stats().skipped[0].kind, "schema_too_deep");
}

#[test]
fn test_connection_failure_is_fatal() {
    let registry = ScriptedRegistry {
        unreachable: Some(|| ExtractError::Connectivity {
            url: "http://registry:8081/subjects".to_string(),
            message: "connection refused".to_string(),
        }),
        ..ScriptedRegistry::default()
    }
    .subject("subject1", &["1"], DEPLOYMENT);
    let mut extractor = SchemaExtractor::new(registry);

    let err = extractor.extract().unwrap_err();
    assert_eq!(err.kind(), "connectivity");

    // No partial iteration after a fatal start
    assert!(extractor.extract().unwrap().is_none());
    assert_eq!(extractor.client().calls(), vec!["subjects"]);
}

#[test]
fn test_auth_failure_is_fatal() {
    let registry = ScriptedRegistry {
        unreachable: Some(|| ExtractError::Auth("Unauthorized".to_string())),
        ..ScriptedRegistry::default()
    };
    let mut extractor = SchemaExtractor::new(registry);

    match extractor.next() {
        Some(Err(ExtractError::Auth(message))) => assert_eq!(message, "Unauthorized"),
        other => panic!("Expected Auth error, got {:?}", other),
    }
    assert!(extractor.next().is_none());
}

#[test]
fn test_iterator_collects_records() {
    let registry = ScriptedRegistry::default()
        .subject("subject1", &["1"], DEPLOYMENT)
        .subject("broken", &["1"], "not json")
        .subject("subject3", &["1"], MILANO);

    let records: Vec<TableRecord> = SchemaExtractor::new(registry).collect::<Result<_>>().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].cluster, "com.landoop.telecom.telecomitalia.grid");
}

#[test]
fn test_cancel_between_subjects() {
    let registry = ScriptedRegistry::default()
        .subject("subject1", &["1"], DEPLOYMENT)
        .subject("subject2", &["1"], NESTED);
    let cancel = CancelToken::new();
    let mut extractor = SchemaExtractor::new(registry).with_cancel_token(cancel.clone());

    assert!(extractor.extract().unwrap().is_some());
    cancel.cancel();
    assert!(extractor.extract().unwrap().is_none());

    assert!(extractor.stats().cancelled);
    assert_eq!(extractor.stats().extracted, 1);
    assert!(!extractor
        .client()
        .calls()
        .iter()
        .any(|c| c.ends_with("subject2")));
}
