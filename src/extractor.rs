//! Schema Extraction
//!
//! Walks every subject of a registry and yields one [`TableRecord`] per
//! subject, built from the subject's greatest version.
//!
//! The extractor is a pull-driven state machine:
//!
//! ```text
//! NotStarted --check_connection, list_subjects--> Running(cursor) --> Exhausted
//!      |                                                                 ^
//!      +--------------------------- startup failure ---------------------+
//! ```
//!
//! Startup failures are returned to the caller. Failures while processing a
//! single subject are logged, recorded in [`ExtractStats`] and skipped.
//! Once exhausted, every further pull returns `Ok(None)`.

use std::iter::FusedIterator;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::client::RegistryApi;
use crate::error::Result;
use crate::normalize::Normalizer;
use crate::table::TableRecord;
use crate::version::SubjectVersion;

/// Configuration scope of this extractor
pub const SCOPE: &str = "extractor.kafka_schema_registry";

/// Cooperative cancellation flag, checked once per subject
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A subject that produced no record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSubject {
    pub subject: String,
    /// Error kind label, see [`crate::ExtractError::kind`]
    pub kind: String,
    pub reason: String,
}

/// Progress of an extraction run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Subjects reported by the registry
    pub subjects: usize,
    /// Records yielded
    pub extracted: usize,
    pub skipped: Vec<SkippedSubject>,
    pub cancelled: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ExtractStats {
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

enum State {
    NotStarted,
    Running { subjects: std::vec::IntoIter<String> },
    Exhausted,
}

/// Single-pass extractor over a schema registry
pub struct SchemaExtractor<C> {
    client: C,
    normalizer: Normalizer,
    cancel: CancelToken,
    state: State,
    stats: ExtractStats,
}

impl<C: RegistryApi> SchemaExtractor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            normalizer: Normalizer::default(),
            cancel: CancelToken::new(),
            state: State::NotStarted,
            stats: ExtractStats::default(),
        }
    }

    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn scope(&self) -> &'static str {
        SCOPE
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn stats(&self) -> &ExtractStats {
        &self.stats
    }

    pub fn into_stats(self) -> ExtractStats {
        self.stats
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted)
    }

    /// Pull the next record
    ///
    /// Returns `Ok(None)` when all subjects are consumed. Errors are only
    /// returned from the first pull, when the registry cannot be reached or
    /// its subjects cannot be listed.
    pub fn extract(&mut self) -> Result<Option<TableRecord>> {
        if matches!(self.state, State::NotStarted) {
            self.start()?;
        }

        loop {
            if self.cancel.is_cancelled() && !self.is_exhausted() {
                info!("Extraction cancelled");
                self.stats.cancelled = true;
                self.finish();
            }

            let subject = match &mut self.state {
                State::Running { subjects } => subjects.next(),
                _ => None,
            };
            let Some(subject) = subject else {
                self.finish();
                return Ok(None);
            };

            match self.extract_subject(&subject) {
                Ok(record) => {
                    self.stats.extracted += 1;
                    return Ok(Some(record));
                }
                Err(e) => {
                    warn!(subject = %subject, kind = e.kind(), error = %e, "Failed to generate table, skipping subject");
                    self.stats.skipped.push(SkippedSubject {
                        subject,
                        kind: e.kind().to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    fn start(&mut self) -> Result<()> {
        // Any failure below leaves the extractor exhausted
        self.state = State::Exhausted;
        self.stats.started_at = Some(Utc::now());

        self.client.check_connection()?;
        let subjects = self.client.list_subjects()?;

        info!(count = subjects.len(), "Number of extracted subjects");
        debug!(?subjects, "Extracted subjects");

        self.stats.subjects = subjects.len();
        self.state = State::Running {
            subjects: subjects.into_iter(),
        };
        Ok(())
    }

    fn extract_subject(&self, subject: &str) -> Result<TableRecord> {
        info!(subject, "Getting subject");
        let version = self.client.max_version(subject)?;
        let target = SubjectVersion {
            subject: subject.to_string(),
            version,
        };
        info!(subject_version = %target, "Maximum version selected");

        let doc = self.client.fetch_version(&target.subject, &target.version)?;
        let record = self.normalizer.normalize(&doc, subject)?;
        debug!(table = %record.key(), columns = record.columns.len(), "Table generated");
        Ok(record)
    }

    fn finish(&mut self) {
        self.state = State::Exhausted;
        if self.stats.finished_at.is_some() {
            return;
        }
        self.stats.finished_at = Some(Utc::now());
        info!(
            subjects = self.stats.subjects,
            extracted = self.stats.extracted,
            skipped = self.stats.skipped_count(),
            "Extraction finished"
        );
    }
}

impl<C: RegistryApi> Iterator for SchemaExtractor<C> {
    type Item = Result<TableRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.extract().transpose()
    }
}

impl<C: RegistryApi> FusedIterator for SchemaExtractor<C> {}
