//! Turning pasted JSON text into store inserts.

use futures_util::future::join_all;
use jsonshelf_protocol::{NewRecord, OwnerId, RecordId};
use jsonshelf_store::DocumentStore;
use log::{debug, info, warn};
use serde_json::{Value, json};
use std::sync::Arc;
use thiserror::Error;

/// Outcome of one ingestion batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Number of inserts issued.
    pub attempted: usize,
    /// Ids of the inserts that succeeded, in input order.
    pub inserted: Vec<RecordId>,
    pub failures: Vec<InsertFailure>,
}

impl IngestReport {
    pub fn succeeded(&self) -> usize {
        self.inserted.len()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.inserted.len() == self.attempted
    }

    /// Confirmation text for a fully successful batch.
    pub fn summary(&self) -> String {
        if self.attempted == 1 {
            "JSON data saved successfully!".to_string()
        } else {
            format!("Successfully saved {} records!", self.attempted)
        }
    }
}

/// A single insert that the store rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertFailure {
    /// Position of the value in the submitted batch.
    pub index: usize,
    pub message: String,
}

/// Errors returned by the ingestion pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Nothing but whitespace was submitted.
    #[error("Please enter some JSON data")]
    EmptyInput,
    /// The text is not valid JSON.
    #[error("Invalid JSON format. Please check your syntax. ({0})")]
    MalformedInput(#[from] serde_json::Error),
    /// An empty array was submitted.
    #[error("Array is empty")]
    EmptyBatch,
    /// The form already has a submit running.
    #[error("Still saving the previous submission")]
    InFlight,
    /// Some inserts failed; the rest were persisted and are not rolled back.
    #[error(
        "Error saving data: saved {} of {} records",
        .0.inserted.len(),
        .0.attempted
    )]
    PartialFailure(IngestReport),
}

/// Parse submitted text into the values to insert.
///
/// Arrays are expanded into one value per element; anything else is a single value.
pub fn parse_candidates(text: &str) -> Result<Vec<Value>, IngestError> {
    if text.trim().is_empty() {
        return Err(IngestError::EmptyInput);
    }
    match serde_json::from_str(text)? {
        Value::Array(items) if items.is_empty() => Err(IngestError::EmptyBatch),
        Value::Array(items) => Ok(items),
        value => Ok(vec![value]),
    }
}

/// Validates submitted JSON and persists it, one record per value.
#[derive(Clone)]
pub struct IngestionPipeline {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl IngestionPipeline {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>) -> Self {
        Self {
            store,
            collection: collection.into(),
        }
    }

    /// Parse `text` and insert every value for `owner_id`.
    ///
    /// Inserts are issued concurrently and all of them are awaited. Nothing is
    /// sent to the store when parsing or classification fails.
    pub async fn ingest(
        &self,
        text: &str,
        owner_id: &OwnerId,
    ) -> Result<IngestReport, IngestError> {
        let candidates = parse_candidates(text)?;
        let attempted = candidates.len();
        debug!(
            "ingesting batch (collection={}, owner_id={}, values={})",
            self.collection, owner_id, attempted
        );

        let inserts = candidates.into_iter().map(|payload| {
            self.store
                .insert(&self.collection, NewRecord::new(payload, owner_id.clone()))
        });
        let results = join_all(inserts).await;

        let mut report = IngestReport {
            attempted,
            ..IngestReport::default()
        };
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(id) => report.inserted.push(id),
                Err(err) => {
                    warn!("insert failed (index={}, error={})", index, err);
                    report.failures.push(InsertFailure {
                        index,
                        message: err.to_string(),
                    });
                }
            }
        }

        if report.is_complete() {
            info!("ingested batch (records={})", report.attempted);
            Ok(report)
        } else {
            Err(IngestError::PartialFailure(report))
        }
    }
}

/// The three course objects offered by "Load sample".
pub fn sample_payload() -> Value {
    json!([
        {
            "name": "Computer Science",
            "level": "Bachelor",
            "duration": "4 years",
            "credits": 120,
            "department": "Engineering",
            "isActive": true
        },
        {
            "name": "Business Administration",
            "level": "Master",
            "duration": "2 years",
            "credits": 60,
            "department": "Business",
            "isActive": true
        },
        {
            "name": "Data Science",
            "level": "Bachelor",
            "duration": "4 years",
            "credits": 128,
            "department": "Engineering",
            "isActive": false
        }
    ])
}

/// Text buffer and submit state behind the data-entry screen.
#[derive(Debug, Clone, Default)]
pub struct JsonForm {
    pub text: String,
    submitting: bool,
}

impl JsonForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.text.trim().is_empty()
    }

    /// Mark a submit as in flight and hand out the text to ingest.
    ///
    /// Returns `None` when a submit is already running or the text is blank.
    pub fn begin_submit(&mut self) -> Option<String> {
        if !self.can_submit() {
            return None;
        }
        self.submitting = true;
        Some(self.text.clone())
    }

    /// Record the outcome of a submit; the text is cleared only on full success.
    pub fn finish_submit(&mut self, result: &Result<IngestReport, IngestError>) {
        self.submitting = false;
        if result.is_ok() {
            self.text.clear();
        }
    }

    /// Submit the current text through `pipeline` and wait for the outcome.
    pub async fn submit(
        &mut self,
        pipeline: &IngestionPipeline,
        owner_id: &OwnerId,
    ) -> Result<IngestReport, IngestError> {
        if self.submitting {
            return Err(IngestError::InFlight);
        }
        let Some(text) = self.begin_submit() else {
            return Err(IngestError::EmptyInput);
        };
        let result = pipeline.ingest(&text, owner_id).await;
        self.finish_submit(&result);
        result
    }

    /// Pretty-print the text with two-space indentation. Invalid JSON is left untouched.
    pub fn format(&mut self) -> Result<(), IngestError> {
        let value: Value = serde_json::from_str(&self.text)?;
        self.text = serde_json::to_string_pretty(&value)?;
        Ok(())
    }

    /// Replace the text with the sample course list.
    pub fn load_sample(&mut self) {
        self.text = serde_json::to_string_pretty(&sample_payload()).unwrap_or_default();
    }
}
