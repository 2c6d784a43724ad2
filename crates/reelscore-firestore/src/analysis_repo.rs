//! Persisted analysis results, keyed by content identifier.

use std::collections::HashMap;

use chrono::Utc;
use reelscore_models::{AnalysisResult, ContentId};
use tracing::{debug, info};

use crate::client::FirestoreClient;
use crate::error::{FirestoreError, FirestoreResult};
use crate::types::{json_to_value, value_to_json, Document, Value};

const FIELD_IDENTIFIER: &str = "identifier";
const FIELD_RESULT: &str = "result";
const FIELD_CREATED_AT: &str = "createdAt";

/// Outcome of a create-only save.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created,
    /// Another writer got there first; carries their stored result.
    AlreadyExists(AnalysisResult),
}

/// Repository for analysis documents.
#[derive(Clone)]
pub struct AnalysisRepository {
    client: FirestoreClient,
    collection: String,
}

impl AnalysisRepository {
    pub fn new(client: FirestoreClient) -> Self {
        let collection = client.config().collection.clone();
        Self { client, collection }
    }

    /// Look up the stored result for `id`.
    pub async fn find(&self, id: &ContentId) -> FirestoreResult<Option<AnalysisResult>> {
        let doc = self
            .client
            .with_retry("get_analysis", || {
                self.client.get_document(&self.collection, id.as_str())
            })
            .await?;

        match doc {
            Some(doc) => {
                debug!(content_id = %id.short(), "Found stored analysis");
                Ok(Some(document_to_result(&doc)?))
            }
            None => Ok(None),
        }
    }

    /// Store `result` under `id` unless a document already exists.
    pub async fn create(&self, id: &ContentId, result: &AnalysisResult) -> FirestoreResult<CreateOutcome> {
        let fields = result_to_fields(id, result)?;

        let created = self
            .client
            .with_retry("create_analysis", || {
                self.client
                    .create_document(&self.collection, id.as_str(), fields.clone())
            })
            .await;

        match created {
            Ok(_) => {
                info!(content_id = %id.short(), "Stored analysis");
                Ok(CreateOutcome::Created)
            }
            Err(FirestoreError::AlreadyExists(_)) => {
                let existing = self.find(id).await?.ok_or_else(|| {
                    FirestoreError::request_failed(format!(
                        "{}/{} reported as existing but could not be read",
                        self.collection, id
                    ))
                })?;
                // A retried create whose first attempt committed conflicts with itself.
                if existing == *result {
                    info!(content_id = %id.short(), "Stored analysis (earlier attempt committed)");
                    return Ok(CreateOutcome::Created);
                }
                info!(content_id = %id.short(), "Analysis already stored by another writer");
                Ok(CreateOutcome::AlreadyExists(existing))
            }
            Err(e) => Err(e),
        }
    }
}

fn result_to_fields(id: &ContentId, result: &AnalysisResult) -> FirestoreResult<HashMap<String, Value>> {
    let json = serde_json::to_value(result)?;

    let mut fields = HashMap::new();
    fields.insert(FIELD_IDENTIFIER.to_string(), Value::string(id.as_str()));
    fields.insert(FIELD_RESULT.to_string(), json_to_value(&json));
    fields.insert(FIELD_CREATED_AT.to_string(), Value::timestamp(Utc::now()));
    Ok(fields)
}

fn document_to_result(doc: &Document) -> FirestoreResult<AnalysisResult> {
    let value = doc
        .field(FIELD_RESULT)
        .ok_or_else(|| FirestoreError::serialization("analysis document has no result field"))?;

    serde_json::from_value(value_to_json(value)).map_err(|e| {
        FirestoreError::serialization(format!("stored analysis does not match schema: {}", e))
    })
}
