use crate::{DocumentStore, StoreError};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Result of projecting one language field out of a stored document
#[derive(Debug)]
pub enum FetchOutcome {
    /// The document exists and has the field; the value is returned untouched
    Found(Value),
    /// The document exists but has no field named by the language code
    FieldMissing { field: String },
    /// No such document
    NotFound,
    /// The request was rejected before reaching the store (empty language code, empty ids)
    InvalidInput(String),
    /// The store call failed
    BackendFailure(StoreError),
}

impl FetchOutcome {
    /// Collapse every non-`Found` outcome to `None`
    pub fn into_value(self) -> Option<Value> {
        match self {
            FetchOutcome::Found(value) => Some(value),
            _ => None,
        }
    }
}

/// Retrieves a document and projects out the field named by a language code
#[derive(Clone)]
pub struct DocumentFetcher {
    store: Arc<dyn DocumentStore>,
}

impl DocumentFetcher {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Fetch `document.data()[lang]` from `collection/doc_id`.
    ///
    /// Empty inputs never reach the store. A missing document logs one
    /// warning, a store failure logs one error. Nothing is retried.
    pub async fn fetch(&self, lang: &str, collection: &str, doc_id: &str) -> FetchOutcome {
        if lang.is_empty() {
            return FetchOutcome::InvalidInput("language code is empty".to_string());
        }
        if collection.is_empty() || doc_id.is_empty() {
            return FetchOutcome::InvalidInput(format!(
                "collection and document id are required (got '{}'/'{}')",
                collection, doc_id
            ));
        }

        match self.store.get(collection, doc_id).await {
            Ok(Some(mut fields)) => match fields.remove(lang) {
                Some(value) => FetchOutcome::Found(value),
                None => FetchOutcome::FieldMissing {
                    field: lang.to_string(),
                },
            },
            Ok(None) => {
                warn!(collection, doc_id, "document not found");
                FetchOutcome::NotFound
            }
            Err(err) => {
                error!(collection, doc_id, error = %err, "failed to fetch document");
                FetchOutcome::BackendFailure(err)
            }
        }
    }
}
