use crate::{Document, DocumentStore, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// In-process store, mostly for tests and demos
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<(String, String), Document>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a document
    pub fn insert(&self, collection: &str, doc_id: &str, document: Document) {
        let mut documents = self
            .documents
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        documents.insert((collection.to_string(), doc_id.to_string()), document);
    }

    /// Builder-style insert
    pub fn with_document(self, collection: &str, doc_id: &str, document: Document) -> Self {
        self.insert(collection, doc_id, document);
        self
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(documents
            .get(&(collection.to_string(), doc_id.to_string()))
            .cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>> {
        let documents = self
            .documents
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut ids: Vec<String> = documents
            .keys()
            .filter(|(c, _)| c == collection)
            .map(|(_, id)| id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }
}
