// Document stores (file, Firestore, in-memory) and the language-field fetcher

pub mod fetcher;
pub mod file;
pub mod firestore;
pub mod memory;

pub use fetcher::{DocumentFetcher, FetchOutcome};
pub use file::FileStore;
pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use site_kit_core::StoreSettings;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Field mapping of one stored document
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid document identifier '{0}'")]
    InvalidId(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("document {0} is not a JSON object")]
    NotAnObject(String),
    #[error("failed to decode document {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("request to document store failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid document store URL: {0}")]
    InvalidUrl(String),
    #[error("invalid document store credentials: {0}")]
    Credentials(String),
    #[error("document store returned {status}: {body}")]
    Backend { status: u16, body: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Key-value document accessor keyed by (collection, document id)
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document's fields; `None` when the document does not exist
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>>;

    /// Ids of every document in a collection, sorted
    async fn list(&self, collection: &str) -> Result<Vec<String>>;
}

/// Open the store described by the site configuration
pub fn open(settings: &StoreSettings) -> Result<Arc<dyn DocumentStore>> {
    Ok(match settings {
        StoreSettings::File { root } => Arc::new(FileStore::new(root.clone())),
        StoreSettings::Firestore(firestore) => Arc::new(FirestoreStore::new(firestore)?),
        StoreSettings::Memory => Arc::new(MemoryStore::new()),
    })
}

/// Reject identifiers that could escape a collection (path separators, `..`)
pub(crate) fn validate_id(id: &str) -> Result<()> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '\\', '\0'])
    {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    Ok(())
}
