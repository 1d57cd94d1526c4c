use crate::{Document, DocumentStore, Result, StoreError, validate_id};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Documents stored as `<root>/<collection>/<doc_id>.json`
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn document_path(&self, collection: &str, doc_id: &str) -> Result<PathBuf> {
        validate_id(collection)?;
        validate_id(doc_id)?;
        Ok(self.root.join(collection).join(format!("{}.json", doc_id)))
    }
}

#[async_trait]
impl DocumentStore for FileStore {
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>> {
        let path = self.document_path(collection, doc_id)?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path, source }),
        };

        let value: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode {
                name: path.display().to_string(),
                reason: e.to_string(),
            })?;

        match value {
            serde_json::Value::Object(fields) => Ok(Some(fields)),
            _ => Err(StoreError::NotAnObject(path.display().to_string())),
        }
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>> {
        validate_id(collection)?;
        let dir = self.root.join(collection);

        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut ids = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(StoreError::Io { path: dir, source }),
            };
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json")
                && let Some(stem) = path.file_stem().and_then(|s| s.to_str())
            {
                ids.push(stem.to_string());
            }
        }
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_doc(root: &Path, collection: &str, doc_id: &str, body: &str) {
        let dir = root.join(collection);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.json", doc_id)), body).unwrap();
    }

    #[tokio::test]
    async fn test_get_existing_document() {
        let tmp = TempDir::new().unwrap();
        write_doc(
            tmp.path(),
            "blog",
            "blogs",
            r#"{"id": [{"slug": "a"}], "en": []}"#,
        );

        let store = FileStore::new(tmp.path());
        let doc = store.get("blog", "blogs").await.unwrap().unwrap();
        assert_eq!(doc.get("id"), Some(&json!([{"slug": "a"}])));
        assert_eq!(doc.get("en"), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_missing_document_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path());
        assert!(store.get("blog", "blogs").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_non_object_document_is_error() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "blog", "blogs", "[1, 2, 3]");

        let store = FileStore::new(tmp.path());
        let err = store.get("blog", "blogs").await.unwrap_err();
        assert!(matches!(err, StoreError::NotAnObject(_)));
    }

    #[tokio::test]
    async fn test_invalid_json_is_error() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "blog", "blogs", "{ not json");

        let store = FileStore::new(tmp.path());
        let err = store.get("blog", "blogs").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::new(tmp.path().join("content"));
        write_doc(tmp.path(), "secrets", "keys", r#"{"id": "x"}"#);

        let err = store.get("..", "secrets").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
        let err = store.get("blog", "../../secrets/keys").await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidId(_)));
        assert!(store.list("../secrets").await.is_err());
    }

    #[tokio::test]
    async fn test_list_documents() {
        let tmp = TempDir::new().unwrap();
        write_doc(tmp.path(), "blog", "blogs", "{}");
        write_doc(tmp.path(), "blog", "archive", "{}");
        fs::write(tmp.path().join("blog").join("notes.txt"), "ignored").unwrap();

        let store = FileStore::new(tmp.path());
        assert_eq!(store.list("blog").await.unwrap(), vec!["archive", "blogs"]);
        assert!(store.list("pages").await.unwrap().is_empty());
    }
}
