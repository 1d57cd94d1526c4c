// Firestore REST client

pub mod value;

use crate::{Document, DocumentStore, Result, StoreError, validate_id};
use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use site_kit_core::config::FirestoreSettings;
use std::collections::BTreeMap;
use value::{FirestoreValue, decode_fields};

const LIST_PAGE_SIZE: &str = "300";

/// Reads documents through the Firestore v1 REST API
pub struct FirestoreStore {
    client: reqwest::Client,
    documents_url: Url,
    api_key: Option<String>,
}

/// Document resource as returned by `documents.get`
#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    #[serde(default)]
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, FirestoreValue>,
}

/// Response of `documents.list`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListDocumentsResponse {
    #[serde(default)]
    documents: Vec<DocumentName>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DocumentName {
    name: String,
}

impl FirestoreStore {
    /// Create new Firestore client
    pub fn new(settings: &FirestoreSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Some(token) = &settings.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| StoreError::Credentials("token is not a valid header value".to_string()))?;
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let mut documents_url = Url::parse(&settings.base_url)
            .map_err(|e| StoreError::InvalidUrl(format!("{}: {}", settings.base_url, e)))?;
        documents_url
            .path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(settings.base_url.clone()))?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                settings.project_id.as_str(),
                "databases",
                settings.database.as_str(),
                "documents",
            ]);

        Ok(Self {
            client,
            documents_url,
            api_key: settings.api_key.clone(),
        })
    }

    /// Documents URL with each segment appended percent-encoded
    fn url_for(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.documents_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidUrl(self.documents_url.to_string()))?
            .extend(segments);
        Ok(url)
    }

    fn request(&self, url: Url) -> reqwest::RequestBuilder {
        let request = self.client.get(url);
        match &self.api_key {
            Some(key) => request.query(&[("key", key.as_str())]),
            None => request,
        }
    }

    async fn error_for(response: reqwest::Response) -> StoreError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        StoreError::Backend { status, body }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn get(&self, collection: &str, doc_id: &str) -> Result<Option<Document>> {
        validate_id(collection)?;
        validate_id(doc_id)?;

        let url = self.url_for(&[collection, doc_id])?;
        let response = self.request(url).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::error_for(response).await);
        }

        let body = response.text().await?;
        let document: FirestoreDocument =
            serde_json::from_str(&body).map_err(|e| StoreError::Decode {
                name: format!("{}/{}", collection, doc_id),
                reason: e.to_string(),
            })?;

        tracing::debug!(name = %document.name, fields = document.fields.len(), "fetched Firestore document");
        Ok(Some(decode_fields(document.fields)))
    }

    async fn list(&self, collection: &str) -> Result<Vec<String>> {
        validate_id(collection)?;

        let url = self.url_for(&[collection])?;
        let mut ids = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .request(url.clone())
                .query(&[("pageSize", LIST_PAGE_SIZE), ("mask.fieldPaths", "__name__")]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(Self::error_for(response).await);
            }

            let body = response.text().await?;
            let page: ListDocumentsResponse =
                serde_json::from_str(&body).map_err(|e| StoreError::Decode {
                    name: collection.to_string(),
                    reason: e.to_string(),
                })?;

            ids.extend(page.documents.into_iter().filter_map(|d| {
                d.name.rsplit('/').next().map(str::to_string)
            }));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        ids.sort();
        Ok(ids)
    }
}
