use crate::records::parse_blog_records;
use crate::xml::render_urlset;
use crate::{Result, SitemapError};
use chrono::{DateTime, Utc};
use site_kit_core::config::SiteSettings;
use site_kit_core::{
    BlogRecord, FailurePolicy, PublishDate, SitemapEntry, SitemapRoute, SlugPolicy,
};
use site_kit_store::{DocumentFetcher, FetchOutcome};
use tracing::{debug, warn};

/// Builds the sitemap of one route from the blog list in the document store
pub struct SitemapBuilder {
    fetcher: DocumentFetcher,
    site: SiteSettings,
    route: SitemapRoute,
}

impl SitemapBuilder {
    pub fn new(fetcher: DocumentFetcher, site: SiteSettings, route: SitemapRoute) -> Self {
        Self {
            fetcher,
            site,
            route,
        }
    }

    pub fn route(&self) -> &SitemapRoute {
        &self.route
    }

    /// Build entries using the current time for records without a publish date
    pub async fn build(&self) -> Result<Vec<SitemapEntry>> {
        self.build_at(Utc::now()).await
    }

    pub async fn build_at(&self, now: DateTime<Utc>) -> Result<Vec<SitemapEntry>> {
        let source = &self.route.source;
        let outcome = self
            .fetcher
            .fetch(&source.lang, &source.collection, &source.document)
            .await;

        let value = match outcome {
            FetchOutcome::Found(value) => value,
            FetchOutcome::NotFound => {
                return self.recover(SitemapError::NotFound {
                    collection: source.collection.clone(),
                    document: source.document.clone(),
                });
            }
            FetchOutcome::FieldMissing { field } => {
                return self.recover(SitemapError::FieldMissing {
                    collection: source.collection.clone(),
                    document: source.document.clone(),
                    field,
                });
            }
            FetchOutcome::InvalidInput(reason) => {
                return self.recover(SitemapError::InvalidInput(reason));
            }
            FetchOutcome::BackendFailure(err) => return self.recover(SitemapError::Store(err)),
        };

        let records = match parse_blog_records(&value) {
            Ok(records) => records,
            Err(err) => return self.recover(err),
        };

        let entries: Vec<SitemapEntry> = records
            .iter()
            .filter(|record| self.keeps(record))
            .map(|record| self.entry_for(record, now))
            .collect();

        debug!(
            route = %self.route.path,
            records = records.len(),
            entries = entries.len(),
            "built sitemap"
        );
        Ok(entries)
    }

    /// Build and serialize the sitemap
    pub async fn render(&self) -> Result<String> {
        self.render_at(Utc::now()).await
    }

    pub async fn render_at(&self, now: DateTime<Utc>) -> Result<String> {
        let entries = self.build_at(now).await?;
        render_urlset(&entries)
    }

    fn keeps(&self, record: &BlogRecord) -> bool {
        match self.route.slug_policy {
            SlugPolicy::RequireSlug => record.has_slug(),
            SlugPolicy::IncludeAll => true,
        }
    }

    fn entry_for(&self, record: &BlogRecord, now: DateTime<Utc>) -> SitemapEntry {
        SitemapEntry {
            loc: self.site.blog_url(record.slug_or_empty()),
            lastmod: self.lastmod_for(record, now),
            changefreq: self.route.changefreq,
            priority: self.route.priority,
        }
    }

    fn lastmod_for(&self, record: &BlogRecord, now: DateTime<Utc>) -> DateTime<Utc> {
        match record.publish_date() {
            PublishDate::Parsed(date) => date,
            PublishDate::Missing => now,
            PublishDate::Invalid(raw) => {
                warn!(
                    route = %self.route.path,
                    slug = record.slug_or_empty(),
                    publish_date = %raw,
                    "unparseable publishDate, using current time"
                );
                now
            }
        }
    }

    fn recover(&self, err: SitemapError) -> Result<Vec<SitemapEntry>> {
        match self.route.on_fetch_failure {
            FailurePolicy::EmptyList => {
                warn!(route = %self.route.path, error = %err, "serving empty sitemap");
                Ok(Vec::new())
            }
            FailurePolicy::Propagate => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{Value, json};
    use site_kit_core::config::parse_site_toml_str;
    use site_kit_store::{Document, DocumentStore, MemoryStore, StoreError};
    use std::sync::Arc;

    struct FailingStore;

    #[async_trait]
    impl DocumentStore for FailingStore {
        async fn get(
            &self,
            _collection: &str,
            _doc_id: &str,
        ) -> site_kit_store::Result<Option<Document>> {
            Err(StoreError::Backend {
                status: 500,
                body: "permission denied".to_string(),
            })
        }

        async fn list(&self, _collection: &str) -> site_kit_store::Result<Vec<String>> {
            Ok(Vec::new())
        }
    }

    fn site() -> SiteSettings {
        parse_site_toml_str("[site]\norigin = \"https://firesafe.example.com\"")
            .unwrap()
            .site
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn store_with(document: Value) -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new().with_document(
            "blog",
            "blogs",
            document.as_object().cloned().unwrap(),
        ))
    }

    fn builder(store: Arc<dyn DocumentStore>, route: SitemapRoute) -> SitemapBuilder {
        SitemapBuilder::new(DocumentFetcher::new(store), site(), route)
    }

    fn fixture() -> Arc<MemoryStore> {
        store_with(json!({
            "id": [
                {"slug": "a", "publishDate": "2024-01-01T00:00:00Z"},
                {"slug": "", "publishDate": null}
            ]
        }))
    }

    #[tokio::test]
    async fn test_index_route_keeps_slugged_records() {
        let entries = builder(fixture(), SitemapRoute::index())
            .build_at(now())
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].loc.ends_with("/blog/blog-details/a"));
        assert_eq!(
            entries[0].loc,
            "https://firesafe.example.com/blog/blog-details/a"
        );
        assert_eq!(entries[0].lastmod_iso(), "2024-01-01T00:00:00.000Z");
        assert_eq!(entries[0].changefreq.as_str(), "weekly");
        assert_eq!(entries[0].priority, 0.7);
    }

    #[tokio::test]
    async fn test_leaf_route_keeps_every_record() {
        let entries = builder(fixture(), SitemapRoute::leaf())
            .build_at(now())
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert!(entries[0].loc.ends_with("/blog/blog-details/a"));
        assert!(entries[1].loc.ends_with("/blog/blog-details/"));
        assert_eq!(entries[1].lastmod, now());
    }

    #[tokio::test]
    async fn test_slug_filtering_counts() {
        let store = store_with(json!({
            "id": [
                {"slug": "one"},
                {"slug": "two"},
                {"slug": "three"},
                {"slug": ""},
                {"title": "no slug at all"}
            ]
        }));

        let index = builder(store.clone(), SitemapRoute::index());
        assert_eq!(index.build_at(now()).await.unwrap().len(), 3);

        let leaf = builder(store, SitemapRoute::leaf());
        assert_eq!(leaf.build_at(now()).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_missing_slug_renders_empty_under_include_all() {
        let store = store_with(json!({"id": [{"title": "draft"}]}));
        let entries = builder(store, SitemapRoute::leaf())
            .build_at(now())
            .await
            .unwrap();
        assert_eq!(
            entries[0].loc,
            "https://firesafe.example.com/blog/blog-details/"
        );
    }

    #[tokio::test]
    async fn test_lastmod_from_publish_date() {
        let store = store_with(json!({
            "id": [
                {"slug": "a", "publishDate": "2024-03-01T00:00:00Z"},
                {"slug": "b", "publishDate": "2024-03-01"},
                {"slug": "c"},
                {"slug": "d", "publishDate": "sometime soon"}
            ]
        }));
        let entries = builder(store, SitemapRoute::index())
            .build_at(now())
            .await
            .unwrap();

        assert_eq!(entries[0].lastmod_iso(), "2024-03-01T00:00:00.000Z");
        assert_eq!(entries[1].lastmod_iso(), "2024-03-01T00:00:00.000Z");
        assert_eq!(entries[2].lastmod, now());
        assert_eq!(entries[3].lastmod, now());
    }

    #[tokio::test]
    async fn test_editorial_fields_of_any_shape_keep_the_post() {
        let store = store_with(json!({
            "id": [
                {"slug": "a", "author": {"name": "Budi"}},
                {"slug": "b", "id": -1},
                {"slug": "c", "id": "3"},
                {"slug": "d", "title": {"id": "Judul"}},
                {"slug": "e", "publishDate": 1704067200000u64}
            ]
        }));

        let leaf = builder(store.clone(), SitemapRoute::leaf())
            .build_at(now())
            .await
            .unwrap();
        assert_eq!(leaf.len(), 5);

        let index = builder(store, SitemapRoute::index())
            .build_at(now())
            .await
            .unwrap();
        assert_eq!(index.len(), 5);
        assert!(index[4].loc.ends_with("/blog/blog-details/e"));
        assert_eq!(index[4].lastmod, now());
    }

    #[tokio::test]
    async fn test_lastmod_defaults_to_wall_clock() {
        let store = store_with(json!({"id": [{"slug": "a"}]}));
        let before = Utc::now();
        let entries = builder(store, SitemapRoute::index()).build().await.unwrap();
        let after = Utc::now();

        assert!(entries[0].lastmod >= before && entries[0].lastmod <= after);
        assert!(DateTime::parse_from_rfc3339(&entries[0].lastmod_iso()).is_ok());
    }

    #[tokio::test]
    async fn test_store_failure_empty_list_policy() {
        let entries = builder(Arc::new(FailingStore), SitemapRoute::index())
            .build_at(now())
            .await
            .unwrap();
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_store_failure_propagate_policy() {
        let err = builder(Arc::new(FailingStore), SitemapRoute::leaf())
            .build_at(now())
            .await
            .unwrap_err();
        assert!(matches!(err, SitemapError::Store(_)));
        assert!(err.to_string().contains("permission denied"));
    }

    #[tokio::test]
    async fn test_malformed_shape_by_policy() {
        let store = store_with(json!({"id": {"slug": "a"}}));

        let index = builder(store.clone(), SitemapRoute::index());
        assert!(index.build_at(now()).await.unwrap().is_empty());

        let leaf = builder(store, SitemapRoute::leaf());
        assert!(matches!(
            leaf.build_at(now()).await,
            Err(SitemapError::MalformedShape(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_document_and_field_by_policy() {
        let empty: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
        assert!(
            builder(empty.clone(), SitemapRoute::index())
                .build_at(now())
                .await
                .unwrap()
                .is_empty()
        );
        assert!(matches!(
            builder(empty, SitemapRoute::leaf()).build_at(now()).await,
            Err(SitemapError::NotFound { .. })
        ));

        let english_only = store_with(json!({"en": []}));
        assert!(matches!(
            builder(english_only, SitemapRoute::leaf())
                .build_at(now())
                .await,
            Err(SitemapError::FieldMissing { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_lang_by_policy() {
        let mut route = SitemapRoute::leaf();
        route.source.lang = String::new();
        assert!(matches!(
            builder(fixture(), route).build_at(now()).await,
            Err(SitemapError::InvalidInput(_))
        ));

        let mut route = SitemapRoute::index();
        route.source.lang = String::new();
        assert!(
            builder(fixture(), route)
                .build_at(now())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_duplicates_are_kept() {
        let store = store_with(json!({"id": [{"slug": "a"}, {"slug": "a"}]}));
        let entries = builder(store, SitemapRoute::index())
            .build_at(now())
            .await
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].loc, entries[1].loc);
    }

    #[tokio::test]
    async fn test_render_at() {
        let xml = builder(fixture(), SitemapRoute::index())
            .render_at(now())
            .await
            .unwrap();
        assert!(xml.contains("<loc>https://firesafe.example.com/blog/blog-details/a</loc>"));
        assert_eq!(xml.matches("<url>").count(), 1);
    }
}
