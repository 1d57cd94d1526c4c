// Sitemap generation: blog list validation, entry mapping, XML output

pub mod builder;
pub mod cache;
pub mod records;
pub mod xml;

pub use builder::SitemapBuilder;
pub use cache::CachedSitemap;
pub use records::{RecordScan, parse_blog_records, scan_blog_records};
pub use xml::render_urlset;

use site_kit_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("document {collection}/{document} not found")]
    NotFound {
        collection: String,
        document: String,
    },
    #[error("document {collection}/{document} has no '{field}' field")]
    FieldMissing {
        collection: String,
        document: String,
        field: String,
    },
    #[error("invalid content source: {0}")]
    InvalidInput(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("malformed blog list: {0}")]
    MalformedShape(String),
    #[error("failed to write sitemap XML: {0}")]
    Xml(String),
}

pub type Result<T> = std::result::Result<T, SitemapError>;
