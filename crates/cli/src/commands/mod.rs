pub mod check;
pub mod init;
pub mod render;
pub mod serve;

use anyhow::{Context, Result};
use site_kit_core::{SiteConfig, parse_site_toml};
use site_kit_sitemap::{CachedSitemap, SitemapBuilder};
use site_kit_store::{DocumentFetcher, DocumentStore};
use std::path::Path;
use std::sync::Arc;

/// Load site.toml and apply environment overrides
pub fn load_config(path: &Path) -> Result<SiteConfig> {
    if !path.exists() {
        anyhow::bail!(
            "{} not found\nRun 'site-kit init <dir>' first",
            path.display()
        );
    }
    parse_site_toml(path)
        .with_context(|| format!("Failed to parse {}", path.display()))?
        .with_env_overrides()
        .context("Invalid environment override")
}

/// One cached sitemap per configured route, all sharing a single store
pub fn sitemaps_for(config: &SiteConfig) -> Result<Vec<Arc<CachedSitemap>>> {
    let store = site_kit_store::open(&config.store).context("Failed to open document store")?;
    Ok(sitemaps_with(store, config))
}

/// Wire every configured route to an already opened store
pub fn sitemaps_with(store: Arc<dyn DocumentStore>, config: &SiteConfig) -> Vec<Arc<CachedSitemap>> {
    let fetcher = DocumentFetcher::new(store);

    config
        .sitemap
        .routes
        .iter()
        .map(|route| {
            Arc::new(CachedSitemap::new(SitemapBuilder::new(
                fetcher.clone(),
                config.site.clone(),
                route.clone(),
            )))
        })
        .collect()
}
