use crate::builder::SitemapBuilder;
use crate::Result;
use site_kit_core::SitemapRoute;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::Instant;

struct Rendered {
    at: Instant,
    xml: Arc<str>,
}

/// A builder whose rendered XML is reused for the route's revalidation interval.
///
/// Routes without an interval render on every call. Failed renders are
/// never cached.
pub struct CachedSitemap {
    builder: SitemapBuilder,
    rendered: RwLock<Option<Rendered>>,
}

impl CachedSitemap {
    pub fn new(builder: SitemapBuilder) -> Self {
        Self {
            builder,
            rendered: RwLock::new(None),
        }
    }

    pub fn route(&self) -> &SitemapRoute {
        self.builder.route()
    }

    pub async fn render(&self) -> Result<Arc<str>> {
        let Some(ttl) = self.builder.route().revalidate else {
            return self.builder.render().await.map(Arc::from);
        };

        if let Some(rendered) = self.rendered.read().await.as_ref()
            && rendered.at.elapsed() < ttl
        {
            return Ok(rendered.xml.clone());
        }

        let mut slot = self.rendered.write().await;
        // Another request may have refreshed it while we waited
        if let Some(rendered) = slot.as_ref()
            && rendered.at.elapsed() < ttl
        {
            return Ok(rendered.xml.clone());
        }

        let xml: Arc<str> = Arc::from(self.builder.render().await?);
        *slot = Some(Rendered {
            at: Instant::now(),
            xml: xml.clone(),
        });
        Ok(xml)
    }
}
