use anyhow::{Context, Result};
use axum::{
    Router,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use site_kit_core::config::HEALTH_PATH;
use site_kit_sitemap::CachedSitemap;
use site_kit_sitemap::xml::CONTENT_TYPE;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Start the sitemap server.
///
/// This command:
/// - Loads and validates site.toml (plus environment overrides)
/// - Opens the configured document store
/// - Serves every configured sitemap route and `/healthz`
///
/// # Arguments
///
/// * `config_path` - Path to site.toml
/// * `bind` - Optional address overriding `server.bind`
pub async fn run(config_path: PathBuf, bind: Option<String>) -> Result<()> {
    let config = super::load_config(&config_path)?;
    let sitemaps = super::sitemaps_for(&config)?;

    for sitemap in &sitemaps {
        let route = sitemap.route();
        info!(
            path = %route.path,
            slug_policy = ?route.slug_policy,
            on_fetch_failure = ?route.on_fetch_failure,
            revalidate_secs = route.revalidate.map(|d| d.as_secs()),
            "registered sitemap route"
        );
    }

    let app = router(sitemaps);
    let addr = bind.unwrap_or(config.server.bind);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(addr = %addr, origin = %config.site.origin, "site-kit listening");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Router with one GET route per sitemap plus `/healthz`
pub fn router(sitemaps: Vec<Arc<CachedSitemap>>) -> Router {
    let mut app = Router::new().route(HEALTH_PATH, get(|| async { "ok" }));

    for sitemap in sitemaps {
        let path = sitemap.route().path.clone();
        app = app.route(&path, get(move || sitemap_handler(sitemap.clone())));
    }

    app.layer(TraceLayer::new_for_http())
}

async fn sitemap_handler(sitemap: Arc<CachedSitemap>) -> Response {
    let route = sitemap.route();

    match sitemap.render().await {
        Ok(xml) => {
            let mut response = (StatusCode::OK, xml.to_string()).into_response();
            let headers = response.headers_mut();
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE));
            if let Some(ttl) = route.revalidate
                && let Ok(value) = HeaderValue::from_str(&format!(
                    "public, s-maxage={}, stale-while-revalidate",
                    ttl.as_secs()
                ))
            {
                headers.insert(header::CACHE_CONTROL, value);
            }
            response
        }
        Err(err) => {
            error!(path = %route.path, error = %err, "sitemap generation failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
