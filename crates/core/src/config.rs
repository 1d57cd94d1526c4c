use crate::error::{Error, Result};
use crate::types::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";
pub const DEFAULT_BLOG_PATH: &str = "/blog/blog-details/";
pub const DEFAULT_BIND: &str = "127.0.0.1:3000";
pub const DEFAULT_FIRESTORE_URL: &str = "https://firestore.googleapis.com";
/// Served by the HTTP layer itself; not available to sitemap routes
pub const HEALTH_PATH: &str = "/healthz";

/// Complete site configuration
#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub site: SiteSettings,
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub sitemap: SitemapSettings,
}

/// Public origin and URL layout of the site
#[derive(Debug, Clone, PartialEq)]
pub struct SiteSettings {
    /// Scheme and host without a trailing slash
    pub origin: String,
    /// Path prefix for blog detail pages, always starting and ending with `/`
    pub blog_path: String,
}

impl SiteSettings {
    /// Canonical URL of a blog post
    pub fn blog_url(&self, slug: &str) -> String {
        format!("{}{}{}", self.origin, self.blog_path, slug)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
}

/// Where documents are read from
#[derive(Debug, Clone, PartialEq)]
pub enum StoreSettings {
    File { root: PathBuf },
    Firestore(FirestoreSettings),
    Memory,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FirestoreSettings {
    pub project_id: String,
    pub database: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapSettings {
    pub routes: Vec<SitemapRoute>,
}

/// Raw TOML configuration structure
/// This matches the site.toml file structure exactly
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    site: RawSite,
    server: RawServer,
    store: RawStore,
    sitemap: RawSitemap,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSite {
    origin: String,
    blog_path: String,
}

impl Default for RawSite {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            blog_path: DEFAULT_BLOG_PATH.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawServer {
    bind: String,
}

impl Default for RawServer {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawBackend {
    #[default]
    File,
    Firestore,
    Memory,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStore {
    backend: RawBackend,
    root: Option<String>,
    firestore: Option<RawFirestore>,
}

#[derive(Debug, Deserialize)]
struct RawFirestore {
    project_id: String,
    database: Option<String>,
    base_url: Option<String>,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSitemap {
    changefreq: ChangeFreq,
    priority: f32,
    #[serde(rename = "route")]
    routes: Vec<RawRoute>,
}

impl Default for RawSitemap {
    fn default() -> Self {
        Self {
            changefreq: ChangeFreq::Weekly,
            priority: 0.7,
            routes: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    path: String,
    #[serde(default)]
    slug_policy: SlugPolicy,
    #[serde(default)]
    on_fetch_failure: FailurePolicy,
    revalidate: Option<u64>, // Seconds
    lang: Option<String>,
    collection: Option<String>,
    document: Option<String>,
    changefreq: Option<ChangeFreq>,
    priority: Option<f32>,
}

/// Parse site.toml from a file path.
///
/// A relative file-store root is resolved against the directory holding
/// the config file.
pub fn parse_site_toml<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut config = parse_site_toml_str(&content)?;

    if let StoreSettings::File { root } = &mut config.store
        && root.is_relative()
        && let Some(parent) = path.parent()
    {
        *root = parent.join(&*root);
    }

    Ok(config)
}

/// Parse site.toml from a string (useful for testing)
pub fn parse_site_toml_str(content: &str) -> Result<SiteConfig> {
    let raw: RawConfig = toml::from_str(content)?;

    let site = SiteSettings {
        origin: validate_origin(&raw.site.origin)?,
        blog_path: normalize_blog_path(&raw.site.blog_path)?,
    };

    if raw.server.bind.trim().is_empty() {
        return Err(Error::ConfigParse("server.bind must not be empty".to_string()));
    }

    let store = match raw.store.backend {
        RawBackend::File => StoreSettings::File {
            root: PathBuf::from(raw.store.root.as_deref().unwrap_or("content")),
        },
        RawBackend::Memory => StoreSettings::Memory,
        RawBackend::Firestore => {
            let firestore = raw.store.firestore.ok_or_else(|| {
                Error::ConfigParse(
                    "store.backend = \"firestore\" requires a [store.firestore] table".to_string(),
                )
            })?;
            if firestore.project_id.trim().is_empty() {
                return Err(Error::ConfigParse(
                    "store.firestore.project_id must not be empty".to_string(),
                ));
            }
            StoreSettings::Firestore(FirestoreSettings {
                project_id: firestore.project_id,
                database: firestore.database.unwrap_or_else(|| "(default)".to_string()),
                base_url: firestore
                    .base_url
                    .unwrap_or_else(|| DEFAULT_FIRESTORE_URL.to_string())
                    .trim_end_matches('/')
                    .to_string(),
                api_key: firestore.api_key,
                token: None,
            })
        }
    };

    let changefreq = raw.sitemap.changefreq;
    let priority = raw.sitemap.priority;
    validate_priority(priority, "sitemap.priority")?;

    let routes = if raw.sitemap.routes.is_empty() {
        let mut defaults = vec![SitemapRoute::index(), SitemapRoute::leaf()];
        for route in &mut defaults {
            route.changefreq = changefreq;
            route.priority = priority;
        }
        defaults
    } else {
        let mut seen = HashSet::new();
        raw.sitemap
            .routes
            .into_iter()
            .map(|r| {
                let route = convert_route(r, changefreq, priority)?;
                if !seen.insert(route.path.clone()) {
                    return Err(Error::ConfigParse(format!(
                        "Duplicate sitemap route '{}'",
                        route.path
                    )));
                }
                Ok(route)
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(SiteConfig {
        site,
        server: ServerSettings {
            bind: raw.server.bind,
        },
        store,
        sitemap: SitemapSettings { routes },
    })
}

impl SiteConfig {
    /// Apply `SITE_KIT_*` and `FIRESTORE_*` environment overrides
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in production)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(bind) = lookup("SITE_KIT_BIND") {
            self.server.bind = bind;
        }
        if let Some(origin) = lookup("SITE_KIT_ORIGIN") {
            self.site.origin = validate_origin(&origin)?;
        }
        if let StoreSettings::Firestore(firestore) = &mut self.store {
            if let Some(key) = lookup("FIRESTORE_API_KEY") {
                firestore.api_key = Some(key);
            }
            if let Some(token) = lookup("FIRESTORE_TOKEN") {
                firestore.token = Some(token);
            }
        }
        Ok(self)
    }

    /// Find the route served at `path`
    pub fn route(&self, path: &str) -> Option<&SitemapRoute> {
        self.sitemap.routes.iter().find(|r| r.path == path)
    }
}

fn convert_route(raw: RawRoute, changefreq: ChangeFreq, priority: f32) -> Result<SitemapRoute> {
    if !raw.path.starts_with('/') {
        return Err(Error::ConfigParse(format!(
            "Sitemap route path must start with '/': '{}'",
            raw.path
        )));
    }
    if raw.path.contains([':', '{', '}', '*']) {
        return Err(Error::ConfigParse(format!(
            "Sitemap route path must be a literal path without ':', '{{', '}}' or '*': '{}'",
            raw.path
        )));
    }
    if raw.path == HEALTH_PATH {
        return Err(Error::ConfigParse(format!(
            "Sitemap route path '{}' is reserved",
            HEALTH_PATH
        )));
    }

    let defaults = ContentSource::default();
    let source = ContentSource {
        lang: non_empty(raw.lang, defaults.lang, "lang", &raw.path)?,
        collection: non_empty(raw.collection, defaults.collection, "collection", &raw.path)?,
        document: non_empty(raw.document, defaults.document, "document", &raw.path)?,
    };

    let priority = raw.priority.unwrap_or(priority);
    validate_priority(priority, &format!("priority of route '{}'", raw.path))?;

    let revalidate = match raw.revalidate {
        Some(0) => {
            return Err(Error::ConfigParse(format!(
                "revalidate of route '{}' must be greater than zero",
                raw.path
            )));
        }
        Some(secs) => Some(Duration::from_secs(secs)),
        None => None,
    };

    Ok(SitemapRoute {
        path: raw.path,
        source,
        slug_policy: raw.slug_policy,
        on_fetch_failure: raw.on_fetch_failure,
        revalidate,
        changefreq: raw.changefreq.unwrap_or(changefreq),
        priority,
    })
}

fn non_empty(value: Option<String>, default: String, field: &str, route: &str) -> Result<String> {
    match value {
        Some(v) if v.trim().is_empty() => Err(Error::ConfigParse(format!(
            "'{}' of route '{}' must not be empty",
            field, route
        ))),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn validate_priority(priority: f32, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&priority) {
        return Err(Error::ConfigParse(format!(
            "{} must be between 0.0 and 1.0, got {}",
            field, priority
        )));
    }
    Ok(())
}

/// Validate a site origin and strip trailing slashes.
///
/// The origin must be an absolute http(s) URL with a host and no path,
/// query or fragment.
fn validate_origin(origin: &str) -> Result<String> {
    let trimmed = origin.trim().trim_end_matches('/');

    let rest = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .ok_or_else(|| {
            Error::ConfigParse(format!(
                "site.origin must start with http:// or https://: '{}'",
                origin
            ))
        })?;

    if rest.is_empty() {
        return Err(Error::ConfigParse(format!(
            "site.origin has no host: '{}'",
            origin
        )));
    }

    if rest.contains(['/', '?', '#']) || rest.contains(char::is_whitespace) {
        return Err(Error::ConfigParse(format!(
            "site.origin must not contain a path, query or whitespace: '{}'",
            origin
        )));
    }

    Ok(trimmed.to_string())
}

/// Ensure the blog path starts and ends with `/`
fn normalize_blog_path(path: &str) -> Result<String> {
    let path = path.trim();
    if !path.starts_with('/') {
        return Err(Error::ConfigParse(format!(
            "site.blog_path must start with '/': '{}'",
            path
        )));
    }
    if path.ends_with('/') {
        Ok(path.to_string())
    } else {
        Ok(format!("{}/", path))
    }
}
