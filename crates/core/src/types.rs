use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

/// A blog post as stored under one language key of the blog document.
///
/// Only `slug` and `publishDate` feed the sitemap. The remaining fields are
/// kept as raw JSON so editorial data of any shape never rejects a post.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Usually an ISO 8601 string; `null` and absent are equivalent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

/// How a record's `publishDate` reads
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PublishDate<'a> {
    Missing,
    Parsed(DateTime<Utc>),
    /// Present but not a recognizable date string
    Invalid(&'a Value),
}

impl BlogRecord {
    /// True when the record carries a non-empty slug
    pub fn has_slug(&self) -> bool {
        self.slug.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// The slug, with a missing one read as empty
    pub fn slug_or_empty(&self) -> &str {
        self.slug.as_deref().unwrap_or("")
    }

    pub fn publish_date(&self) -> PublishDate<'_> {
        match &self.publish_date {
            None | Some(Value::Null) => PublishDate::Missing,
            Some(value @ Value::String(raw)) => match parse_publish_date(raw) {
                Some(date) => PublishDate::Parsed(date),
                None => PublishDate::Invalid(value),
            },
            Some(other) => PublishDate::Invalid(other),
        }
    }
}

/// Parse a publish date the way browsers read ISO strings.
///
/// Accepts RFC 3339 date-times, zone-less date-times and plain
/// `YYYY-MM-DD` dates. Zone-less values are read as UTC.
pub fn parse_publish_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Sitemap `<changefreq>` values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeFreq {
    Always,
    Hourly,
    Daily,
    #[default]
    Weekly,
    Monthly,
    Yearly,
    Never,
}

impl ChangeFreq {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeFreq::Always => "always",
            ChangeFreq::Hourly => "hourly",
            ChangeFreq::Daily => "daily",
            ChangeFreq::Weekly => "weekly",
            ChangeFreq::Monthly => "monthly",
            ChangeFreq::Yearly => "yearly",
            ChangeFreq::Never => "never",
        }
    }
}

impl fmt::Display for ChangeFreq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<url>` element of a sitemap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapEntry {
    /// `lastmod` as ISO 8601 with milliseconds, e.g. `2024-03-01T00:00:00.000Z`
    pub fn lastmod_iso(&self) -> String {
        self.lastmod.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Which records a sitemap route keeps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlugPolicy {
    /// Drop records whose slug is missing or empty
    #[default]
    RequireSlug,
    /// Keep every record; a missing slug renders as empty
    IncludeAll,
}

/// What a sitemap route does when its content cannot be fetched or parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Serve an empty sitemap
    #[default]
    EmptyList,
    /// Return the error to the caller
    Propagate,
}

/// Location of the blog list inside the document store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentSource {
    pub lang: String,
    pub collection: String,
    pub document: String,
}

impl Default for ContentSource {
    fn default() -> Self {
        Self {
            lang: "id".to_string(),
            collection: "blog".to_string(),
            document: "blogs".to_string(),
        }
    }
}

/// A sitemap served at one HTTP path
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapRoute {
    pub path: String,
    pub source: ContentSource,
    pub slug_policy: SlugPolicy,
    pub on_fetch_failure: FailurePolicy,
    /// How long a rendered sitemap may be reused
    pub revalidate: Option<Duration>,
    pub changefreq: ChangeFreq,
    pub priority: f32,
}

impl SitemapRoute {
    /// `/server-sitemap-index.xml`: slugged records only, never fails outward
    pub fn index() -> Self {
        Self {
            path: "/server-sitemap-index.xml".to_string(),
            source: ContentSource::default(),
            slug_policy: SlugPolicy::RequireSlug,
            on_fetch_failure: FailurePolicy::EmptyList,
            revalidate: None,
            changefreq: ChangeFreq::Weekly,
            priority: 0.7,
        }
    }

    /// `/server-sitemap.xml`: every record, errors surface, cached for an hour
    pub fn leaf() -> Self {
        Self {
            path: "/server-sitemap.xml".to_string(),
            source: ContentSource::default(),
            slug_policy: SlugPolicy::IncludeAll,
            on_fetch_failure: FailurePolicy::Propagate,
            revalidate: Some(Duration::from_secs(3600)),
            changefreq: ChangeFreq::Weekly,
            priority: 0.7,
        }
    }
}
