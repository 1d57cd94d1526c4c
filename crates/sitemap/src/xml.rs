//! Sitemap serialization.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://example.com/blog/blog-details/a</loc>
//!     <lastmod>2024-01-01T00:00:00.000Z</lastmod>
//!     <changefreq>weekly</changefreq>
//!     <priority>0.7</priority>
//!   </url>
//! </urlset>
//! ```

use crate::{Result, SitemapError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use site_kit_core::SitemapEntry;
use std::io::Cursor;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

pub const CONTENT_TYPE: &str = "application/xml; charset=utf-8";

/// Serialize entries into a `<urlset>` document, in order
pub fn render_urlset(entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_error)?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NS));
    writer.write_event(Event::Start(urlset)).map_err(xml_error)?;

    for entry in entries {
        writer
            .write_event(Event::Start(BytesStart::new("url")))
            .map_err(xml_error)?;
        write_element(&mut writer, "loc", &entry.loc)?;
        write_element(&mut writer, "lastmod", &entry.lastmod_iso())?;
        write_element(&mut writer, "changefreq", entry.changefreq.as_str())?;
        write_element(&mut writer, "priority", &entry.priority.to_string())?;
        writer
            .write_event(Event::End(BytesEnd::new("url")))
            .map_err(xml_error)?;
    }

    writer
        .write_event(Event::End(BytesEnd::new("urlset")))
        .map_err(xml_error)?;

    let mut xml = String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| SitemapError::Xml(e.to_string()))?;
    xml.push('\n');
    Ok(xml)
}

fn write_element(writer: &mut Writer<Cursor<Vec<u8>>>, name: &str, text: &str) -> Result<()> {
    writer
        .write_event(Event::Start(BytesStart::new(name)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(xml_error)?;
    writer
        .write_event(Event::End(BytesEnd::new(name)))
        .map_err(xml_error)?;
    Ok(())
}

fn xml_error(err: impl std::fmt::Display) -> SitemapError {
    SitemapError::Xml(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use site_kit_core::ChangeFreq;

    fn entry(loc: &str) -> SitemapEntry {
        SitemapEntry {
            loc: loc.to_string(),
            lastmod: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            changefreq: ChangeFreq::Weekly,
            priority: 0.7,
        }
    }

    #[test]
    fn test_empty_urlset() {
        let xml = render_urlset(&[]).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}">"#)));
        assert!(xml.contains("</urlset>"));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn test_single_entry() {
        let xml = render_urlset(&[entry("https://example.com/blog/blog-details/a")]).unwrap();

        assert!(xml.contains("<loc>https://example.com/blog/blog-details/a</loc>"));
        assert!(xml.contains("<lastmod>2024-01-01T00:00:00.000Z</lastmod>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
        assert!(xml.contains("<priority>0.7</priority>"));
        assert_eq!(xml.matches("<url>").count(), 1);
        assert_eq!(xml.matches("</url>").count(), 1);
    }

    #[test]
    fn test_entries_keep_order_and_duplicates() {
        let xml = render_urlset(&[
            entry("https://example.com/blog/blog-details/b"),
            entry("https://example.com/blog/blog-details/a"),
            entry("https://example.com/blog/blog-details/a"),
        ])
        .unwrap();

        assert_eq!(xml.matches("<url>").count(), 3);
        let b = xml.find("/blog-details/b<").unwrap();
        let a = xml.find("/blog-details/a<").unwrap();
        assert!(b < a);
    }

    #[test]
    fn test_escapes_text() {
        let xml = render_urlset(&[entry("https://example.com/blog/blog-details/a&b<c>")]).unwrap();
        assert!(xml.contains("<loc>https://example.com/blog/blog-details/a&amp;b&lt;c&gt;</loc>"));
    }

    #[test]
    fn test_other_changefreq_and_priority() {
        let mut e = entry("https://example.com/");
        e.changefreq = ChangeFreq::Daily;
        e.priority = 1.0;
        let xml = render_urlset(&[e]).unwrap();
        assert!(xml.contains("<changefreq>daily</changefreq>"));
        assert!(xml.contains("<priority>1</priority>"));
    }
}
