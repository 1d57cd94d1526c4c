use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const SITE_TOML: &str = r#"# site-kit configuration

[site]
# Public origin used in sitemap URLs (no trailing slash needed)
origin = "http://localhost:3000"
# Blog detail pages live at <origin><blog_path><slug>
blog_path = "/blog/blog-details/"

[server]
bind = "127.0.0.1:3000"

[store]
# file | firestore | memory
backend = "file"
# Documents are read from <root>/<collection>/<document>.json
root = "content"

# [store.firestore]
# project_id = "your-project"
# database = "(default)"
# Credentials can also come from FIRESTORE_API_KEY / FIRESTORE_TOKEN

[sitemap]
changefreq = "weekly"
priority = 0.7

# Stable URLs only; content problems degrade to an empty sitemap
[[sitemap.route]]
path = "/server-sitemap-index.xml"
slug_policy = "require_slug"
on_fetch_failure = "empty_list"

# Every post, cached for an hour; content problems return 500
[[sitemap.route]]
path = "/server-sitemap.xml"
slug_policy = "include_all"
on_fetch_failure = "propagate"
revalidate = 3600
"#;

const SAMPLE_BLOGS: &str = r#"{
  "id": [
    {
      "id": 1,
      "slug": "pemeriksaan-apar-berkala",
      "publishDate": "2024-01-15T00:00:00Z",
      "title": "Pemeriksaan APAR Berkala",
      "summary": "Kapan dan bagaimana memeriksa alat pemadam api ringan.",
      "author": "Tim Teknis"
    },
    {
      "id": 2,
      "slug": "",
      "publishDate": null,
      "title": "Draf: Jalur Evakuasi"
    }
  ],
  "en": [
    {
      "id": 1,
      "slug": "routine-fire-extinguisher-checks",
      "publishDate": "2024-01-15T00:00:00Z",
      "title": "Routine Fire Extinguisher Checks",
      "summary": "When and how to inspect portable extinguishers.",
      "author": "Technical Team"
    }
  ]
}
"#;

/// Scaffold a site directory: site.toml plus a sample blog document
pub async fn run(path: PathBuf) -> Result<()> {
    println!("🔥 Initializing site at: {}", path.display());

    let config_path = path.join("site.toml");
    if config_path.exists() {
        anyhow::bail!(
            "{} already exists; refusing to overwrite",
            config_path.display()
        );
    }

    create_directory_structure(&path)?;
    fs::write(&config_path, SITE_TOML).context("Failed to write site.toml")?;
    println!("   ✓ Wrote site.toml");

    let blogs_path = path.join("content").join("blog").join("blogs.json");
    if blogs_path.exists() {
        println!("   • Keeping existing {}", blogs_path.display());
    } else {
        fs::write(&blogs_path, SAMPLE_BLOGS).context("Failed to write sample blogs.json")?;
        println!("   ✓ Wrote content/blog/blogs.json");
    }

    println!();
    println!("✅ Site ready!");
    println!();
    println!("Next steps:");
    println!("   site-kit check {}", path.join("content").display());
    println!("   site-kit serve --config {}", config_path.display());
    println!();

    Ok(())
}

fn create_directory_structure(base: &Path) -> Result<()> {
    fs::create_dir_all(base.join("content").join("blog"))
        .with_context(|| format!("Failed to create {}", base.display()))?;
    Ok(())
}
