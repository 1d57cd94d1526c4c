use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

/// Render one sitemap route once and write it to disk
pub async fn run(config_path: PathBuf, route: Option<String>, output: PathBuf) -> Result<()> {
    println!("🗺  Rendering sitemap...");
    println!("   Config: {}", config_path.display());
    println!("   Output: {}", output.display());
    println!();

    let config = super::load_config(&config_path)?;
    let sitemaps = super::sitemaps_for(&config)?;

    let sitemap = match &route {
        Some(path) => sitemaps
            .iter()
            .find(|s| s.route().path == *path)
            .with_context(|| {
                let known: Vec<&str> = sitemaps.iter().map(|s| s.route().path.as_str()).collect();
                format!("No sitemap route '{}' (configured: {})", path, known.join(", "))
            })?,
        None => sitemaps
            .first()
            .context("No sitemap routes configured")?,
    };

    println!("✓ Route: {}", sitemap.route().path);
    let xml = sitemap.render().await.context("Failed to build sitemap")?;
    let urls = xml.matches("<url>").count();

    if let Some(parent) = output.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).context("Failed to create output directory")?;
    }
    fs::write(&output, xml.as_bytes())
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!("   ✓ Wrote {} URLs", urls);
    println!();
    println!("✅ Sitemap written to {}", output.display());

    Ok(())
}
