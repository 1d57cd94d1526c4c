use anyhow::{Context, Result};
use serde_json::Value;
use site_kit_sitemap::scan_blog_records;
use site_kit_store::{DocumentStore, FileStore};
use std::path::PathBuf;
use walkdir::WalkDir;

/// Per-field summary of one document
#[derive(Debug, PartialEq)]
pub struct FieldReport {
    pub field: String,
    /// Set when the field holds an array
    pub blog_list: Option<BlogListReport>,
}

#[derive(Debug, PartialEq)]
pub struct BlogListReport {
    pub records: usize,
    pub without_slug: usize,
    pub rejected: usize,
}

#[derive(Debug, PartialEq)]
pub struct DocumentReport {
    pub collection: String,
    pub document: String,
    pub fields: Vec<FieldReport>,
}

/// Check every document under a file-store root
pub async fn run(path: PathBuf) -> Result<()> {
    println!("Checking content at: {}", path.display());

    if !path.is_dir() {
        anyhow::bail!("Content directory does not exist: {}", path.display());
    }

    let reports = inspect(&path).await?;
    if reports.is_empty() {
        println!("\n⚠ No documents found");
        return Ok(());
    }

    let mut rejected = 0;
    for report in &reports {
        println!("\n✓ {}/{}", report.collection, report.document);
        for field in &report.fields {
            match &field.blog_list {
                Some(list) => {
                    rejected += list.rejected;
                    println!(
                        "  {}: {} records, {} without slug, {} rejected",
                        field.field, list.records, list.without_slug, list.rejected
                    );
                }
                None => println!("  {}: (not a list)", field.field),
            }
        }
    }

    println!("\n{} documents checked", reports.len());
    if rejected > 0 {
        println!("⚠ {} entries are not valid blog records and will be skipped", rejected);
    }

    Ok(())
}

/// Read every `<collection>/<doc>.json` under `root` through the file store
pub async fn inspect(root: &std::path::Path) -> Result<Vec<DocumentReport>> {
    let store = FileStore::new(root);

    let mut collections: Vec<String> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_dir())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| !name.starts_with('.'))
        .collect();
    collections.sort();

    let mut reports = Vec::new();
    for collection in collections {
        for document in store.list(&collection).await? {
            let fields = store
                .get(&collection, &document)
                .await
                .with_context(|| format!("Failed to read {}/{}", collection, document))?
                .with_context(|| format!("{}/{} disappeared while checking", collection, document))?;

            let fields = fields
                .into_iter()
                .map(|(field, value)| FieldReport {
                    blog_list: blog_list_report(&value),
                    field,
                })
                .collect();

            reports.push(DocumentReport {
                collection: collection.clone(),
                document,
                fields,
            });
        }
    }

    Ok(reports)
}

fn blog_list_report(value: &Value) -> Option<BlogListReport> {
    let scan = scan_blog_records(value).ok()?;
    Some(BlogListReport {
        records: scan.records.len(),
        without_slug: scan.without_slug(),
        rejected: scan.rejected.len(),
    })
}
