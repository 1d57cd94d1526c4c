use crate::{Result, SitemapError};
use serde_json::Value;
use site_kit_core::BlogRecord;
use tracing::warn;

/// Outcome of decoding a fetched blog list element by element
#[derive(Debug, Default)]
pub struct RecordScan {
    pub records: Vec<BlogRecord>,
    /// (index, reason) for every element that is not a blog record
    pub rejected: Vec<(usize, String)>,
}

impl RecordScan {
    pub fn without_slug(&self) -> usize {
        self.records.iter().filter(|r| !r.has_slug()).count()
    }
}

/// Decode a fetched value as a list of blog records.
///
/// The value itself must be an array; elements that do not decode are
/// reported in `rejected` instead of failing the whole list.
pub fn scan_blog_records(value: &Value) -> Result<RecordScan> {
    let items = value.as_array().ok_or_else(|| {
        SitemapError::MalformedShape(format!(
            "expected an array of blog records, found {}",
            describe(value)
        ))
    })?;

    let mut scan = RecordScan::default();
    for (index, item) in items.iter().enumerate() {
        match serde_json::from_value::<BlogRecord>(item.clone()) {
            Ok(record) => scan.records.push(record),
            Err(err) => scan.rejected.push((index, err.to_string())),
        }
    }
    Ok(scan)
}

/// Like [`scan_blog_records`], logging and dropping rejected elements
pub fn parse_blog_records(value: &Value) -> Result<Vec<BlogRecord>> {
    let scan = scan_blog_records(value)?;
    for (index, reason) in &scan.rejected {
        warn!(index, reason = %reason, "skipping malformed blog record");
    }
    Ok(scan.records)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
