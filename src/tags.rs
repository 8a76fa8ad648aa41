//! Projection of metadata onto object-storage tags.
//!
//! Storage backends accept at most [`MAX_TAGS`] tags per object, with keys of
//! up to [`MAX_KEY_LEN`] and values of up to [`MAX_VALUE_LEN`] characters from
//! a restricted character set. Projection picks scalar fields in
//! [`TAG_PRIORITY`] order and sanitizes them; it never rejects input.
//!
//! The reverse mapping is lossy: every value comes back as a string.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::metadata::{FieldMap, NormalizedMetadata};
use crate::validator::is_present;

/// Maximum tags per object
pub const MAX_TAGS: usize = 10;

/// Maximum key length in characters
pub const MAX_KEY_LEN: usize = 128;

/// Maximum value length in characters
pub const MAX_VALUE_LEN: usize = 256;

/// Key used when sanitizing leaves nothing
pub const KEY_PLACEHOLDER: &str = "unnamed";

/// Value used when sanitizing leaves nothing
pub const VALUE_PLACEHOLDER: &str = "unknown";

/// Fields considered for tagging, most important first
pub const TAG_PRIORITY: &[&str] = &[
    "instrument_model",
    "format",
    "manufacturer",
    "acquisition_date",
    "read_count",
    "instrument_id",
    "objective_magnification",
    "objective_na",
    "channel_count",
    "image_size_x",
    "image_size_y",
    "image_size_z",
    "physical_size_x_um",
    "flowcell_id",
    "run_number",
    "lane",
    "paired_end",
    "read_pair",
    "total_bases",
    "mean_read_length",
    "gc_content_percent",
    "operator",
    "software_name",
    "file_size_bytes",
    "extractor_name",
    "schema_name",
    "checksum_sha256",
    "file_name",
];

/// One storage tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    /// Sanitized key
    pub key: String,
    /// Sanitized value
    pub value: String,
}

impl Tag {
    /// Build a tag, sanitizing both halves
    pub fn new(key: &str, value: &str) -> Self {
        Self {
            key: sanitize_key(key),
            value: sanitize_value(value),
        }
    }
}

/// Project a field map onto at most [`MAX_TAGS`] tags
pub fn project_fields(fields: &FieldMap) -> Vec<Tag> {
    TAG_PRIORITY
        .iter()
        .filter_map(|key| {
            let value = fields.get(*key).filter(|v| is_present(Some(*v)))?;
            scalar_text(value).map(|text| Tag::new(key, &text))
        })
        .take(MAX_TAGS)
        .collect()
}

/// Project an extracted record, including its extractor and schema names
pub fn project_metadata(metadata: &NormalizedMetadata) -> Vec<Tag> {
    let mut fields = metadata.fields().clone();
    fields
        .entry("extractor_name".to_string())
        .or_insert_with(|| Value::from(metadata.extractor_name()));
    fields
        .entry("schema_name".to_string())
        .or_insert_with(|| Value::from(metadata.schema_name()));
    project_fields(&fields)
}

/// Map tags back to fields; all values become strings
pub fn tags_to_fields(tags: &[Tag]) -> FieldMap {
    tags.iter()
        .map(|tag| {
            let key = tag.key.to_lowercase().replace('-', "_");
            (key, Value::String(tag.value.clone()))
        })
        .collect()
}

/// Make a key acceptable to the storage backend
pub fn sanitize_key(key: &str) -> String {
    let cleaned: String = key
        .chars()
        .map(|c| if c == '_' { '-' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | ':' | '/' | '@' | '_' | '-'))
        .take(MAX_KEY_LEN)
        .collect();

    if cleaned.is_empty() {
        KEY_PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}

/// Make a value acceptable to the storage backend
pub fn sanitize_value(value: &str) -> String {
    let cleaned: String = value
        .chars()
        .filter(|c| {
            c.is_ascii_alphanumeric()
                || matches!(c, ' ' | '.' | ':' | '/' | '@' | '+' | '=' | '_' | '-')
        })
        .collect();
    let trimmed = cleaned.trim();

    if trimmed.is_empty() {
        VALUE_PLACEHOLDER.to_string()
    } else {
        trimmed.chars().take(MAX_VALUE_LEN).collect()
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
