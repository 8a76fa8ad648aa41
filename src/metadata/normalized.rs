use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{MetadataError, MicroscopyMetadata, SequencingMetadata};

/// Flat name to value mapping shared by extraction, validation and tagging
pub type FieldMap = BTreeMap<String, Value>;

/// Metadata extracted from a single file
///
/// Produced by an extractor through [`MetadataBuilder`]. There are no
/// mutating methods; downstream stages read it and derive their own values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedMetadata {
    extractor_name: String,
    schema_name: String,
    extracted_at: DateTime<Utc>,
    fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    microscopy: Option<MicroscopyMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sequencing: Option<SequencingMetadata>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    notes: Vec<String>,
}

impl NormalizedMetadata {
    /// Name of the extractor that produced this record
    pub fn extractor_name(&self) -> &str {
        &self.extractor_name
    }

    /// Name of the schema the fields are expected to conform to
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// When the extraction ran
    pub fn extracted_at(&self) -> DateTime<Utc> {
        self.extracted_at
    }

    /// Flat extracted fields
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Look up a single field
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Look up a field as a string slice
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Microscopy sub-structure, when the source carried instrument metadata
    pub fn microscopy(&self) -> Option<&MicroscopyMetadata> {
        self.microscopy.as_ref()
    }

    /// Sequencing sub-structure
    pub fn sequencing(&self) -> Option<&SequencingMetadata> {
        self.sequencing.as_ref()
    }

    /// Explanatory notes about partial data
    pub fn notes(&self) -> &[String] {
        &self.notes
    }

    /// Field map including the identity fields (`extractor_name`,
    /// `schema_name`, `extracted_at`)
    pub fn to_field_map(&self) -> FieldMap {
        let mut map = self.fields.clone();
        map.insert("extractor_name".to_string(), Value::from(self.extractor_name.clone()));
        map.insert("schema_name".to_string(), Value::from(self.schema_name.clone()));
        map.insert(
            "extracted_at".to_string(),
            Value::from(self.extracted_at.to_rfc3339()),
        );
        map
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json_pretty(&self) -> Result<String, MetadataError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON
    pub fn from_json(json: &str) -> Result<Self, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for [`NormalizedMetadata`]
#[derive(Debug, Clone)]
pub struct MetadataBuilder {
    extractor_name: String,
    schema_name: String,
    fields: FieldMap,
    microscopy: Option<MicroscopyMetadata>,
    sequencing: Option<SequencingMetadata>,
    notes: Vec<String>,
}

impl MetadataBuilder {
    /// Start a record for the given extractor and schema
    pub fn new(extractor_name: &str, schema_name: &str) -> Self {
        Self {
            extractor_name: extractor_name.to_string(),
            schema_name: schema_name.to_string(),
            fields: FieldMap::new(),
            microscopy: None,
            sequencing: None,
            notes: Vec::new(),
        }
    }

    /// Set a field
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Set a field in place
    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    /// Set a field only when a value is present
    pub fn insert_opt<V: Into<Value>>(&mut self, key: &str, value: Option<V>) {
        if let Some(value) = value {
            self.insert(key, value);
        }
    }

    /// Merge a whole field map; existing keys are overwritten
    pub fn extend(mut self, fields: FieldMap) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Attach an explanatory note
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Attach an explanatory note in place
    pub fn push_note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    /// Attach the microscopy sub-structure and its flattened fields
    pub fn microscopy(mut self, microscopy: MicroscopyMetadata) -> Self {
        self.fields.extend(microscopy.to_fields());
        self.microscopy = Some(microscopy);
        self
    }

    /// Attach the sequencing sub-structure and its flattened fields
    pub fn sequencing(mut self, sequencing: SequencingMetadata) -> Self {
        self.fields.extend(sequencing.to_fields());
        self.sequencing = Some(sequencing);
        self
    }

    /// Finish the record, stamping the current time
    pub fn build(self) -> NormalizedMetadata {
        self.build_at(Utc::now())
    }

    /// Finish the record with an explicit extraction time
    pub fn build_at(self, extracted_at: DateTime<Utc>) -> NormalizedMetadata {
        NormalizedMetadata {
            extractor_name: self.extractor_name,
            schema_name: self.schema_name,
            extracted_at,
            fields: self.fields,
            microscopy: self.microscopy,
            sequencing: self.sequencing,
            notes: self.notes,
        }
    }
}
