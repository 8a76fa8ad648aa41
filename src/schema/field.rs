use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Value type a field must have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// JSON string
    String,
    /// Any JSON number
    Number,
    /// Whole JSON number
    Integer,
    /// JSON boolean
    Boolean,
    /// JSON array
    Array,
    /// JSON object
    Object,
    /// String holding an ISO-8601 date or timestamp
    Date,
}

impl FieldType {
    /// Whether a value conforms to this type
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
            FieldType::Object => value.is_object(),
            FieldType::Date => value.as_str().is_some_and(is_iso_date),
        }
    }

    /// Lower-case type name as written in schema documents
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Boolean => "boolean",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Date => "date",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn is_iso_date(text: &str) -> bool {
    DateTime::parse_from_rfc3339(text).is_ok()
        || NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
        || NaiveDate::parse_from_str(text, "%Y-%m-%d").is_ok()
}

/// Condition making a field required
///
/// The field becomes required when `field` is present and, if `equals` is
/// given, holds exactly that value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredIf {
    /// Field the condition looks at
    pub field: String,
    /// Value that triggers the requirement; any present value when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Value>,
}

/// Definition of one metadata field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSchema {
    /// Expected value type; unchecked when absent
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<FieldType>,

    /// Field must be present
    pub required: bool,

    /// Field must be present when a condition holds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_if: Option<RequiredIf>,

    /// Absence is reported as a warning
    pub recommended: bool,

    /// Allowed string values; anything else is a warning
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub vocabulary: Vec<String>,

    /// Regular expression string values must match
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    /// Inclusive lower bound for numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,

    /// Inclusive upper bound for numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,

    /// Definition applied to every array element
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldSchema>>,

    /// Definitions of object members
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, FieldSchema>,

    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Ontology term accession describing the field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ontology_term: Option<String>,
}

impl FieldSchema {
    /// Definition with only a type
    pub fn of_type(field_type: FieldType) -> Self {
        Self {
            field_type: Some(field_type),
            ..Default::default()
        }
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark as recommended
    pub fn recommended(mut self) -> Self {
        self.recommended = true;
        self
    }

    /// Set the allowed values
    pub fn with_vocabulary<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the string pattern
    pub fn with_pattern(mut self, pattern: &str) -> Self {
        self.pattern = Some(pattern.to_string());
        self
    }

    /// Set the inclusive numeric range
    pub fn with_range(mut self, minimum: Option<f64>, maximum: Option<f64>) -> Self {
        self.minimum = minimum;
        self.maximum = maximum;
        self
    }

    /// Set the element definition
    pub fn with_items(mut self, items: FieldSchema) -> Self {
        self.items = Some(Box::new(items));
        self
    }

    /// Add an object member definition
    pub fn with_property(mut self, name: &str, property: FieldSchema) -> Self {
        self.properties.insert(name.to_string(), property);
        self
    }

    /// Set the ontology term
    pub fn with_ontology_term(mut self, accession: &str) -> Self {
        self.ontology_term = Some(accession.to_string());
        self
    }
}
