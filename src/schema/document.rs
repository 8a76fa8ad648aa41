use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::{FieldSchema, SchemaError};
use crate::controlled_vocabulary::OntologyTerm;

/// Named custom rule evaluated after field checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Rule identifier, reported as the error field
    pub name: String,
    /// Boolean expression over field values
    pub expression: String,
    /// Message reported when the expression is false
    #[serde(default)]
    pub message: String,
}

/// Declarative metadata schema
///
/// Documents are YAML or JSON:
///
/// ```yaml
/// name: microscopy
/// version: "1.0"
/// extends: [base]
/// required: [instrument_model]
/// fields:
///   objective_na:
///     type: number
///     minimum: 0.0
///     maximum: 1.7
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Schema {
    /// Registry key
    pub name: String,
    /// Document version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Scientific domain (e.g., "microscopy")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Human-readable description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Fields that must be present; may repeat after inheritance
    pub required: Vec<String>,
    /// Field definitions
    pub fields: BTreeMap<String, FieldSchema>,
    /// Parent schema names, merged in order
    pub extends: Vec<String>,
    /// Custom rules
    pub validation_rules: Vec<ValidationRule>,
    /// Field name to ontology term accession
    pub ontology_mappings: BTreeMap<String, String>,
}

impl Schema {
    /// Empty schema with a name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Add a field definition
    pub fn with_field(mut self, name: &str, field: FieldSchema) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    /// Add a required field name
    pub fn with_required(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }

    /// Add a parent schema
    pub fn with_parent(mut self, parent: &str) -> Self {
        self.extends.push(parent.to_string());
        self
    }

    /// Add a custom rule
    pub fn with_rule(mut self, name: &str, expression: &str, message: &str) -> Self {
        self.validation_rules.push(ValidationRule {
            name: name.to_string(),
            expression: expression.to_string(),
            message: message.to_string(),
        });
        self
    }

    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SchemaError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a `.yaml`, `.yml` or `.json` document; an unnamed document takes
    /// the file stem as its name
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content = std::fs::read_to_string(path)?;

        let mut schema = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&content)?,
            "json" => Self::from_json_str(&content)?,
            _ => return Err(SchemaError::UnsupportedFormat(path.display().to_string())),
        };

        if schema.name.is_empty() {
            schema.name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .ok_or(SchemaError::MissingName)?
                .to_string();
        }
        Ok(schema)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, SchemaError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compile every pattern and check every ontology accession, including
    /// those of array items and object members, and require a name
    pub fn check(&self) -> Result<(), SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::MissingName);
        }
        for (name, field) in &self.fields {
            check_field(&self.name, name, field)?;
        }
        for (name, accession) in &self.ontology_mappings {
            check_accession(&self.name, name, accession)?;
        }
        Ok(())
    }

    /// Union of the `required` list and fields flagged `required: true`
    pub fn required_fields(&self) -> BTreeSet<&str> {
        self.required
            .iter()
            .map(String::as_str)
            .chain(
                self.fields
                    .iter()
                    .filter(|(_, f)| f.required)
                    .map(|(n, _)| n.as_str()),
            )
            .collect()
    }

    /// Ontology term for a field, from its definition or the mapping table
    pub fn ontology_term(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|f| f.ontology_term.as_deref())
            .or_else(|| self.ontology_mappings.get(field).map(String::as_str))
    }
}

fn check_field(schema: &str, path: &str, field: &FieldSchema) -> Result<(), SchemaError> {
    if let Some(pattern) = &field.pattern {
        Regex::new(pattern).map_err(|source| SchemaError::InvalidPattern {
            schema: schema.to_string(),
            field: path.to_string(),
            source,
        })?;
    }
    if let Some(accession) = &field.ontology_term {
        check_accession(schema, path, accession)?;
    }
    if let Some(items) = &field.items {
        check_field(schema, &format!("{}[]", path), items)?;
    }
    for (name, property) in &field.properties {
        check_field(schema, &format!("{}.{}", path, name), property)?;
    }
    Ok(())
}

fn check_accession(schema: &str, path: &str, accession: &str) -> Result<(), SchemaError> {
    if OntologyTerm::is_valid_accession(accession) {
        return Ok(());
    }
    Err(SchemaError::InvalidAccession {
        schema: schema.to_string(),
        field: path.to_string(),
        accession: accession.to_string(),
    })
}
