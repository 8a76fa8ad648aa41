//! # Metadata Validation
//!
//! Checks a flat field map against a resolved schema in three passes:
//!
//! 1. **Required fields**: the schema's `required` list, fields marked
//!    `required: true`, and `required_if` conditions that hold
//! 2. **Field checks**: type, pattern, numeric range and vocabulary for every
//!    present field, descending into array items and object properties
//! 3. **Rules**: the schema's custom expressions through a [`RuleEvaluator`]
//!
//! Errors and warnings are values in the returned [`ValidationResult`]; only
//! schema lookup can fail. A [`QualityScore`] is attached to every result.
//!
//! Dataset-level publication checks live in [`readiness`].
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use scimeta::schema::{SchemaRegistry, SchemaResolver};
//! use scimeta::validator::Validator;
//! use serde_json::json;
//!
//! let resolver = SchemaResolver::new(SchemaRegistry::with_builtin().unwrap());
//! let validator = Validator::new(Arc::new(resolver));
//!
//! let mut fields = scimeta::metadata::FieldMap::new();
//! fields.insert("file_name".into(), json!("scan.czi"));
//! fields.insert("extractor_name".into(), json!("czi"));
//! fields.insert("instrument_model".into(), json!("Axio Observer"));
//!
//! let result = validator.validate(&fields, "microscopy").unwrap();
//! assert!(result.valid);
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};

use log::{debug, info};
use regex::Regex;
use serde_json::Value;

use crate::metadata::{FieldMap, NormalizedMetadata};
use crate::schema::{FieldSchema, Schema, SchemaError, SchemaResolver};

pub use quality::QualityScore;
pub use readiness::{assess, ReadinessReport};
pub use report::{IssueKind, ValidationIssue, ValidationResult, ValidationWarning};
pub use rules::{ExpressionEvaluator, RuleError, RuleEvaluator};

mod quality;
pub mod readiness;
mod report;
mod rules;


/// Maximum vocabulary suggestions per warning
pub const MAX_SUGGESTIONS: usize = 3;

/// Absent, null and empty-string values all count as not present
pub(crate) fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Validates field maps against schemas from a shared resolver
pub struct Validator {
    resolver: Arc<SchemaResolver>,
    rules: Box<dyn RuleEvaluator>,
    patterns: RwLock<HashMap<String, Regex>>,
}

impl Validator {
    /// Validator using the default expression evaluator
    pub fn new(resolver: Arc<SchemaResolver>) -> Self {
        Self {
            resolver,
            rules: Box::new(ExpressionEvaluator::new()),
            patterns: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the rule evaluator
    pub fn with_rule_evaluator(mut self, rules: Box<dyn RuleEvaluator>) -> Self {
        self.rules = rules;
        self
    }

    /// Shared schema resolver
    pub fn resolver(&self) -> &Arc<SchemaResolver> {
        &self.resolver
    }

    /// Validate fields against a named schema
    pub fn validate(
        &self,
        fields: &FieldMap,
        schema_name: &str,
    ) -> Result<ValidationResult, SchemaError> {
        let schema = self.resolver.resolve(schema_name)?;
        Ok(self.validate_with_schema(fields, &schema))
    }

    /// Validate an extracted record against the schema its extractor names
    pub fn validate_metadata(
        &self,
        metadata: &NormalizedMetadata,
    ) -> Result<ValidationResult, SchemaError> {
        self.validate(&metadata.to_field_map(), metadata.schema_name())
    }

    /// Validate fields against an already resolved schema
    pub fn validate_with_schema(&self, fields: &FieldMap, schema: &Schema) -> ValidationResult {
        let mut result = ValidationResult::new(&schema.name);

        self.check_required(fields, schema, &mut result);

        for (name, definition) in &schema.fields {
            match fields.get(name) {
                Some(value) if is_present(Some(value)) => {
                    self.check_value(name, value, definition, &mut result)
                }
                _ => {
                    if definition.recommended {
                        result.warn(ValidationWarning::new(
                            name.as_str(),
                            format!("Recommended field '{}' is missing", name),
                        ));
                    }
                }
            }
        }

        self.check_rules(fields, schema, &mut result);

        result.quality = Some(QualityScore::compute(schema, fields, &result.errors));

        if result.valid {
            debug!(
                "Record valid against '{}' ({} warnings)",
                schema.name,
                result.warnings.len()
            );
        } else {
            info!(
                "Record invalid against '{}': {} errors",
                schema.name,
                result.errors.len()
            );
        }

        result
    }

    fn check_required(&self, fields: &FieldMap, schema: &Schema, result: &mut ValidationResult) {
        let mut checked: BTreeSet<&str> = BTreeSet::new();
        let missing = |name: &str, reason: String, result: &mut ValidationResult| {
            if !is_present(fields.get(name)) {
                result.error(ValidationIssue::new(name, IssueKind::MissingRequired, reason));
            }
        };

        for name in &schema.required {
            missing(name, format!("Required field '{}' is missing", name), result);
            checked.insert(name);
        }

        for (name, definition) in &schema.fields {
            if checked.contains(name.as_str()) {
                continue;
            }
            if definition.required {
                missing(name, format!("Required field '{}' is missing", name), result);
                checked.insert(name);
                continue;
            }
            if let Some(condition) = &definition.required_if {
                let trigger = fields.get(&condition.field);
                let holds = match &condition.equals {
                    Some(expected) => trigger == Some(expected),
                    None => is_present(trigger),
                };
                if holds {
                    missing(
                        name,
                        format!(
                            "Field '{}' is required when '{}' is set",
                            name, condition.field
                        ),
                        result,
                    );
                }
            }
        }
    }

    fn check_value(
        &self,
        path: &str,
        value: &Value,
        definition: &FieldSchema,
        result: &mut ValidationResult,
    ) {
        if let Some(field_type) = definition.field_type {
            if !field_type.matches(value) {
                result.error(ValidationIssue::new(
                    path,
                    IssueKind::TypeMismatch,
                    format!("Expected {}, found {}", field_type, json_kind(value)),
                ));
                return;
            }
        }

        if let (Some(pattern), Value::String(text)) = (&definition.pattern, value) {
            match self.matches_pattern(pattern, text) {
                Ok(true) => {}
                Ok(false) => result.error(ValidationIssue::new(
                    path,
                    IssueKind::PatternMismatch,
                    format!("'{}' does not match pattern '{}'", text, pattern),
                )),
                Err(e) => result.error(ValidationIssue::new(
                    path,
                    IssueKind::PatternMismatch,
                    format!("Pattern '{}' is invalid: {}", pattern, e),
                )),
            }
        }

        if let Some(number) = value.as_f64() {
            let below = definition.minimum.map_or(false, |min| number < min);
            let above = definition.maximum.map_or(false, |max| number > max);
            if below || above {
                result.error(ValidationIssue::new(
                    path,
                    IssueKind::OutOfRange,
                    format!("{} is outside {}", number, range_text(definition)),
                ));
            }
        }

        if !definition.vocabulary.is_empty() {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            if !definition.vocabulary.iter().any(|allowed| *allowed == text) {
                result.warn(
                    ValidationWarning::new(
                        path,
                        format!("'{}' is not in the controlled vocabulary", text),
                    )
                    .with_suggestions(suggest(&text, &definition.vocabulary)),
                );
            }
        }

        match value {
            Value::Array(items) => {
                if let Some(item_def) = &definition.items {
                    for (i, item) in items.iter().enumerate() {
                        let item_path = format!("{}[{}]", path, i);
                        if is_present(Some(item)) {
                            self.check_value(&item_path, item, item_def, result);
                        }
                    }
                }
            }
            Value::Object(members) => {
                for (member, member_def) in &definition.properties {
                    let member_path = format!("{}.{}", path, member);
                    match members.get(member) {
                        Some(v) if is_present(Some(v)) => {
                            self.check_value(&member_path, v, member_def, result)
                        }
                        _ if member_def.required => result.error(ValidationIssue::new(
                            member_path.as_str(),
                            IssueKind::MissingRequired,
                            format!("Required member '{}' is missing", member),
                        )),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }

    fn check_rules(&self, fields: &FieldMap, schema: &Schema, result: &mut ValidationResult) {
        for rule in &schema.validation_rules {
            match self.rules.evaluate(rule, fields) {
                Ok(true) => {}
                Ok(false) => result.error(ValidationIssue::new(
                    rule.name.as_str(),
                    IssueKind::RuleFailed,
                    rule.message.as_str(),
                )),
                Err(e) => {
                    debug!("Rule '{}' could not be evaluated: {}", rule.name, e);
                    result.error(ValidationIssue::new(
                        rule.name.as_str(),
                        IssueKind::RuleFailed,
                        format!("{} ({})", rule.message, e),
                    ))
                }
            }
        }
    }

    fn matches_pattern(&self, pattern: &str, text: &str) -> Result<bool, regex::Error> {
        if let Some(re) = self
            .patterns
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(pattern)
        {
            return Ok(re.is_match(text));
        }
        let re = Regex::new(pattern)?;
        let matched = re.is_match(text);
        self.patterns
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pattern.to_string(), re);
        Ok(matched)
    }
}

impl std::fmt::Debug for Validator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Validator")
            .field("resolver", &self.resolver)
            .finish_non_exhaustive()
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn range_text(definition: &FieldSchema) -> String {
    match (definition.minimum, definition.maximum) {
        (Some(min), Some(max)) => format!("[{}, {}]", min, max),
        (Some(min), None) => format!(">= {}", min),
        (None, Some(max)) => format!("<= {}", max),
        (None, None) => "range".to_string(),
    }
}

/// Closest vocabulary entries by edit distance, case-insensitive
fn suggest(value: &str, vocabulary: &[String]) -> Vec<String> {
    let needle = value.to_lowercase();
    let mut ranked: Vec<(usize, &String)> = vocabulary
        .iter()
        .map(|term| (strsim::levenshtein(&needle, &term.to_lowercase()), term))
        .collect();
    ranked.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, term)| term.clone())
        .collect()
}
