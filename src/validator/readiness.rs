//! Publication readiness of dataset-level metadata.
//!
//! The five citation categories (title, creators, publisher, publication
//! year, resource type) are worth 60 points together. Optional enrichment
//! adds up to 40 more. Each hard error costs 10 points and the result is
//! clamped to 0..=100.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{is_present, IssueKind, ValidationIssue, ValidationWarning};
use crate::metadata::FieldMap;

/// Points for each required category
pub const REQUIRED_POINTS: [(&str, u32); 5] = [
    ("title", 15),
    ("creators", 10),
    ("publisher", 10),
    ("publication_year", 10),
    ("resource_type", 15),
];

/// Description length that earns the full description bonus
pub const FULL_DESCRIPTION_CHARS: usize = 100;

/// Points deducted per hard error
pub const ERROR_PENALTY: u32 = 10;

/// Outcome of a readiness assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    /// Score in 0..=100
    pub score: u32,
    /// True when there are no hard errors
    pub ready: bool,
    /// Hard errors
    pub errors: Vec<ValidationIssue>,
    /// Soft findings
    pub warnings: Vec<ValidationWarning>,
    /// Points earned per category, before penalties
    pub breakdown: BTreeMap<String, u32>,
}

impl ReadinessReport {
    /// Whether an error names the field
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

/// Score dataset metadata for publication
pub fn assess(fields: &FieldMap) -> ReadinessReport {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let mut breakdown = BTreeMap::new();

    for (name, points) in REQUIRED_POINTS {
        let value = fields.get(name);
        if !is_present(value) {
            errors.push(ValidationIssue::new(
                name,
                IssueKind::MissingRequired,
                format!("'{}' is required for publication", name),
            ));
            continue;
        }

        let problem = match (name, value) {
            ("publication_year", Some(v)) => check_year(v),
            ("creators", Some(v)) => check_creators(v),
            _ => None,
        };
        match problem {
            Some(message) => {
                errors.push(ValidationIssue::new(name, IssueKind::InvalidValue, message))
            }
            None => {
                breakdown.insert(name.to_string(), points);
            }
        }
    }

    if let Some(description) = fields.get("description").and_then(Value::as_str) {
        let length = description.trim().chars().count();
        if length > 0 {
            let points = if length >= FULL_DESCRIPTION_CHARS { 10 } else { 5 };
            if points < 10 {
                warnings.push(ValidationWarning::new(
                    "description",
                    format!(
                        "Description is {} characters; {} or more earns the full bonus",
                        length, FULL_DESCRIPTION_CHARS
                    ),
                ));
            }
            breakdown.insert("description".into(), points);
        }
    }

    if is_present(fields.get("license")) {
        breakdown.insert("license".into(), 6);
    }

    if let Some(url) = fields.get("url").filter(|v| is_present(Some(*v))) {
        match url.as_str() {
            Some(u) if is_web_url(u) => {
                breakdown.insert("url".into(), 6);
            }
            _ => warnings.push(ValidationWarning::new(
                "url",
                "URL should be an absolute http(s) address",
            )),
        }
    }

    let keywords = keyword_count(fields.get("keywords"));
    if keywords > 0 {
        breakdown.insert("keywords".into(), if keywords >= 3 { 6 } else { 3 });
    }

    if creators_have_orcid(fields.get("creators")) {
        breakdown.insert("orcid".into(), 6);
    }

    if let Some(Value::Array(funding)) = fields.get("funding_references") {
        if !funding.is_empty() {
            breakdown.insert("funding_references".into(), 6);
        }
    }

    let earned: u32 = breakdown.values().sum();
    let penalty = ERROR_PENALTY * errors.len() as u32;
    let score = earned.saturating_sub(penalty).min(100);

    log::debug!(
        "Readiness: {} points earned, {} errors, score {}",
        earned,
        errors.len(),
        score
    );

    ReadinessReport {
        score,
        ready: errors.is_empty(),
        errors,
        warnings,
        breakdown,
    }
}

fn check_year(value: &Value) -> Option<String> {
    let year = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) if s.len() == 4 => s.parse::<i64>().ok(),
        _ => None,
    };
    match year {
        Some(y) if (1000..=9999).contains(&y) => None,
        _ => Some(format!("'{}' is not a four-digit year", value)),
    }
}

fn check_creators(value: &Value) -> Option<String> {
    let creators = match value {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Some("creators must be a non-empty list".into()),
    };
    let named = creators.iter().all(|c| match c {
        Value::String(s) => !s.trim().is_empty(),
        Value::Object(o) => is_present(o.get("name")),
        _ => false,
    });
    if named {
        None
    } else {
        Some("every creator needs a name".into())
    }
}

fn is_web_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.is_empty() && !host.starts_with('/') && !host.contains(char::is_whitespace))
}

fn keyword_count(value: Option<&Value>) -> usize {
    match value {
        Some(Value::Array(items)) => items.iter().filter(|v| is_present(Some(*v))).count(),
        Some(Value::String(s)) => s.split(',').filter(|k| !k.trim().is_empty()).count(),
        _ => 0,
    }
}

/// Bare or `https://orcid.org/`-prefixed ORCID iD
fn is_orcid(text: &str) -> bool {
    static ORCID: OnceLock<Regex> = OnceLock::new();
    ORCID
        .get_or_init(|| {
            Regex::new(r"^(https://orcid\.org/)?\d{4}-\d{4}-\d{4}-\d{3}[\dX]$")
                .expect("static ORCID pattern")
        })
        .is_match(text)
}

fn creators_have_orcid(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Array(items)) => items.iter().any(|c| {
            c.get("orcid")
                .and_then(Value::as_str)
                .map_or(false, is_orcid)
        }),
        _ => false,
    }
}

impl fmt::Display for ReadinessReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Publication Readiness: {}/100", self.score)?;
        for (category, points) in &self.breakdown {
            writeln!(f, "  {:<20} +{}", category, points)?;
        }
        for error in &self.errors {
            writeln!(f, "[✗] {} - {}", error.field, error.message)?;
        }
        for warning in &self.warnings {
            writeln!(f, "[⚠] {} - {}", warning.field, warning.message)?;
        }
        if self.ready {
            writeln!(f, "Ready for publication")
        } else {
            writeln!(f, "Not ready for publication")
        }
    }
}
