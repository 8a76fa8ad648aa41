use std::fmt;

#[cfg(feature = "colorized_output")]
use console::style;
use serde::{Deserialize, Serialize};

use super::QualityScore;

/// Class of a hard validation error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Required field is absent, null or empty
    MissingRequired,
    /// Value has the wrong JSON type
    TypeMismatch,
    /// String does not match the field pattern
    PatternMismatch,
    /// Number outside the declared range
    OutOfRange,
    /// Custom rule evaluated to false or could not be evaluated
    RuleFailed,
    /// Value present but unusable for its purpose
    InvalidValue,
}

impl IssueKind {
    /// Snake-case label
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::MissingRequired => "missing_required",
            IssueKind::TypeMismatch => "type_mismatch",
            IssueKind::PatternMismatch => "pattern_mismatch",
            IssueKind::OutOfRange => "out_of_range",
            IssueKind::RuleFailed => "rule_failed",
            IssueKind::InvalidValue => "invalid_value",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A hard error; any one makes the result invalid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Field path (`channels[0].name`) or rule name
    pub field: String,
    /// Explanation
    pub message: String,
    /// Error class
    pub kind: IssueKind,
}

impl ValidationIssue {
    pub(crate) fn new(
        field: impl Into<String>,
        kind: IssueKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            kind,
        }
    }

    /// Top-level field the path starts with
    pub fn root_field(&self) -> &str {
        self.field.split(['.', '[']).next().unwrap_or(&self.field)
    }
}

/// A soft finding; does not affect validity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWarning {
    /// Field path
    pub field: String,
    /// Explanation
    pub message: String,
    /// Closest allowed values, best first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ValidationWarning {
    pub(crate) fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    pub(crate) fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// Outcome of validating one record against one schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when there are no errors
    pub valid: bool,
    /// Hard errors in the order they were found
    pub errors: Vec<ValidationIssue>,
    /// Soft findings
    pub warnings: Vec<ValidationWarning>,
    /// Quality score, when computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<QualityScore>,
    /// Schema the record was checked against
    pub schema_name: String,
}

impl ValidationResult {
    /// Empty (valid) result for a schema
    pub fn new(schema_name: impl Into<String>) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            quality: None,
            schema_name: schema_name.into(),
        }
    }

    pub(crate) fn error(&mut self, issue: ValidationIssue) {
        self.valid = false;
        self.errors.push(issue);
    }

    pub(crate) fn warn(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Check if any errors were found
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Check if any warnings were produced
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Errors of one kind
    pub fn errors_of(&self, kind: IssueKind) -> impl Iterator<Item = &ValidationIssue> + '_ {
        self.errors.iter().filter(move |e| e.kind == kind)
    }

    /// Whether an error was reported for a field path
    pub fn has_error_for(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Format the report with colors (requires console feature)
    pub fn format_colored(&self) -> String {
        #[cfg(feature = "colorized_output")]
        {
            use console::Emoji;

            static WARN: Emoji<'_, '_> = Emoji("⚠", "[WARN]");
            static FAIL: Emoji<'_, '_> = Emoji("✗", "[FAIL]");

            let mut output = String::new();

            output.push_str(&format!("{}\n", style("Metadata Validation Report").bold().cyan()));
            output.push_str(&format!("{}\n", style("==========================").cyan()));
            output.push_str(&format!("{}: {}\n\n", style("Schema").bold(), self.schema_name));

            for error in &self.errors {
                output.push_str(&format!(
                    "[{}] {} - {}: {}\n",
                    FAIL,
                    style(&error.field).red(),
                    style(error.kind).red().bold(),
                    error.message
                ));
            }
            for warning in &self.warnings {
                output.push_str(&format!(
                    "[{}] {} - {}",
                    WARN,
                    style(&warning.field).yellow(),
                    warning.message
                ));
                if !warning.suggestions.is_empty() {
                    output.push_str(&format!(
                        " (did you mean: {})",
                        style(warning.suggestions.join(", ")).green()
                    ));
                }
                output.push('\n');
            }

            if let Some(quality) = &self.quality {
                output.push('\n');
                output.push_str(&format!("{}: {}\n", style("Quality").bold(), quality));
            }

            output.push('\n');
            output.push_str(&format!(
                "{}: {} errors, {} warnings\n",
                style("Summary").bold(),
                style(self.errors.len()).red(),
                style(self.warnings.len()).yellow()
            ));

            output.push('\n');
            if !self.valid {
                output.push_str(&format!("{}\n", style("Validation FAILED").red().bold()));
            } else if self.has_warnings() {
                output.push_str(&format!(
                    "{}\n",
                    style("Validation PASSED with warnings").yellow().bold()
                ));
            } else {
                output.push_str(&format!("{}\n", style("Validation PASSED").green().bold()));
            }

            output
        }

        #[cfg(not(feature = "colorized_output"))]
        {
            format!("{}", self)
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Metadata Validation Report")?;
        writeln!(f, "==========================")?;
        writeln!(f, "Schema: {}", self.schema_name)?;
        writeln!(f)?;

        for error in &self.errors {
            writeln!(f, "[✗] {} - {}: {}", error.field, error.kind, error.message)?;
        }
        for warning in &self.warnings {
            write!(f, "[⚠] {} - {}", warning.field, warning.message)?;
            if warning.suggestions.is_empty() {
                writeln!(f)?;
            } else {
                writeln!(f, " (did you mean: {})", warning.suggestions.join(", "))?;
            }
        }

        if let Some(quality) = &self.quality {
            writeln!(f)?;
            writeln!(f, "Quality: {}", quality)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Summary: {} errors, {} warnings",
            self.errors.len(),
            self.warnings.len()
        )?;

        writeln!(f)?;
        if !self.valid {
            writeln!(f, "Validation FAILED")?;
        } else if self.has_warnings() {
            writeln!(f, "Validation PASSED with warnings")?;
        } else {
            writeln!(f, "Validation PASSED")?;
        }

        Ok(())
    }
}
