use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{is_present, ValidationIssue};
use crate::metadata::FieldMap;
use crate::schema::Schema;

/// Four 0-100 sub-scores and their unweighted mean
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    /// Share of defined fields that are present
    pub completeness: f64,
    /// Share of present fields without a hard error
    pub consistency: f64,
    /// Share of optional defined fields that are present
    pub richness: f64,
    /// Share of present fields mapped to an ontology term
    pub interoperability: f64,
    /// Mean of the four sub-scores
    pub overall: f64,
}

impl QualityScore {
    /// Score from sub-scores; `overall` is their mean
    pub fn from_components(
        completeness: f64,
        consistency: f64,
        richness: f64,
        interoperability: f64,
    ) -> Self {
        Self {
            completeness,
            consistency,
            richness,
            interoperability,
            overall: (completeness + consistency + richness + interoperability) / 4.0,
        }
    }

    /// Score a record against a resolved schema and the errors found for it
    ///
    /// Only fields the schema defines are counted. A ratio with an empty
    /// denominator scores 100, except interoperability, which scores 0 when
    /// nothing is present.
    pub fn compute(schema: &Schema, fields: &FieldMap, errors: &[ValidationIssue]) -> Self {
        let defined = schema.fields.len();
        let required = schema.required_fields();

        let present: Vec<&str> = schema
            .fields
            .keys()
            .map(String::as_str)
            .filter(|name| is_present(fields.get(*name)))
            .collect();

        let failing: BTreeSet<&str> = errors.iter().map(ValidationIssue::root_field).collect();
        let consistent = present.iter().filter(|n| !failing.contains(*n)).count();

        let optional: Vec<&str> = schema
            .fields
            .keys()
            .map(String::as_str)
            .filter(|name| !required.contains(name))
            .collect();
        let optional_present = optional
            .iter()
            .filter(|n| is_present(fields.get(**n)))
            .count();

        let mapped = present
            .iter()
            .filter(|n| schema.ontology_term(n).is_some())
            .count();

        Self::from_components(
            percent(present.len(), defined, 100.0),
            percent(consistent, present.len(), 100.0),
            percent(optional_present, optional.len(), 100.0),
            percent(mapped, present.len(), 0.0),
        )
    }
}

fn percent(part: usize, whole: usize, empty: f64) -> f64 {
    if whole == 0 {
        empty
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

impl fmt::Display for QualityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1}/100 (completeness {:.1}, consistency {:.1}, richness {:.1}, interoperability {:.1})",
            self.overall, self.completeness, self.consistency, self.richness, self.interoperability
        )
    }
}
