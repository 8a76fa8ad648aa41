//! # Ontology Terms for Instrument Metadata
//!
//! Controlled vocabulary terms attached to extracted metadata. Extractors
//! record an EDAM format term for the files they read, and schema loading
//! checks that every ontology accession has the `PREFIX:local_id` shape the
//! quality scorer counts as a mapping.
//!
//! ## Reference
//! - EDAM: https://edamontology.org
//! - Units of Measurement Ontology: https://github.com/bio-ontology-research-group/unit-ontology

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// An ontology term with its accession and name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OntologyTerm {
    /// Term accession (e.g., "EDAM:format_1930")
    pub accession: String,
    /// Human-readable name
    pub name: String,
}

impl OntologyTerm {
    /// Create a new term with accession and name
    pub fn new(accession: &str, name: &str) -> Self {
        Self {
            accession: accession.to_string(),
            name: name.to_string(),
        }
    }

    /// Check that an accession has the `PREFIX:local_id` shape
    pub fn is_valid_accession(accession: &str) -> bool {
        static ACCESSION: OnceLock<Regex> = OnceLock::new();
        ACCESSION
            .get_or_init(|| {
                Regex::new(r"^[A-Za-z][A-Za-z0-9_]*:[A-Za-z0-9_]+$").expect("static accession pattern")
            })
            .is_match(accession)
    }
}

impl fmt::Display for OntologyTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}: {}]", self.accession, self.name)
    }
}

/// EDAM format terms for the supported file kinds
pub mod format_terms {
    use super::OntologyTerm;

    /// EDAM:format_1930 - FASTQ
    pub fn fastq() -> OntologyTerm {
        OntologyTerm::new("EDAM:format_1930", "FASTQ")
    }

    /// EDAM:format_3752 - CSV
    pub fn csv() -> OntologyTerm {
        OntologyTerm::new("EDAM:format_3752", "CSV")
    }

    /// EDAM:format_3475 - TSV
    pub fn tsv() -> OntologyTerm {
        OntologyTerm::new("EDAM:format_3475", "TSV")
    }

    /// EDAM:format_2330 - Textual format
    pub fn textual() -> OntologyTerm {
        OntologyTerm::new("EDAM:format_2330", "Textual format")
    }
}
