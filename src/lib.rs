//! # scimeta - Scientific Instrument Metadata Extraction
//!
//! `scimeta` reads the acquisition metadata embedded in scientific instrument
//! files, normalizes it into flat schema-conformant records, validates those
//! records and projects them onto storage tags. No vendor software is needed.
//!
//! ## Key Features
//!
//! - **Pluggable extractors**: each format implements [`extract::Extractor`];
//!   the [`extract::ExtractorRegistry`] dispatches files by name and always
//!   falls back to a generic extractor (size, checksum, modification time).
//!
//! - **Zeiss CZI decoding**: walks the segmented binary container with a
//!   bounds-checked cursor and maps the embedded XML onto microscopy fields.
//!   Damaged files yield partial metadata with notes rather than failing.
//!
//! - **FASTQ sampling**: streams plain or gzip-compressed reads and computes
//!   read statistics over a bounded sample, reporting when the file held more.
//!
//! - **Declarative schemas**: YAML or JSON documents with types, patterns,
//!   ranges, vocabularies, nested items and multiple inheritance.
//!
//! - **Validation and scoring**: required-field, type and constraint checks,
//!   custom rule expressions, a four-part quality score and a publication
//!   readiness score.
//!
//! - **Tag projection**: at most ten sanitized key/value tags per file for
//!   object-storage backends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! use scimeta::prelude::*;
//!
//! let config = Config::default();
//! let extractors = ExtractorRegistry::with_defaults(&config.extraction);
//! let schemas = SchemaResolver::new(SchemaRegistry::from_config(&config.schemas)?);
//! let validator = Validator::new(Arc::new(schemas));
//!
//! let extraction = extractors.extract(Path::new("run_R1_001.fastq.gz"))?;
//! let result = validator.validate_metadata(&extraction.metadata)?;
//! println!("{}", result);
//!
//! for tag in project_metadata(&extraction.metadata) {
//!     println!("{} = {}", tag.key, tag.value);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - [`extract`]: extractor contract, registry and the generic/text fallbacks
//! - [`formats`]: format-specific extractors (CZI, FASTQ)
//! - [`metadata`]: normalized records and file descriptors
//! - [`schema`]: schema documents, registry and inheritance resolution
//! - [`validator`]: validation, quality and readiness scoring
//! - [`tags`]: bounded projection onto storage tags
//! - [`config`]: TOML configuration
//! - [`controlled_vocabulary`]: ontology format terms and accession checks

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod controlled_vocabulary;
pub mod extract;
pub mod formats;
pub mod metadata;
pub mod schema;
pub mod tags;
pub mod validator;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::config::{Config, ExtractionConfig, SchemaConfig};
    pub use crate::controlled_vocabulary::{format_terms, OntologyTerm};
    pub use crate::extract::{
        Extraction, ExtractError, Extractor, ExtractorRegistry, GenericExtractor, TextExtractor,
    };
    #[cfg(feature = "czi")]
    pub use crate::formats::czi::CziExtractor;
    #[cfg(feature = "fastq")]
    pub use crate::formats::fastq::FastqExtractor;
    pub use crate::metadata::{
        FieldMap, FileDescriptor, MetadataBuilder, MicroscopyMetadata, NormalizedMetadata,
        SequencingMetadata,
    };
    pub use crate::schema::{
        FieldSchema, FieldType, Schema, SchemaError, SchemaRegistry, SchemaResolver,
    };
    pub use crate::tags::{project_fields, project_metadata, tags_to_fields, Tag};
    pub use crate::validator::{
        assess, IssueKind, QualityScore, ReadinessReport, ValidationResult, Validator,
    };
}
