//! # Extractor Contract
//!
//! Every format handler implements [`Extractor`]. The [`ExtractorRegistry`]
//! keeps handlers in priority order and dispatches each file to the first one
//! whose [`Extractor::can_handle`] accepts its name. A [`GenericExtractor`]
//! that accepts everything always sits at the end of the list, so every file
//! yields at least its basic attributes.
//!
//! Extractors hold no per-call state and never write to their input, so one
//! registry can serve concurrent extractions of different files.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use scimeta::config::ExtractionConfig;
//! use scimeta::extract::ExtractorRegistry;
//! use std::path::Path;
//!
//! let registry = ExtractorRegistry::with_defaults(&ExtractionConfig::default());
//! let extraction = registry.extract(Path::new("cells.czi"))?;
//! println!("{}", extraction.metadata.to_json_pretty()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::Read;
use std::path::Path;

use crate::metadata::{FileDescriptor, NormalizedMetadata};

pub use error::ExtractError;
pub use generic::GenericExtractor;
pub use registry::{BatchItem, Extraction, ExtractorRegistry};
pub use text::TextExtractor;

mod error;
mod generic;
mod registry;
mod text;

#[cfg(test)]
mod tests;

/// Capability interface implemented by every format handler
pub trait Extractor: Send + Sync {
    /// Short stable name, recorded as `extractor_name` in the output
    fn name(&self) -> &'static str;

    /// Declared extensions this extractor understands
    fn supported_formats(&self) -> &'static [&'static str];

    /// Whether this extractor accepts a file with the given name
    fn can_handle(&self, file_name: &str) -> bool;

    /// Extract metadata from a file on disk
    fn extract(&self, path: &Path) -> Result<NormalizedMetadata, ExtractError>;

    /// Extract a file the caller has already described
    ///
    /// Extractors that report file attributes take them from `file` here
    /// instead of reading the file again.
    fn extract_described(
        &self,
        path: &Path,
        file: &FileDescriptor,
    ) -> Result<NormalizedMetadata, ExtractError> {
        let _ = file;
        self.extract(path)
    }

    /// Extract metadata from an already-open stream
    fn extract_from_reader(
        &self,
        reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError>;
}

/// File name component of a path, for error messages and dispatch
pub(crate) fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
