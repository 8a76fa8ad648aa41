//! # Normalized Metadata
//!
//! This module holds the records every extractor produces:
//!
//! 1. **NormalizedMetadata**: a flat field map plus optional microscopy and
//!    sequencing sub-structures, stamped with the producing extractor, the
//!    target schema and the extraction time.
//!
//! 2. **FileDescriptor**: name, declared extension, size and checksum of the
//!    input, computed once when a file enters the pipeline.
//!
//! Records are assembled through [`MetadataBuilder`] and are read-only once
//! built.

mod descriptor;
mod error;
mod microscopy;
mod normalized;
mod sequencing;

#[cfg(test)]
mod tests;

pub use descriptor::{declared_extension, sha256_hex, DigestReader, FileDescriptor};
pub use error::MetadataError;
pub use microscopy::{
    ApplicationInfo, ChannelInfo, ImageDimensions, MicroscopyMetadata, ObjectiveInfo,
    PhysicalScaling,
};
pub use normalized::{FieldMap, MetadataBuilder, NormalizedMetadata};
pub use sequencing::SequencingMetadata;
