//! Format-specific extractors.
//!
//! - [`czi`] - segmented microscopy container (Zeiss CZI)
//! - [`fastq`] - four-line sequencing read records, plain or gzip-compressed
//!
//! Each format is behind a cargo feature of the same name; both are on by
//! default. Formats without a dedicated extractor fall through to
//! [`crate::extract::GenericExtractor`].

#[cfg(feature = "czi")]
/// Zeiss CZI container decoder.
pub mod czi;

#[cfg(feature = "fastq")]
/// FASTQ sampling decoder.
pub mod fastq;
