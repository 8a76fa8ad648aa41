use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::debug;

use super::{file_name_of, ExtractError, Extractor};
use crate::metadata::{FileDescriptor, MetadataBuilder, NormalizedMetadata};

/// Fallback extractor that accepts every file and reports basic attributes
#[derive(Debug, Clone)]
pub struct GenericExtractor {
    compute_checksum: bool,
}

impl GenericExtractor {
    /// Name recorded in the output
    pub const NAME: &'static str = "generic";

    /// Create a fallback extractor
    pub fn new(compute_checksum: bool) -> Self {
        Self { compute_checksum }
    }

    fn builder_for(descriptor: &FileDescriptor) -> MetadataBuilder {
        let format = if descriptor.extension().is_empty() {
            "unknown".to_string()
        } else {
            descriptor.extension().to_ascii_uppercase()
        };

        let mut builder = MetadataBuilder::new(Self::NAME, "generic")
            .field("file_name", descriptor.file_name())
            .field("file_size_bytes", descriptor.size_bytes())
            .field("format", format);

        if !descriptor.extension().is_empty() {
            builder.insert("extension", descriptor.extension());
        }
        builder.insert_opt("checksum_sha256", descriptor.checksum_sha256());
        builder
    }
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Extractor for GenericExtractor {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn supported_formats(&self) -> &'static [&'static str] {
        &["*"]
    }

    fn can_handle(&self, _file_name: &str) -> bool {
        true
    }

    fn extract(&self, path: &Path) -> Result<NormalizedMetadata, ExtractError> {
        let file = file_name_of(path);
        let descriptor = FileDescriptor::from_path(path, self.compute_checksum)
            .map_err(|e| ExtractError::from_metadata(&file, e))?;
        self.extract_described(path, &descriptor)
    }

    fn extract_described(
        &self,
        path: &Path,
        file: &FileDescriptor,
    ) -> Result<NormalizedMetadata, ExtractError> {
        debug!("Generic extraction for {}", file.file_name());

        let mut builder = Self::builder_for(file);
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(|t| DateTime::<Utc>::from(t).to_rfc3339());
        builder.insert_opt("modified", modified);

        Ok(builder.build())
    }

    fn extract_from_reader(
        &self,
        reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<NormalizedMetadata, ExtractError> {
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| ExtractError::io(file_name, e))?;

        let descriptor = FileDescriptor::from_bytes(file_name, &bytes, self.compute_checksum);
        Ok(Self::builder_for(&descriptor).build())
    }
}
