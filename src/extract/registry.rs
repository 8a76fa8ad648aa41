use std::collections::BTreeSet;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{file_name_of, ExtractError, Extractor, GenericExtractor, TextExtractor};
use crate::config::ExtractionConfig;
use crate::metadata::{DigestReader, FileDescriptor, NormalizedMetadata};

/// Result of extracting one file: its identity plus the extracted record
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Descriptor computed when the file entered the pipeline
    pub file: FileDescriptor,
    /// Extracted metadata
    pub metadata: NormalizedMetadata,
}

/// Outcome for one path of a batch
#[derive(Debug)]
pub struct BatchItem {
    /// Input path
    pub path: PathBuf,
    /// Extraction outcome for that path
    pub result: Result<Extraction, ExtractError>,
}

/// Ordered set of extractors with a terminal fallback
///
/// Registered extractors are consulted in insertion order. The
/// [`GenericExtractor`] is held apart from the list and consulted last, so
/// nothing can be registered behind it.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
    fallback: Option<GenericExtractor>,
    compute_checksum: bool,
}

impl ExtractorRegistry {
    /// Create a registry with no format extractors, only the fallback
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            extractors: Vec::new(),
            fallback: Some(GenericExtractor::new(config.compute_checksum)),
            compute_checksum: config.compute_checksum,
        }
    }

    /// Create a registry without the fallback; unknown files then fail with
    /// [`ExtractError::NotFound`]
    pub fn without_fallback(config: &ExtractionConfig) -> Self {
        Self {
            extractors: Vec::new(),
            fallback: None,
            compute_checksum: config.compute_checksum,
        }
    }

    /// Create a registry with every built-in format extractor
    pub fn with_defaults(config: &ExtractionConfig) -> Self {
        let mut registry = Self::new(config);

        #[cfg(feature = "czi")]
        registry.register(Box::new(crate::formats::czi::CziExtractor::new(
            config.max_container_bytes,
        )));

        #[cfg(feature = "fastq")]
        registry.register(Box::new(crate::formats::fastq::FastqExtractor::new()));

        registry.register(Box::new(TextExtractor::new()));
        registry
    }

    /// Append an extractor ahead of the fallback
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        debug!("Registering extractor '{}'", extractor.name());
        self.extractors.push(extractor);
    }

    /// Names in dispatch order, fallback included
    pub fn names(&self) -> Vec<&'static str> {
        self.candidates().map(|e| e.name()).collect()
    }

    /// Union of declared extensions over the registered extractors
    pub fn supported_formats(&self) -> Vec<&'static str> {
        let formats: BTreeSet<&'static str> = self
            .extractors
            .iter()
            .flat_map(|e| e.supported_formats().iter().copied())
            .collect();
        formats.into_iter().collect()
    }

    /// First extractor that accepts the file name
    pub fn find(&self, file_name: &str) -> Result<&dyn Extractor, ExtractError> {
        self.candidates()
            .find(|e| e.can_handle(file_name))
            .ok_or_else(|| ExtractError::NotFound {
                file: file_name.to_string(),
            })
    }

    /// Describe and extract a file on disk
    pub fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let file_name = file_name_of(path);
        let file = FileDescriptor::from_path(path, self.compute_checksum)
            .map_err(|e| ExtractError::from_metadata(&file_name, e))?;

        let extractor = self.find(&file_name)?;
        info!("Extracting {} with '{}'", file_name, extractor.name());
        let metadata = extractor.extract_described(path, &file)?;

        Ok(Extraction { file, metadata })
    }

    /// Extract from an open stream
    ///
    /// The stream goes to the extractor as-is, so a sampling extractor stops
    /// reading at its bound. The descriptor counts the bytes actually read and
    /// carries a checksum only if the extractor read to the end.
    pub fn extract_from_reader(
        &self,
        reader: &mut dyn Read,
        file_name: &str,
    ) -> Result<Extraction, ExtractError> {
        let extractor = self.find(file_name)?;

        info!("Extracting stream {} with '{}'", file_name, extractor.name());
        let mut digest = DigestReader::new(reader, self.compute_checksum);
        let metadata = extractor.extract_from_reader(&mut digest, file_name)?;
        debug!("Stream {} yielded {} bytes", file_name, digest.bytes_read());
        let file = FileDescriptor::from_stream(file_name, digest);

        Ok(Extraction { file, metadata })
    }

    /// Extract many files; a failing file is reported in its item and the
    /// batch carries on
    pub fn extract_batch<P: AsRef<Path>>(&self, paths: &[P]) -> Vec<BatchItem> {
        let items: Vec<BatchItem> = paths
            .iter()
            .map(|p| {
                let path = p.as_ref().to_path_buf();
                let result = self.extract(&path);
                if let Err(e) = &result {
                    warn!("Extraction failed for {}: {}", path.display(), e);
                }
                BatchItem { path, result }
            })
            .collect();

        let failed = items.iter().filter(|i| i.result.is_err()).count();
        info!("Batch finished: {} files, {} failed", items.len(), failed);
        items
    }

    fn candidates(&self) -> impl Iterator<Item = &dyn Extractor> + '_ {
        let fallback = self.fallback.as_ref().map(|f| f as &dyn Extractor);
        self.extractors
            .iter()
            .map(|e| e.as_ref() as &dyn Extractor)
            .chain(fallback)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults(&ExtractionConfig::default())
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("extractors", &self.names())
            .field("compute_checksum", &self.compute_checksum)
            .finish()
    }
}
