use crate::metadata::MetadataError;

/// Errors that can occur while extracting metadata from a file
///
/// All variants are final for the file in question; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// Structurally invalid input (bad header marker, broken record boundaries)
    #[error("Invalid format in {file}: {detail}")]
    Format {
        /// File the error refers to
        file: String,
        /// What was wrong
        detail: String,
    },

    /// No registered extractor accepted the file
    #[error("No extractor can handle {file}")]
    NotFound {
        /// File the error refers to
        file: String,
    },

    /// I/O error while reading the source
    #[error("I/O error reading {file}: {source}")]
    Io {
        /// File the error refers to
        file: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// Input exceeds a configured size limit
    #[error("{file} is {size} bytes, exceeding the {limit} byte limit")]
    ResourceLimit {
        /// File the error refers to
        file: String,
        /// Size of the input
        size: u64,
        /// Configured limit
        limit: u64,
    },
}

impl ExtractError {
    pub(crate) fn format(file: &str, detail: impl Into<String>) -> Self {
        Self::Format {
            file: file.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn io(file: &str, source: std::io::Error) -> Self {
        Self::Io {
            file: file.to_string(),
            source,
        }
    }

    pub(crate) fn from_metadata(file: &str, error: MetadataError) -> Self {
        match error {
            MetadataError::IoError(source) => Self::io(file, source),
            MetadataError::JsonError(e) => Self::format(file, e.to_string()),
        }
    }

    /// Name of the file the error refers to
    pub fn file(&self) -> &str {
        match self {
            Self::Format { file, .. }
            | Self::NotFound { file }
            | Self::Io { file, .. }
            | Self::ResourceLimit { file, .. } => file,
        }
    }

    /// True for structurally invalid input
    pub fn is_format_error(&self) -> bool {
        matches!(self, Self::Format { .. })
    }
}
