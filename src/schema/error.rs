/// Errors raised while loading, registering or resolving schemas
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// No schema registered under the name
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// `extends` chain leads back to a schema already being resolved
    #[error("Circular schema inheritance: {}", .0.join(" -> "))]
    CircularInheritance(Vec<String>),

    /// A field pattern is not a valid regular expression
    #[error("Invalid pattern for field '{field}' in schema '{schema}': {source}")]
    InvalidPattern {
        /// Schema declaring the pattern
        schema: String,
        /// Field path the pattern belongs to
        field: String,
        /// Regex compilation error
        source: regex::Error,
    },

    /// An ontology term is not a `PREFIX:local_id` accession
    #[error("Invalid ontology accession '{accession}' for field '{field}' in schema '{schema}'")]
    InvalidAccession {
        /// Schema declaring the term
        schema: String,
        /// Field path the term belongs to
        field: String,
        /// Rejected accession
        accession: String,
    },

    /// Schema document has no name and none could be derived
    #[error("Schema document has no name")]
    MissingName,

    /// File extension is not a supported schema format
    #[error("Unsupported schema file: {0}")]
    UnsupportedFormat(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
