//! TOML configuration file support.
//!
//! Ingestion pipelines can keep extraction and schema settings in a file
//! instead of wiring them in code:
//!
//! ```toml
//! # scimeta.toml
//! [extraction]
//! compute_checksum = true
//! max_container_bytes = 2147483648
//!
//! [schemas]
//! directories = ["./schemas"]
//! include_builtin = true
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration structure for scimeta.toml files.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Extraction settings.
    #[serde(default)]
    pub extraction: ExtractionConfig,

    /// Schema loading settings.
    #[serde(default)]
    pub schemas: SchemaConfig,
}

/// Settings consumed by the extractor registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Hash file contents (SHA-256) when describing inputs.
    pub compute_checksum: bool,

    /// Refuse microscopy containers larger than this many bytes. The container
    /// decoder holds the whole file in memory.
    pub max_container_bytes: Option<u64>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            compute_checksum: true,
            max_container_bytes: None,
        }
    }
}

/// Settings consumed by the schema registry.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Directories scanned for `.yaml`, `.yml` and `.json` schema documents.
    pub directories: Vec<PathBuf>,

    /// Register the schemas shipped with the crate before loading directories.
    pub include_builtin: bool,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            directories: Vec::new(),
            include_builtin: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}
