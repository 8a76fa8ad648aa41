use std::collections::BTreeMap;
use std::path::Path;

use log::{debug, info};

use super::builtin::builtin_schemas;
use super::{Schema, SchemaError};
use crate::config::SchemaConfig;

/// Raw (unresolved) schemas keyed by name
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
}

impl SchemaRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the schemas shipped with the crate
    pub fn with_builtin() -> Result<Self, SchemaError> {
        let mut registry = Self::new();
        for schema in builtin_schemas()? {
            registry.register(schema)?;
        }
        Ok(registry)
    }

    /// Registry built from configuration: built-ins when enabled, then every
    /// configured directory in order (later documents replace earlier ones)
    pub fn from_config(config: &SchemaConfig) -> Result<Self, SchemaError> {
        let mut registry = if config.include_builtin {
            Self::with_builtin()?
        } else {
            Self::new()
        };
        for dir in &config.directories {
            registry.load_dir(dir)?;
        }
        Ok(registry)
    }

    /// Add or replace a schema after checking its patterns
    pub fn register(&mut self, schema: Schema) -> Result<(), SchemaError> {
        schema.check()?;
        if self.schemas.contains_key(&schema.name) {
            debug!("Replacing schema '{}'", schema.name);
        }
        self.schemas.insert(schema.name.clone(), schema);
        Ok(())
    }

    /// Load and register one document; returns the schema name
    pub fn load_file(&mut self, path: &Path) -> Result<String, SchemaError> {
        let schema = Schema::from_path(path)?;
        let name = schema.name.clone();
        self.register(schema)?;
        debug!("Loaded schema '{}' from {}", name, path.display());
        Ok(name)
    }

    /// Load every `.yaml`, `.yml` and `.json` document in a directory, in
    /// file-name order; returns how many were loaded
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize, SchemaError> {
        let mut paths: Vec<_> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && is_schema_file(p))
            .collect();
        paths.sort();

        for path in &paths {
            self.load_file(path)?;
        }
        info!("Loaded {} schemas from {}", paths.len(), dir.display());
        Ok(paths.len())
    }

    /// Raw schema by name
    pub fn get(&self, name: &str) -> Option<&Schema> {
        self.schemas.get(name)
    }

    /// Whether a schema is registered
    pub fn contains(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<&str> {
        self.schemas.keys().map(String::as_str).collect()
    }

    /// Number of registered schemas
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn is_schema_file(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    matches!(extension.as_str(), "yaml" | "yml" | "json")
}
