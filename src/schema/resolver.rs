use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use log::debug;

use super::{Schema, SchemaError, SchemaRegistry};

/// Resolves `extends` chains into merged schemas
///
/// Merged results are cached per name. The resolver owns its registry, so
/// the cache can never go stale behind its back; build a new resolver to
/// pick up new documents.
#[derive(Debug)]
pub struct SchemaResolver {
    registry: SchemaRegistry,
    cache: RwLock<HashMap<String, Arc<Schema>>>,
}

impl SchemaResolver {
    /// Resolver over a registry
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Underlying registry
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Fully merged schema for a name
    pub fn resolve(&self, name: &str) -> Result<Arc<Schema>, SchemaError> {
        if let Some(schema) = self.cached(name) {
            return Ok(schema);
        }
        let mut chain = Vec::new();
        self.resolve_inner(name, &mut chain)
    }

    /// Number of cached merged schemas
    pub fn cached_count(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Drop all cached merges
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn cached(&self, name: &str) -> Option<Arc<Schema>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn resolve_inner(
        &self,
        name: &str,
        chain: &mut Vec<String>,
    ) -> Result<Arc<Schema>, SchemaError> {
        if chain.iter().any(|n| n == name) {
            let mut cycle = chain.clone();
            cycle.push(name.to_string());
            return Err(SchemaError::CircularInheritance(cycle));
        }
        if let Some(schema) = self.cached(name) {
            return Ok(schema);
        }

        let raw = self
            .registry
            .get(name)
            .ok_or_else(|| SchemaError::NotFound(name.to_string()))?;

        chain.push(name.to_string());
        let mut merged = raw.clone();
        for parent_name in &raw.extends {
            let parent = self.resolve_inner(parent_name, chain)?;
            merge_parent(&mut merged, &parent);
        }
        chain.pop();

        debug!(
            "Resolved schema '{}' ({} fields, {} required)",
            name,
            merged.fields.len(),
            merged.required.len()
        );

        let merged = Arc::new(merged);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), Arc::clone(&merged));
        Ok(merged)
    }
}

/// Fold a resolved parent into a child; the child keeps every field, rule
/// and mapping it declares itself
fn merge_parent(child: &mut Schema, parent: &Schema) {
    for (name, field) in &parent.fields {
        child
            .fields
            .entry(name.clone())
            .or_insert_with(|| field.clone());
    }
    child.required.extend(parent.required.iter().cloned());
    child
        .validation_rules
        .extend(parent.validation_rules.iter().cloned());
    for (field, term) in &parent.ontology_mappings {
        child
            .ontology_mappings
            .entry(field.clone())
            .or_insert_with(|| term.clone());
    }
    if child.domain.is_none() {
        child.domain = parent.domain.clone();
    }
}
