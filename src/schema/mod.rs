//! # Metadata Schemas
//!
//! Schemas are declarative YAML or JSON documents describing the fields a
//! record may carry: type, requiredness, allowed values, patterns, numeric
//! ranges, nested element/member definitions and ontology terms.
//!
//! ## Inheritance
//!
//! A schema may `extend` other schemas. [`SchemaResolver`] merges each parent
//! (itself resolved first) into the child:
//!
//! - fields the child does not define are copied in; the child wins on conflict
//! - parent `required` lists are appended as-is, duplicates included
//! - parent rules are appended, ontology mappings fill gaps
//!
//! Unknown parents and cycles are errors. Merged schemas are cached behind a
//! `RwLock`, so one resolver can be shared between threads.
//!
//! ## Usage
//!
//! ```rust
//! use scimeta::schema::{SchemaRegistry, SchemaResolver};
//!
//! let resolver = SchemaResolver::new(SchemaRegistry::with_builtin()?);
//! let microscopy = resolver.resolve("microscopy")?;
//! assert!(microscopy.fields.contains_key("file_name"));
//! # Ok::<(), scimeta::schema::SchemaError>(())
//! ```

mod builtin;
mod document;
mod error;
mod field;
mod registry;
mod resolver;


pub use builtin::{builtin_names, builtin_schemas};
pub use document::{Schema, ValidationRule};
pub use error::SchemaError;
pub use field::{FieldSchema, FieldType, RequiredIf};
pub use registry::SchemaRegistry;
pub use resolver::SchemaResolver;
