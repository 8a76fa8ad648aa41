use super::{Schema, SchemaError};

/// Schema documents shipped with the crate, parents first
const BUILTIN_DOCUMENTS: &[(&str, &str)] = &[
    ("base", include_str!("../../schemas/base.yaml")),
    ("generic", include_str!("../../schemas/generic.yaml")),
    ("microscopy", include_str!("../../schemas/microscopy.yaml")),
    ("sequencing", include_str!("../../schemas/sequencing.yaml")),
    ("dataset", include_str!("../../schemas/dataset.yaml")),
];

/// Names of the shipped schemas
pub fn builtin_names() -> impl Iterator<Item = &'static str> {
    BUILTIN_DOCUMENTS.iter().map(|(name, _)| *name)
}

/// Parse the shipped schemas
pub fn builtin_schemas() -> Result<Vec<Schema>, SchemaError> {
    BUILTIN_DOCUMENTS
        .iter()
        .map(|(name, yaml)| {
            let mut schema = Schema::from_yaml_str(yaml)?;
            if schema.name.is_empty() {
                schema.name = name.to_string();
            }
            Ok(schema)
        })
        .collect()
}
