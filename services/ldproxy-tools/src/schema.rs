//! `schema` command: print class bundles and collection schemas.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use ogcapi_schema::{
    ApiRevision, ClassSchemaCache, CollectionDefinition, CollectionSchemaCache, JsonSchema,
    ReturnablesCollection, ReturnablesFeature, SchemaRegistry, SchemaType, StructuralSchemaProvider,
};
use tracing::info;

use crate::cli::{Returnable, SchemaArgs};

/// Read a collection definition from a `.json`, `.yml` or `.yaml` file.
pub fn load_collection(path: &Path) -> Result<CollectionDefinition> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read collection {}", path.display()))?;
    let collection = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse collection {}", path.display()))?
    } else {
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse collection {}", path.display()))?
    };
    Ok(collection)
}

/// Build the schema document requested by `args`.
pub fn schema_document(args: &SchemaArgs) -> Result<JsonSchema> {
    let registry = match &args.registry {
        Some(path) => SchemaRegistry::load_from_file(path)
            .with_context(|| format!("Failed to load schema registry {}", path.display()))?,
        None => SchemaRegistry::new(),
    };
    info!(types = registry.len(), "Loaded schema registry");
    let classes = Arc::new(ClassSchemaCache::new(registry));
    let version = args.schema_version;

    if let Some(name) = &args.type_name {
        if classes.provider().structure(name).is_none() {
            bail!("Type {} is not defined in the schema registry", name);
        }
        let bundle = classes.bundle(&SchemaType::named(name.as_str()), version);
        classes.log_stats();
        return Ok(bundle);
    }

    let path = args
        .collection
        .as_deref()
        .context("Either --type or --collection is required")?;
    let collection = load_collection(path)?;
    let api = ApiRevision::new(args.api_id.as_str(), args.revision);

    let schema = match args.returnable {
        Returnable::Collection => {
            CollectionSchemaCache::new(ReturnablesCollection::new(Arc::clone(&classes)))
                .get_schema(&api, &collection, version)
        }
        Returnable::Feature => {
            CollectionSchemaCache::new(ReturnablesFeature::new(Arc::clone(&classes)))
                .get_schema(&api, &collection, version)
        }
    };
    classes.log_stats();
    info!(collection = %collection.id, version = %version, "Collection schema built");
    Ok((*schema).clone())
}

/// Serialize a schema document for output.
pub fn render(schema: &JsonSchema, pretty: bool) -> Result<Vec<u8>> {
    let mut bytes = if pretty {
        serde_json::to_vec_pretty(schema)?
    } else {
        serde_json::to_vec(schema)?
    };
    bytes.push(b'\n');
    Ok(bytes)
}
