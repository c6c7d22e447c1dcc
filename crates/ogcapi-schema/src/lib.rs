//! JSON Schema derivation for OGC API responses.
//!
//! Two caches live here, both created once per process and shared between
//! request handlers:
//! - [`ClassSchemaCache`] derives schemas from structural type descriptions,
//!   memoized per type and JSON Schema version, and tracks which schemas
//!   reference each other so that self-contained documents can be assembled.
//! - [`CollectionSchemaCache`] holds the per-collection schemas of returned
//!   documents ([`ReturnablesCollection`], [`ReturnablesFeature`]), keyed by
//!   the API configuration revision.
//!
//! # Example
//!
//! ```rust
//! use ogcapi_schema::{
//!     ClassSchemaCache, Field, FieldType, PrimitiveKind, SchemaRegistry, SchemaType,
//!     SchemaVersion, StructuralSchema,
//! };
//!
//! let registry = SchemaRegistry::new().with_type(
//!     StructuralSchema::object("Road")
//!         .with_field(Field::new("name", FieldType::Primitive(PrimitiveKind::String))),
//! );
//! let cache = ClassSchemaCache::new(registry);
//! let schema = cache.get_schema(&SchemaType::named("Road"), SchemaVersion::V202012, None);
//! assert!(schema.property("name").is_some());
//! ```

pub mod cache;
pub mod returnables;
pub mod schema;
pub mod structural;
pub mod version;

// Re-export commonly used types
pub use cache::{ClassSchemaCache, SchemaCacheStats};
pub use returnables::{
    link_schema, ApiRevision, CollectionDefinition, CollectionSchemaCache, CollectionSchemaDeriver,
    PropertyDefinition, PropertyType, ReturnablesCollection, ReturnablesFeature, GEOJSON_FEATURE,
};
pub use schema::JsonSchema;
pub use structural::{
    Field, FieldType, PrimitiveKind, RegistryError, SchemaRegistry, SchemaType, StructuralSchema,
    StructuralSchemaProvider,
};
pub use version::SchemaVersion;
