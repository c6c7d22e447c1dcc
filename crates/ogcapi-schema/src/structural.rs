//! Structural descriptions of the types schemas are derived from.
//!
//! A [`StructuralSchemaProvider`] answers what fields a named type has. The
//! in-memory [`SchemaRegistry`] is the provider used by the services; it is
//! built once at startup, typically from a JSON or YAML file:
//!
//! ```json
//! {
//!   "types": [
//!     {"name": "RoadClass", "enum": ["motorway", "primary"]},
//!     {"name": "Road", "fields": [
//!       {"name": "id", "type": "string"},
//!       {"name": "class", "type": {"ref": "RoadClass"}},
//!       {"name": "lanes", "type": "optionalInteger"},
//!       {"name": "tags", "type": {"array": "string"}}
//!     ]}
//!   ]
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kinds with a fixed, canonical schema node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveKind {
    String,
    Number,
    Integer,
    Boolean,
    Date,
    DateTime,
    Uri,
    Locale,
    AnyObject,
}

impl PrimitiveKind {
    /// Identifier used when a primitive appears in a derived schema id.
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "String",
            PrimitiveKind::Number => "Number",
            PrimitiveKind::Integer => "Integer",
            PrimitiveKind::Boolean => "Boolean",
            PrimitiveKind::Date => "Date",
            PrimitiveKind::DateTime => "DateTime",
            PrimitiveKind::Uri => "Uri",
            PrimitiveKind::Locale => "Locale",
            PrimitiveKind::AnyObject => "Object",
        }
    }
}

/// Identity of a type handed to the schema cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Primitive(PrimitiveKind),
    Named(String),
    Array(Box<SchemaType>),
}

impl SchemaType {
    pub fn named(name: impl Into<String>) -> Self {
        SchemaType::Named(name.into())
    }

    pub fn array_of(element: SchemaType) -> Self {
        SchemaType::Array(Box::new(element))
    }

    /// Primitives and arrays of primitives carry no identity of their own.
    pub fn is_canonical(&self) -> bool {
        match self {
            SchemaType::Primitive(_) => true,
            SchemaType::Named(_) => false,
            SchemaType::Array(element) => element.is_canonical(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaType::Primitive(kind) => f.write_str(kind.name()),
            SchemaType::Named(name) => f.write_str(name),
            SchemaType::Array(element) => write!(f, "{}[]", element),
        }
    }
}

/// Declared type of a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Optional floating point value without a wrapper type of its own.
    OptionalDouble,
    /// Optional integer value without a wrapper type of its own.
    OptionalInteger,
    Array(Box<FieldType>),
    Ref(String),
    Optional(Box<FieldType>),
    /// A type with no schema mapping; carries the raw type name.
    Unmapped(String),
    #[serde(untagged)]
    Primitive(PrimitiveKind),
}

impl FieldType {
    pub fn reference(name: impl Into<String>) -> Self {
        FieldType::Ref(name.into())
    }

    pub fn array(element: FieldType) -> Self {
        FieldType::Array(Box::new(element))
    }

    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    /// The cache identity of values of this field, if any.
    pub fn schema_type(&self) -> Option<SchemaType> {
        match self {
            FieldType::Primitive(kind) => Some(SchemaType::Primitive(*kind)),
            FieldType::OptionalDouble => Some(SchemaType::Primitive(PrimitiveKind::Number)),
            FieldType::OptionalInteger => Some(SchemaType::Primitive(PrimitiveKind::Integer)),
            FieldType::Array(element) => element.schema_type().map(SchemaType::array_of),
            FieldType::Ref(name) => Some(SchemaType::named(name.clone())),
            FieldType::Optional(inner) => inner.schema_type(),
            FieldType::Unmapped(_) => None,
        }
    }

    /// Whether the type itself makes the field optional.
    pub fn is_optional(&self) -> bool {
        matches!(
            self,
            FieldType::Optional(_) | FieldType::OptionalDouble | FieldType::OptionalInteger
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Explicitly nullable fields are not required.
    #[serde(default)]
    pub nullable: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            nullable: false,
            description: None,
        }
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_required(&self) -> bool {
        !self.nullable && !self.field_type.is_optional()
    }
}

/// Structure of a named type: either fields or enum constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralSchema {
    pub name: String,

    /// Explicit schema identifier, overriding the type name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,

    #[serde(rename = "enum", default, skip_serializing_if = "Vec::is_empty")]
    pub enum_constants: Vec<String>,
}

impl StructuralSchema {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_id: None,
            title: None,
            description: None,
            fields: Vec::new(),
            enum_constants: Vec::new(),
        }
    }

    pub fn enumeration<I, S>(name: impl Into<String>, constants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_constants: constants.into_iter().map(Into::into).collect(),
            ..Self::object(name)
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_schema_id(mut self, id: impl Into<String>) -> Self {
        self.schema_id = Some(id.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_enum(&self) -> bool {
        !self.enum_constants.is_empty()
    }

    /// Identifier of the derived schema document.
    pub fn id(&self) -> &str {
        self.schema_id.as_deref().unwrap_or(&self.name)
    }
}

/// Supplies the structure of named types.
pub trait StructuralSchemaProvider: Send + Sync {
    fn structure(&self, name: &str) -> Option<&StructuralSchema>;
}

/// Errors loading a schema registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Duplicate type definition: {0}")]
    Duplicate(String),
}

#[derive(Debug, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    types: Vec<StructuralSchema>,
}

/// In-memory structural schema provider.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: BTreeMap<String, StructuralSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_type(mut self, schema: StructuralSchema) -> Self {
        self.types.insert(schema.name.clone(), schema);
        self
    }

    /// Add a type; a name can only be registered once.
    pub fn register(&mut self, schema: StructuralSchema) -> Result<(), RegistryError> {
        if self.types.contains_key(&schema.name) {
            return Err(RegistryError::Duplicate(schema.name));
        }
        self.types.insert(schema.name.clone(), schema);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn from_json_str(content: &str) -> Result<Self, RegistryError> {
        let file: RegistryFile = serde_json::from_str(content).map_err(|e| RegistryError::Parse {
            path: "<inline>".to_string(),
            message: e.to_string(),
        })?;
        Self::from_types(file.types)
    }

    /// Load a registry from a `.json`, `.yml` or `.yaml` file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| RegistryError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
        let parsed = if is_json {
            serde_json::from_str::<RegistryFile>(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<RegistryFile>(&content).map_err(|e| e.to_string())
        };
        let file = parsed.map_err(|message| RegistryError::Parse {
            path: path.display().to_string(),
            message,
        })?;
        Self::from_types(file.types)
    }

    fn from_types(types: Vec<StructuralSchema>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for schema in types {
            registry.register(schema)?;
        }
        Ok(registry)
    }
}

impl StructuralSchemaProvider for SchemaRegistry {
    fn structure(&self, name: &str) -> Option<&StructuralSchema> {
        self.types.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_type_from_json() {
        let parse = |s: &str| serde_json::from_str::<FieldType>(s).unwrap();

        assert_eq!(parse(r#""string""#), FieldType::Primitive(PrimitiveKind::String));
        assert_eq!(parse(r#""dateTime""#), FieldType::Primitive(PrimitiveKind::DateTime));
        assert_eq!(parse(r#""optionalDouble""#), FieldType::OptionalDouble);
        assert_eq!(parse(r#"{"ref": "Road"}"#), FieldType::reference("Road"));
        assert_eq!(
            parse(r#"{"array": {"ref": "Link"}}"#),
            FieldType::array(FieldType::reference("Link"))
        );
        assert_eq!(
            parse(r#"{"optional": "uri"}"#),
            FieldType::optional(FieldType::Primitive(PrimitiveKind::Uri))
        );
    }

    #[test]
    fn test_schema_type_of_fields() {
        assert_eq!(
            FieldType::array(FieldType::reference("Link")).schema_type(),
            Some(SchemaType::array_of(SchemaType::named("Link")))
        );
        assert_eq!(
            FieldType::OptionalInteger.schema_type(),
            Some(SchemaType::Primitive(PrimitiveKind::Integer))
        );
        assert_eq!(FieldType::Unmapped("Blob".to_string()).schema_type(), None);
        assert!(SchemaType::array_of(SchemaType::Primitive(PrimitiveKind::String)).is_canonical());
        assert!(!SchemaType::array_of(SchemaType::named("Link")).is_canonical());
    }

    #[test]
    fn test_required_fields() {
        assert!(Field::new("id", FieldType::Primitive(PrimitiveKind::String)).is_required());
        assert!(!Field::new("id", FieldType::Primitive(PrimitiveKind::String))
            .nullable()
            .is_required());
        assert!(!Field::new("lanes", FieldType::OptionalInteger).is_required());
    }

    #[test]
    fn test_registry_rejects_duplicates() {
        let mut registry = SchemaRegistry::new();
        registry.register(StructuralSchema::object("Road")).unwrap();
        assert!(matches!(
            registry.register(StructuralSchema::object("Road")),
            Err(RegistryError::Duplicate(_))
        ));
    }

    #[test]
    fn test_schema_id_override() {
        let schema = StructuralSchema::object("RoadSegmentImpl").with_schema_id("RoadSegment");
        assert_eq!(schema.id(), "RoadSegment");
        assert_eq!(StructuralSchema::object("Road").id(), "Road");
    }
}
