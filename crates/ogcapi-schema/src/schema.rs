//! JSON Schema document model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::structural::PrimitiveKind;
use crate::version::SchemaVersion;

/// A JSON Schema node.
///
/// Only the keywords used by the OGC API schema documents are modelled. An
/// empty node (`{}`) accepts any value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonSchema {
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<JsonSchema>>,

    #[serde(rename = "oneOf", default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<JsonSchema>>,

    #[serde(rename = "$defs", default, skip_serializing_if = "Option::is_none")]
    pub defs: Option<BTreeMap<String, JsonSchema>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definitions: Option<BTreeMap<String, JsonSchema>>,
}

impl JsonSchema {
    /// The permissive schema accepting any value.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_type(type_: &str) -> Self {
        Self {
            type_: Some(type_.to_string()),
            ..Self::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type("string")
    }

    pub fn integer() -> Self {
        Self::of_type("integer")
    }

    pub fn number() -> Self {
        Self::of_type("number")
    }

    pub fn object() -> Self {
        Self::of_type("object")
    }

    pub fn null() -> Self {
        Self::of_type("null")
    }

    /// Canonical node of a primitive kind.
    pub fn primitive(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::String | PrimitiveKind::Locale => Self::string(),
            PrimitiveKind::Number => Self::number(),
            PrimitiveKind::Integer => Self::integer(),
            PrimitiveKind::Boolean => Self::of_type("boolean"),
            PrimitiveKind::Date => Self::string().with_format("date"),
            PrimitiveKind::DateTime => Self::string().with_format("date-time"),
            PrimitiveKind::Uri => Self::string().with_format("uri"),
            PrimitiveKind::AnyObject => Self::object(),
        }
    }

    /// A `$ref` to another document or definition.
    pub fn reference(uri: impl Into<String>) -> Self {
        Self {
            reference: Some(uri.into()),
            ..Self::default()
        }
    }

    pub fn array(items: JsonSchema) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of_type("array")
        }
    }

    /// A closed string enumeration.
    pub fn enumeration<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Self::string()
        }
    }

    pub fn one_of(options: Vec<JsonSchema>) -> Self {
        Self {
            one_of: Some(options),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add a property; required properties are listed in insertion order.
    pub fn with_property(mut self, name: impl Into<String>, schema: JsonSchema, required: bool) -> Self {
        let name = name.into();
        if required {
            self.required.get_or_insert_with(Vec::new).push(name.clone());
        }
        self.properties
            .get_or_insert_with(BTreeMap::new)
            .insert(name, schema);
        self
    }

    /// Embed definitions under the keyword of `version` and set `$schema`.
    pub fn with_definitions(mut self, version: SchemaVersion, definitions: BTreeMap<String, JsonSchema>) -> Self {
        self.schema = Some(version.uri().to_string());
        if !definitions.is_empty() {
            match version {
                SchemaVersion::Draft07 => self.definitions = Some(definitions),
                SchemaVersion::V201909 | SchemaVersion::V202012 => self.defs = Some(definitions),
            }
        }
        self
    }

    /// Whether this node accepts any value.
    pub fn is_any(&self) -> bool {
        *self == Self::default()
    }

    pub fn property(&self, name: &str) -> Option<&JsonSchema> {
        self.properties.as_ref().and_then(|p| p.get(name))
    }

    /// Embedded definitions, regardless of the keyword used.
    pub fn definition(&self, id: &str) -> Option<&JsonSchema> {
        self.defs
            .as_ref()
            .and_then(|d| d.get(id))
            .or_else(|| self.definitions.as_ref().and_then(|d| d.get(id)))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_serializes_empty() {
        assert_eq!(serde_json::to_value(JsonSchema::any()).unwrap(), json!({}));
        assert!(JsonSchema::any().is_any());
    }

    #[test]
    fn test_object_with_properties() {
        let schema = JsonSchema::object()
            .with_property("id", JsonSchema::string(), true)
            .with_property("note", JsonSchema::string(), false)
            .with_property("count", JsonSchema::integer().with_minimum(0), true);

        assert_eq!(
            schema.to_value(),
            json!({
                "type": "object",
                "required": ["id", "count"],
                "properties": {
                    "id": {"type": "string"},
                    "note": {"type": "string"},
                    "count": {"type": "integer", "minimum": 0}
                }
            })
        );
    }

    #[test]
    fn test_definitions_keyword_per_version() {
        let mut defs = BTreeMap::new();
        defs.insert("Link".to_string(), JsonSchema::object());

        let draft07 = JsonSchema::object().with_definitions(SchemaVersion::Draft07, defs.clone());
        let value = draft07.to_value();
        assert_eq!(value["$schema"], "http://json-schema.org/draft-07/schema#");
        assert!(value["definitions"]["Link"].is_object());
        assert!(value.get("$defs").is_none());

        let v2020 = JsonSchema::object().with_definitions(SchemaVersion::V202012, defs);
        assert!(v2020.to_value()["$defs"]["Link"].is_object());
        assert!(v2020.definition("Link").is_some());
    }

    #[test]
    fn test_deserialize_round_trip() {
        let value = json!({"type": "array", "items": {"$ref": "#/$defs/Link"}});
        let schema: JsonSchema = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(schema.items.as_deref(), Some(&JsonSchema::reference("#/$defs/Link")));
        assert_eq!(schema.to_value(), value);
    }
}
