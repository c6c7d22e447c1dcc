//! Per-collection schemas of the documents an API returns.
//!
//! Unlike class schemas these are not derived from a type structure but
//! assembled from the collection definition: the FeatureCollection wrapper of
//! a collection's items response, and the GeoJSON Feature schema of a single
//! item. Both reuse the class cache for the `Link` definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::ClassSchemaCache;
use crate::schema::JsonSchema;
use crate::structural::{SchemaType, StructuralSchemaProvider};
use crate::version::SchemaVersion;

/// Feature schema used when a collection publishes no schema of its own.
pub const GEOJSON_FEATURE: &str = "https://geojson.org/schema/Feature.json";

const GEOJSON_SCHEMA_BASE: &str = "https://geojson.org/schema";
const COLLECTION_SCHEMA_PATH: &str = "/schemas/collection";
const FEATURE_SCHEMA_PATH: &str = "/schemas/feature";

const LINK: &str = "Link";
const FEATURE_COLLECTION: &str = "FeatureCollection";

/// Stable identity of an API configuration.
///
/// A new revision is issued whenever the configuration is reloaded, so
/// schemas of an outdated configuration are never served.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRevision {
    pub api_id: String,
    pub revision: u64,
}

impl ApiRevision {
    pub fn new(api_id: impl Into<String>, revision: u64) -> Self {
        Self {
            api_id: api_id.into(),
            revision,
        }
    }
}

/// Value type of a collection property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
    Geometry,
}

impl PropertyType {
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            PropertyType::Point
                | PropertyType::MultiPoint
                | PropertyType::LineString
                | PropertyType::MultiLineString
                | PropertyType::Polygon
                | PropertyType::MultiPolygon
                | PropertyType::Geometry
        )
    }

    fn schema(&self) -> JsonSchema {
        match self {
            PropertyType::String => JsonSchema::string(),
            PropertyType::Integer => JsonSchema::integer(),
            PropertyType::Float => JsonSchema::number(),
            PropertyType::Boolean => JsonSchema::of_type("boolean"),
            PropertyType::Date => JsonSchema::string().with_format("date"),
            PropertyType::Datetime => JsonSchema::string().with_format("date-time"),
            geometry => JsonSchema::reference(format!("{}/{}.json", GEOJSON_SCHEMA_BASE, geometry.geojson_type())),
        }
    }

    fn geojson_type(&self) -> &'static str {
        match self {
            PropertyType::Point => "Point",
            PropertyType::MultiPoint => "MultiPoint",
            PropertyType::LineString => "LineString",
            PropertyType::MultiLineString => "MultiLineString",
            PropertyType::Polygon => "Polygon",
            PropertyType::MultiPolygon => "MultiPolygon",
            _ => "Geometry",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,

    #[serde(rename = "type")]
    pub property_type: PropertyType,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, property_type: PropertyType) -> Self {
        Self {
            name: name.into(),
            property_type,
            required: false,
            description: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// The parts of a collection configuration its schemas are built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionDefinition {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// URI at which the schema being built is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_uri: Option<String>,

    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

impl CollectionDefinition {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            schema_uri: None,
            properties: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_schema_uri(mut self, uri: impl Into<String>) -> Self {
        self.schema_uri = Some(uri.into());
        self
    }

    pub fn with_property(mut self, property: PropertyDefinition) -> Self {
        self.properties.push(property);
        self
    }

    /// URI of the feature schema next to a published collection schema.
    pub fn feature_schema_uri(&self) -> String {
        match &self.schema_uri {
            Some(uri) => uri.replace(COLLECTION_SCHEMA_PATH, FEATURE_SCHEMA_PATH),
            None => GEOJSON_FEATURE.to_string(),
        }
    }

    fn title_or_id(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

/// Builds the schema of one kind of returnable document for a collection.
pub trait CollectionSchemaDeriver: Send + Sync {
    fn derive(&self, collection: &CollectionDefinition, version: SchemaVersion) -> JsonSchema;
}

/// Memoizes per-collection schemas of one returnable kind.
pub struct CollectionSchemaCache<D> {
    deriver: D,
    schemas: DashMap<(ApiRevision, String, SchemaVersion), Arc<JsonSchema>>,
}

impl<D: CollectionSchemaDeriver> CollectionSchemaCache<D> {
    pub fn new(deriver: D) -> Self {
        info!("Initializing collection schema cache");
        Self {
            deriver,
            schemas: DashMap::new(),
        }
    }

    pub fn get_schema(
        &self,
        api: &ApiRevision,
        collection: &CollectionDefinition,
        version: SchemaVersion,
    ) -> Arc<JsonSchema> {
        let key = (api.clone(), collection.id.clone(), version);
        let cached = self.schemas.get(&key).map(|entry| Arc::clone(entry.value()));
        if let Some(schema) = cached {
            return schema;
        }
        let derived = self.deriver.derive(collection, version);
        debug!(
            api = %api.api_id,
            revision = api.revision,
            collection = %collection.id,
            "Collection schema derived"
        );
        Arc::clone(self.schemas.entry(key).or_insert(Arc::new(derived)).value())
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Hand-authored schema of the `Link` object.
pub fn link_schema() -> JsonSchema {
    JsonSchema::object()
        .with_title("Link")
        .with_property("href", JsonSchema::string().with_format("uri-reference"), true)
        .with_property("rel", JsonSchema::string(), true)
        .with_property("type", JsonSchema::string(), false)
        .with_property("title", JsonSchema::string(), false)
        .with_property("hreflang", JsonSchema::string(), false)
        .with_property("length", JsonSchema::integer(), false)
}

/// Registers the `Link` definition with the class cache and returns the
/// definitions referenced by the generic FeatureCollection wrapper.
fn wrapper_definitions<P: StructuralSchemaProvider>(
    classes: &ClassSchemaCache<P>,
    version: SchemaVersion,
) -> BTreeMap<String, JsonSchema> {
    let link = SchemaType::named(LINK);
    // replaces a Link derived from the provider, if any
    classes.register_schema(&link, version, link_schema(), &[]);
    classes.register_schema(
        &SchemaType::named(FEATURE_COLLECTION),
        version,
        JsonSchema::object().with_title(FEATURE_COLLECTION),
        &[link],
    );
    classes
        .get_referenced_schemas(&SchemaType::named(FEATURE_COLLECTION), version)
        .into_iter()
        .map(|(id, schema)| (id, (*schema).clone()))
        .collect()
}

fn links(version: SchemaVersion) -> JsonSchema {
    JsonSchema::array(JsonSchema::reference(version.reference(LINK)))
}

fn head(collection: &CollectionDefinition, title: String) -> JsonSchema {
    let mut schema = JsonSchema::object().with_title(title);
    if let Some(uri) = &collection.schema_uri {
        schema = schema.with_id(uri.clone());
    }
    if let Some(description) = &collection.description {
        schema = schema.with_description(description.clone());
    }
    schema
}

/// FeatureCollection schema of a collection's items response.
pub struct ReturnablesCollection<P> {
    classes: Arc<ClassSchemaCache<P>>,
}

impl<P> ReturnablesCollection<P> {
    pub fn new(classes: Arc<ClassSchemaCache<P>>) -> Self {
        Self { classes }
    }
}

impl<P: StructuralSchemaProvider> CollectionSchemaDeriver for ReturnablesCollection<P> {
    fn derive(&self, collection: &CollectionDefinition, version: SchemaVersion) -> JsonSchema {
        let definitions = wrapper_definitions(&self.classes, version);

        head(collection, collection.title_or_id().to_string())
            .with_property("type", JsonSchema::enumeration([FEATURE_COLLECTION]), true)
            .with_property("links", links(version), false)
            .with_property("timeStamp", JsonSchema::string().with_format("date-time"), false)
            .with_property("numberMatched", JsonSchema::integer().with_minimum(0), false)
            .with_property("numberReturned", JsonSchema::integer().with_minimum(0), false)
            .with_property(
                "features",
                JsonSchema::array(JsonSchema::reference(collection.feature_schema_uri())),
                true,
            )
            .with_definitions(version, definitions)
    }
}

/// GeoJSON Feature schema of a single item of a collection.
pub struct ReturnablesFeature<P> {
    classes: Arc<ClassSchemaCache<P>>,
}

impl<P> ReturnablesFeature<P> {
    pub fn new(classes: Arc<ClassSchemaCache<P>>) -> Self {
        Self { classes }
    }
}

impl<P: StructuralSchemaProvider> CollectionSchemaDeriver for ReturnablesFeature<P> {
    fn derive(&self, collection: &CollectionDefinition, version: SchemaVersion) -> JsonSchema {
        let definitions = wrapper_definitions(&self.classes, version);

        let mut properties = JsonSchema::object();
        let mut geometry: Option<&PropertyDefinition> = None;
        for property in &collection.properties {
            if property.property_type.is_geometry() {
                if geometry.is_none() {
                    geometry = Some(property);
                }
                continue;
            }
            let mut schema = property.property_type.schema();
            if let Some(description) = &property.description {
                schema = schema.with_description(description.clone());
            }
            properties = properties.with_property(property.name.clone(), schema, property.required);
        }

        let geometry = match geometry {
            Some(g) if g.required => g.property_type.schema(),
            Some(g) => JsonSchema::one_of(vec![JsonSchema::null(), g.property_type.schema()]),
            None => JsonSchema::null(),
        };

        head(collection, format!("{} (feature)", collection.title_or_id()))
            .with_property("type", JsonSchema::enumeration(["Feature"]), true)
            .with_property(
                "id",
                JsonSchema::one_of(vec![JsonSchema::string(), JsonSchema::integer()]),
                false,
            )
            .with_property("links", links(version), false)
            .with_property("geometry", geometry, true)
            .with_property("properties", properties, true)
            .with_definitions(version, definitions)
    }
}
