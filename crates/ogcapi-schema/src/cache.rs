//! Memoizing JSON Schema derivation with dependency tracking.
//!
//! Schemas are derived from structural type descriptions once per
//! `(type, version)` and kept for the lifetime of the cache. Whenever a
//! derivation refers to another named type, the referring document only
//! carries a `$ref` and an edge is recorded in the dependency graph. Response
//! formatting later collects the transitive closure of a type with
//! [`ClassSchemaCache::get_referenced_schemas`] to embed the definitions.
//!
//! ## Concurrency
//!
//! The cache is shared by all request handlers. Documents are inserted with
//! an atomic first-writer-wins `entry` on the memo map, and no map guard is
//! held while a derivation runs, so a derivation may freely recurse into the
//! cache. Two threads racing on the same type may both derive it, but only
//! the first inserted document is ever returned.
//!
//! ## Registered documents
//!
//! A document injected with [`ClassSchemaCache::register_schema`] replaces a
//! derived one for the same type, whatever order the two happen in. Later
//! registrations for the type are ignored.
//!
//! ## Cycles
//!
//! Each top-level call tracks the types currently being derived. Reaching one
//! of them again only produces a `$ref`, so self-referencing and mutually
//! recursive types terminate.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info};

use crate::schema::JsonSchema;
use crate::structural::{FieldType, SchemaType, StructuralSchemaProvider};
use crate::version::SchemaVersion;

type CacheKey = (SchemaType, SchemaVersion);

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub derivations: u64,
    pub entries: usize,
}

impl SchemaCacheStats {
    /// Share of lookups answered from the memo (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

struct CachedSchema {
    document: Arc<JsonSchema>,
    registered: bool,
}

/// Schema cache for types described by a [`StructuralSchemaProvider`].
pub struct ClassSchemaCache<P> {
    provider: P,
    schemas: DashMap<CacheKey, CachedSchema>,
    dependencies: DashMap<CacheKey, HashSet<SchemaType>>,
    hits: AtomicU64,
    misses: AtomicU64,
    derivations: AtomicU64,
}

impl<P: StructuralSchemaProvider> ClassSchemaCache<P> {
    pub fn new(provider: P) -> Self {
        info!("Initializing class schema cache");
        Self {
            provider,
            schemas: DashMap::new(),
            dependencies: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            derivations: AtomicU64::new(0),
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Schema of `schema_type`.
    ///
    /// Primitives return their canonical node. For other types the derived
    /// document is returned, or, when `referencing` is given, a `$ref` to it
    /// after recording the edge `referencing -> schema_type`.
    ///
    /// Two threads missing the same type at the same time may both derive
    /// it. The first stored document is the one both receive, and derivation
    /// has no side effects besides cache entries and edges, so the extra work
    /// is the only cost. There is no per-type lock: mutually recursive types
    /// derived from both ends at once would deadlock on it.
    pub fn get_schema(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
        referencing: Option<&SchemaType>,
    ) -> Arc<JsonSchema> {
        let mut in_progress = Vec::new();
        self.resolve(schema_type, version, referencing, &mut in_progress)
    }

    /// Inject a hand-built document for `schema_type`.
    ///
    /// A registered document takes precedence over a derived one, even if the
    /// type was derived earlier. The first registration for a type wins; the
    /// document that is kept is returned. Edges to `referenced` are added to
    /// any recorded before, so referenced schemas never shrink.
    pub fn register_schema(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
        document: JsonSchema,
        referenced: &[SchemaType],
    ) -> Arc<JsonSchema> {
        for target in referenced {
            self.record_dependency(schema_type, target, version);
        }
        let stored = match self.schemas.entry((schema_type.clone(), version)) {
            Entry::Occupied(entry) if entry.get().registered => Arc::clone(&entry.get().document),
            Entry::Occupied(mut entry) => {
                debug!(schema = %schema_type, version = %version, "Derived schema replaced by registration");
                let document = Arc::new(document);
                entry.insert(CachedSchema {
                    document: Arc::clone(&document),
                    registered: true,
                });
                document
            }
            Entry::Vacant(entry) => {
                let document = Arc::new(document);
                entry.insert(CachedSchema {
                    document: Arc::clone(&document),
                    registered: true,
                });
                document
            }
        };
        debug!(schema = %schema_type, version = %version, "Schema registered");
        stored
    }

    /// Every schema transitively referenced by `schema_type`, keyed by id.
    ///
    /// The type itself is excluded. Referenced types without a document yet
    /// are derived now; types that are neither registered nor known to the
    /// provider are skipped.
    pub fn get_referenced_schemas(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
    ) -> BTreeMap<String, Arc<JsonSchema>> {
        self.collect_referenced(schema_type, version).0
    }

    /// A self-contained document for `schema_type` with `$schema` set and
    /// all referenced schemas embedded as definitions.
    pub fn bundle(&self, schema_type: &SchemaType, version: SchemaVersion) -> JsonSchema {
        let root = self.get_schema(schema_type, version, None);
        let (referenced, cyclic) = self.collect_referenced(schema_type, version);

        let mut definitions: BTreeMap<String, JsonSchema> = referenced
            .into_iter()
            .map(|(id, schema)| (id, (*schema).clone()))
            .collect();
        if cyclic {
            definitions.insert(self.schema_id(schema_type), (*root).clone());
        }

        (*root).clone().with_definitions(version, definitions)
    }

    /// Identifier of the document derived for `schema_type`.
    pub fn schema_id(&self, schema_type: &SchemaType) -> String {
        match schema_type {
            SchemaType::Primitive(kind) => kind.name().to_string(),
            SchemaType::Named(name) => self
                .provider
                .structure(name)
                .map(|s| s.id().to_string())
                .unwrap_or_else(|| name.clone()),
            SchemaType::Array(element) => format!("{}Array", self.schema_id(element)),
        }
    }

    /// Types directly referenced by `schema_type`.
    pub fn dependencies(&self, schema_type: &SchemaType, version: SchemaVersion) -> Vec<SchemaType> {
        self.dependencies
            .get(&(schema_type.clone(), version))
            .map(|targets| targets.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, schema_type: &SchemaType, version: SchemaVersion) -> bool {
        self.schemas.contains_key(&(schema_type.clone(), version))
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn stats(&self) -> SchemaCacheStats {
        SchemaCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            derivations: self.derivations.load(Ordering::Relaxed),
            entries: self.schemas.len(),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            derivations = stats.derivations,
            entries = stats.entries,
            hit_rate = stats.hit_rate(),
            "Class schema cache statistics"
        );
    }

    fn resolve(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
        referencing: Option<&SchemaType>,
        in_progress: &mut Vec<SchemaType>,
    ) -> Arc<JsonSchema> {
        if schema_type.is_canonical() {
            return Arc::new(self.derive(schema_type, version, in_progress));
        }
        match referencing {
            Some(owner) => {
                self.record_dependency(owner, schema_type, version);
                if !in_progress.contains(schema_type) {
                    self.materialize(schema_type, version, in_progress);
                }
                Arc::new(JsonSchema::reference(version.reference(&self.schema_id(schema_type))))
            }
            None => self.materialize(schema_type, version, in_progress),
        }
    }

    fn materialize(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
        in_progress: &mut Vec<SchemaType>,
    ) -> Arc<JsonSchema> {
        let key = (schema_type.clone(), version);
        // The read guard must be gone before deriving, which may insert.
        let cached = self.schemas.get(&key).map(|entry| Arc::clone(&entry.document));
        if let Some(schema) = cached {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return schema;
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        in_progress.push(schema_type.clone());
        let derived = self.derive(schema_type, version, in_progress);
        in_progress.pop();
        self.derivations.fetch_add(1, Ordering::Relaxed);
        debug!(schema = %schema_type, version = %version, "Schema derived");

        let entry = self.schemas.entry(key).or_insert_with(|| CachedSchema {
            document: Arc::new(derived),
            registered: false,
        });
        Arc::clone(&entry.document)
    }

    fn derive(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
        in_progress: &mut Vec<SchemaType>,
    ) -> JsonSchema {
        match schema_type {
            SchemaType::Primitive(kind) => JsonSchema::primitive(*kind),
            SchemaType::Array(element) => {
                let items = self.resolve(element, version, Some(schema_type), in_progress);
                JsonSchema::array((*items).clone())
            }
            SchemaType::Named(name) => {
                let Some(structure) = self.provider.structure(name) else {
                    debug!(schema = %name, "Unknown type, using permissive schema");
                    return JsonSchema::any();
                };

                let mut schema = if structure.is_enum() {
                    JsonSchema::enumeration(structure.enum_constants.iter().cloned())
                } else {
                    let mut object = JsonSchema::object();
                    for field in &structure.fields {
                        let mut property =
                            self.field_schema(&field.field_type, version, schema_type, in_progress);
                        if let Some(description) = &field.description {
                            property = property.with_description(description.clone());
                        }
                        object = object.with_property(field.name.clone(), property, field.is_required());
                    }
                    object
                };
                if let Some(title) = &structure.title {
                    schema = schema.with_title(title.clone());
                }
                if let Some(description) = &structure.description {
                    schema = schema.with_description(description.clone());
                }
                schema
            }
        }
    }

    fn field_schema(
        &self,
        field_type: &FieldType,
        version: SchemaVersion,
        owner: &SchemaType,
        in_progress: &mut Vec<SchemaType>,
    ) -> JsonSchema {
        match field_type.schema_type() {
            Some(target) => (*self.resolve(&target, version, Some(owner), in_progress)).clone(),
            None => {
                debug!(owner = %owner, field_type = ?field_type, "Unmapped field type, using permissive schema");
                match field_type {
                    FieldType::Array(_) => JsonSchema::array(JsonSchema::any()),
                    _ => JsonSchema::any(),
                }
            }
        }
    }

    fn record_dependency(&self, from: &SchemaType, to: &SchemaType, version: SchemaVersion) {
        self.dependencies
            .entry((from.clone(), version))
            .or_default()
            .insert(to.clone());
    }

    /// Whether a document exists or can be derived for `schema_type`.
    fn is_resolvable(&self, schema_type: &SchemaType, version: SchemaVersion) -> bool {
        if self.contains(schema_type, version) {
            return true;
        }
        match schema_type {
            SchemaType::Primitive(_) => false,
            SchemaType::Named(name) => self.provider.structure(name).is_some(),
            SchemaType::Array(element) => {
                element.is_canonical() || self.is_resolvable(element, version)
            }
        }
    }

    /// Breadth-first walk over the dependency graph. Also reports whether
    /// the start type is reachable from itself.
    fn collect_referenced(
        &self,
        schema_type: &SchemaType,
        version: SchemaVersion,
    ) -> (BTreeMap<String, Arc<JsonSchema>>, bool) {
        if self.is_resolvable(schema_type, version) {
            // derives the start type and records its outgoing edges
            self.get_schema(schema_type, version, None);
        }

        let mut result = BTreeMap::new();
        let mut cyclic = false;
        let mut visited: HashSet<SchemaType> = HashSet::new();
        let mut queue: VecDeque<SchemaType> = VecDeque::new();
        visited.insert(schema_type.clone());
        queue.extend(self.dependencies(schema_type, version));

        while let Some(current) = queue.pop_front() {
            if current == *schema_type {
                cyclic = true;
                continue;
            }
            if !visited.insert(current.clone()) {
                continue;
            }
            if !self.is_resolvable(&current, version) {
                debug!(schema = %current, "Referenced schema cannot be resolved, skipped");
                continue;
            }
            let document = self.get_schema(&current, version, None);
            result.insert(self.schema_id(&current), document);
            queue.extend(self.dependencies(&current, version));
        }

        (result, cyclic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structural::{Field, PrimitiveKind, SchemaRegistry, StructuralSchema};

    fn string() -> FieldType {
        FieldType::Primitive(PrimitiveKind::String)
    }

    fn registry() -> SchemaRegistry {
        SchemaRegistry::new()
            .with_type(
                StructuralSchema::object("Link")
                    .with_field(Field::new("href", FieldType::Primitive(PrimitiveKind::Uri)))
                    .with_field(Field::new("rel", string()))
                    .with_field(Field::new("title", FieldType::optional(string()))),
            )
            .with_type(StructuralSchema::enumeration(
                "Surface",
                ["paved", "gravel", "unpaved"],
            ))
            .with_type(
                StructuralSchema::object("Road")
                    .with_title("Road")
                    .with_field(Field::new("id", string()))
                    .with_field(Field::new("surface", FieldType::reference("Surface")))
                    .with_field(Field::new("lanes", FieldType::OptionalInteger))
                    .with_field(Field::new("width", FieldType::OptionalDouble))
                    .with_field(Field::new("note", string()).nullable())
                    .with_field(Field::new("tags", FieldType::array(string())))
                    .with_field(Field::new("links", FieldType::array(FieldType::reference("Link"))))
                    .with_field(Field::new("blob", FieldType::Unmapped("Geometry".to_string())))
                    .with_field(Field::new("next", FieldType::reference("Road")).nullable()),
            )
            .with_type(
                StructuralSchema::object("Junction")
                    .with_schema_id("Node")
                    .with_field(Field::new("exit", FieldType::reference("Exit"))),
            )
            .with_type(
                StructuralSchema::object("Exit")
                    .with_field(Field::new("junction", FieldType::reference("Junction"))),
            )
    }

    fn cache() -> ClassSchemaCache<SchemaRegistry> {
        ClassSchemaCache::new(registry())
    }

    fn road() -> SchemaType {
        SchemaType::named("Road")
    }

    const V: SchemaVersion = SchemaVersion::V202012;

    #[test]
    fn test_primitives_are_not_cached() {
        let cache = cache();
        let schema = cache.get_schema(&SchemaType::Primitive(PrimitiveKind::DateTime), V, None);
        assert_eq!(*schema, JsonSchema::string().with_format("date-time"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_derivation_is_memoized() {
        let cache = cache();
        let first = cache.get_schema(&road(), V, None);
        let second = cache.get_schema(&road(), V, None);
        assert!(Arc::ptr_eq(&first, &second));

        let stats = cache.stats();
        assert!(stats.hits >= 1);
        assert!(stats.hit_rate() > 0.0);
        // Road, Surface, LinkArray, Link
        assert_eq!(stats.derivations, 4);
        assert_eq!(stats.entries, 4);
    }

    #[test]
    fn test_object_derivation() {
        let cache = cache();
        let road = cache.get_schema(&road(), V, None);

        assert_eq!(road.title.as_deref(), Some("Road"));
        assert_eq!(
            road.required.clone().unwrap_or_default(),
            vec!["id", "surface", "tags", "links", "blob"]
        );
        assert_eq!(road.property("surface"), Some(&JsonSchema::reference("#/$defs/Surface")));
        assert_eq!(road.property("lanes"), Some(&JsonSchema::integer()));
        assert_eq!(road.property("width"), Some(&JsonSchema::number()));
        assert_eq!(road.property("tags"), Some(&JsonSchema::array(JsonSchema::string())));
        assert_eq!(road.property("links"), Some(&JsonSchema::reference("#/$defs/LinkArray")));
        assert!(road.property("blob").map(JsonSchema::is_any).unwrap_or(false));
    }

    #[test]
    fn test_enum_derivation() {
        let cache = cache();
        let surface = cache.get_schema(&SchemaType::named("Surface"), V, None);
        assert_eq!(*surface, JsonSchema::enumeration(["paved", "gravel", "unpaved"]));
    }

    #[test]
    fn test_array_schema_id_and_items() {
        let cache = cache();
        let links = SchemaType::array_of(SchemaType::named("Link"));
        assert_eq!(cache.schema_id(&links), "LinkArray");

        let schema = cache.get_schema(&links, V, None);
        assert_eq!(*schema, JsonSchema::array(JsonSchema::reference("#/$defs/Link")));
    }

    #[test]
    fn test_referencing_returns_ref_and_records_edge() {
        let cache = cache();
        let owner = SchemaType::named("Route");
        let schema = cache.get_schema(&SchemaType::named("Link"), SchemaVersion::Draft07, Some(&owner));

        assert_eq!(*schema, JsonSchema::reference("#/definitions/Link"));
        assert_eq!(cache.dependencies(&owner, SchemaVersion::Draft07), vec![SchemaType::named("Link")]);
        assert!(cache.contains(&SchemaType::named("Link"), SchemaVersion::Draft07));
    }

    #[test]
    fn test_self_reference_is_a_ref_cycle() {
        let cache = cache();
        let road = cache.get_schema(&road(), V, None);
        assert_eq!(road.property("next"), Some(&JsonSchema::reference("#/$defs/Road")));

        let referenced = cache.get_referenced_schemas(&SchemaType::named("Road"), V);
        assert!(!referenced.contains_key("Road"));

        let bundle = cache.bundle(&SchemaType::named("Road"), V);
        assert!(bundle.definition("Road").is_some());
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let cache = cache();
        let junction = cache.get_schema(&SchemaType::named("Junction"), V, None);
        assert_eq!(junction.property("exit"), Some(&JsonSchema::reference("#/$defs/Exit")));

        let exit = cache.get_schema(&SchemaType::named("Exit"), V, None);
        // explicit schema id of Junction
        assert_eq!(exit.property("junction"), Some(&JsonSchema::reference("#/$defs/Node")));

        let referenced = cache.get_referenced_schemas(&SchemaType::named("Junction"), V);
        assert_eq!(referenced.keys().map(String::as_str).collect::<Vec<_>>(), vec!["Exit"]);
    }

    #[test]
    fn test_referenced_schemas_closure() {
        let cache = cache();
        let referenced = cache.get_referenced_schemas(&road(), V);
        assert_eq!(
            referenced.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Link", "LinkArray", "Surface"]
        );
    }

    #[test]
    fn test_referenced_schemas_never_shrink() {
        let cache = cache();
        let owner = SchemaType::named("Collection");
        assert!(cache.get_referenced_schemas(&owner, V).is_empty());

        cache.register_schema(&owner, V, JsonSchema::object(), &[SchemaType::named("Surface")]);
        let before = cache.get_referenced_schemas(&owner, V);
        assert_eq!(before.len(), 1);

        cache.get_schema(&road(), V, Some(&owner));
        let after = cache.get_referenced_schemas(&owner, V);
        for id in before.keys() {
            assert!(after.contains_key(id));
        }
        assert!(after.contains_key("Road"));
        assert!(after.contains_key("Link"));
    }

    #[test]
    fn test_register_schema_first_wins() {
        let cache = cache();
        let link = SchemaType::named("Link");
        let custom = JsonSchema::object().with_title("Hand-built link");

        let registered = cache.register_schema(&link, V, custom.clone(), &[]);
        assert_eq!(*registered, custom);
        assert_eq!(*cache.get_schema(&link, V, None), custom);

        let again = cache.register_schema(&link, V, JsonSchema::any(), &[]);
        assert!(Arc::ptr_eq(&registered, &again));
    }

    #[test]
    fn test_registration_replaces_derived_schema() {
        let cache = cache();
        let link = SchemaType::named("Link");
        let derived = cache.get_schema(&link, V, None);
        assert!(derived.property("href").is_some());

        let custom = JsonSchema::object().with_title("Hand-built link");
        let registered = cache.register_schema(&link, V, custom.clone(), &[]);
        assert_eq!(*registered, custom);
        assert_eq!(*cache.get_schema(&link, V, None), custom);
        assert_eq!(*cache.get_referenced_schemas(&road(), V)["Link"], custom);
        assert_eq!(cache.stats().entries, 4);
    }

    #[test]
    fn test_repeated_lookups_derive_once() {
        let cache = cache();
        cache.get_schema(&road(), V, None);
        let derivations = cache.stats().derivations;

        for _ in 0..3 {
            cache.get_schema(&road(), V, None);
            cache.get_referenced_schemas(&road(), V);
            cache.bundle(&road(), V);
        }
        assert_eq!(cache.stats().derivations, derivations);
    }

    #[test]
    fn test_unknown_types_degrade() {
        let cache = cache();
        let owner = SchemaType::named("Wrapper");
        let unknown = SchemaType::named("Unknown");

        assert!(cache.get_schema(&unknown, V, None).is_any());
        // known to nobody: skipped from the referenced schemas
        let fresh = ClassSchemaCache::new(registry());
        fresh.register_schema(&owner, V, JsonSchema::object(), &[unknown.clone()]);
        assert!(fresh.get_referenced_schemas(&owner, V).is_empty());
    }

    #[test]
    fn test_versions_are_cached_separately() {
        let cache = cache();
        let a = cache.get_schema(&road(), SchemaVersion::Draft07, None);
        let b = cache.get_schema(&road(), SchemaVersion::V202012, None);
        assert_eq!(a.property("surface"), Some(&JsonSchema::reference("#/definitions/Surface")));
        assert_eq!(b.property("surface"), Some(&JsonSchema::reference("#/$defs/Surface")));
    }

    #[test]
    fn test_bundle_embeds_definitions() {
        let cache = cache();
        let bundle = cache.bundle(&road(), SchemaVersion::Draft07);
        let value = bundle.to_value();

        assert_eq!(value["$schema"], "http://json-schema.org/draft-07/schema#");
        assert_eq!(value["definitions"]["LinkArray"]["items"]["$ref"], "#/definitions/Link");
        assert_eq!(value["definitions"]["Surface"]["enum"][0], "paved");
        assert_eq!(value["definitions"]["Link"]["properties"]["href"]["format"], "uri");
    }
}
