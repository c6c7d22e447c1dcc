//! Assembly of feature records from the token stream.

use tracing::debug;

use crate::errors::RouteEncodingError;
use crate::token::{FeatureToken, Geometry, PropertyPath, ValueType};

/// A property value as delivered by the feature source.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyValue {
    pub value: Option<String>,
    pub value_type: ValueType,
}

/// One complete feature: flattened properties plus its primary geometry.
///
/// Nested property paths are flattened with `.` as separator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureRecord {
    properties: Vec<(String, PropertyValue)>,
    geometry: Option<Geometry>,
}

impl FeatureRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a property value (builder pattern).
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<String>,
        value_type: ValueType,
    ) -> Self {
        self.insert(
            name.into(),
            PropertyValue {
                value: Some(value.into()),
                value_type,
            },
        );
        self
    }

    /// Set the geometry (builder pattern).
    pub fn with_geometry(mut self, geometry: Geometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    fn insert(&mut self, name: String, value: PropertyValue) {
        match self.properties.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.properties.push((name, value)),
        }
    }

    /// Look up a property by its flattened name.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The raw text of a property, if present and not null.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(|p| p.value.as_deref())
    }

    /// All properties in arrival order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        self.geometry.as_ref()
    }
}

/// Collects feature-level tokens into [`FeatureRecord`]s.
#[derive(Debug, Default)]
pub struct FeatureAssembler {
    current: Option<FeatureRecord>,
    open_objects: Vec<PropertyPath>,
}

impl FeatureAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a feature is currently being assembled.
    pub fn in_feature(&self) -> bool {
        self.current.is_some()
    }

    /// Feed one feature-level token; returns the record once the feature ends.
    pub fn push(
        &mut self,
        token: FeatureToken,
    ) -> Result<Option<FeatureRecord>, RouteEncodingError> {
        let kind = token.kind();
        let in_feature = self.current.is_some();
        match token {
            FeatureToken::FeatureStart if !in_feature => {
                self.current = Some(FeatureRecord::new());
                self.open_objects.clear();
                Ok(None)
            }
            FeatureToken::FeatureEnd if in_feature => {
                if !self.open_objects.is_empty() {
                    debug!(
                        unclosed = self.open_objects.len(),
                        "Feature ended with unclosed nested objects"
                    );
                }
                Ok(self.current.take())
            }
            FeatureToken::ObjectStart { path } if in_feature => {
                self.open_objects.push(path);
                Ok(None)
            }
            FeatureToken::ObjectEnd { path } if in_feature => {
                if self.open_objects.last() == Some(&path) {
                    self.open_objects.pop();
                } else {
                    debug!(path = %path.join("."), "Unbalanced object end ignored");
                }
                Ok(None)
            }
            FeatureToken::Value {
                path,
                value,
                value_type,
            } => match self.current.as_mut() {
                Some(feature) => {
                    feature.insert(path.join("."), PropertyValue { value, value_type });
                    Ok(None)
                }
                None => Err(unexpected(kind, in_feature)),
            },
            FeatureToken::Geometry { path, geometry } => match self.current.as_mut() {
                Some(feature) if feature.geometry.is_none() => {
                    feature.geometry = Some(geometry);
                    Ok(None)
                }
                Some(_) => {
                    debug!(path = %path.join("."), "Secondary geometry ignored");
                    Ok(None)
                }
                None => Err(unexpected(kind, in_feature)),
            },
            _ => Err(unexpected(kind, in_feature)),
        }
    }
}

fn unexpected(token: &'static str, in_feature: bool) -> RouteEncodingError {
    RouteEncodingError::UnexpectedToken {
        token,
        state: if in_feature {
            "InFeature"
        } else {
            "BetweenFeatures"
        },
    }
}
