//! Routing configuration loading and types.

use std::path::Path;

use ogcapi_common::{CrsCode, Link};
use serde::{Deserialize, Serialize};

/// Settings for the route encoder, loaded from YAML.
///
/// Every field has a default so partial files are valid. A more specific
/// configuration (e.g. per collection) is layered over a base one with
/// [`RoutingConfig::merge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfig {
    /// Default route name when the request does not provide one.
    pub name: String,

    /// CRS of the segment geometries.
    pub crs: CrsCode,

    /// Douglas-Peucker tolerance in meters for the elevation profile.
    ///
    /// When unset, ascent and descent are summed over every vertex.
    pub elevation_profile_simplification_tolerance: Option<f64>,

    /// Number of decimal places for output coordinates.
    pub coordinate_precision: Option<u32>,

    /// Emit the route bounding box on the feature collection.
    pub include_bbox: bool,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            name: "Route".to_string(),
            crs: CrsCode::Crs84,
            elevation_profile_simplification_tolerance: None,
            coordinate_precision: None,
            include_bbox: true,
        }
    }
}

/// A partially specified configuration used as an override layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoutingConfigOverride {
    pub name: Option<String>,
    pub crs: Option<CrsCode>,
    pub elevation_profile_simplification_tolerance: Option<f64>,
    pub coordinate_precision: Option<u32>,
    pub include_bbox: Option<bool>,
}

impl RoutingConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: RoutingConfig =
            serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Apply an override layer; every value set in `other` wins.
    pub fn merge(mut self, other: RoutingConfigOverride) -> Self {
        if let Some(name) = other.name {
            self.name = name;
        }
        if let Some(crs) = other.crs {
            self.crs = crs;
        }
        if other.elevation_profile_simplification_tolerance.is_some() {
            self.elevation_profile_simplification_tolerance =
                other.elevation_profile_simplification_tolerance;
        }
        if other.coordinate_precision.is_some() {
            self.coordinate_precision = other.coordinate_precision;
        }
        if let Some(include_bbox) = other.include_bbox {
            self.include_bbox = include_bbox;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(tolerance) = self.elevation_profile_simplification_tolerance {
            if !tolerance.is_finite() || tolerance < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "elevationProfileSimplificationTolerance must be a non-negative number, got {}",
                    tolerance
                )));
            }
        }
        Ok(())
    }

    /// Build the per-request encoding context.
    pub fn encoding_context(&self, name: Option<&str>, links: Vec<Link>) -> EncodingContext {
        EncodingContext {
            name: name.unwrap_or(&self.name).to_string(),
            crs: self.crs,
            simplification_tolerance: self.elevation_profile_simplification_tolerance,
            coordinate_precision: self.coordinate_precision,
            include_bbox: self.include_bbox,
            links,
        }
    }
}

/// Request-scoped settings handed to the encoder and the formatter.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodingContext {
    pub name: String,
    pub crs: CrsCode,
    pub simplification_tolerance: Option<f64>,
    pub coordinate_precision: Option<u32>,
    pub include_bbox: bool,
    pub links: Vec<Link>,
}

impl Default for EncodingContext {
    fn default() -> Self {
        RoutingConfig::default().encoding_context(None, Vec::new())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Invalid routing configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: RoutingConfig =
            serde_yaml::from_str("elevationProfileSimplificationTolerance: 5.0\n").unwrap();
        assert_eq!(config.elevation_profile_simplification_tolerance, Some(5.0));
        assert_eq!(config.name, "Route");
        assert_eq!(config.crs, CrsCode::Crs84);
        assert!(config.include_bbox);
    }

    #[test]
    fn test_merge_override_wins() {
        let base = RoutingConfig {
            coordinate_precision: Some(7),
            ..RoutingConfig::default()
        };
        let merged = base.merge(RoutingConfigOverride {
            crs: Some(CrsCode::Epsg25832),
            include_bbox: Some(false),
            ..RoutingConfigOverride::default()
        });

        assert_eq!(merged.crs, CrsCode::Epsg25832);
        assert!(!merged.include_bbox);
        // Unset override values keep the base value
        assert_eq!(merged.coordinate_precision, Some(7));
        assert_eq!(merged.name, "Route");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name: Bike route").unwrap();
        writeln!(file, "crs: EPSG:25832").unwrap();
        writeln!(file, "coordinatePrecision: 2").unwrap();

        let config = RoutingConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.name, "Bike route");
        assert_eq!(config.crs, CrsCode::Epsg25832);
        assert_eq!(config.coordinate_precision, Some(2));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "elevationProfileSimplificationTolerance: -1").unwrap();

        let result = RoutingConfig::load_from_file(file.path());
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_encoding_context_name_override() {
        let config = RoutingConfig::default();
        assert_eq!(config.encoding_context(Some("To work"), vec![]).name, "To work");
        assert_eq!(config.encoding_context(None, vec![]).name, "Route");
    }
}
