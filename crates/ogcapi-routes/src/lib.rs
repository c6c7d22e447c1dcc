//! OGC API - Routes encoder
//!
//! This crate turns the result of a routing query, a stream of graph edge
//! features in route order, into a single route document. The document is a
//! GeoJSON FeatureCollection with:
//! - a start and an end point
//! - an overview line with totals for length, duration, cost and elevation
//! - one line per segment with its attributes and the turn instruction into
//!   the following segment
//!
//! # Example
//!
//! ```rust
//! use ogcapi_common::Coordinate;
//! use ogcapi_routes::{EncodingContext, FeatureToken, Geometry, RouteEncoder, ValueType};
//!
//! let tokens = vec![
//!     FeatureToken::StreamStart,
//!     FeatureToken::FeatureStart,
//!     FeatureToken::value("cost", "3.5", ValueType::Float),
//!     FeatureToken::Geometry {
//!         path: vec!["geometry".to_string()],
//!         geometry: Geometry::LineString(vec![
//!             Coordinate::xy(7.0, 50.0),
//!             Coordinate::xy(7.001, 50.0),
//!         ]),
//!     },
//!     FeatureToken::FeatureEnd,
//!     FeatureToken::StreamEnd,
//! ];
//!
//! let bytes = RouteEncoder::geojson(EncodingContext::default())
//!     .encode(tokens)
//!     .unwrap();
//! assert!(!bytes.is_empty());
//! ```

pub mod attributes;
pub mod config;
pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod feature;
pub mod format;
pub mod profile;
pub mod route;
pub mod token;

// Re-export commonly used types
pub use config::{ConfigError, EncodingContext, RoutingConfig, RoutingConfigOverride};
pub use decoder::{tokens_from_str, tokens_from_value, DecodeError};
pub use encoder::RouteEncoder;
pub use errors::RouteEncodingError;
pub use feature::{FeatureAssembler, FeatureRecord, PropertyValue};
pub use format::{GeoJsonRouteFormatter, RouteFormatter, RouteSink};
pub use profile::{ElevationGain, ElevationProfile};
pub use route::{ComponentKind, Instruction, Route, RouteComponent, RouteGeometry};
pub use token::{FeatureToken, Geometry, PropertyPath, ValueType};
