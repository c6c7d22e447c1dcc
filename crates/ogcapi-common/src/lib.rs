//! Common types and utilities shared across the ldproxy crates.

pub mod bbox;
pub mod coordinate;
pub mod crs;
pub mod geodesy;
pub mod link;

pub use bbox::BoundingBox;
pub use coordinate::{Coordinate, CoordinateError};
pub use crs::{CrsCode, CrsParseError};
pub use geodesy::{bearing, haversine_distance, normalize_angle, planar_distance, EARTH_RADIUS_M};
pub use link::Link;

/// Media types used in responses.
pub mod media_types {
    /// GeoJSON media type
    pub const GEO_JSON: &str = "application/geo+json";
    /// JSON media type
    pub const JSON: &str = "application/json";
    /// JSON Schema media type
    pub const SCHEMA_JSON: &str = "application/schema+json";
}
