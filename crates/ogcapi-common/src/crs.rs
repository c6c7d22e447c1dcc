//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Well-known CRS codes supported for feature output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 longitude/latitude (degrees)
    #[default]
    Crs84,
    /// WGS84 longitude/latitude/ellipsoidal height
    Crs84h,
    /// WGS84 Geographic, latitude/longitude axis order
    Epsg4326,
    /// WGS84 Geographic 3D
    Epsg4979,
    /// Web Mercator (meters)
    Epsg3857,
    /// ETRS89 / UTM zone 32N (meters)
    Epsg25832,
    /// ETRS89 / UTM zone 33N (meters)
    Epsg25833,
}

impl CrsCode {
    /// Parse a CRS identifier.
    ///
    /// Accepts formats like:
    /// - "http://www.opengis.net/def/crs/OGC/1.3/CRS84"
    /// - "http://www.opengis.net/def/crs/EPSG/0/25832"
    /// - "EPSG:4326" / "epsg:4326"
    /// - "CRS84"
    pub fn from_crs_string(s: &str) -> Result<Self, CrsParseError> {
        let trimmed = s.trim();
        let normalized = trimmed.to_uppercase();
        let code = normalized
            .strip_prefix("HTTP://WWW.OPENGIS.NET/DEF/CRS/OGC/1.3/")
            .or_else(|| normalized.strip_prefix("HTTP://WWW.OPENGIS.NET/DEF/CRS/OGC/0/"))
            .map(|c| c.to_string())
            .or_else(|| {
                normalized
                    .strip_prefix("HTTP://WWW.OPENGIS.NET/DEF/CRS/EPSG/0/")
                    .map(|c| format!("EPSG:{}", c))
            })
            .unwrap_or_else(|| normalized.clone());

        match code.as_str() {
            "CRS84" | "CRS:84" => Ok(CrsCode::Crs84),
            "CRS84H" => Ok(CrsCode::Crs84h),
            "EPSG:4326" => Ok(CrsCode::Epsg4326),
            "EPSG:4979" => Ok(CrsCode::Epsg4979),
            "EPSG:3857" | "EPSG:900913" => Ok(CrsCode::Epsg3857),
            "EPSG:25832" => Ok(CrsCode::Epsg25832),
            "EPSG:25833" => Ok(CrsCode::Epsg25833),
            _ => Err(CrsParseError::UnsupportedCrs(trimmed.to_string())),
        }
    }

    /// Check if this is a geographic (longitude/latitude) CRS.
    ///
    /// Distances along geometries in a geographic CRS are great-circle
    /// distances, everything else is measured in the plane.
    pub fn is_geographic(&self) -> bool {
        matches!(
            self,
            CrsCode::Crs84 | CrsCode::Crs84h | CrsCode::Epsg4326 | CrsCode::Epsg4979
        )
    }

    /// Whether the CRS has a vertical axis.
    pub fn is_3d(&self) -> bool {
        matches!(self, CrsCode::Crs84h | CrsCode::Epsg4979)
    }

    /// The canonical OGC URI of this CRS.
    pub fn uri(&self) -> &'static str {
        match self {
            CrsCode::Crs84 => "http://www.opengis.net/def/crs/OGC/1.3/CRS84",
            CrsCode::Crs84h => "http://www.opengis.net/def/crs/OGC/0/CRS84h",
            CrsCode::Epsg4326 => "http://www.opengis.net/def/crs/EPSG/0/4326",
            CrsCode::Epsg4979 => "http://www.opengis.net/def/crs/EPSG/0/4979",
            CrsCode::Epsg3857 => "http://www.opengis.net/def/crs/EPSG/0/3857",
            CrsCode::Epsg25832 => "http://www.opengis.net/def/crs/EPSG/0/25832",
            CrsCode::Epsg25833 => "http://www.opengis.net/def/crs/EPSG/0/25833",
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uri())
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_crs_string(&value)
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.uri().to_string()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(
            CrsCode::from_crs_string("http://www.opengis.net/def/crs/OGC/1.3/CRS84").unwrap(),
            CrsCode::Crs84
        );
        assert_eq!(
            CrsCode::from_crs_string("epsg:25832").unwrap(),
            CrsCode::Epsg25832
        );
        assert_eq!(
            CrsCode::from_crs_string("http://www.opengis.net/def/crs/EPSG/0/3857").unwrap(),
            CrsCode::Epsg3857
        );
        assert!(CrsCode::from_crs_string("EPSG:99999").is_err());
    }

    #[test]
    fn test_is_geographic() {
        assert!(CrsCode::Crs84.is_geographic());
        assert!(CrsCode::Epsg4979.is_geographic());
        assert!(!CrsCode::Epsg25832.is_geographic());
        assert!(!CrsCode::Epsg3857.is_geographic());
    }

    #[test]
    fn test_serde_uses_uri() {
        let json = serde_json::to_string(&CrsCode::Epsg25832).unwrap();
        assert_eq!(json, "\"http://www.opengis.net/def/crs/EPSG/0/25832\"");

        let parsed: CrsCode = serde_json::from_str("\"EPSG:4326\"").unwrap();
        assert_eq!(parsed, CrsCode::Epsg4326);
    }
}
