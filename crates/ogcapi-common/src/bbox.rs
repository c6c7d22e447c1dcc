//! Bounding box types and operations.

use serde::{Deserialize, Serialize};

use crate::Coordinate;

/// A geographic or projected bounding box, optionally with a vertical range.
///
/// For geographic CRS (CRS84, EPSG:4326), coordinates are in degrees.
/// For projected CRS (EPSG:3857, EPSG:25832, etc.), coordinates are in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_z: Option<f64>,
}

impl BoundingBox {
    /// Create a new 2D bounding box from corner coordinates.
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            min_z: None,
            max_z: None,
        }
    }

    /// Create a new 3D bounding box.
    pub fn new_3d(min_x: f64, min_y: f64, min_z: f64, max_x: f64, max_y: f64, max_z: f64) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
            min_z: Some(min_z),
            max_z: Some(max_z),
        }
    }

    /// Component-wise min/max over a set of coordinates.
    ///
    /// With `three_d` set the vertical range is included; coordinates without
    /// an elevation contribute `0.0`. Returns `None` for an empty input.
    pub fn from_coordinates<'a>(
        coordinates: impl IntoIterator<Item = &'a Coordinate>,
        three_d: bool,
    ) -> Option<Self> {
        let mut iter = coordinates.into_iter();
        let first = iter.next()?;
        let mut bbox = if three_d {
            let z = first.z_or_zero();
            Self::new_3d(first.x, first.y, z, first.x, first.y, z)
        } else {
            Self::new(first.x, first.y, first.x, first.y)
        };
        for c in iter {
            bbox.expand(c);
        }
        Some(bbox)
    }

    /// Grow the box to include a coordinate.
    pub fn expand(&mut self, c: &Coordinate) {
        self.min_x = self.min_x.min(c.x);
        self.min_y = self.min_y.min(c.y);
        self.max_x = self.max_x.max(c.x);
        self.max_y = self.max_y.max(c.y);
        if let (Some(min_z), Some(max_z), Some(z)) = (self.min_z, self.max_z, c.z) {
            self.min_z = Some(min_z.min(z));
            self.max_z = Some(max_z.max(z));
        }
    }

    pub fn is_3d(&self) -> bool {
        self.min_z.is_some() && self.max_z.is_some()
    }

    /// Parse a `bbox` query parameter: "minx,miny,maxx,maxy" or
    /// "minx,miny,minz,maxx,maxy,maxz".
    pub fn from_bbox_string(s: &str) -> Result<Self, BboxParseError> {
        let parts: Vec<&str> = s.split(',').collect();
        let values = parts
            .iter()
            .map(|p| {
                p.parse::<f64>()
                    .map_err(|_| BboxParseError::InvalidNumber(p.to_string()))
            })
            .collect::<Result<Vec<f64>, _>>();

        match (parts.len(), values) {
            (4, Ok(v)) => Ok(Self::new(v[0], v[1], v[2], v[3])),
            (6, Ok(v)) => Ok(Self::new_3d(v[0], v[1], v[2], v[3], v[4], v[5])),
            (4 | 6, Err(e)) => Err(e),
            _ => Err(BboxParseError::InvalidFormat(s.to_string())),
        }
    }

    /// GeoJSON `bbox` member order: `[minx, miny, (minz,) maxx, maxy (, maxz)]`.
    pub fn to_vec(&self) -> Vec<f64> {
        match (self.min_z, self.max_z) {
            (Some(min_z), Some(max_z)) => vec![
                self.min_x, self.min_y, min_z, self.max_x, self.max_y, max_z,
            ],
            _ => vec![self.min_x, self.min_y, self.max_x, self.max_y],
        }
    }

    /// Width of the bounding box in coordinate units.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height of the bounding box in coordinate units.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Check if a point is contained within this bbox (horizontal only).
    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BboxParseError {
    #[error("Invalid bbox format: {0}. Expected 4 or 6 comma-separated numbers")]
    InvalidFormat(String),

    #[error("Invalid number in bbox: {0}")]
    InvalidNumber(String),
}
