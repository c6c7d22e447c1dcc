//! Coordinate positions with an optional elevation.

use serde::{Deserialize, Serialize};

/// A 2D or 3D position.
///
/// Serialized as a GeoJSON position array, `[x, y]` or `[x, y, z]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

impl Coordinate {
    /// Create a 2D coordinate.
    pub fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    /// Create a 3D coordinate.
    pub fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Number of ordinates (2 or 3).
    pub fn dimension(&self) -> usize {
        if self.z.is_some() {
            3
        } else {
            2
        }
    }

    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }

    /// Elevation, `0.0` for 2D positions.
    pub fn z_or_zero(&self) -> f64 {
        self.z.unwrap_or(0.0)
    }

    /// Drop the elevation.
    pub fn to_2d(self) -> Self {
        Self::xy(self.x, self.y)
    }

    /// Build a coordinate from a slice of 2 or 3 ordinates.
    pub fn from_slice(values: &[f64]) -> Result<Self, CoordinateError> {
        match values {
            [x, y] => Ok(Self::xy(*x, *y)),
            [x, y, z] => Ok(Self::xyz(*x, *y, *z)),
            _ => Err(CoordinateError::InvalidDimension(values.len())),
        }
    }
}

impl TryFrom<Vec<f64>> for Coordinate {
    type Error = CoordinateError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_slice(&values)
    }
}

impl From<Coordinate> for Vec<f64> {
    fn from(c: Coordinate) -> Self {
        match c.z {
            Some(z) => vec![c.x, c.y, z],
            None => vec![c.x, c.y],
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoordinateError {
    #[error("A position must have 2 or 3 ordinates, found {0}")]
    InvalidDimension(usize),

    #[error("Mixed coordinate dimensions within one geometry: expected {expected}, found {found}")]
    MixedDimension { expected: usize, found: usize },
}

/// Verify that all coordinates share the dimensionality of the first one.
pub fn check_uniform_dimension(coordinates: &[Coordinate]) -> Result<(), CoordinateError> {
    let Some(first) = coordinates.first() else {
        return Ok(());
    };
    let expected = first.dimension();
    match coordinates.iter().find(|c| c.dimension() != expected) {
        Some(c) => Err(CoordinateError::MixedDimension {
            expected,
            found: c.dimension(),
        }),
        None => Ok(()),
    }
}
