//! Elevation profile along a route and ascent/descent totals.
//!
//! The profile is a 1D line of `(cumulative distance, elevation)` pairs. It is
//! simplified with Douglas-Peucker before the totals are summed, which
//! removes small bumps caused by noisy elevation data. Totals from a lossy
//! simplification are therefore lower than the raw vertex-to-vertex sums.

use geo::{Coord, LineString, Simplify};
use ogcapi_common::geodesy::{horizontal_distance, planar_distance};
use ogcapi_common::Coordinate;

/// Ascent and descent in meters; both are non-negative.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ElevationGain {
    pub ascent: f64,
    pub descent: f64,
}

impl ElevationGain {
    /// Sum positive and negative deltas of a sequence of elevations.
    pub fn from_elevations(elevations: impl IntoIterator<Item = f64>) -> Self {
        let mut gain = ElevationGain::default();
        let mut previous: Option<f64> = None;
        for z in elevations {
            if let Some(p) = previous {
                gain.add_delta(z - p);
            }
            previous = Some(z);
        }
        gain
    }

    pub fn add_delta(&mut self, delta: f64) {
        if delta > 0.0 {
            self.ascent += delta;
        } else {
            self.descent -= delta;
        }
    }
}

impl std::ops::AddAssign for ElevationGain {
    fn add_assign(&mut self, other: Self) {
        self.ascent += other.ascent;
        self.descent += other.descent;
    }
}

/// `(distance, elevation)` pairs along a line.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationProfile {
    points: Vec<(f64, f64)>,
}

impl ElevationProfile {
    /// Build the profile for a 3D line.
    ///
    /// Distances are great-circle distances for geographic coordinates and
    /// Euclidean 3D distances otherwise. Positions without an elevation add
    /// to the distance but not to the profile.
    pub fn from_line(coordinates: &[Coordinate], geographic: bool) -> Self {
        let mut points = Vec::with_capacity(coordinates.len());
        let mut distance = 0.0;
        let mut previous: Option<&Coordinate> = None;
        for c in coordinates {
            if let Some(p) = previous {
                distance += if geographic {
                    horizontal_distance(p, c, true)
                } else {
                    planar_distance(p, c)
                };
            }
            if let Some(z) = c.z {
                points.push((distance, z));
            }
            previous = Some(c);
        }
        Self { points }
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Total horizontal length covered by the profile.
    pub fn length(&self) -> f64 {
        self.points.last().map(|(d, _)| *d).unwrap_or(0.0)
    }

    /// Douglas-Peucker simplification with the given tolerance in meters.
    pub fn simplify(&self, tolerance: f64) -> Self {
        if self.points.len() < 3 {
            return self.clone();
        }
        let line: LineString<f64> = self
            .points
            .iter()
            .map(|&(x, y)| Coord { x, y })
            .collect();
        let simplified = line.simplify(tolerance);
        Self {
            points: simplified.coords().map(|c| (c.x, c.y)).collect(),
        }
    }

    /// Ascent and descent of this profile.
    pub fn gain(&self) -> ElevationGain {
        ElevationGain::from_elevations(self.points.iter().map(|(_, z)| *z))
    }
}

/// Ascent/descent of a route after simplifying its elevation profile.
pub fn simplified_gain(coordinates: &[Coordinate], geographic: bool, tolerance: f64) -> ElevationGain {
    ElevationProfile::from_line(coordinates, geographic)
        .simplify(tolerance)
        .gain()
}
