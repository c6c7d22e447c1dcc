//! Distance and direction helpers.

use std::f64::consts::PI;

use crate::Coordinate;

/// Earth radius in meters used for great-circle distances (WGS84 semi-major axis).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Calculate the great-circle distance between two points using the Haversine formula.
///
/// Inputs are in degrees, the result is in meters.
pub fn haversine_distance(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_M * c
}

/// Euclidean distance, including the vertical component when both positions have one.
pub fn planar_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let dz = match (a.z, b.z) {
        (Some(za), Some(zb)) => zb - za,
        _ => 0.0,
    };
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Horizontal distance between two positions, great-circle for geographic coordinates.
pub fn horizontal_distance(a: &Coordinate, b: &Coordinate, geographic: bool) -> f64 {
    if geographic {
        haversine_distance(a.x, a.y, b.x, b.y)
    } else {
        planar_distance(&a.to_2d(), &b.to_2d())
    }
}

/// Direction from `from` to `to` in radians, counter-clockwise from the x axis.
pub fn bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Normalize an angle into (-PI, PI].
pub fn normalize_angle(angle: f64) -> f64 {
    let mut a = angle % (2.0 * PI);
    if a <= -PI {
        a += 2.0 * PI;
    } else if a > PI {
        a -= 2.0 * PI;
    }
    a
}
