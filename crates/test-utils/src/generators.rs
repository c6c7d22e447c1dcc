//! Generators for synthetic routing data.
//!
//! These generators create predictable, verifiable segment chains that can be
//! used across the test suite.

use serde_json::{json, Value};

use crate::fixtures::{feature_collection, segment_feature};

/// Splits a polyline into consecutive forward edges.
///
/// Each edge covers `per_segment` line pieces (`per_segment + 1` vertices);
/// neighbouring edges share their junction vertex. Node ids start at 1.
///
/// # Example
///
/// ```
/// use test_utils::segment_chain;
///
/// let vertices: Vec<Vec<f64>> = (0..7).map(|i| vec![i as f64, 0.0]).collect();
/// let route = segment_chain(&vertices, 2);
/// assert_eq!(route["features"].as_array().unwrap().len(), 3);
/// ```
pub fn segment_chain(vertices: &[Vec<f64>], per_segment: usize) -> Value {
    let step = per_segment.max(1);
    let mut features = Vec::new();
    let mut start = 0;
    let mut node = 1u64;
    while start + 1 < vertices.len() {
        let end = (start + step).min(vertices.len() - 1);
        let coordinates: Vec<Value> = vertices[start..=end].iter().map(|v| json!(v)).collect();
        features.push(segment_feature(
            node * 100,
            node,
            node + 1,
            node,
            Value::Array(coordinates),
        ));
        node += 1;
        start = end;
    }
    feature_collection(features)
}

/// Vertices along the x axis with elevations alternating around `base`.
///
/// Every odd vertex is `amplitude` above `base`, so the raw profile has
/// `n / 2` climbs of `amplitude` each.
pub fn zigzag_profile(n: usize, step: f64, base: f64, amplitude: f64) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            let z = if i % 2 == 1 { base + amplitude } else { base };
            vec![i as f64 * step, 0.0, z]
        })
        .collect()
}

/// Two 10 m edges: due east, then turning by `angle_deg` (counter-clockwise positive).
pub fn turn_pair(angle_deg: f64) -> Value {
    let angle = angle_deg.to_radians();
    let end = [10.0 + 10.0 * angle.cos(), 10.0 * angle.sin()];
    feature_collection(vec![
        segment_feature(1, 1, 2, 1, json!([[0.0, 0.0], [10.0, 0.0]])),
        segment_feature(2, 2, 3, 2, json!([[10.0, 0.0], end])),
    ])
}
