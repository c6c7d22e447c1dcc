//! Common test fixtures for ldproxy tests.
//!
//! Routing graph edges are delivered by the feature provider with their
//! geometry in graph order (source to target). The `node` attribute names the
//! node at which the route enters the edge.

use serde_json::{json, Value};

/// A routing graph edge feature.
///
/// `coordinates` is a GeoJSON position array in source to target order.
pub fn segment_feature(edge: u64, source: u64, target: u64, node: u64, coordinates: Value) -> Value {
    json!({
        "type": "Feature",
        "properties": {
            "edge": edge,
            "source": source,
            "target": target,
            "node": node
        },
        "geometry": {
            "type": "LineString",
            "coordinates": coordinates
        }
    })
}

/// Add or replace properties on a feature built by [`segment_feature`].
pub fn with_properties(mut feature: Value, properties: Value) -> Value {
    if let (Some(target), Some(source)) = (
        feature.get_mut("properties").and_then(Value::as_object_mut),
        properties.as_object(),
    ) {
        for (k, v) in source {
            target.insert(k.clone(), v.clone());
        }
    }
    feature
}

pub fn feature_collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": features
    })
}

/// One projected edge, 100 m due east.
pub fn single_segment_route() -> Value {
    feature_collection(vec![with_properties(
        segment_feature(10, 1, 2, 1, json!([[0.0, 0.0], [50.0, 0.0], [100.0, 0.0]])),
        json!({
            "cost": 7.5,
            "reverse_cost": 9.0,
            "length_m": 100.0,
            "duration_forward_s": 7.2,
            "duration_backward_s": 8.4,
            "maxspeed_forward": 50,
            "maxspeed_backward": 30,
            "name": "Hauptstraße"
        }),
    )])
}

/// Two projected edges: 100 m east, then 100 m north (a left turn of 90 degrees).
pub fn two_segment_route() -> Value {
    feature_collection(vec![
        with_properties(
            segment_feature(10, 1, 2, 1, json!([[0.0, 0.0], [100.0, 0.0]])),
            json!({"cost": 10.0, "length_m": 100.0, "duration_forward_s": 8.0}),
        ),
        with_properties(
            segment_feature(11, 2, 3, 2, json!([[100.0, 0.0], [100.0, 50.0], [100.0, 100.0]])),
            json!({"cost": 12.0, "length_m": 100.0, "duration_forward_s": 9.0}),
        ),
    ])
}

/// Edge A is traversed forward; edge B (source 3, target 2) is entered at its
/// target, so its geometry arrives in the opposite direction of travel.
pub fn reversed_segment_route() -> Value {
    feature_collection(vec![
        with_properties(
            segment_feature(20, 1, 2, 1, json!([[0.0, 0.0], [100.0, 0.0]])),
            json!({"cost": 1.0, "reverse_cost": 2.0}),
        ),
        with_properties(
            segment_feature(21, 3, 2, 2, json!([[200.0, 0.0], [150.0, 0.0], [100.0, 0.0]])),
            json!({
                "cost": 3.0,
                "reverse_cost": 4.0,
                "duration_forward_s": 5.0,
                "duration_backward_s": 6.0
            }),
        ),
    ])
}

/// Two 3D edges climbing 30 m and then descending 10 m.
pub fn elevation_route() -> Value {
    feature_collection(vec![
        segment_feature(
            30,
            1,
            2,
            1,
            json!([[0.0, 0.0, 100.0], [100.0, 0.0, 110.0], [200.0, 0.0, 130.0]]),
        ),
        segment_feature(31, 2, 3, 2, json!([[200.0, 0.0, 130.0], [300.0, 0.0, 120.0]])),
    ])
}

/// Structural schemas of a small road network model.
///
/// `Road` references itself through `next`, `Junction` and `Road` reference
/// each other, and `RoadClass` is an enum.
pub const ROAD_REGISTRY_JSON: &str = r#"{
  "types": [
    {
      "name": "Road",
      "title": "Road",
      "fields": [
        {"name": "id", "type": "string"},
        {"name": "class", "type": {"ref": "RoadClass"}},
        {"name": "lanes", "type": "optionalInteger"},
        {"name": "width", "type": "optionalDouble"},
        {"name": "name", "type": {"optional": "string"}},
        {"name": "from", "type": {"ref": "Junction"}},
        {"name": "next", "type": {"ref": "Road"}, "nullable": true},
        {"name": "tags", "type": {"array": "string"}},
        {"name": "links", "type": {"array": {"ref": "Link"}}},
        {"name": "geometryBlob", "type": {"unmapped": "org.locationtech.jts.geom.Geometry"}}
      ]
    },
    {
      "name": "Junction",
      "fields": [
        {"name": "id", "type": "integer"},
        {"name": "roads", "type": {"array": {"ref": "Road"}}}
      ]
    },
    {
      "name": "RoadClass",
      "enum": ["motorway", "primary", "residential"]
    },
    {
      "name": "Link",
      "fields": [
        {"name": "href", "type": "uri"},
        {"name": "rel", "type": "string"},
        {"name": "type", "type": {"optional": "string"}},
        {"name": "title", "type": {"optional": "string"}}
      ]
    }
  ]
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_feature_collections() {
        for route in [
            single_segment_route(),
            two_segment_route(),
            reversed_segment_route(),
            elevation_route(),
        ] {
            assert_eq!(route["type"], "FeatureCollection");
            assert!(!route["features"].as_array().unwrap().is_empty());
        }
    }

    #[test]
    fn test_with_properties_merges() {
        let feature = with_properties(
            segment_feature(1, 1, 2, 1, json!([[0.0, 0.0], [1.0, 0.0]])),
            json!({"cost": 2.0, "node": 2}),
        );
        assert_eq!(feature["properties"]["cost"], 2.0);
        assert_eq!(feature["properties"]["node"], 2);
        assert_eq!(feature["properties"]["edge"], 1);
    }

    #[test]
    fn test_registry_fixture_is_json() {
        let registry: Value = serde_json::from_str(ROAD_REGISTRY_JSON).unwrap();
        assert_eq!(registry["types"].as_array().unwrap().len(), 4);
    }
}
