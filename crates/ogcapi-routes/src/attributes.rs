//! Mapping of segment attributes to route output properties.
//!
//! Routing graph edges carry direction-dependent attributes (`cost` vs
//! `reverse_cost`, forward vs backward durations and speed limits). The
//! direction in which a segment is traversed selects which of the pair is
//! used; the other one is dropped.

use std::collections::BTreeMap;

use serde_json::{Number, Value};
use tracing::{debug, warn};

use crate::feature::FeatureRecord;
use crate::route::{round_half_up, round_to};
use crate::token::ValueType;

/// Attribute naming the node the route arrives at when entering the segment.
pub const NODE: &str = "node";
/// Attribute naming the end node of the edge in graph order.
pub const TARGET: &str = "target";

/// Graph-internal attributes never copied to the output.
const IGNORED: &[&str] = &["source", "target", "node", "edge"];

const COST_FORWARD: &str = "cost";
const COST_BACKWARD: &str = "reverse_cost";
const LENGTH: &str = "length_m";
const DURATION_FORWARD: &str = "duration_forward_s";
const DURATION_BACKWARD: &str = "duration_backward_s";
const MAXSPEED_FORWARD: &str = "maxspeed_forward";
const MAXSPEED_BACKWARD: &str = "maxspeed_backward";

/// Direction-dependent and aggregated values extracted from one segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentAttributes {
    pub cost: Option<f64>,
    pub length: Option<f64>,
    pub duration: Option<f64>,
    pub properties: BTreeMap<String, Value>,
}

/// Whether a segment is traversed against its graph direction.
///
/// The feature source always delivers edge geometries from source to target.
/// When the route enters the edge at its target node, the geometry has to be
/// reversed.
pub fn is_reversed(feature: &FeatureRecord) -> bool {
    match (feature.value(NODE), feature.value(TARGET)) {
        (Some(node), Some(target)) => node.trim() == target.trim(),
        _ => false,
    }
}

/// Extract the output properties of a segment.
pub fn extract(feature: &FeatureRecord, reverse: bool) -> SegmentAttributes {
    let (cost_key, skip_cost) = pick(reverse, COST_FORWARD, COST_BACKWARD);
    let (duration_key, skip_duration) = pick(reverse, DURATION_FORWARD, DURATION_BACKWARD);
    let (maxspeed_key, skip_maxspeed) = pick(reverse, MAXSPEED_FORWARD, MAXSPEED_BACKWARD);

    let mut attributes = SegmentAttributes::default();

    for (name, property) in feature.properties() {
        if IGNORED.contains(&name) || name == skip_cost || name == skip_duration || name == skip_maxspeed {
            continue;
        }
        let Some(raw) = property.value.as_deref() else {
            continue;
        };

        if name == cost_key {
            if let Some(cost) = parse_number(name, raw) {
                attributes.cost = Some(cost);
                insert_number(&mut attributes.properties, "cost", cost);
            }
        } else if name == LENGTH {
            if let Some(length) = parse_number(name, raw) {
                attributes.length = Some(length);
                attributes
                    .properties
                    .insert(LENGTH.to_string(), Value::from(round_half_up(length)));
            }
        } else if name == duration_key {
            if let Some(duration) = parse_number(name, raw) {
                attributes.duration = Some(duration);
                attributes
                    .properties
                    .insert("duration_s".to_string(), Value::from(round_half_up(duration)));
            }
        } else if name == maxspeed_key {
            if let Some(speed) = parse_number(name, raw) {
                attributes
                    .properties
                    .insert("maxspeed_kmh".to_string(), Value::from(round_half_up(speed)));
            }
        } else if name.starts_with("maxheight") || name.starts_with("maxweight") {
            if let Some(limit) = parse_number(name, raw) {
                insert_number(&mut attributes.properties, name, round_to(limit, 1));
            }
        } else if let Some(value) = convert(name, raw, property.value_type) {
            attributes.properties.insert(name.to_string(), value);
        }
    }

    attributes
}

fn pick(reverse: bool, forward: &'static str, backward: &'static str) -> (&'static str, &'static str) {
    if reverse {
        (backward, forward)
    } else {
        (forward, backward)
    }
}

fn parse_number(name: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            warn!(attribute = name, value = raw, "Malformed numeric attribute skipped");
            None
        }
    }
}

fn insert_number(properties: &mut BTreeMap<String, Value>, key: &str, value: f64) {
    if let Some(n) = Number::from_f64(value) {
        properties.insert(key.to_string(), Value::Number(n));
    }
}

fn convert(name: &str, raw: &str, value_type: ValueType) -> Option<Value> {
    match value_type {
        ValueType::String | ValueType::Date | ValueType::Datetime => Some(Value::from(raw)),
        ValueType::Boolean => match raw.trim() {
            "true" | "t" | "1" => Some(Value::Bool(true)),
            "false" | "f" | "0" => Some(Value::Bool(false)),
            _ => {
                warn!(attribute = name, value = raw, "Malformed boolean attribute skipped");
                None
            }
        },
        ValueType::Integer => match raw.trim().parse::<i64>() {
            Ok(v) => Some(Value::from(v)),
            Err(_) => {
                warn!(attribute = name, value = raw, "Malformed integer attribute skipped");
                None
            }
        },
        ValueType::Float => parse_number(name, raw)
            .and_then(Number::from_f64)
            .map(Value::Number),
        ValueType::Unknown => {
            debug!(attribute = name, "Attribute of unsupported type skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge() -> FeatureRecord {
        FeatureRecord::new()
            .with_property("edge", "4711", ValueType::Integer)
            .with_property("node", "1", ValueType::Integer)
            .with_property("source", "1", ValueType::Integer)
            .with_property("target", "2", ValueType::Integer)
            .with_property("cost", "12.5", ValueType::Float)
            .with_property("reverse_cost", "30.0", ValueType::Float)
            .with_property("length_m", "104.6", ValueType::Float)
            .with_property("duration_forward_s", "9.49", ValueType::Float)
            .with_property("duration_backward_s", "20.5", ValueType::Float)
            .with_property("maxspeed_forward", "50", ValueType::Integer)
            .with_property("maxspeed_backward", "30", ValueType::Integer)
            .with_property("maxheight_m", "4.25", ValueType::Float)
            .with_property("name", "Hauptstraße", ValueType::String)
            .with_property("oneway", "false", ValueType::Boolean)
            .with_property("lanes", "2", ValueType::Integer)
    }

    #[test]
    fn test_forward_attributes() {
        let attributes = extract(&edge(), false);
        let p = &attributes.properties;

        assert_eq!(attributes.cost, Some(12.5));
        assert_eq!(attributes.duration, Some(9.49));
        assert_eq!(attributes.length, Some(104.6));
        assert_eq!(p["cost"], 12.5);
        assert_eq!(p["duration_s"], 9);
        assert_eq!(p["length_m"], 105);
        assert_eq!(p["maxspeed_kmh"], 50);
        assert_eq!(p["maxheight_m"], 4.3);
        assert_eq!(p["name"], "Hauptstraße");
        assert_eq!(p["oneway"], false);
        assert_eq!(p["lanes"], 2);
        for ignored in ["edge", "node", "source", "target", "reverse_cost", "duration_backward_s"] {
            assert!(!p.contains_key(ignored), "{} should be dropped", ignored);
        }
    }

    #[test]
    fn test_backward_attributes() {
        let attributes = extract(&edge(), true);
        assert_eq!(attributes.cost, Some(30.0));
        assert_eq!(attributes.duration, Some(20.5));
        assert_eq!(attributes.properties["duration_s"], 21);
        assert_eq!(attributes.properties["maxspeed_kmh"], 30);
    }

    #[test]
    fn test_malformed_values_are_omitted() {
        let feature = FeatureRecord::new()
            .with_property("cost", "n/a", ValueType::Float)
            .with_property("lanes", "two", ValueType::Integer)
            .with_property("lit", "maybe", ValueType::Boolean)
            .with_property("geometry_blob", "AQID", ValueType::Unknown)
            .with_property("surface", "gravel", ValueType::String);
        let attributes = extract(&feature, false);

        assert_eq!(attributes.cost, None);
        assert_eq!(attributes.properties.len(), 1);
        assert_eq!(attributes.properties["surface"], "gravel");
    }

    #[test]
    fn test_is_reversed() {
        assert!(!is_reversed(&edge()));
        let reversed = FeatureRecord::new()
            .with_property("node", "2", ValueType::Integer)
            .with_property("target", "2", ValueType::Integer);
        assert!(is_reversed(&reversed));
        assert!(!is_reversed(&FeatureRecord::new()));
    }
}
