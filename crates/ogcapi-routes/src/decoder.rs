//! GeoJSON token decoder.
//!
//! Turns a GeoJSON FeatureCollection (or a single Feature) into the token
//! stream the route encoder consumes. Used by the command line tools and in
//! tests; the server receives its tokens from the feature provider.

use ogcapi_common::coordinate::check_uniform_dimension;
use ogcapi_common::{Coordinate, CoordinateError};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::token::{FeatureToken, Geometry, PropertyPath, ValueType};

/// Errors that can occur when decoding GeoJSON input.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Expected a GeoJSON Feature or FeatureCollection, found {0}")]
    NotGeoJson(String),

    #[error("Unsupported geometry type: {0}")]
    UnsupportedGeometry(String),

    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}

/// Decode a GeoJSON document from text.
pub fn tokens_from_str(input: &str) -> Result<Vec<FeatureToken>, DecodeError> {
    let value: Value = serde_json::from_str(input)?;
    tokens_from_value(&value)
}

/// Decode a parsed GeoJSON document, including stream start and end tokens.
pub fn tokens_from_value(value: &Value) -> Result<Vec<FeatureToken>, DecodeError> {
    let mut tokens = vec![FeatureToken::StreamStart];
    match value.get("type").and_then(Value::as_str) {
        Some("FeatureCollection") => {
            let features = value
                .get("features")
                .and_then(Value::as_array)
                .ok_or_else(|| DecodeError::NotGeoJson("collection without features".to_string()))?;
            for feature in features {
                decode_feature(feature, &mut tokens)?;
            }
        }
        Some("Feature") => decode_feature(value, &mut tokens)?,
        other => {
            return Err(DecodeError::NotGeoJson(
                other.unwrap_or("untyped document").to_string(),
            ))
        }
    }
    tokens.push(FeatureToken::StreamEnd);
    Ok(tokens)
}

fn decode_feature(feature: &Value, tokens: &mut Vec<FeatureToken>) -> Result<(), DecodeError> {
    tokens.push(FeatureToken::FeatureStart);
    if let Some(properties) = feature.get("properties").and_then(Value::as_object) {
        decode_object(properties, &mut Vec::new(), tokens);
    }
    match feature.get("geometry") {
        None | Some(Value::Null) => {}
        Some(geometry) => tokens.push(FeatureToken::Geometry {
            path: vec!["geometry".to_string()],
            geometry: decode_geometry(geometry)?,
        }),
    }
    tokens.push(FeatureToken::FeatureEnd);
    Ok(())
}

fn decode_object(object: &Map<String, Value>, path: &mut PropertyPath, tokens: &mut Vec<FeatureToken>) {
    for (name, value) in object {
        path.push(name.clone());
        match value {
            Value::Object(nested) => {
                tokens.push(FeatureToken::ObjectStart { path: path.clone() });
                decode_object(nested, path, tokens);
                tokens.push(FeatureToken::ObjectEnd { path: path.clone() });
            }
            _ => {
                let (value, value_type) = scalar(value);
                tokens.push(FeatureToken::Value {
                    path: path.clone(),
                    value,
                    value_type,
                });
            }
        }
        path.pop();
    }
}

fn scalar(value: &Value) -> (Option<String>, ValueType) {
    match value {
        Value::Null => (None, ValueType::String),
        Value::Bool(b) => (Some(b.to_string()), ValueType::Boolean),
        Value::Number(n) if n.is_i64() || n.is_u64() => (Some(n.to_string()), ValueType::Integer),
        Value::Number(n) => (Some(n.to_string()), ValueType::Float),
        Value::String(s) => (Some(s.clone()), string_type(s)),
        other => (Some(other.to_string()), ValueType::Unknown),
    }
}

/// Recognize ISO dates and timestamps among string values.
fn string_type(s: &str) -> ValueType {
    if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok() {
        ValueType::Date
    } else if chrono::DateTime::parse_from_rfc3339(s).is_ok() {
        ValueType::Datetime
    } else {
        ValueType::String
    }
}

fn decode_geometry(geometry: &Value) -> Result<Geometry, DecodeError> {
    let geometry_type = geometry
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::UnsupportedGeometry("untyped geometry".to_string()))?;
    let coordinates = geometry
        .get("coordinates")
        .ok_or_else(|| DecodeError::InvalidCoordinates("missing coordinates".to_string()))?;

    match geometry_type {
        "Point" => Ok(Geometry::Point(position(coordinates)?)),
        "LineString" => Ok(Geometry::LineString(line(coordinates)?)),
        "MultiLineString" => {
            let parts = coordinates
                .as_array()
                .ok_or_else(|| DecodeError::InvalidCoordinates(coordinates.to_string()))?
                .iter()
                .map(line)
                .collect::<Result<Vec<_>, _>>()?;
            let all: Vec<Coordinate> = parts.iter().flatten().copied().collect();
            check_uniform_dimension(&all)?;
            Ok(Geometry::MultiLineString(parts))
        }
        other => Err(DecodeError::UnsupportedGeometry(other.to_string())),
    }
}

fn line(value: &Value) -> Result<Vec<Coordinate>, DecodeError> {
    let coordinates = value
        .as_array()
        .ok_or_else(|| DecodeError::InvalidCoordinates(value.to_string()))?
        .iter()
        .map(position)
        .collect::<Result<Vec<_>, _>>()?;
    check_uniform_dimension(&coordinates)?;
    Ok(coordinates)
}

fn position(value: &Value) -> Result<Coordinate, DecodeError> {
    let ordinates = value
        .as_array()
        .ok_or_else(|| DecodeError::InvalidCoordinates(value.to_string()))?
        .iter()
        .map(|v| {
            v.as_f64()
                .ok_or_else(|| DecodeError::InvalidCoordinates(value.to_string()))
        })
        .collect::<Result<Vec<f64>, _>>()?;
    Ok(Coordinate::from_slice(&ordinates)?)
}
