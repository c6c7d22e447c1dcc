//! Feature token stream model.
//!
//! A feature source emits a flat, ordered sequence of tokens. Each feature is
//! bracketed by `FeatureStart`/`FeatureEnd`; property values and geometries
//! carry the path of the property they belong to. The stream is read once.

use ogcapi_common::Coordinate;
use serde::{Deserialize, Serialize};

/// Ordered list of property names from the feature root.
pub type PropertyPath = Vec<String>;

/// Declared type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Integer,
    Float,
    Boolean,
    Date,
    Datetime,
    Unknown,
}

/// Parsed geometry attached to a geometry-valued property.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
}

impl Geometry {
    /// The positions of a line geometry.
    ///
    /// Multi-part lines are joined, dropping a part's first position when it
    /// repeats the previous part's last one. Points have no line positions.
    pub fn line_coordinates(&self) -> Option<Vec<Coordinate>> {
        match self {
            Geometry::Point(_) => None,
            Geometry::LineString(coordinates) => Some(coordinates.clone()),
            Geometry::MultiLineString(parts) => {
                let mut joined: Vec<Coordinate> = Vec::new();
                for part in parts {
                    let skip = match (joined.last(), part.first()) {
                        (Some(last), Some(first)) => usize::from(last == first),
                        _ => 0,
                    };
                    joined.extend(part.iter().skip(skip).copied());
                }
                Some(joined)
            }
        }
    }
}

/// One event of the feature token stream.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureToken {
    StreamStart,
    FeatureStart,
    ObjectStart {
        path: PropertyPath,
    },
    ObjectEnd {
        path: PropertyPath,
    },
    Value {
        path: PropertyPath,
        value: Option<String>,
        value_type: ValueType,
    },
    Geometry {
        path: PropertyPath,
        geometry: Geometry,
    },
    FeatureEnd,
    StreamEnd,
}

impl FeatureToken {
    /// Convenience constructor for a top-level property value.
    pub fn value(name: &str, value: impl Into<String>, value_type: ValueType) -> Self {
        FeatureToken::Value {
            path: vec![name.to_string()],
            value: Some(value.into()),
            value_type,
        }
    }

    /// Short name used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FeatureToken::StreamStart => "StreamStart",
            FeatureToken::FeatureStart => "FeatureStart",
            FeatureToken::ObjectStart { .. } => "ObjectStart",
            FeatureToken::ObjectEnd { .. } => "ObjectEnd",
            FeatureToken::Value { .. } => "Value",
            FeatureToken::Geometry { .. } => "Geometry",
            FeatureToken::FeatureEnd => "FeatureEnd",
            FeatureToken::StreamEnd => "StreamEnd",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multi_line_joins_parts() {
        let geometry = Geometry::MultiLineString(vec![
            vec![Coordinate::xy(0.0, 0.0), Coordinate::xy(1.0, 0.0)],
            vec![Coordinate::xy(1.0, 0.0), Coordinate::xy(2.0, 0.0)],
        ]);
        let coords = geometry.line_coordinates().unwrap();
        assert_eq!(coords.len(), 3);
        assert_eq!(coords[2], Coordinate::xy(2.0, 0.0));
    }

    #[test]
    fn test_point_has_no_line() {
        assert!(Geometry::Point(Coordinate::xy(0.0, 0.0))
            .line_coordinates()
            .is_none());
    }
}
