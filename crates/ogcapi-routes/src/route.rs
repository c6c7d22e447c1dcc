//! Route document model.
//!
//! A route is an ordered list of [`RouteComponent`]s: the start marker, the
//! end marker, the overview line and one record per segment.

use std::collections::BTreeMap;

use ogcapi_common::{BoundingBox, Coordinate};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property holding the role of a component within the route.
pub const FEATURE_TYPE: &str = "featureType";

/// Turn instruction at the end of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Instruction {
    Continue,
    Left,
    Right,
}

impl Instruction {
    /// Threshold in radians beyond which a direction change is a turn.
    pub const TURN_THRESHOLD: f64 = std::f64::consts::FRAC_PI_4;

    /// Classify a normalized direction change (positive is counter-clockwise).
    pub fn from_angle(delta: f64) -> Self {
        if delta > Self::TURN_THRESHOLD {
            Instruction::Left
        } else if delta < -Self::TURN_THRESHOLD {
            Instruction::Right
        } else {
            Instruction::Continue
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Instruction::Continue => "continue",
            Instruction::Left => "left",
            Instruction::Right => "right",
        }
    }
}

/// Role of a component within the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Start,
    End,
    Overview,
    Segment,
}

impl ComponentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Start => "start",
            ComponentKind::End => "end",
            ComponentKind::Overview => "route",
            ComponentKind::Segment => "segment",
        }
    }
}

/// Geometry of a route component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RouteGeometry {
    Point { coordinates: Coordinate },
    LineString { coordinates: Vec<Coordinate> },
}

impl RouteGeometry {
    pub fn point(c: Coordinate) -> Self {
        RouteGeometry::Point { coordinates: c }
    }

    pub fn line_string(coordinates: Vec<Coordinate>) -> Self {
        RouteGeometry::LineString { coordinates }
    }

    /// Number of positions in the geometry.
    pub fn len(&self) -> usize {
        match self {
            RouteGeometry::Point { .. } => 1,
            RouteGeometry::LineString { coordinates } => coordinates.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Round every ordinate to `decimals` places.
    pub fn rounded(&self, decimals: u32) -> Self {
        let round = |c: &Coordinate| Coordinate {
            x: round_to(c.x, decimals),
            y: round_to(c.y, decimals),
            z: c.z.map(|z| round_to(z, decimals)),
        };
        match self {
            RouteGeometry::Point { coordinates } => RouteGeometry::point(round(coordinates)),
            RouteGeometry::LineString { coordinates } => {
                RouteGeometry::line_string(coordinates.iter().map(round).collect())
            }
        }
    }
}

/// One output feature of the route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteComponent {
    pub id: String,
    pub geometry: RouteGeometry,
    pub properties: BTreeMap<String, Value>,
}

impl RouteComponent {
    pub fn new(id: impl Into<String>, kind: ComponentKind, geometry: RouteGeometry) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(FEATURE_TYPE.to_string(), Value::from(kind.as_str()));
        Self {
            id: id.into(),
            geometry,
            properties,
        }
    }

    /// Set a property (builder pattern).
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn kind(&self) -> Option<&str> {
        self.properties.get(FEATURE_TYPE).and_then(Value::as_str)
    }

    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

/// The assembled route, ready for formatting.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    pub bbox: Option<BoundingBox>,
    pub components: Vec<RouteComponent>,
}

impl Route {
    fn find(&self, kind: ComponentKind) -> Option<&RouteComponent> {
        self.components
            .iter()
            .find(|c| c.kind() == Some(kind.as_str()))
    }

    pub fn start(&self) -> Option<&RouteComponent> {
        self.find(ComponentKind::Start)
    }

    pub fn end(&self) -> Option<&RouteComponent> {
        self.find(ComponentKind::End)
    }

    pub fn overview(&self) -> Option<&RouteComponent> {
        self.find(ComponentKind::Overview)
    }

    pub fn segments(&self) -> impl Iterator<Item = &RouteComponent> {
        self.components
            .iter()
            .filter(|c| c.kind() == Some(ComponentKind::Segment.as_str()))
    }
}

/// Round half up to the nearest integer.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Round half up to a number of decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor + 0.5).floor() / factor
}
