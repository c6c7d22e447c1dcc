//! Route output formats and sinks.

use std::collections::BTreeMap;

use bytes::Bytes;
use ogcapi_common::Link;
use serde::Serialize;
use serde_json::Value;

use crate::config::EncodingContext;
use crate::errors::RouteEncodingError;
use crate::route::{Route, RouteGeometry};

/// Serializes an assembled route into a response payload.
pub trait RouteFormatter {
    /// Media type of the produced payload.
    fn media_type(&self) -> &'static str;

    fn format(&self, route: &Route, context: &EncodingContext) -> Result<Bytes, RouteEncodingError>;
}

/// Receives the serialized route once a pass completed.
pub trait RouteSink {
    fn push(&mut self, payload: Bytes) -> Result<(), RouteEncodingError>;
}

impl RouteSink for Vec<u8> {
    fn push(&mut self, payload: Bytes) -> Result<(), RouteEncodingError> {
        self.extend_from_slice(&payload);
        Ok(())
    }
}

impl RouteSink for Vec<Bytes> {
    fn push(&mut self, payload: Bytes) -> Result<(), RouteEncodingError> {
        Vec::push(self, payload);
        Ok(())
    }
}

/// A GeoJSON FeatureCollection holding the route components.
#[derive(Debug, Serialize)]
struct RouteFeatureCollection<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bbox: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "no_links")]
    links: &'a [Link],
    features: Vec<RouteFeature<'a>>,
}

fn no_links(links: &&[Link]) -> bool {
    links.is_empty()
}

#[derive(Debug, Serialize)]
struct RouteFeature<'a> {
    #[serde(rename = "type")]
    type_: &'static str,
    id: &'a str,
    geometry: RouteGeometry,
    properties: &'a BTreeMap<String, Value>,
}

/// Default formatter producing `application/geo+json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonRouteFormatter {
    pub pretty: bool,
}

impl GeoJsonRouteFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl RouteFormatter for GeoJsonRouteFormatter {
    fn media_type(&self) -> &'static str {
        ogcapi_common::media_types::GEO_JSON
    }

    fn format(&self, route: &Route, context: &EncodingContext) -> Result<Bytes, RouteEncodingError> {
        let features = route
            .components
            .iter()
            .map(|component| RouteFeature {
                type_: "Feature",
                id: &component.id,
                geometry: match context.coordinate_precision {
                    Some(decimals) => component.geometry.rounded(decimals),
                    None => component.geometry.clone(),
                },
                properties: &component.properties,
            })
            .collect();

        let collection = RouteFeatureCollection {
            type_: "FeatureCollection",
            name: &route.name,
            bbox: route
                .bbox
                .filter(|_| context.include_bbox)
                .map(|b| b.to_vec()),
            links: &context.links,
            features,
        };

        let bytes = if self.pretty {
            serde_json::to_vec_pretty(&collection)?
        } else {
            serde_json::to_vec(&collection)?
        };
        Ok(Bytes::from(bytes))
    }
}
