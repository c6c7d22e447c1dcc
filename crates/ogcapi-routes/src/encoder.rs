//! Streaming route encoder.
//!
//! The encoder consumes the token stream of a routing query result, one
//! segment feature after another, and aggregates them into a single route
//! document: a start and an end marker, an overview line with totals, and the
//! segments annotated with turn instructions and elevation gain.
//!
//! ## States
//! - `Idle`: waiting for `StreamStart`
//! - `InFeature`: segments are assembled and aggregated
//! - `Done`: the document was pushed to the sink
//! - `Failed`: an error aborted the pass; nothing was pushed
//!
//! Encoding is strictly sequential and request-scoped. The sink receives
//! exactly one payload, and only after `StreamEnd` was processed successfully.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use futures::{Stream, StreamExt};
use ogcapi_common::geodesy::horizontal_distance;
use ogcapi_common::{bearing, normalize_angle, BoundingBox, Coordinate};
use serde_json::Value;
use tracing::{debug, info};

use crate::attributes;
use crate::config::EncodingContext;
use crate::errors::RouteEncodingError;
use crate::feature::{FeatureAssembler, FeatureRecord};
use crate::format::{GeoJsonRouteFormatter, RouteFormatter, RouteSink};
use crate::profile::{simplified_gain, ElevationGain};
use crate::route::{
    round_half_up, ComponentKind, Instruction, Route, RouteComponent, RouteGeometry,
};
use crate::token::FeatureToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EncoderState {
    Idle,
    InFeature,
    Done,
    Failed,
}

impl EncoderState {
    fn name(&self) -> &'static str {
        match self {
            EncoderState::Idle => "Idle",
            EncoderState::InFeature => "InFeature",
            EncoderState::Done => "Done",
            EncoderState::Failed => "Failed",
        }
    }
}

/// Output record of a segment that is still waiting for its turn instruction.
#[derive(Debug)]
struct PendingSegment {
    index: usize,
    coordinates: Vec<Coordinate>,
    properties: BTreeMap<String, Value>,
    gain: Option<ElevationGain>,
}

impl PendingSegment {
    /// Finish the record; `turn` is the direction change into the next segment.
    fn close(self, turn: Option<(Instruction, f64)>) -> RouteComponent {
        let mut component = RouteComponent::new(
            self.index.to_string(),
            ComponentKind::Segment,
            RouteGeometry::line_string(self.coordinates),
        );
        component.properties.extend(self.properties);
        if let Some(gain) = self.gain {
            component = component
                .with_property("ascent_m", round_half_up(gain.ascent))
                .with_property("descent_m", round_half_up(gain.descent));
        }
        if let Some((instruction, angle)) = turn {
            component = component
                .with_property("instruction", instruction.as_str())
                .with_property("angle_deg", round_half_up(angle.to_degrees()));
        }
        component
    }
}

/// Request-scoped running totals and buffers.
#[derive(Debug)]
struct Aggregation {
    started_at: DateTime<Utc>,
    timer: Instant,
    cost: f64,
    duration: f64,
    length: f64,
    gain: ElevationGain,
    start: Option<Coordinate>,
    last_point: Option<Coordinate>,
    last_bearing: Option<f64>,
    overview: Vec<Coordinate>,
    current: Option<PendingSegment>,
    segments: Vec<RouteComponent>,
    three_d: bool,
    reverse: bool,
}

impl Aggregation {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            timer: Instant::now(),
            cost: 0.0,
            duration: 0.0,
            length: 0.0,
            gain: ElevationGain::default(),
            start: None,
            last_point: None,
            last_bearing: None,
            overview: Vec::new(),
            current: None,
            segments: Vec::new(),
            three_d: false,
            reverse: false,
        }
    }

    fn segment_count(&self) -> usize {
        self.segments.len() + usize::from(self.current.is_some())
    }
}

/// Encodes the segments of one routing result into a route document.
pub struct RouteEncoder<F = GeoJsonRouteFormatter, S = Vec<u8>> {
    context: EncodingContext,
    formatter: F,
    sink: S,
    state: EncoderState,
    assembler: FeatureAssembler,
    aggregation: Aggregation,
}

impl RouteEncoder<GeoJsonRouteFormatter, Vec<u8>> {
    /// Encoder writing compact GeoJSON into a byte buffer.
    pub fn geojson(context: EncodingContext) -> Self {
        Self::new(context, GeoJsonRouteFormatter::new(), Vec::new())
    }
}

impl<F: RouteFormatter, S: RouteSink> RouteEncoder<F, S> {
    pub fn new(context: EncodingContext, formatter: F, sink: S) -> Self {
        Self {
            context,
            formatter,
            sink,
            state: EncoderState::Idle,
            assembler: FeatureAssembler::new(),
            aggregation: Aggregation::new(),
        }
    }

    /// Whether the route was pushed to the sink.
    pub fn is_done(&self) -> bool {
        self.state == EncoderState::Done
    }

    pub fn media_type(&self) -> &'static str {
        self.formatter.media_type()
    }

    /// Consume the encoder and return its sink.
    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Encode a complete token sequence and return the sink.
    pub fn encode<I>(mut self, tokens: I) -> Result<S, RouteEncodingError>
    where
        I: IntoIterator<Item = FeatureToken>,
    {
        for token in tokens {
            self.on_token(token)?;
        }
        self.finish()
    }

    /// Encode a token stream whose source may fail, e.g. on client disconnect.
    ///
    /// An upstream error aborts the pass without pushing anything.
    pub async fn encode_stream<St, E>(mut self, tokens: St) -> Result<S, RouteEncodingError>
    where
        St: Stream<Item = Result<FeatureToken, E>>,
        E: fmt::Display,
    {
        futures::pin_mut!(tokens);
        while let Some(item) = tokens.next().await {
            match item {
                Ok(token) => self.on_token(token)?,
                Err(e) => {
                    self.state = EncoderState::Failed;
                    return Err(RouteEncodingError::Upstream(e.to_string()));
                }
            }
        }
        self.finish()
    }

    fn finish(self) -> Result<S, RouteEncodingError> {
        match self.state {
            EncoderState::Done => Ok(self.sink),
            _ => Err(RouteEncodingError::Upstream(
                "token stream ended before end of stream".to_string(),
            )),
        }
    }

    /// Feed one token. Any error moves the encoder into a terminal failed state.
    pub fn on_token(&mut self, token: FeatureToken) -> Result<(), RouteEncodingError> {
        let result = self.dispatch(token);
        if result.is_err() {
            self.state = EncoderState::Failed;
        }
        result
    }

    fn dispatch(&mut self, token: FeatureToken) -> Result<(), RouteEncodingError> {
        match (self.state, token) {
            (EncoderState::Idle, FeatureToken::StreamStart) => {
                self.on_start();
                Ok(())
            }
            (EncoderState::InFeature, FeatureToken::StreamEnd) if !self.assembler.in_feature() => {
                self.on_end()
            }
            (
                EncoderState::InFeature,
                token @ (FeatureToken::StreamStart | FeatureToken::StreamEnd),
            ) => Err(RouteEncodingError::UnexpectedToken {
                token: token.kind(),
                state: EncoderState::InFeature.name(),
            }),
            (EncoderState::InFeature, token) => match self.assembler.push(token)? {
                Some(feature) => self.on_feature(feature),
                None => Ok(()),
            },
            (state, token) => Err(RouteEncodingError::UnexpectedToken {
                token: token.kind(),
                state: state.name(),
            }),
        }
    }

    /// Reset all aggregation state.
    pub fn on_start(&mut self) {
        self.aggregation = Aggregation::new();
        self.assembler = FeatureAssembler::new();
        self.state = EncoderState::InFeature;
        debug!(name = %self.context.name, "Route encoding started");
    }

    /// Aggregate one segment.
    pub fn on_feature(&mut self, feature: FeatureRecord) -> Result<(), RouteEncodingError> {
        let index = self.aggregation.segment_count() + 1;
        let mut coordinates = segment_coordinates(&feature, index)?;

        let reverse = attributes::is_reversed(&feature);
        if reverse {
            coordinates.reverse();
        }

        let geographic = self.context.crs.is_geographic();
        let agg = &mut self.aggregation;
        agg.reverse = reverse;

        match agg.last_bearing {
            None => {
                agg.start = Some(coordinates[0]);
                agg.three_d = coordinates[0].is_3d();
                agg.overview.extend(coordinates.iter().copied());
            }
            Some(previous) => {
                let next = bearing(&coordinates[0], &coordinates[1]);
                let delta = normalize_angle(next - previous);
                let instruction = Instruction::from_angle(delta);
                if let Some(pending) = agg.current.take() {
                    agg.segments.push(pending.close(Some((instruction, delta))));
                }
                agg.overview.extend(coordinates.iter().skip(1).copied());
            }
        }

        let n = coordinates.len();
        agg.last_bearing = Some(bearing(&coordinates[n - 2], &coordinates[n - 1]));
        agg.last_point = Some(coordinates[n - 1]);

        let mut segment = attributes::extract(&feature, reverse);
        let length = match segment.length {
            Some(length) => length,
            None => {
                let length = line_length(&coordinates, geographic);
                segment
                    .properties
                    .insert("length_m".to_string(), Value::from(round_half_up(length)));
                length
            }
        };
        agg.cost += segment.cost.unwrap_or(0.0);
        agg.duration += segment.duration.unwrap_or(0.0);
        agg.length += length;

        let gain = if agg.three_d && coordinates[0].is_3d() {
            let gain = ElevationGain::from_elevations(coordinates.iter().filter_map(|c| c.z));
            agg.gain += gain;
            Some(gain)
        } else {
            if agg.three_d {
                debug!(segment = index, "2D segment in a 3D route, no elevation gain");
            }
            None
        };

        debug!(segment = index, reverse = agg.reverse, positions = n, "Route segment aggregated");

        agg.current = Some(PendingSegment {
            index,
            coordinates,
            properties: segment.properties,
            gain,
        });

        Ok(())
    }

    /// Assemble the route, format it and push it to the sink.
    pub fn on_end(&mut self) -> Result<(), RouteEncodingError> {
        let agg = &mut self.aggregation;
        let (Some(start), Some(end)) = (agg.start, agg.last_point) else {
            return Err(RouteEncodingError::NoRouteFound);
        };

        if agg.three_d {
            if let Some(tolerance) = self.context.simplification_tolerance {
                let raw = agg.gain;
                agg.gain = simplified_gain(&agg.overview, self.context.crs.is_geographic(), tolerance);
                debug!(
                    tolerance,
                    raw_ascent = raw.ascent,
                    ascent = agg.gain.ascent,
                    "Elevation gain recomputed from simplified profile"
                );
            }
        }

        let bbox = BoundingBox::from_coordinates(&agg.overview, agg.three_d);

        if let Some(pending) = agg.current.take() {
            agg.segments.push(pending.close(None));
        }

        let mut overview = RouteComponent::new(
            "route",
            ComponentKind::Overview,
            RouteGeometry::line_string(std::mem::take(&mut agg.overview)),
        )
        .with_property("name", self.context.name.as_str())
        .with_property("length_m", round_half_up(agg.length))
        .with_property("duration_s", round_half_up(agg.duration))
        .with_property("segments", agg.segments.len())
        .with_property(
            "processingStart",
            agg.started_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        )
        .with_property("processingDuration_ms", agg.timer.elapsed().as_millis() as u64);
        if let Some(cost) = serde_json::Number::from_f64(agg.cost) {
            overview = overview.with_property("cost", Value::Number(cost));
        }
        if agg.three_d {
            overview = overview
                .with_property("ascent_m", round_half_up(agg.gain.ascent))
                .with_property("descent_m", round_half_up(agg.gain.descent));
        }

        let mut components = Vec::with_capacity(agg.segments.len() + 3);
        components.push(RouteComponent::new(
            "start",
            ComponentKind::Start,
            RouteGeometry::point(start),
        ));
        components.push(RouteComponent::new(
            "end",
            ComponentKind::End,
            RouteGeometry::point(end),
        ));
        components.push(overview);
        components.append(&mut agg.segments);

        let route = Route {
            name: self.context.name.clone(),
            bbox,
            components,
        };

        let payload = self.formatter.format(&route, &self.context)?;
        let size = payload.len();
        self.sink.push(payload)?;
        self.state = EncoderState::Done;

        info!(
            name = %route.name,
            segments = route.segments().count(),
            length_m = round_half_up(agg.length),
            bytes = size,
            "Route encoded"
        );
        Ok(())
    }
}

/// Line positions of a segment; at least two are needed for directions.
fn segment_coordinates(
    feature: &FeatureRecord,
    index: usize,
) -> Result<Vec<Coordinate>, RouteEncodingError> {
    let missing = |reason: &str| RouteEncodingError::GeometryMissing {
        index,
        reason: reason.to_string(),
    };
    let geometry = feature.geometry().ok_or_else(|| missing("no geometry"))?;
    let coordinates = geometry
        .line_coordinates()
        .ok_or_else(|| missing("geometry is not a line"))?;
    if coordinates.len() < 2 {
        return Err(missing("line has fewer than two positions"));
    }
    Ok(coordinates)
}

fn line_length(coordinates: &[Coordinate], geographic: bool) -> f64 {
    coordinates
        .windows(2)
        .map(|w| horizontal_distance(&w[0], &w[1], geographic))
        .sum()
}
