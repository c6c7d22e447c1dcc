//! End-to-end tests for the route encoder, driven by GeoJSON segment fixtures.

use ogcapi_common::CrsCode;
use ogcapi_routes::{tokens_from_value, EncodingContext, RouteEncoder, RouteEncodingError};
use serde_json::{json, Value};
use test_utils::{
    elevation_route, feature_collection, reversed_segment_route, segment_chain, segment_feature,
    single_segment_route, turn_pair, two_segment_route, zigzag_profile,
};

fn projected() -> EncodingContext {
    EncodingContext {
        crs: CrsCode::Epsg25832,
        ..EncodingContext::default()
    }
}

fn encode(route: &Value, context: EncodingContext) -> Value {
    let tokens = tokens_from_value(route).unwrap();
    let bytes = RouteEncoder::geojson(context).encode(tokens).unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn overview(json: &Value) -> &Value {
    &json["features"][2]
}

fn segment(json: &Value, n: usize) -> &Value {
    &json["features"][2 + n]
}

// ============================================================================
// Document structure
// ============================================================================

#[test]
fn test_single_segment_document() {
    let json = encode(&single_segment_route(), projected());
    let features = json["features"].as_array().unwrap();
    assert_eq!(features.len(), 4);

    assert_eq!(features[0]["id"], "start");
    assert_eq!(features[0]["geometry"]["coordinates"], json!([0.0, 0.0]));
    assert_eq!(features[1]["id"], "end");
    assert_eq!(features[1]["geometry"]["coordinates"], json!([100.0, 0.0]));

    let totals = &overview(&json)["properties"];
    assert_eq!(totals["featureType"], "route");
    assert_eq!(totals["cost"], 7.5);
    assert_eq!(totals["length_m"], 100);
    assert_eq!(totals["duration_s"], 7);
    assert_eq!(totals["segments"], 1);
    assert!(totals["processingStart"].is_string());
    assert!(totals["processingDuration_ms"].is_u64());
    assert!(totals.get("ascent_m").is_none());

    let first = &segment(&json, 1)["properties"];
    assert_eq!(first["featureType"], "segment");
    assert_eq!(first["maxspeed_kmh"], 50);
    assert_eq!(first["name"], "Hauptstraße");
    assert!(first.get("instruction").is_none());
    assert!(first.get("edge").is_none());
}

#[test]
fn test_overview_has_no_duplicate_junctions() {
    let vertices: Vec<Vec<f64>> = (0..11).map(|i| vec![i as f64 * 10.0, (i % 2) as f64]).collect();
    let route = segment_chain(&vertices, 3);
    let json = encode(&route, projected());

    let segments: Vec<&Value> = json["features"].as_array().unwrap()[3..].iter().collect();
    assert_eq!(segments.len(), 4);
    let total: usize = segments
        .iter()
        .map(|s| s["geometry"]["coordinates"].as_array().unwrap().len())
        .sum();

    let overview_len = overview(&json)["geometry"]["coordinates"].as_array().unwrap().len();
    assert_eq!(overview_len, total - (segments.len() - 1));
    assert_eq!(overview_len, vertices.len());
}

#[test]
fn test_reversed_segment_continues_overview() {
    let json = encode(&reversed_segment_route(), projected());

    assert_eq!(
        overview(&json)["geometry"]["coordinates"],
        json!([[0.0, 0.0], [100.0, 0.0], [150.0, 0.0], [200.0, 0.0]])
    );
    assert_eq!(
        segment(&json, 2)["geometry"]["coordinates"],
        json!([[100.0, 0.0], [150.0, 0.0], [200.0, 0.0]])
    );
    assert_eq!(json["features"][1]["geometry"]["coordinates"], json!([200.0, 0.0]));

    // backward attributes on the reversed edge
    let second = &segment(&json, 2)["properties"];
    assert_eq!(second["cost"], 4.0);
    assert_eq!(second["duration_s"], 6);
    assert_eq!(second["length_m"], 100);

    let first = &segment(&json, 1)["properties"];
    assert_eq!(first["cost"], 1.0);
    assert_eq!(first["instruction"], "continue");

    let totals = &overview(&json)["properties"];
    assert_eq!(totals["cost"], 5.0);
    assert_eq!(totals["length_m"], 200);
}

// ============================================================================
// Turn instructions
// ============================================================================

fn instruction_for(angle_deg: f64) -> (String, i64) {
    let json = encode(&turn_pair(angle_deg), projected());
    let first = &segment(&json, 1)["properties"];
    (
        first["instruction"].as_str().unwrap().to_string(),
        first["angle_deg"].as_i64().unwrap(),
    )
}

#[test]
fn test_turn_left() {
    assert_eq!(instruction_for(60.0), ("left".to_string(), 60));
}

#[test]
fn test_turn_right() {
    assert_eq!(instruction_for(-60.0), ("right".to_string(), -60));
}

#[test]
fn test_slight_bend_continues() {
    assert_eq!(instruction_for(10.0), ("continue".to_string(), 10));
}

#[test]
fn test_instruction_only_on_preceding_segment() {
    let json = encode(&two_segment_route(), projected());
    assert_eq!(segment(&json, 1)["properties"]["instruction"], "left");
    assert_eq!(segment(&json, 1)["properties"]["angle_deg"], 90);
    assert!(segment(&json, 2)["properties"].get("instruction").is_none());
}

// ============================================================================
// Elevation
// ============================================================================

#[test]
fn test_elevation_totals_and_3d_bbox() {
    let json = encode(&elevation_route(), projected());

    assert_eq!(json["bbox"], json!([0.0, 0.0, 100.0, 300.0, 0.0, 130.0]));
    let totals = &overview(&json)["properties"];
    assert_eq!(totals["ascent_m"], 30);
    assert_eq!(totals["descent_m"], 10);

    assert_eq!(segment(&json, 1)["properties"]["ascent_m"], 30);
    assert_eq!(segment(&json, 1)["properties"]["descent_m"], 0);
    assert_eq!(segment(&json, 2)["properties"]["descent_m"], 10);
}

#[test]
fn test_2d_segment_in_3d_route_adds_no_elevation() {
    let route = feature_collection(vec![
        segment_feature(1, 1, 2, 1, json!([[0.0, 0.0, 100.0], [100.0, 0.0, 120.0]])),
        segment_feature(2, 2, 3, 2, json!([[100.0, 0.0], [200.0, 0.0]])),
        segment_feature(3, 3, 4, 3, json!([[200.0, 0.0, 120.0], [300.0, 0.0, 110.0]])),
    ]);

    for tolerance in [None, Some(0.0)] {
        let json = encode(
            &route,
            EncodingContext {
                simplification_tolerance: tolerance,
                ..projected()
            },
        );
        assert_eq!(json["bbox"], json!([0.0, 0.0, 100.0, 300.0, 0.0, 120.0]));
        let totals = &overview(&json)["properties"];
        assert_eq!(totals["ascent_m"], 20);
        assert_eq!(totals["descent_m"], 10);
        assert!(segment(&json, 2)["properties"].get("ascent_m").is_none());
    }
}

#[test]
fn test_zero_tolerance_matches_raw_totals() {
    let route = segment_chain(&zigzag_profile(9, 100.0, 100.0, 5.0), 2);

    let raw = encode(&route, projected());
    let simplified = encode(
        &route,
        EncodingContext {
            simplification_tolerance: Some(0.0),
            ..projected()
        },
    );

    assert_eq!(overview(&raw)["properties"]["ascent_m"], 20);
    assert_eq!(
        overview(&raw)["properties"]["ascent_m"],
        overview(&simplified)["properties"]["ascent_m"]
    );
    assert_eq!(
        overview(&raw)["properties"]["descent_m"],
        overview(&simplified)["properties"]["descent_m"]
    );
}

#[test]
fn test_lossy_tolerance_diverges_from_segment_sums() {
    let route = segment_chain(&zigzag_profile(9, 100.0, 100.0, 1.0), 2);
    let json = encode(
        &route,
        EncodingContext {
            simplification_tolerance: Some(10.0),
            ..projected()
        },
    );

    let segment_ascent: i64 = json["features"].as_array().unwrap()[3..]
        .iter()
        .map(|s| s["properties"]["ascent_m"].as_i64().unwrap())
        .sum();
    assert_eq!(segment_ascent, 4);
    assert_eq!(overview(&json)["properties"]["ascent_m"], 0);
}

// ============================================================================
// Errors and stream driving
// ============================================================================

#[test]
fn test_empty_collection_is_no_route() {
    let tokens = tokens_from_value(&json!({"type": "FeatureCollection", "features": []})).unwrap();
    let result = RouteEncoder::geojson(projected()).encode(tokens);
    let err = result.unwrap_err();
    assert!(matches!(err, RouteEncodingError::NoRouteFound));
    assert_eq!(err.status_code(), 422);
}

#[tokio::test]
async fn test_encode_stream() {
    let tokens = tokens_from_value(&two_segment_route()).unwrap();
    let stream = futures::stream::iter(tokens.into_iter().map(Ok::<_, std::io::Error>));

    let bytes = RouteEncoder::geojson(projected())
        .encode_stream(stream)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["features"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_upstream_error_aborts_without_output() {
    let mut items: Vec<Result<_, std::io::Error>> = tokens_from_value(&two_segment_route())
        .unwrap()
        .into_iter()
        .map(Ok)
        .collect();
    let end = items.pop();
    assert!(end.is_some());
    items.push(Err(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        "client disconnected",
    )));

    let result = RouteEncoder::geojson(projected())
        .encode_stream(futures::stream::iter(items))
        .await;
    match result {
        Err(RouteEncodingError::Upstream(message)) => assert!(message.contains("client disconnected")),
        other => panic!("expected upstream error, got {:?}", other.map(|b| b.len())),
    }
}

#[test]
fn test_truncated_stream_is_upstream_error() {
    let mut tokens = tokens_from_value(&single_segment_route()).unwrap();
    tokens.pop();
    let stream = futures::stream::iter(tokens.into_iter().map(Ok::<_, std::io::Error>));

    let result = tokio_test::block_on(RouteEncoder::geojson(projected()).encode_stream(stream));
    assert!(matches!(result, Err(RouteEncodingError::Upstream(_))));
}

#[test]
fn test_config_driven_output() {
    use ogcapi_common::Link;
    use ogcapi_routes::{RoutingConfig, RoutingConfigOverride};

    let config = RoutingConfig::default().merge(RoutingConfigOverride {
        crs: Some(CrsCode::Epsg25832),
        coordinate_precision: Some(0),
        include_bbox: Some(false),
        ..RoutingConfigOverride::default()
    });
    let context = config.encoding_context(
        Some("Commute"),
        vec![Link::new("https://example.com/routes/commute", "self")],
    );

    let json = encode(&turn_pair(60.0), context);
    assert_eq!(json["name"], "Commute");
    assert_eq!(json["links"][0]["rel"], "self");
    assert!(json.get("bbox").is_none());
    // 10 + 10 * cos(60°) = 15, 10 * sin(60°) = 8.66
    assert_eq!(json["features"][1]["geometry"]["coordinates"], json!([15.0, 9.0]));
    assert_eq!(overview(&json)["properties"]["name"], "Commute");
}
