//! `route` command: encode a segment file into a route document.

use std::convert::Infallible;

use anyhow::{Context, Result};
use ogcapi_common::Link;
use ogcapi_routes::{tokens_from_str, GeoJsonRouteFormatter, RouteEncoder, RoutingConfig};
use tracing::info;

use crate::cli::RouteArgs;

/// Resolve the effective routing configuration for a command invocation.
pub fn routing_config(args: &RouteArgs) -> Result<RoutingConfig> {
    let base = match &args.config {
        Some(path) => RoutingConfig::load_from_file(path)
            .with_context(|| format!("Failed to load routing configuration {}", path.display()))?,
        None => RoutingConfig::default(),
    };
    let config = base.merge(args.overrides());
    config.validate()?;
    Ok(config)
}

/// Encode the segments named by `args` and return the document bytes.
pub async fn encode_route(args: &RouteArgs) -> Result<Vec<u8>> {
    let config = routing_config(args)?;

    let content = tokio::fs::read_to_string(&args.segments)
        .await
        .with_context(|| format!("Failed to read segments {}", args.segments.display()))?;
    let tokens = tokens_from_str(&content)
        .with_context(|| format!("Failed to decode segments {}", args.segments.display()))?;
    info!(
        file = %args.segments.display(),
        tokens = tokens.len(),
        crs = %config.crs,
        "Decoded route segments"
    );

    let links = args
        .self_link
        .iter()
        .map(|href| Link::self_geojson(href.as_str()))
        .collect();
    let context = config.encoding_context(None, links);
    let formatter = if args.pretty {
        GeoJsonRouteFormatter::pretty()
    } else {
        GeoJsonRouteFormatter::new()
    };

    let encoder = RouteEncoder::new(context, formatter, Vec::new());
    let stream = futures::stream::iter(tokens.into_iter().map(Ok::<_, Infallible>));
    let document = encoder.encode_stream(stream).await?;

    info!(bytes = document.len(), "Route encoded");
    Ok(document)
}
