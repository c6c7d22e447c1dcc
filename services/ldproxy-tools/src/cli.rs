//! Command line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ogcapi_common::CrsCode;
use ogcapi_routes::RoutingConfigOverride;
use ogcapi_schema::SchemaVersion;

#[derive(Parser, Debug)]
#[command(name = "ldproxy-tools")]
#[command(about = "Encode routes and derive JSON schemas from ldproxy configurations")]
pub struct Cli {
    /// Log level, used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info", env = "LDPROXY_LOG_LEVEL")]
    pub log_level: String,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "LDPROXY_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Encode a GeoJSON file of route segments into a route document
    Route(RouteArgs),
    /// Print a self-contained JSON schema
    Schema(SchemaArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RouteArgs {
    /// GeoJSON FeatureCollection of segments in route order
    pub segments: PathBuf,

    /// Routing configuration (YAML)
    #[arg(short, long, env = "LDPROXY_ROUTING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Route name
    #[arg(long)]
    pub name: Option<String>,

    /// CRS of the segment geometries, e.g. EPSG:25832
    #[arg(long, value_parser = CrsCode::from_crs_string)]
    pub crs: Option<CrsCode>,

    /// Elevation profile simplification tolerance in meters
    #[arg(long)]
    pub tolerance: Option<f64>,

    /// Number of decimal places for output coordinates
    #[arg(long)]
    pub precision: Option<u32>,

    /// Omit the route bounding box
    #[arg(long)]
    pub no_bbox: bool,

    /// Href of the self link of the route document
    #[arg(long)]
    pub self_link: Option<String>,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the document
    #[arg(long)]
    pub pretty: bool,
}

impl RouteArgs {
    /// Arguments given on the command line take precedence over the file.
    pub fn overrides(&self) -> RoutingConfigOverride {
        RoutingConfigOverride {
            name: self.name.clone(),
            crs: self.crs,
            elevation_profile_simplification_tolerance: self.tolerance,
            coordinate_precision: self.precision,
            include_bbox: self.no_bbox.then_some(false),
        }
    }
}

/// Kind of returned document a collection schema describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Returnable {
    #[default]
    Collection,
    Feature,
}

#[derive(Args, Debug, Clone)]
pub struct SchemaArgs {
    /// Registry of structural types (JSON or YAML)
    #[arg(short, long, env = "LDPROXY_SCHEMA_REGISTRY")]
    pub registry: Option<PathBuf>,

    /// Name of a registered type to bundle
    #[arg(long = "type", conflicts_with = "collection", required_unless_present = "collection")]
    pub type_name: Option<String>,

    /// Collection definition (JSON or YAML)
    #[arg(long)]
    pub collection: Option<PathBuf>,

    /// Returned document of the collection
    #[arg(long, value_enum, default_value_t = Returnable::Collection)]
    pub returnable: Returnable,

    /// JSON Schema version: draft-07, 2019-09 or 2020-12
    #[arg(long, default_value = "2020-12")]
    pub schema_version: SchemaVersion,

    /// API identifier used to key collection schemas
    #[arg(long, default_value = "default")]
    pub api_id: String,

    /// Configuration revision of the API
    #[arg(long, default_value_t = 0)]
    pub revision: u64,

    /// Output file (default: stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the document
    #[arg(long)]
    pub pretty: bool,
}
