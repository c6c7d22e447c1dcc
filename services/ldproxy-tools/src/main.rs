//! ldproxy-tools: route encoding and schema derivation from the command line.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use ldproxy_tools::cli::{Cli, Command};
use ldproxy_tools::{init_tracing, route, schema, write_output};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_json)?;

    match cli.command {
        Command::Route(args) => {
            info!(segments = %args.segments.display(), "Encoding route");
            let document = route::encode_route(&args).await?;
            write_output(args.output.as_deref(), &document).await?;
        }
        Command::Schema(args) => {
            let document = schema::schema_document(&args)?;
            let bytes = schema::render(&document, args.pretty)?;
            write_output(args.output.as_deref(), &bytes).await?;
        }
    }

    Ok(())
}
