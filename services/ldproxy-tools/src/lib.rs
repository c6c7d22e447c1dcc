//! Offline tooling around the ldproxy encoders and schema caches.
//!
//! The binary wraps two commands: `route` encodes a GeoJSON file of routing
//! graph segments into a route document, `schema` prints self-contained JSON
//! schemas for registered types or configured collections.

pub mod cli;
pub mod route;
pub mod schema;

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `level`. Logs go to stderr so documents written to
/// stdout stay clean.
pub fn init_tracing(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level {}", level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}

/// Write `bytes` to `output`, or to stdout when no file is given.
pub async fn write_output(output: Option<&Path>, bytes: &[u8]) -> Result<()> {
    match output {
        Some(path) => tokio::fs::write(path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(bytes).await?;
            stdout.flush().await?;
            Ok(())
        }
    }
}
