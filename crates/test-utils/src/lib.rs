//! Test fixtures shared by the ldproxy crates.
//!
//! - [`fixtures`]: hand-written routing graph segments as GeoJSON and the
//!   road network type registry used by the schema tests
//! - [`generators`]: synthetic segment chains, elevation profiles and turns
//!
//! Only ever used as a dev-dependency:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
