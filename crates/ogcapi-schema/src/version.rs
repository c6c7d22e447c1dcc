//! JSON Schema dialects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The JSON Schema version a document is written for.
///
/// Draft 07 keeps reusable schemas under `definitions`, later versions use
/// `$defs`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "draft-07")]
    Draft07,
    #[serde(rename = "2019-09")]
    V201909,
    #[default]
    #[serde(rename = "2020-12")]
    V202012,
}

impl SchemaVersion {
    /// Value of the `$schema` keyword.
    pub fn uri(&self) -> &'static str {
        match self {
            SchemaVersion::Draft07 => "http://json-schema.org/draft-07/schema#",
            SchemaVersion::V201909 => "https://json-schema.org/draft/2019-09/schema",
            SchemaVersion::V202012 => "https://json-schema.org/draft/2020-12/schema",
        }
    }

    /// Keyword holding embedded definitions.
    pub fn definitions_keyword(&self) -> &'static str {
        match self {
            SchemaVersion::Draft07 => "definitions",
            SchemaVersion::V201909 | SchemaVersion::V202012 => "$defs",
        }
    }

    /// Local `$ref` to an embedded definition.
    pub fn reference(&self, id: &str) -> String {
        format!("#/{}/{}", self.definitions_keyword(), id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaVersion::Draft07 => "draft-07",
            SchemaVersion::V201909 => "2019-09",
            SchemaVersion::V202012 => "2020-12",
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchemaVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "draft-07" | "draft07" | "7" => Ok(SchemaVersion::Draft07),
            "2019-09" | "v201909" => Ok(SchemaVersion::V201909),
            "2020-12" | "v202012" => Ok(SchemaVersion::V202012),
            other => Err(format!("Unknown JSON Schema version: {}", other)),
        }
    }
}
