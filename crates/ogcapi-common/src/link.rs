//! Hyperlinks attached to responses.

use serde::{Deserialize, Serialize};

use crate::media_types;

/// Link relation of the document itself.
pub const REL_SELF: &str = "self";
/// Link relation of the same document in another encoding.
pub const REL_ALTERNATE: &str = "alternate";
/// Link relation of the schema describing the document.
pub const REL_DESCRIBEDBY: &str = "describedby";

/// A web link as embedded in OGC API responses.
///
/// The field set matches the `Link` definition published in the response
/// schemas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hreflang: Option<String>,

    /// Size of the linked resource in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u64>,
}

impl Link {
    pub fn new(href: impl Into<String>, rel: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            rel: rel.into(),
            type_: None,
            title: None,
            hreflang: None,
            length: None,
        }
    }

    /// The `self` link of a GeoJSON document.
    pub fn self_geojson(href: impl Into<String>) -> Self {
        Self::new(href, REL_SELF)
            .with_type(media_types::GEO_JSON)
            .with_title("This document")
    }

    /// The `describedby` link to a JSON schema.
    pub fn schema(href: impl Into<String>) -> Self {
        Self::new(href, REL_DESCRIBEDBY)
            .with_type(media_types::SCHEMA_JSON)
            .with_title("JSON Schema of this document")
    }

    pub fn with_type(mut self, type_: impl Into<String>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_hreflang(mut self, hreflang: impl Into<String>) -> Self {
        self.hreflang = Some(hreflang.into());
        self
    }

    pub fn is_self(&self) -> bool {
        self.rel == REL_SELF
    }
}
