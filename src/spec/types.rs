//! Spec catalog types and error definitions.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// An object-rooted spec document.
///
/// `serde_json` is built with `preserve_order`, so keys keep document order
/// and flattening follows traversal order.
pub type Document = Map<String, Value>;

/// HTTP method keys recognized under a path item.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "post", "put", "patch", "delete", "head", "options", "trace",
];

/// Returns true if `key` names an operation (case-insensitive).
pub fn is_http_method(key: &str) -> bool {
    HTTP_METHODS.iter().any(|m| m.eq_ignore_ascii_case(key))
}

/// Where a parameter is carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Cookie,
}

impl ParameterLocation {
    /// Parse an OpenAPI `in` value. Unknown values are `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            _ => None,
        }
    }
}

/// A fully dereferenced operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub description: Option<String>,
    pub schema: Value,
}

/// One (path, method) pair of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointSummary {
    pub method: String,
    pub path: String,
    pub operation_id: Option<String>,
    pub summary: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub parameters: Vec<ParameterInfo>,
    pub has_request_body: bool,
    pub request_body_schema: Option<Value>,
    pub request_body_required: bool,
}

/// The result of a successful spec load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadedSpec {
    pub title: String,
    pub version: String,
    pub description: Option<String>,
    pub base_url: Option<String>,
    pub endpoints: Vec<EndpointSummary>,
    pub raw: Document,
    pub source_url: String,
    pub loaded_at: String,
}

/// Failure to retrieve one document.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid document URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("timed out fetching {0}")]
    Timeout(String),

    #[error("failed to fetch {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("failed to parse document: {0}")]
    Parse(String),

    #[error("parsed document is not a mapping")]
    NotAMapping,
}

impl FetchError {
    /// True for failures that happened before a document body was obtained.
    pub fn is_retrieval(&self) -> bool {
        matches!(
            self,
            FetchError::InvalidUrl { .. }
                | FetchError::Timeout(_)
                | FetchError::Transport { .. }
                | FetchError::Status { .. }
        )
    }
}

/// Failure of a whole spec load. Only the root document can cause one.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("{0}")]
    Fetch(FetchError),

    #[error("{0}")]
    Parse(String),
}

impl From<FetchError> for SpecError {
    fn from(err: FetchError) -> Self {
        if err.is_retrieval() {
            SpecError::Fetch(err)
        } else {
            SpecError::Parse(err.to_string())
        }
    }
}
