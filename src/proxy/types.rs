//! Proxy request/response value objects and errors.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Default per-call upstream timeout, in seconds.
pub const DEFAULT_TIMEOUT_SECS: f64 = 30.0;

fn default_timeout() -> f64 {
    DEFAULT_TIMEOUT_SECS
}

/// A test request to run against an environment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyRequest {
    pub environment_id: String,
    pub method: String,
    /// Path template, e.g. `/items/{id}`.
    pub path: String,
    #[serde(default)]
    pub path_params: BTreeMap<String, String>,
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Sent as JSON when present.
    #[serde(default)]
    pub body: Option<Value>,
    /// Timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: f64,
}

/// The normalized upstream response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProxyResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    /// Parsed JSON when the upstream declared JSON and it parsed, else text.
    pub body: Value,
    pub duration_ms: f64,
    /// Final URL after redirects.
    pub url: String,
    pub error: Option<String>,
}

/// Why a proxy call produced no response.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Upstream timeout: {0}")]
    Timeout(String),

    #[error("Upstream unreachable: {0}")]
    Connectivity(String),

    #[error("Invalid proxy request: {0}")]
    InvalidRequest(String),
}

impl ProxyError {
    /// Classify a transport error from the upstream call.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProxyError::Timeout(err.to_string())
        } else {
            ProxyError::Connectivity(err.to_string())
        }
    }
}
