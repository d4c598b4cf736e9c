//! Error-to-response mapping at the HTTP boundary.
//!
//! # Design Decisions
//! - Every failure body is `{"detail": "<message>"}`
//! - Root spec fetch failures are 502, parse failures 422
//! - Upstream timeouts are 504, unreachable upstreams 502
//! - Persistence failures are 500 and logged; the detail stays generic

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::environment::StoreError;
use crate::proxy::ProxyError;
use crate::spec::SpecError;

/// Errors a handler can return.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Environment not found: {0}")]
    EnvironmentNotFound(String),

    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Proxy(#[from] ProxyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EnvironmentNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Spec(SpecError::Fetch(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Spec(SpecError::Parse(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Proxy(ProxyError::Timeout(_)) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Proxy(ProxyError::Connectivity(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Proxy(ProxyError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Spec(SpecError::Fetch(e)) => format!("Failed to fetch spec: {e}"),
            ApiError::Spec(SpecError::Parse(e)) => format!("Failed to parse spec: {e}"),
            ApiError::Store(_) => "Failed to persist environments".to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Store(e) = &self {
            tracing::error!(error = %e, "Environment store write failed");
        }
        (self.status(), Json(json!({ "detail": self.detail() }))).into_response()
    }
}
