//! Spec load / inspect / clear handlers.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::spec::LoadedSpec;

#[derive(Debug, Deserialize)]
pub struct SpecLoadRequest {
    pub url: String,
    #[serde(default)]
    pub environment_id: Option<String>,
}

/// Load a spec and make it current. On failure the previous spec stays.
pub async fn load_spec(
    State(state): State<AppState>,
    Json(body): Json<SpecLoadRequest>,
) -> Result<Json<Arc<LoadedSpec>>, ApiError> {
    let environment = match &body.environment_id {
        Some(id) => Some(
            state
                .store
                .get(id)
                .await
                .ok_or_else(|| ApiError::EnvironmentNotFound(id.clone()))?,
        ),
        None => None,
    };

    let spec = state.pipeline.load(&body.url, environment.as_ref()).await?;
    Ok(Json(state.specs.replace(spec)))
}

pub async fn current_spec(State(state): State<AppState>) -> Response {
    match state.specs.current() {
        Some(spec) => Json(spec).into_response(),
        None => Json(json!({ "loaded": false })).into_response(),
    }
}

pub async fn clear_spec(State(state): State<AppState>) -> Json<Value> {
    state.specs.clear();
    tracing::info!("Spec cleared");
    Json(json!({ "cleared": true }))
}
