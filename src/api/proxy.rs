use axum::{extract::State, Json};

use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::proxy::{ProxyRequest, ProxyResponse};

/// Run one test request against a stored environment.
pub async fn execute(
    State(state): State<AppState>,
    Json(request): Json<ProxyRequest>,
) -> Result<Json<ProxyResponse>, ApiError> {
    let env = state
        .store
        .get(&request.environment_id)
        .await
        .ok_or_else(|| ApiError::EnvironmentNotFound(request.environment_id.clone()))?;

    let response = state.proxy.execute(&request, &env).await?;
    Ok(Json(response))
}
