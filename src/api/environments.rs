//! Environment CRUD handlers. Responses never carry secrets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::environment::{EnvironmentCreate, EnvironmentPublic, EnvironmentUpdate};
use crate::http::response::ApiError;
use crate::http::server::AppState;

pub async fn list_environments(State(state): State<AppState>) -> Json<Vec<EnvironmentPublic>> {
    let envs = state.store.list().await;
    Json(envs.iter().map(|e| e.to_public()).collect())
}

pub async fn create_environment(
    State(state): State<AppState>,
    Json(body): Json<EnvironmentCreate>,
) -> Result<(StatusCode, Json<EnvironmentPublic>), ApiError> {
    let env = state.store.create(body).await?;
    tracing::info!(environment_id = %env.id, name = %env.name, "Environment created");
    Ok((StatusCode::CREATED, Json(env.to_public())))
}

pub async fn get_environment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EnvironmentPublic>, ApiError> {
    match state.store.get(&id).await {
        Some(env) => Ok(Json(env.to_public())),
        None => Err(ApiError::EnvironmentNotFound(id)),
    }
}

pub async fn update_environment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<EnvironmentUpdate>,
) -> Result<Json<EnvironmentPublic>, ApiError> {
    match state.store.update(&id, body).await? {
        Some(env) => {
            tracing::info!(environment_id = %env.id, "Environment updated");
            Ok(Json(env.to_public()))
        }
        None => Err(ApiError::EnvironmentNotFound(id)),
    }
}

pub async fn delete_environment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    if state.store.delete(&id).await? {
        tracing::info!(environment_id = %id, "Environment deleted");
        Ok(Json(json!({ "deleted": true })))
    } else {
        Err(ApiError::EnvironmentNotFound(id))
    }
}
