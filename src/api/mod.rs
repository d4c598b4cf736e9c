//! JSON API routes.
//!
//! # Routes
//! ```text
//! GET    /health
//! GET    /api/info
//! GET    /api/environments          POST /api/environments
//! GET    /api/environments/{id}     PUT  /api/environments/{id}   DELETE
//! POST   /api/spec/load
//! GET    /api/spec                  DELETE /api/spec
//! POST   /api/proxy/execute
//! ```

pub mod environments;
pub mod proxy;
pub mod spec;
pub mod system;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/api/info", get(system::info))
        .route(
            "/api/environments",
            get(environments::list_environments).post(environments::create_environment),
        )
        .route(
            "/api/environments/{id}",
            get(environments::get_environment)
                .put(environments::update_environment)
                .delete(environments::delete_environment),
        )
        .route("/api/spec/load", post(spec::load_spec))
        .route("/api/spec", get(spec::current_spec).delete(spec::clear_spec))
        .route("/api/proxy/execute", post(proxy::execute))
        .with_state(state)
}
