//! Axum router construction for the per-agent surface.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router for one agent's HTTP surface.
///
/// CORS allows any origin so a dashboard can read every agent directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/pheromones", get(handlers::get_pheromones))
        .route("/pheromone", post(handlers::post_pheromone))
        .route("/thoughts", get(handlers::get_thoughts))
        .route("/identity", get(handlers::get_identity))
        .route("/attestation", get(handlers::get_attestation))
        .route("/collective", get(handlers::get_collective))
        .route("/health", get(handlers::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
