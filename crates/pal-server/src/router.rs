//! Router assembly for the Pal HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax.
/// CORS is permissive; the web client is served from a different origin.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        // Participants
        .route(
            "/participants",
            get(handlers::participants::list_participants)
                .post(handlers::participants::register_participant),
        )
        .route(
            "/participants/heartbeat",
            post(handlers::participants::heartbeat),
        )
        .route(
            "/participants/{participant_id}",
            delete(handlers::participants::disconnect_participant),
        )
        // Floors
        .route("/rooms", get(handlers::floor::list_rooms))
        .route("/rooms/{room}/floor", get(handlers::floor::floor_status))
        .route(
            "/rooms/{room}/floor/request",
            post(handlers::floor::request_floor),
        )
        .route(
            "/rooms/{room}/floor/release",
            post(handlers::floor::release_floor),
        )
        .route(
            "/rooms/{room}/floor/withdraw",
            post(handlers::floor::withdraw_from_floor),
        )
        .route("/rooms/{room}/floor/mute", post(handlers::floor::mute_floor))
        .route(
            "/rooms/{room}/floor/events",
            get(handlers::events::floor_events),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
