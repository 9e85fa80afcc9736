//! Floor control handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use crate::error::ApiError;
use crate::handlers::{authenticate, parse_room};
use crate::schema::floor::{
    FloorReleaseResponse, FloorRequestResponse, FloorStatusResponse, ListRoomsResponse,
    MuteRequest, MuteResponse, WithdrawResponse,
};
use crate::state::AppState;

/// `GET /rooms`
pub async fn list_rooms(State(state): State<AppState>) -> Result<Json<ListRoomsResponse>, ApiError> {
    Ok(Json(ListRoomsResponse {
        rooms: state.floors.rooms(),
    }))
}

/// `GET /rooms/{room}/floor`
pub async fn floor_status(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<FloorStatusResponse>, ApiError> {
    let room = parse_room(&room)?;
    let floor = state.floors.snapshot(&room);
    Ok(Json(FloorStatusResponse { room, floor }))
}

/// `POST /rooms/{room}/floor/request`
pub async fn request_floor(
    State(state): State<AppState>,
    Path(room): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FloorRequestResponse>, ApiError> {
    let participant = authenticate(&state, &headers)?;
    let room = parse_room(&room)?;

    let outcome = state
        .floors
        .request_if_connected(&room, participant, |p| state.sessions.contains(p))
        .ok_or_else(|| {
            ApiError::NotFound(format!("participant {} disconnected", participant))
        })?;
    tracing::debug!(%room, %participant, ?outcome, "floor requested");

    Ok(Json(outcome.into()))
}

/// `POST /rooms/{room}/floor/release`
pub async fn release_floor(
    State(state): State<AppState>,
    Path(room): Path<String>,
    headers: HeaderMap,
) -> Result<Json<FloorReleaseResponse>, ApiError> {
    let participant = authenticate(&state, &headers)?;
    let room = parse_room(&room)?;

    let outcome = state.floors.release(&room, participant)?;

    Ok(Json(FloorReleaseResponse {
        next_holder: outcome.next_holder.map(|p| p.0),
    }))
}

/// `POST /rooms/{room}/floor/withdraw`
pub async fn withdraw_from_floor(
    State(state): State<AppState>,
    Path(room): Path<String>,
    headers: HeaderMap,
) -> Result<Json<WithdrawResponse>, ApiError> {
    let participant = authenticate(&state, &headers)?;
    let room = parse_room(&room)?;

    state.floors.withdraw(&room, participant)?;

    Ok(Json(WithdrawResponse { success: true }))
}

/// `POST /rooms/{room}/floor/mute`
pub async fn mute_floor(
    State(state): State<AppState>,
    Path(room): Path<String>,
    headers: HeaderMap,
    Json(req): Json<MuteRequest>,
) -> Result<Json<MuteResponse>, ApiError> {
    let participant = authenticate(&state, &headers)?;
    let room = parse_room(&room)?;

    state.floors.set_muted(&room, participant, req.muted)?;

    Ok(Json(MuteResponse { muted: req.muted }))
}
