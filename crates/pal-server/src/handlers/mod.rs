//! HTTP handler modules for the Pal API.
//!
//! Handlers parse requests, resolve the caller's identity, delegate to the
//! floor or session registries, and return JSON responses. Floor policy
//! lives in `pal-floor`, never here.

use axum::http::HeaderMap;

use pal_floor::{ParticipantId, RoomId};

use crate::error::ApiError;
use crate::session::extract_participant_id;
use crate::state::AppState;

pub mod events;
pub mod floor;
pub mod health;
pub mod participants;

/// Resolves the caller and marks it active.
pub(crate) fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<ParticipantId, ApiError> {
    let participant = extract_participant_id(headers)?;
    if !state.sessions.touch(&participant) {
        return Err(ApiError::NotFound(format!(
            "participant {} is not registered",
            participant
        )));
    }
    Ok(participant)
}

pub(crate) fn parse_room(raw: &str) -> Result<RoomId, ApiError> {
    RoomId::parse(raw).ok_or_else(|| ApiError::BadRequest("room id must not be blank".to_string()))
}
