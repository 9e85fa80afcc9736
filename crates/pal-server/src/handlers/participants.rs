//! Participant registration and lifecycle handlers.

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;

use pal_floor::ParticipantId;

use crate::error::ApiError;
use crate::handlers::authenticate;
use crate::schema::participants::{
    DisconnectResponse, HeartbeatResponse, ListParticipantsResponse, ParticipantView,
    RegisterParticipantRequest, RegisterParticipantResponse,
};
use crate::session::extract_participant_id;
use crate::state::AppState;

/// `POST /participants`
pub async fn register_participant(
    State(state): State<AppState>,
    Json(req): Json<RegisterParticipantRequest>,
) -> Result<Json<RegisterParticipantResponse>, ApiError> {
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let participant = state.sessions.register(name.clone());

    Ok(Json(RegisterParticipantResponse {
        participant_id: participant.0,
        name,
        registered_at: unix_seconds_now(),
    }))
}

/// `GET /participants`
pub async fn list_participants(
    State(state): State<AppState>,
) -> Result<Json<ListParticipantsResponse>, ApiError> {
    let mut participants = state
        .sessions
        .list()
        .into_iter()
        .map(|session| ParticipantView {
            participant_id: session.id.0,
            name: session.name.clone(),
            idle_ms: state.sessions.idle_for(&session).as_millis() as u64,
        })
        .collect::<Vec<_>>();
    participants.sort_by_key(|p| p.participant_id);

    Ok(Json(ListParticipantsResponse { participants }))
}

/// `POST /participants/heartbeat`
pub async fn heartbeat(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<HeartbeatResponse>, ApiError> {
    authenticate(&state, &headers)?;
    Ok(Json(HeartbeatResponse { success: true }))
}

/// `DELETE /participants/{participant_id}`
///
/// Participants may only disconnect themselves.
pub async fn disconnect_participant(
    State(state): State<AppState>,
    Path(participant_id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<DisconnectResponse>, ApiError> {
    let participant = ParticipantId::parse(&participant_id).ok_or_else(|| {
        ApiError::BadRequest(format!(
            "invalid participant id '{}': expected UUID",
            participant_id
        ))
    })?;

    let caller = extract_participant_id(&headers)?;
    if caller != participant {
        return Err(ApiError::Forbidden(format!(
            "participant {} cannot disconnect {}",
            caller, participant
        )));
    }

    if !state.sessions.deregister(&participant) {
        return Err(ApiError::NotFound(format!(
            "participant {} not found",
            participant
        )));
    }

    let released_rooms = state.floors.disconnect(participant);
    tracing::info!(%participant, "participant disconnected");

    Ok(Json(DisconnectResponse {
        success: true,
        released_rooms,
    }))
}

fn unix_seconds_now() -> String {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    format!("{}", secs)
}
