//! Schema types for floor control API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pal_floor::{FloorSnapshot, RequestOutcome, RoomId};

use crate::floor::RoomSummary;

/// How a floor request was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FloorRequestOutcome {
    Granted,
    Queued,
    AlreadyHolder,
}

/// Response to a floor request. Queued is a success, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct FloorRequestResponse {
    pub outcome: FloorRequestOutcome,
    /// Queue position when queued (1-based).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl From<RequestOutcome> for FloorRequestResponse {
    fn from(outcome: RequestOutcome) -> Self {
        let (outcome, position) = match outcome {
            RequestOutcome::Granted => (FloorRequestOutcome::Granted, None),
            RequestOutcome::Queued { position } => (FloorRequestOutcome::Queued, Some(position)),
            RequestOutcome::AlreadyHolder => (FloorRequestOutcome::AlreadyHolder, None),
        };
        FloorRequestResponse { outcome, position }
    }
}

/// Response after releasing the floor.
#[derive(Debug, Clone, Serialize)]
pub struct FloorReleaseResponse {
    /// Participant who got the floor next, if anyone was waiting.
    pub next_holder: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WithdrawResponse {
    pub success: bool,
}

/// Request to mute or unmute the held microphone.
#[derive(Debug, Clone, Deserialize)]
pub struct MuteRequest {
    pub muted: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MuteResponse {
    pub muted: bool,
}

/// Floor state of one room.
#[derive(Debug, Clone, Serialize)]
pub struct FloorStatusResponse {
    pub room: RoomId,
    #[serde(flatten)]
    pub floor: FloorSnapshot,
}

/// All rooms with an active floor.
#[derive(Debug, Clone, Serialize)]
pub struct ListRoomsResponse {
    pub rooms: Vec<RoomSummary>,
}
