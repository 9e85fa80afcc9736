//! Schema types for participant registration API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use pal_floor::RoomId;

/// Request to register a new participant.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterParticipantRequest {
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Response after successful registration.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterParticipantResponse {
    /// The assigned participant UUID. Send it back as `X-Participant-Id`.
    pub participant_id: Uuid,
    pub name: Option<String>,
    /// Unix seconds.
    pub registered_at: String,
}

/// View of a participant for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ParticipantView {
    pub participant_id: Uuid,
    pub name: Option<String>,
    /// Milliseconds since the last request or heartbeat.
    pub idle_ms: u64,
}

/// Response listing all connected participants.
#[derive(Debug, Clone, Serialize)]
pub struct ListParticipantsResponse {
    pub participants: Vec<ParticipantView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatResponse {
    pub success: bool,
}

/// Response after a participant disconnects.
#[derive(Debug, Clone, Serialize)]
pub struct DisconnectResponse {
    pub success: bool,
    /// Rooms whose floor the participant held or waited for.
    pub released_rooms: Vec<RoomId>,
}
