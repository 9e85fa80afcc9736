//! Participant session management.
//!
//! [`SessionRegistry`] is the session boundary for floor control: it mints
//! participant identities on connect and decides when a participant has gone
//! away (explicit disconnect or heartbeat timeout). Whoever removes a session
//! is responsible for telling the floors via
//! [`FloorRegistry::disconnect`](crate::floor::FloorRegistry::disconnect).

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use pal_floor::{Clock, ParticipantId};

use crate::error::ApiError;

/// Header carrying the caller's participant id.
pub const PARTICIPANT_HEADER: &str = "X-Participant-Id";

/// Extracts the participant ID from the `X-Participant-Id` HTTP header.
///
/// Returns `ApiError::ParticipantRequired` if the header is missing or malformed.
pub fn extract_participant_id(headers: &axum::http::HeaderMap) -> Result<ParticipantId, ApiError> {
    headers
        .get(PARTICIPANT_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(ParticipantId::parse)
        .ok_or_else(|| {
            ApiError::ParticipantRequired(format!("{PARTICIPANT_HEADER} header required"))
        })
}

/// An active participant session with metadata.
#[derive(Debug, Clone)]
pub struct ParticipantSession {
    pub id: ParticipantId,
    /// Optional display name.
    pub name: Option<String>,
    pub registered_at: Instant,
    /// Last request or heartbeat.
    pub last_active: Instant,
}

/// Registry of connected participants.
///
/// Backed by `DashMap` for concurrent access from multiple handler tasks.
pub struct SessionRegistry {
    sessions: DashMap<ParticipantId, ParticipantSession>,
    clock: Arc<dyn Clock>,
}

impl SessionRegistry {
    /// Creates a new empty registry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        SessionRegistry {
            sessions: DashMap::new(),
            clock,
        }
    }

    /// Registers a new participant, returning its assigned ID.
    pub fn register(&self, name: Option<String>) -> ParticipantId {
        let id = ParticipantId::new();
        let now = self.clock.now();
        self.sessions.insert(
            id,
            ParticipantSession {
                id,
                name,
                registered_at: now,
                last_active: now,
            },
        );
        tracing::info!(participant = %id, "participant registered");
        id
    }

    /// Removes a session. Returns `true` if it existed.
    pub fn deregister(&self, id: &ParticipantId) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<ParticipantSession> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.sessions.contains_key(id)
    }

    pub fn list(&self) -> Vec<ParticipantSession> {
        self.sessions.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Refreshes `last_active`. Returns `false` for unknown participants.
    pub fn touch(&self, id: &ParticipantId) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.last_active = self.clock.now();
                true
            }
            None => false,
        }
    }

    /// How long since the participant was last heard from.
    pub fn idle_for(&self, session: &ParticipantSession) -> Duration {
        self.clock
            .now()
            .saturating_duration_since(session.last_active)
    }

    /// Removes sessions that have been inactive longer than `timeout`.
    ///
    /// Returns the removed participant IDs.
    pub fn sweep_inactive(&self, timeout: Duration) -> Vec<ParticipantId> {
        let now = self.clock.now();
        let mut removed = Vec::new();
        self.sessions.retain(|id, session| {
            let active = now.saturating_duration_since(session.last_active) <= timeout;
            if !active {
                removed.push(*id);
            }
            active
        });
        removed
    }
}
