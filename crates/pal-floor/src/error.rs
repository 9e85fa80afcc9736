//! Floor control errors.
//!
//! None of these are fatal. Each is reported to the caller that caused it
//! and leaves the floor state untouched.

use thiserror::Error;

use crate::id::ParticipantId;

/// Errors produced by [`LeaseManager`](crate::LeaseManager) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FloorError {
    /// The participant tried to act as holder without holding the floor.
    #[error("participant {participant} does not hold the floor")]
    NotHolder {
        participant: ParticipantId,
        holder: Option<ParticipantId>,
    },

    /// The participant tried to leave a queue it is not waiting in.
    #[error("participant {participant} is not waiting for the floor")]
    NotQueued { participant: ParticipantId },
}
