//! The granted lease itself.

use std::time::{Duration, Instant};

use crate::id::ParticipantId;

/// An outstanding grant of the floor.
///
/// A free floor is represented as `Option<Lease>::None`, so a lease always
/// has a holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    /// Participant currently holding the floor.
    pub holder: ParticipantId,
    /// When the grant happened. Expiry is measured from here.
    pub acquired_at: Instant,
    /// Whether the holder has muted their microphone.
    pub muted: bool,
}

impl Lease {
    pub fn new(holder: ParticipantId, acquired_at: Instant) -> Self {
        Lease {
            holder,
            acquired_at,
            muted: false,
        }
    }

    /// How long the lease has been held as of `now`. Zero if `now` is earlier
    /// than the grant.
    pub fn held_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.acquired_at)
    }

    /// True once the lease has been held strictly longer than `max_hold`.
    pub fn is_stale(&self, now: Instant, max_hold: Duration) -> bool {
        self.held_for(now) > max_hold
    }
}
