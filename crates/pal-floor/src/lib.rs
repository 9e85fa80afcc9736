//! Floor control for voice chat rooms.
//!
//! A room has one shared microphone. [`LeaseManager`] grants it to a single
//! participant at a time, queues everyone else in arrival order, and reclaims
//! it when the holder disconnects or holds it past a configured limit.

pub mod clock;
pub mod error;
pub mod event;
pub mod id;
pub mod lease;
pub mod manager;
pub mod queue;

// Re-export commonly used types
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::FloorError;
pub use event::{FloorEvent, GrantReason, NoopNotifier, Notifier, ReleaseReason};
pub use id::{ParticipantId, RoomId};
pub use lease::Lease;
pub use manager::{
    Expiry, FloorSnapshot, ForceReleaseOutcome, LeaseManager, QueuedView, ReleaseOutcome,
    RequestOutcome,
};
pub use queue::{QueueEntry, WaitQueue};
