//! Lease-state-changed notifications.
//!
//! The manager reports every state change to a [`Notifier`] in the order the
//! changes happen. Transports fan these out to everyone in the room.

use serde::{Deserialize, Serialize};

use crate::id::ParticipantId;

/// Why a participant was granted the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantReason {
    /// The floor was free when the participant asked.
    Immediate,
    /// The participant reached the head of the queue.
    Promoted,
}

/// Why a holder lost the floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseReason {
    /// The holder released it.
    Released,
    /// The holder's session ended.
    Disconnected,
    /// The holder kept it past the maximum hold duration.
    Expired,
}

/// A change to one floor's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FloorEvent {
    Granted {
        participant: ParticipantId,
        reason: GrantReason,
    },
    Queued {
        participant: ParticipantId,
        position: usize,
    },
    Released {
        participant: ParticipantId,
        reason: ReleaseReason,
    },
    /// Nobody holds the floor and nobody is waiting.
    Freed,
    /// A queued participant left the queue.
    Withdrawn { participant: ParticipantId },
    MuteChanged {
        participant: ParticipantId,
        muted: bool,
    },
}

/// Receiver of floor events.
pub trait Notifier: Send + Sync {
    fn notify(&self, event: FloorEvent);
}

impl<F> Notifier for F
where
    F: Fn(FloorEvent) + Send + Sync,
{
    fn notify(&self, event: FloorEvent) {
        self(event)
    }
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: FloorEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let id = ParticipantId::new();
        let json = serde_json::to_value(FloorEvent::Released {
            participant: id,
            reason: ReleaseReason::Expired,
        })
        .unwrap();
        assert_eq!(json["type"], "released");
        assert_eq!(json["reason"], "expired");
        assert_eq!(json["participant"], id.to_string());

        let json = serde_json::to_value(FloorEvent::Freed).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "freed" }));
    }
}
