//! Per-room floor registry.
//!
//! [`FloorRegistry`] keeps one [`LeaseManager`] per room in a `DashMap`. A
//! room's manager is only ever touched through its map entry, which makes
//! the entry lock the single serialization point for that room's floor.
//! Each room also owns a broadcast channel that carries its [`RoomEvent`]s to
//! any number of listeners.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::broadcast;

use pal_floor::{
    Clock, Expiry, FloorError, FloorEvent, FloorSnapshot, ForceReleaseOutcome, LeaseManager,
    ParticipantId, ReleaseOutcome, RequestOutcome, RoomId,
};

/// A floor event tagged with the room it happened in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoomEvent {
    pub room: RoomId,
    #[serde(flatten)]
    pub event: FloorEvent,
}

/// Sender half of a room's event channel.
pub type RoomEventBroadcast = broadcast::Sender<RoomEvent>;

struct RoomFloor {
    manager: LeaseManager,
    events: RoomEventBroadcast,
}

/// Summary line for one active room.
#[derive(Debug, Clone, Serialize)]
pub struct RoomSummary {
    pub room: RoomId,
    pub holder: Option<ParticipantId>,
    pub waiting: usize,
}

/// All floors known to the server.
pub struct FloorRegistry {
    rooms: DashMap<RoomId, RoomFloor>,
    clock: Arc<dyn Clock>,
    event_buffer: usize,
}

impl FloorRegistry {
    pub fn new(clock: Arc<dyn Clock>, event_buffer: usize) -> Self {
        FloorRegistry {
            rooms: DashMap::new(),
            clock,
            event_buffer: event_buffer.max(1),
        }
    }

    fn open_room(&self, room: &RoomId) -> RoomFloor {
        let (events, _) = broadcast::channel(self.event_buffer);
        let sender = events.clone();
        let tag = room.clone();
        let notifier = move |event: FloorEvent| {
            let receivers = sender
                .send(RoomEvent {
                    room: tag.clone(),
                    event,
                })
                .unwrap_or(0);
            tracing::trace!(room = %tag, receivers, "floor event published");
        };

        tracing::debug!(%room, "opening floor");
        RoomFloor {
            manager: LeaseManager::new(Arc::clone(&self.clock), notifier),
            events,
        }
    }

    /// Runs `f` against the room's manager, opening the room if needed.
    fn with_floor<R>(&self, room: &RoomId, f: impl FnOnce(&mut LeaseManager) -> R) -> R {
        let mut entry = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| self.open_room(room));
        f(&mut entry.manager)
    }

    pub fn request(&self, room: &RoomId, participant: ParticipantId) -> RequestOutcome {
        self.with_floor(room, |floor| floor.request(participant))
    }

    /// Like [`request`](Self::request), but only if `is_connected` still
    /// holds while the room is locked. Returns `None` for a departed
    /// participant.
    ///
    /// Sessions are removed before [`disconnect`](Self::disconnect) walks the
    /// rooms, so a session seen here is either cleared by that walk or was
    /// never removed.
    pub fn request_if_connected(
        &self,
        room: &RoomId,
        participant: ParticipantId,
        is_connected: impl FnOnce(&ParticipantId) -> bool,
    ) -> Option<RequestOutcome> {
        self.with_floor(room, |floor| {
            is_connected(&participant).then(|| floor.request(participant))
        })
    }

    pub fn release(
        &self,
        room: &RoomId,
        participant: ParticipantId,
    ) -> Result<ReleaseOutcome, FloorError> {
        match self.rooms.get_mut(room) {
            Some(mut entry) => entry.manager.release(participant),
            None => Err(FloorError::NotHolder {
                participant,
                holder: None,
            }),
        }
    }

    pub fn withdraw(&self, room: &RoomId, participant: ParticipantId) -> Result<(), FloorError> {
        match self.rooms.get_mut(room) {
            Some(mut entry) => entry.manager.withdraw(participant),
            None => Err(FloorError::NotQueued { participant }),
        }
    }

    pub fn set_muted(
        &self,
        room: &RoomId,
        participant: ParticipantId,
        muted: bool,
    ) -> Result<(), FloorError> {
        match self.rooms.get_mut(room) {
            Some(mut entry) => entry.manager.set_muted(participant, muted),
            None => Err(FloorError::NotHolder {
                participant,
                holder: None,
            }),
        }
    }

    /// Current state of a room's floor. Unknown rooms are simply free.
    pub fn snapshot(&self, room: &RoomId) -> FloorSnapshot {
        match self.rooms.get(room) {
            Some(entry) => entry.manager.snapshot(),
            None => FloorSnapshot {
                holder: None,
                held_for_ms: None,
                muted: false,
                queue: Vec::new(),
            },
        }
    }

    /// Starts listening to a room's floor events.
    pub fn subscribe(&self, room: &RoomId) -> broadcast::Receiver<RoomEvent> {
        let entry = self
            .rooms
            .entry(room.clone())
            .or_insert_with(|| self.open_room(room));
        entry.events.subscribe()
    }

    /// Clears `participant` from every floor. Returns the rooms it held or
    /// waited in.
    pub fn disconnect(&self, participant: ParticipantId) -> Vec<RoomId> {
        let mut affected = Vec::new();
        for mut entry in self.rooms.iter_mut() {
            match entry.manager.force_release(participant) {
                ForceReleaseOutcome::NotPresent => {}
                ForceReleaseOutcome::WasHolder { .. } | ForceReleaseOutcome::WasQueued => {
                    affected.push(entry.key().clone());
                }
            }
        }
        affected.sort();
        if !affected.is_empty() {
            tracing::info!(%participant, rooms = ?affected, "cleared disconnected participant from floors");
        }
        affected
    }

    /// Reclaims every floor held longer than `max_hold`.
    pub fn expire_stale(&self, max_hold: Duration) -> Vec<(RoomId, Expiry)> {
        let now = self.clock.now();
        let mut expired = Vec::new();
        for mut entry in self.rooms.iter_mut() {
            if let Some(expiry) = entry.manager.expire_if_stale(now, max_hold) {
                expired.push((entry.key().clone(), expiry));
            }
        }
        expired.sort_by(|a, b| a.0.cmp(&b.0));
        expired
    }

    /// Drops rooms nobody holds, waits for, or listens to.
    pub fn prune_idle(&self) -> usize {
        let before = self.rooms.len();
        self.rooms
            .retain(|_, floor| !(floor.manager.is_idle() && floor.events.receiver_count() == 0));
        before - self.rooms.len()
    }

    /// Active rooms, sorted by id.
    pub fn rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .rooms
            .iter()
            .map(|entry| RoomSummary {
                room: entry.key().clone(),
                holder: entry.manager.holder(),
                waiting: entry.manager.queue().len(),
            })
            .collect();
        rooms.sort_by(|a, b| a.room.cmp(&b.room));
        rooms
    }
}
