//! Background reclamation of stale floors and silent sessions.
//!
//! Floor managers hold no timers. This task is the external scheduler that
//! periodically expires over-long leases, disconnects participants whose
//! heartbeats stopped, and drops rooms nobody is using.

use std::time::Duration;

use pal_floor::{Expiry, ParticipantId, RoomId};
use tokio::task::JoinHandle;

use crate::state::AppState;

/// What one sweep pass did.
#[derive(Debug, Default)]
pub struct SweepReport {
    pub expired: Vec<(RoomId, Expiry)>,
    pub disconnected: Vec<ParticipantId>,
    pub pruned_rooms: usize,
}

/// Runs a single sweep pass.
pub fn sweep_once(state: &AppState) -> SweepReport {
    let expired = state.floors.expire_stale(state.config.max_hold);

    let disconnected = state
        .sessions
        .sweep_inactive(state.config.session_timeout);
    for participant in &disconnected {
        let rooms = state.floors.disconnect(*participant);
        tracing::info!(%participant, rooms = rooms.len(), "session timed out");
    }

    let pruned_rooms = state.floors.prune_idle();

    SweepReport {
        expired,
        disconnected,
        pruned_rooms,
    }
}

/// Spawns a background tokio task that sweeps every `sweep_interval`.
pub fn start_sweeper(state: AppState) -> JoinHandle<()> {
    let interval: Duration = state.config.sweep_interval;
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(interval);
        loop {
            tick.tick().await;
            let report = sweep_once(&state);
            if !report.expired.is_empty() || !report.disconnected.is_empty() {
                tracing::info!(
                    "Swept {} stale floor(s) and {} silent participant(s)",
                    report.expired.len(),
                    report.disconnected.len()
                );
            }
        }
    })
}
