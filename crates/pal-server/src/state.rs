//! Shared application state for the HTTP server.
//!
//! [`AppState`] is cheap to clone: everything inside is behind an `Arc`.
//! Floors and sessions are each internally synchronized with `DashMap`, so
//! handlers never hold a server-wide lock.

use std::sync::Arc;

use pal_floor::{Clock, SystemClock};

use crate::config::ServerConfig;
use crate::floor::FloorRegistry;
use crate::session::SessionRegistry;

/// Shared application state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Per-room floor managers.
    pub floors: Arc<FloorRegistry>,
    /// Connected participants.
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Creates state backed by the system clock.
    pub fn new(config: ServerConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates state that reads time from `clock` (tests pass a manual clock).
    pub fn with_clock(config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let floors = Arc::new(FloorRegistry::new(Arc::clone(&clock), config.event_buffer));
        let sessions = Arc::new(SessionRegistry::new(clock));

        AppState {
            config: Arc::new(config),
            floors,
            sessions,
        }
    }
}
