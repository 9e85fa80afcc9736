//! HTTP/JSON server for floor control in Pal chat rooms.
//!
//! Participants register to get an identity, then request and release the
//! shared microphone of any room. Floor changes are pushed to listeners over
//! Server-Sent Events. A background sweeper reclaims stale leases and cleans
//! up after participants that stop sending heartbeats.

pub mod config;
pub mod error;
pub mod floor;
pub mod handlers;
pub mod router;
pub mod schema;
pub mod session;
pub mod state;
pub mod sweeper;
