//! Server-Sent Events stream of a room's floor changes.
//!
//! Every listener gets its own broadcast receiver. A listener that falls
//! behind skips the events it missed and carries on; it can always fetch
//! the current state from `GET /rooms/{room}/floor`.

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::{self, Stream};
use tokio::sync::broadcast::error::RecvError;

use crate::error::ApiError;
use crate::handlers::parse_room;
use crate::state::AppState;

/// `GET /rooms/{room}/floor/events`
pub async fn floor_events(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let room = parse_room(&room)?;
    let rx = state.floors.subscribe(&room);
    tracing::debug!(%room, "floor event listener attached");

    let stream = stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    let data = match serde_json::to_string(&event) {
                        Ok(data) => data,
                        Err(e) => {
                            tracing::error!("failed to serialize floor event: {:?}", e);
                            continue;
                        }
                    };
                    let event = Event::default().event("floor").data(data);
                    return Some((Ok::<Event, axum::Error>(event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "floor event listener lagged");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
