use axum::{
    extract::State,
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

use crate::metrics::SSE_CONNECTIONS_ACTIVE;
use crate::models::session::SessionSnapshot;
use crate::models::timer::TimerEvent;
use crate::services::AppState;

pub const SNAPSHOT_EVENT: &str = "snapshot";

/// GET /api/v1/session/stream
///
/// Sends the current snapshot right away, then one `snapshot` event per
/// published change (selection, answers, every countdown tick, expiry).
/// The running countdown is interleaved as `timer-tick` / `time-expired`
/// events.
pub async fn session_stream(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    tracing::info!("Client connected to session stream");
    let snapshots = snapshot_stream(state.session.subscribe());
    let timer = timer_stream(state.session.subscribe_timer());
    Sse::new(stream::select(snapshots, timer)).keep_alive(KeepAlive::default())
}

/// Decrements the active-stream gauge when the client goes away.
struct ConnectionGuard;

impl ConnectionGuard {
    fn open() -> Self {
        SSE_CONNECTIONS_ACTIVE.inc();
        ConnectionGuard
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        SSE_CONNECTIONS_ACTIVE.dec();
        tracing::debug!("Session stream closed");
    }
}

fn snapshot_stream(
    mut updates: watch::Receiver<SessionSnapshot>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    // the value present at subscription time counts as unseen
    updates.mark_changed();

    stream::unfold(
        (updates, ConnectionGuard::open()),
        |(mut updates, guard)| async move {
            // dispatcher gone: end the stream
            updates.changed().await.ok()?;
            let snapshot = updates.borrow_and_update().clone();
            Some((Ok(snapshot_event(&snapshot)), (updates, guard)))
        },
    )
}

fn timer_stream(
    events: broadcast::Receiver<TimerEvent>,
) -> impl Stream<Item = Result<Event, Infallible>> {
    stream::unfold(events, |mut events| async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    let frame = Event::default()
                        .event(event.event_name())
                        .data(event.to_sse_data());
                    return Some((Ok(frame), events));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Session stream lagging, skipped {} timer events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
}

fn snapshot_event(snapshot: &SessionSnapshot) -> Event {
    let data = serde_json::to_string(snapshot).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(SNAPSHOT_EVENT).data(data)
}
