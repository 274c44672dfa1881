use crate::auth::CurrentUser;
use crate::state::AppState;
use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::{Stream, StreamExt};
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;

/// GET /v1/rides/events
/// Server-sent stream of ride lifecycle events. Payloads carry ids and
/// timestamps only; OTPs are never on this channel.
pub async fn stream_ride_events(
    State(state): State<AppState>,
    _user: CurrentUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events_tx.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => match Event::default().event(event.kind()).json_data(&event) {
                Ok(sse_event) => Some(Ok::<Event, Infallible>(sse_event)),
                Err(err) => {
                    tracing::warn!("failed to serialize ride event: {}", err);
                    None
                }
            },
            // Receiver lagged behind the channel; drop the gap and resume.
            Err(_) => None,
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
