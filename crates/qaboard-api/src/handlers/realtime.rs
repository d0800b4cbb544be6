//! Event stream endpoint and status action.

use std::convert::Infallible;
use std::sync::Arc;
use std::task::Poll;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use chrono::Utc;
use futures::Stream;
use tokio::sync::mpsc;
use tracing::warn;

use qaboard_core::error::AppError;
use qaboard_realtime::message::StreamMessage;
use qaboard_realtime::registry::ConnectionRegistry;

use crate::dto::request::{RealtimeActionRequest, RealtimeQuery};
use crate::dto::response::RealtimeStatusResponse;
use crate::state::AppState;

/// Unregisters the connection when the response stream is dropped.
struct StreamGuard {
    registry: Arc<ConnectionRegistry>,
    connection_id: String,
    receiver: mpsc::Receiver<StreamMessage>,
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.registry.unregister(&self.connection_id);
    }
}

/// GET /api/realtime?token=...
///
/// Opens a server-sent event stream. Auth is by JWT alone: the stream
/// only ever carries broadcasts every logged-in user may see, and tying
/// stream liveness to session liveness is the client agent's job through
/// its revalidation calls.
pub async fn stream(
    State(state): State<AppState>,
    Query(query): Query<RealtimeQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let claims = state.jwt_decoder.decode_token(&query.token)?;

    // First viewer in this process starts the shared listener.
    state.bridge.ensure_listening().await?;

    let (connection_id, receiver) = state.registry.register(claims.sub, Utc::now());

    let mut guard = StreamGuard {
        registry: Arc::clone(&state.registry),
        connection_id,
        receiver,
    };

    let stream = futures::stream::poll_fn(move |cx| match guard.receiver.poll_recv(cx) {
        Poll::Ready(Some(message)) => {
            let event = Event::default().json_data(&message).unwrap_or_else(|e| {
                warn!(error = %e, "Failed to serialize stream message");
                Event::default().comment("serialization failure")
            });
            Poll::Ready(Some(Ok(event)))
        }
        Poll::Ready(None) => Poll::Ready(None),
        Poll::Pending => Poll::Pending,
    });

    Ok(Sse::new(stream))
}

/// POST /api/realtime
///
/// Status action for monitoring: how many streams this process holds and
/// whether the notification listener is up.
pub async fn action(
    State(state): State<AppState>,
    Json(req): Json<RealtimeActionRequest>,
) -> Result<Json<RealtimeStatusResponse>, AppError> {
    if req.action != "status" {
        return Err(AppError::validation(format!(
            "Unsupported action: {}",
            req.action
        )));
    }

    Ok(Json(RealtimeStatusResponse {
        connections: state.registry.connection_count(),
        is_listening: state.bridge.is_listening(),
        timestamp: Utc::now(),
    }))
}
