//! Axum route handlers for the chat assistant.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::ChatMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct TranscriptResponse {
    pub mode: &'static str,
    pub messages: Vec<ChatMessage>,
}

/// GET /api/v1/chat/messages
pub async fn handle_get_transcript(State(state): State<AppState>) -> Json<TranscriptResponse> {
    Json(TranscriptResponse {
        mode: if state.chat.is_mock() { "mock" } else { "live" },
        messages: state.chat.transcript().await,
    })
}

/// POST /api/v1/chat/messages
///
/// Streams the reply as `fragment` events carrying `{"text": ...}`, then one `done`
/// event. Returns 409 while a previous reply is still streaming.
pub async fn handle_send_message(
    State(state): State<AppState>,
    Json(request): Json<SendMessageRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, AppError> {
    let fragments = state.chat.send(&request.message).await?;

    let events = fragments
        .map(|fragment| Event::default().event("fragment").json_data(fragment))
        .chain(stream::once(async {
            Ok(Event::default().event("done").data("[DONE]"))
        }));

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
