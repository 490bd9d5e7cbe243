//! Chat Session Manager.
//!
//! One session per process, created on first use and reused for every message.
//! A `Live` session keeps the turn history and replays it to the backend on each
//! send; a `Mock` session echoes the message without touching the network.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, OnceCell};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

use crate::chat::prompts::persona;
use crate::llm_client::{ChatTurn, LlmError, ModelBackend, ModelGateway};

/// Turns replayed to the backend on each send (20 exchanges). Older turns are dropped
/// so a long-lived session stays inside the model's context window.
pub const MAX_HISTORY_TURNS: usize = 40;

/// Final fragment of a stream that failed or produced nothing.
pub const CHAT_ERROR_TEXT: &str = "Sorry, I encountered an error. Please try again.";

/// One incremental piece of a streamed reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fragment {
    pub text: String,
}

impl Fragment {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

pub struct LiveSession {
    backend: Arc<dyn ModelBackend>,
    system_instruction: String,
    /// Most recent completed exchanges, at most `MAX_HISTORY_TURNS`. Held for the
    /// whole send, so sends on one session never interleave.
    history: Mutex<Vec<ChatTurn>>,
}

impl LiveSession {
    fn new(backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            backend,
            system_instruction: persona(),
            history: Mutex::new(Vec::new()),
        }
    }

    async fn stream_into(&self, message: &str, tx: &mpsc::UnboundedSender<Fragment>) {
        let mut history = self.history.lock().await;
        let mut reply = String::new();

        let outcome = async {
            let mut deltas = self
                .backend
                .stream_chat(&self.system_instruction, &history, message)
                .await?;
            while let Some(delta) = deltas.next().await {
                let delta = delta?;
                if delta.is_empty() {
                    continue;
                }
                reply.push_str(&delta);
                if tx.send(Fragment::new(delta)).is_err() {
                    debug!("Chat consumer went away mid-stream");
                    break;
                }
            }
            Ok::<(), LlmError>(())
        }
        .await;

        match outcome {
            Ok(()) if !reply.is_empty() => {
                history.push(ChatTurn::user(message));
                history.push(ChatTurn::model(reply));
                let excess = history.len().saturating_sub(MAX_HISTORY_TURNS);
                if excess > 0 {
                    history.drain(..excess);
                    debug!("Dropped {excess} oldest chat turns");
                }
            }
            Ok(()) => {
                warn!("Chat stream ended without any text");
                let _ = tx.send(Fragment::new(CHAT_ERROR_TEXT));
            }
            Err(e) => {
                warn!("Chat stream failed: {e}");
                let _ = tx.send(Fragment::new(CHAT_ERROR_TEXT));
            }
        }
    }

    #[cfg(test)]
    pub async fn turns(&self) -> usize {
        self.history.lock().await.len()
    }
}

pub enum ChatSession {
    Live(LiveSession),
    Mock,
}

impl ChatSession {
    pub fn is_mock(&self) -> bool {
        matches!(self, ChatSession::Mock)
    }
}

/// Owns the process-wide session. Created lazily on the first `session()` call.
pub struct ChatSessionManager {
    gateway: ModelGateway,
    session: OnceCell<Arc<ChatSession>>,
}

impl ChatSessionManager {
    pub fn new(gateway: ModelGateway) -> Self {
        Self {
            gateway,
            session: OnceCell::new(),
        }
    }

    /// Whether the session is (or will be) a mock one.
    pub fn is_mock(&self) -> bool {
        !self.gateway.is_available()
    }

    pub async fn session(&self) -> Arc<ChatSession> {
        self.session
            .get_or_init(|| async {
                match self.gateway.backend() {
                    Some(backend) => {
                        info!("Chat session created");
                        Arc::new(ChatSession::Live(LiveSession::new(backend)))
                    }
                    None => {
                        info!("Chat session created in mock mode");
                        Arc::new(ChatSession::Mock)
                    }
                }
            })
            .await
            .clone()
    }
}

/// Sends `message` on `session` and returns its reply as fragments.
///
/// The stream is finite and always yields at least one fragment: on failure the
/// last fragment is `CHAT_ERROR_TEXT`. History is recorded only for replies that
/// completed without error.
pub fn send_stream(session: Arc<ChatSession>, message: String) -> BoxStream<'static, Fragment> {
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        match &*session {
            ChatSession::Mock => {
                let _ = tx.send(Fragment::new(format!("Mock response to: {message}")));
            }
            ChatSession::Live(live) => live.stream_into(&message, &tx).await,
        }
    });

    UnboundedReceiverStream::new(rx).boxed()
}
