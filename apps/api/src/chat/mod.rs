// Conversational assistant: one process-wide session, a shared transcript, and a
// single active sender. Independent of the pipeline; the two share no mutable state.

use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::ModelGateway;
use crate::models::ChatMessage;

pub mod handlers;
pub mod prompts;
pub mod session;
pub mod transcript;

use session::{send_stream, ChatSessionManager, Fragment};
use transcript::ChatTranscript;

pub struct ChatService {
    sessions: ChatSessionManager,
    transcript: Arc<RwLock<ChatTranscript>>,
    /// Held for the lifetime of one reply stream.
    sender_slot: Arc<Mutex<()>>,
}

impl ChatService {
    pub fn new(gateway: ModelGateway) -> Self {
        let sessions = ChatSessionManager::new(gateway);
        let transcript = ChatTranscript::opened(sessions.is_mock());
        Self {
            sessions,
            transcript: Arc::new(RwLock::new(transcript)),
            sender_slot: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_mock(&self) -> bool {
        self.sessions.is_mock()
    }

    pub async fn transcript(&self) -> Vec<ChatMessage> {
        self.transcript.read().await.messages().to_vec()
    }

    /// Records `message` and streams the reply, mirroring each fragment into the
    /// transcript. Rejected with `Conflict` while a previous reply is still streaming.
    /// The transcript is completed even if the caller drops the returned stream.
    pub async fn send(&self, message: &str) -> Result<BoxStream<'static, Fragment>, AppError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("message cannot be empty".to_string()));
        }

        let guard = self.sender_slot.clone().try_lock_owned().map_err(|_| {
            AppError::Conflict("A reply is still streaming; wait for it to finish".to_string())
        })?;

        let session = self.sessions.session().await;
        debug!(mock = session.is_mock(), "Sending chat message");
        let bot_id = {
            let mut transcript = self.transcript.write().await;
            transcript.push_user(message);
            transcript.push_bot_placeholder()
        };

        let mut fragments = send_stream(session, message.to_string());
        let transcript = self.transcript.clone();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            while let Some(fragment) = fragments.next().await {
                transcript
                    .write()
                    .await
                    .append_fragment(&bot_id, &fragment.text);
                if tx.send(fragment).is_err() {
                    debug!("Chat client disconnected; finishing reply in the background");
                }
            }
            transcript.write().await.finish(&bot_id);
            // Release the slot before closing the stream so the next send is accepted
            // as soon as the caller observes the end.
            drop(guard);
            drop(tx);
        });

        Ok(UnboundedReceiverStream::new(rx).boxed())
    }
}
