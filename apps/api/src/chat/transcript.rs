//! Append-only chat transcript shown to the user.

use crate::catalog::{ASSISTANT_AVATAR_URL, ASSISTANT_NAME, ORGANIZATION_SHORT_NAME};
use crate::chat::session::CHAT_ERROR_TEXT;
use crate::models::{ChatMessage, Sender};

pub const GREETING_ID: &str = "initial-greeting";
/// Text of a bot message before its first fragment arrives.
pub const PLACEHOLDER_TEXT: &str = "...";
pub const MOCK_NOTICE: &str =
    "Chatbot is in mock mode as API key is not configured. Responses will be simulated.";

#[derive(Debug, Clone)]
pub struct ChatTranscript {
    messages: Vec<ChatMessage>,
    next_id: u64,
    /// Id of the bot message still showing the placeholder.
    placeholder: Option<String>,
}

impl ChatTranscript {
    /// Opens with a greeting from the assistant, or a system notice in mock mode.
    pub fn opened(mock: bool) -> Self {
        let first = if mock {
            ChatMessage::new(GREETING_ID, Sender::System, MOCK_NOTICE)
        } else {
            ChatMessage::new(
                GREETING_ID,
                Sender::Bot,
                format!(
                    "Hello! I'm {ASSISTANT_NAME}, your AI HR assistant from {ORGANIZATION_SHORT_NAME}. How can I help you with your career path today?"
                ),
            )
            .with_avatar(ASSISTANT_AVATAR_URL)
        };

        Self {
            messages: vec![first],
            next_id: 0,
            placeholder: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    fn issue_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}-{}", self.next_id)
    }

    pub fn push_user(&mut self, text: &str) -> String {
        let id = self.issue_id("user");
        self.messages
            .push(ChatMessage::new(id.clone(), Sender::User, text));
        id
    }

    /// Adds the bot message that the next reply will stream into.
    pub fn push_bot_placeholder(&mut self) -> String {
        let id = self.issue_id("bot");
        self.messages.push(
            ChatMessage::new(id.clone(), Sender::Bot, PLACEHOLDER_TEXT)
                .with_avatar(ASSISTANT_AVATAR_URL),
        );
        self.placeholder = Some(id.clone());
        id
    }

    /// Grows message `id` by one fragment. The first fragment replaces the placeholder.
    pub fn append_fragment(&mut self, id: &str, fragment: &str) {
        let Some(message) = self.messages.iter_mut().rev().find(|m| m.id == id) else {
            return;
        };
        if self.placeholder.as_deref() == Some(id) {
            message.text.clear();
            self.placeholder = None;
        }
        message.text.push_str(fragment);
    }

    /// Closes the reply to `id`. A message that never received a fragment
    /// shows the apology instead of the placeholder.
    pub fn finish(&mut self, id: &str) {
        if self.placeholder.as_deref() == Some(id) {
            self.append_fragment(id, CHAT_ERROR_TEXT);
        }
    }
}
