use serde::Serialize;

use crate::gemini::Content;
use crate::models::{ChatMessage, ChatReply, GeoPosition};

pub const GREETING: &str =
    "你好！我是你的台北旅遊 AI 助手。想知道哪裡好玩、好吃的，或是交通資訊都可以問我喔！";

pub const CHAT_FAILURE_APOLOGY: &str = "抱歉，我現在遇到了一點連線問題，請稍後再試。";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnRejected {
    EmptyMessage,
    Busy,
}

/// A turn accepted by [`ChatSession::begin_turn`]
#[derive(Debug, Clone, PartialEq)]
pub struct PendingTurn {
    pub message: String,
    /// Every turn before the new user message, in backend format
    pub history: Vec<Content>,
    pub location: Option<GeoPosition>,
}

/// Append-only conversation for one chat panel.
///
/// Location is fixed when the session is created. Only one turn may be
/// outstanding at a time.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    location: Option<GeoPosition>,
    loading: bool,
}

impl ChatSession {
    pub fn new(location: Option<GeoPosition>) -> Self {
        Self {
            messages: vec![ChatMessage::model(GREETING, Vec::new())],
            location,
            loading: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn location(&self) -> Option<GeoPosition> {
        self.location
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn history(&self) -> Vec<Content> {
        self.messages
            .iter()
            .map(|m| Content::turn(m.role, m.content.clone()))
            .collect()
    }

    pub fn begin_turn(&mut self, input: &str) -> Result<PendingTurn, TurnRejected> {
        if input.trim().is_empty() {
            return Err(TurnRejected::EmptyMessage);
        }
        if self.loading {
            return Err(TurnRejected::Busy);
        }

        // History is captured before the user message is appended
        let history = self.history();
        self.messages.push(ChatMessage::user(input));
        self.loading = true;

        Ok(PendingTurn {
            message: input.to_string(),
            history,
            location: self.location,
        })
    }

    /// Appends the answer, or the apology on failure, and reopens the session
    pub fn finish_turn<E: std::fmt::Display>(&mut self, outcome: Result<ChatReply, E>) -> &ChatMessage {
        let message = match outcome {
            Ok(reply) => ChatMessage::model(reply.text, reply.urls),
            Err(e) => {
                tracing::warn!("Chat turn failed, showing apology: {}", e);
                ChatMessage::model(CHAT_FAILURE_APOLOGY, Vec::new())
            }
        };
        self.messages.push(message);
        self.loading = false;
        &self.messages[self.messages.len() - 1]
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new(None)
    }
}
