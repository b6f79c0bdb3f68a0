use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ExplorerError, Result};
use crate::models::ChatMessage;
use crate::session::TurnRejected;

/// Parameters for the tp_chat tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TpChatParams {
    #[schemars(description = "Question for the Taipei travel assistant")]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    /// True when the backend failed and the apology was shown instead
    pub degraded: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatHistoryResponse {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
    pub location_grounding: bool,
}

/// Trait for assistant chat operations
pub trait ChatHandler {
    /// Handle tp_chat tool
    async fn tp_chat(&self, params: TpChatParams) -> Result<ChatResponse>;

    /// Handle tp_chat_history tool
    async fn tp_chat_history(&self) -> Result<ChatHistoryResponse>;
}

impl ChatHandler for super::ToolHandlers {
    async fn tp_chat(&self, params: TpChatParams) -> Result<ChatResponse> {
        let turn = self
            .state
            .lock()
            .await
            .chat_mut()
            .begin_turn(&params.message)
            .map_err(|rejected| match rejected {
                TurnRejected::EmptyMessage => {
                    ExplorerError::InvalidInput("message cannot be empty".to_string())
                }
                TurnRejected::Busy => ExplorerError::InvalidInput(
                    "the assistant is still answering the previous message".to_string(),
                ),
            })?;

        // The turn runs detached so a cancelled caller still closes it
        let assistant = Arc::clone(&self.assistant);
        let state = Arc::clone(&self.state);
        let task = tokio::spawn(async move {
            let outcome = assistant
                .send(&turn.message, &turn.history, turn.location)
                .await;
            let degraded = outcome.is_err();
            let message = state.lock().await.chat_mut().finish_turn(outcome).clone();
            ChatResponse { message, degraded }
        });

        match task.await {
            Ok(response) => Ok(response),
            Err(e) => {
                let mut state = self.state.lock().await;
                if state.chat().is_loading() {
                    state.chat_mut().finish_turn(Err(&e));
                }
                Err(ExplorerError::Internal(format!("chat turn aborted: {e}")))
            }
        }
    }

    async fn tp_chat_history(&self) -> Result<ChatHistoryResponse> {
        let state = self.state.lock().await;
        let chat = state.chat();
        Ok(ChatHistoryResponse {
            messages: chat.messages().to_vec(),
            loading: chat.is_loading(),
            location_grounding: chat.location().is_some(),
        })
    }
}
