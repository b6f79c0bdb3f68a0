use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::gemini::{Content, GenerateContentRequest, Tool, ToolConfig};
use crate::models::{ChatReply, ChatRole, GeoPosition};
use crate::transport::GeminiTransport;

const SYSTEM_INSTRUCTION: &str = "你是一位熱愛台北的旅遊專家，可以回答台北景點、交通、美食、天氣與活動相關的問題。\
需要時請使用搜尋功能提供最新資訊。請以繁體中文回答，語氣活潑親切。";

/// Retrieval tools attached to a chat turn
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ToolSelection {
    GeneralSearch,
    GeneralSearchWithLocation(GeoPosition),
}

impl ToolSelection {
    pub fn for_location(location: Option<GeoPosition>) -> Self {
        match location {
            Some(pos) => Self::GeneralSearchWithLocation(pos),
            None => Self::GeneralSearch,
        }
    }

    pub fn tools(&self) -> Vec<Tool> {
        match self {
            Self::GeneralSearch => vec![Tool::GoogleSearch {}],
            Self::GeneralSearchWithLocation(_) => vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}],
        }
    }

    pub fn tool_config(&self) -> Option<ToolConfig> {
        match self {
            Self::GeneralSearch => None,
            Self::GeneralSearchWithLocation(pos) => Some((*pos).into()),
        }
    }
}

#[async_trait]
pub trait Assistant: Send + Sync {
    /// Failures propagate; callers decide how to surface them
    async fn send(
        &self,
        message: &str,
        history: &[Content],
        location: Option<GeoPosition>,
    ) -> Result<ChatReply>;
}

pub struct AssistantChatClient {
    tx: Arc<dyn GeminiTransport>,
    model: String,
}

impl AssistantChatClient {
    pub fn new(tx: Arc<dyn GeminiTransport>, model: String) -> Self {
        Self { tx, model }
    }

    pub fn build_request(
        message: &str,
        history: &[Content],
        tools: ToolSelection,
    ) -> GenerateContentRequest {
        let mut contents = history.to_vec();
        contents.push(Content::turn(ChatRole::User, message));

        GenerateContentRequest {
            contents,
            system_instruction: Some(Content::instruction(SYSTEM_INSTRUCTION)),
            tools: tools.tools(),
            tool_config: tools.tool_config(),
            generation_config: None,
        }
    }
}

#[async_trait]
impl Assistant for AssistantChatClient {
    async fn send(
        &self,
        message: &str,
        history: &[Content],
        location: Option<GeoPosition>,
    ) -> Result<ChatReply> {
        let tools = ToolSelection::for_location(location);
        tracing::info!(
            "Sending chat turn ({} prior turns, maps grounding: {})",
            history.len(),
            location.is_some()
        );

        let request = Self::build_request(message, history, tools);
        let response = self.tx.generate(&self.model, &request).await.inspect_err(|e| {
            tracing::error!("Gemini chat error: {}", e);
        })?;

        let urls = response.grounding_urls();
        let text = response.text().unwrap_or_default();
        tracing::info!("Chat turn answered with {} citations", urls.len());

        Ok(ChatReply { text, urls })
    }
}
