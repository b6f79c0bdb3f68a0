use rmcp::{
    ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::{CallToolResult, Content, ErrorData, ServerCapabilities, ServerInfo},
};
use rmcp_macros::{tool, tool_handler, tool_router};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::assistant::AssistantChatClient;
use crate::config::Config;
use crate::error::ExplorerError;
use crate::handlers::attractions::{TpAttractionParams, TpAttractionsParams};
use crate::handlers::chat::TpChatParams;
use crate::handlers::{AttractionsHandler, ChatHandler, ToolHandlers};
use crate::repository::AttractionRepository;
use crate::session::ChatSession;
use crate::state::{ExplorerState, LoadStatus};
use crate::summary::{SamplingConfig, TravelSummaryClient};
use crate::transport::{GeminiHttpTransport, GeminiTransport, HttpDatasetSource};

/// Main service struct for the explorer MCP server
#[derive(Clone)]
pub struct ExplorerService {
    tool_router: ToolRouter<Self>,
    handlers: Arc<ToolHandlers>,
    config: Arc<Config>,
}

fn to_error_data(tool: &str, e: ExplorerError) -> ErrorData {
    match &e {
        ExplorerError::NotFound(_) | ExplorerError::InvalidInput(_) => {
            tracing::warn!("{} rejected: {}", tool, e);
            ErrorData::invalid_params(e.to_string(), None)
        }
        _ => {
            tracing::error!("{} error: {}", tool, e);
            ErrorData::internal_error(e.to_string(), None)
        }
    }
}

fn json_result<T: Serialize>(response: T) -> std::result::Result<CallToolResult, ErrorData> {
    let content = Content::json(response).map_err(|e| {
        ErrorData::internal_error(format!("Failed to create JSON content: {e}"), None)
    })?;
    Ok(CallToolResult::success(vec![content]))
}

impl ExplorerService {
    /// Wires the HTTP-backed clients from configuration
    pub fn new(config: Arc<Config>) -> crate::error::Result<Self> {
        tracing::info!("Service::new() - Starting initialization");

        let source = Arc::new(HttpDatasetSource::new(config.open_data_timeout())?);
        let repository = Arc::new(AttractionRepository::new(source, config.dataset_url()));

        let transport: Arc<dyn GeminiTransport> = Arc::new(GeminiHttpTransport::new(
            &config.gemini.base_url,
            config.gemini.api_key.clone(),
            config.gemini_timeout(),
        )?);
        let summarizer = Arc::new(TravelSummaryClient::new(
            Arc::clone(&transport),
            config.gemini.summary_model.clone(),
            SamplingConfig {
                temperature: config.gemini.summary_temperature,
                top_p: config.gemini.summary_top_p,
            },
        ));
        let assistant = Arc::new(AssistantChatClient::new(
            Arc::clone(&transport),
            config.gemini.chat_model.clone(),
        ));

        // Location is captured once, when the chat session is created
        let location = config.location();
        if location.is_none() {
            tracing::info!("No assistant location configured; maps grounding disabled");
        }
        let state = ExplorerState::new(ChatSession::new(location));

        let handlers = Arc::new(ToolHandlers::new(repository, summarizer, assistant, state));
        tracing::info!("Service::new() - Service initialization complete");

        Ok(Self::from_handlers(handlers, config))
    }

    pub fn from_handlers(handlers: Arc<ToolHandlers>, config: Arc<Config>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            handlers,
            config,
        }
    }

    /// Initial fetch; failures are recorded in state and reported through the tools
    pub async fn load(&self) -> LoadStatus {
        let status = self.handlers.load_attractions().await;
        if let LoadStatus::Failed(message) = &status {
            tracing::error!("Initial attraction load failed: {}", message);
        }
        status
    }
}

#[tool_router]
impl ExplorerService {
    #[tool(
        description = "Search and filter Taipei attractions by keyword and category. Omitted fields keep the previous filter."
    )]
    pub async fn tp_attractions(
        &self,
        params: Parameters<TpAttractionsParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        match self.handlers.tp_attractions(params.0).await {
            Ok(response) => json_result(response),
            Err(e) => Err(to_error_data("tp_attractions", e)),
        }
    }

    #[tool(description = "Show one attraction's details with an AI-generated travel tip")]
    pub async fn tp_attraction(
        &self,
        params: Parameters<TpAttractionParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        match self.handlers.tp_attraction(params.0).await {
            Ok(response) => json_result(response),
            Err(e) => Err(to_error_data("tp_attraction", e)),
        }
    }

    #[tool(description = "Close the attraction detail view that tp_attraction opened")]
    pub async fn tp_close_attraction(&self) -> std::result::Result<CallToolResult, ErrorData> {
        match self.handlers.tp_close_attraction().await {
            Ok(response) => json_result(response),
            Err(e) => Err(to_error_data("tp_close_attraction", e)),
        }
    }

    #[tool(description = "Reload the attraction dataset from the open-data API")]
    pub async fn tp_refresh(&self) -> std::result::Result<CallToolResult, ErrorData> {
        match self.handlers.tp_refresh().await {
            Ok(response) => json_result(response),
            Err(e) => Err(to_error_data("tp_refresh", e)),
        }
    }

    #[tool(
        description = "Ask the Taipei travel assistant a question. Answers are grounded with web search, and with maps search when a location is configured."
    )]
    pub async fn tp_chat(
        &self,
        params: Parameters<TpChatParams>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        match self.handlers.tp_chat(params.0).await {
            Ok(response) => json_result(response),
            Err(e) => Err(to_error_data("tp_chat", e)),
        }
    }

    #[tool(description = "Show the full conversation with the travel assistant")]
    pub async fn tp_chat_history(&self) -> std::result::Result<CallToolResult, ErrorData> {
        match self.handlers.tp_chat_history().await {
            Ok(response) => json_result(response),
            Err(e) => Err(to_error_data("tp_chat_history", e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for ExplorerService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: rmcp::model::ProtocolVersion::V_2024_11_05,
            server_info: rmcp::model::Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
            },
            capabilities: ServerCapabilities {
                tools: Some(Default::default()),
                ..Default::default()
            },
            instructions: Some(
                "Taipei attraction explorer: browse the city's open attraction dataset and ask an AI travel assistant".into(),
            ),
        }
    }
}
