/// Handler modules for the explorer MCP tools
pub mod attractions;
pub mod chat;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::assistant::Assistant;
use crate::repository::AttractionRepository;
use crate::state::{ExplorerState, LoadStatus};
use crate::summary::Summarizer;

// Re-export handler traits from submodules
pub use attractions::AttractionsHandler;
pub use chat::ChatHandler;

/// Handler for MCP tool operations
pub struct ToolHandlers {
    pub(crate) repository: Arc<AttractionRepository>,
    pub(crate) summarizer: Arc<dyn Summarizer>,
    pub(crate) assistant: Arc<dyn Assistant>,
    pub(crate) state: Arc<Mutex<ExplorerState>>,
}

impl ToolHandlers {
    pub fn new(
        repository: Arc<AttractionRepository>,
        summarizer: Arc<dyn Summarizer>,
        assistant: Arc<dyn Assistant>,
        state: ExplorerState,
    ) -> Self {
        Self {
            repository,
            summarizer,
            assistant,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Runs one fetch and swaps the result into state. The lock is not held
    /// across the request.
    pub async fn load_attractions(&self) -> LoadStatus {
        self.state.lock().await.begin_load();
        let outcome = self.repository.fetch_all().await;
        let mut state = self.state.lock().await;
        state.finish_load(outcome);
        state.status().clone()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::error::{ExplorerError, FetchError, Result};
    use crate::gemini::Content;
    use crate::models::{ChatReply, GeoPosition};
    use crate::session::ChatSession;
    use crate::transport::{DatasetSource, RawReply};
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    pub const DATASET: &str = r#"{"total": 2, "data": [
        {"id": 1, "name": "Elephant Mountain", "introduction": "hiking", "address": "信義區",
         "category": [{"id": 1, "name": "自然風景"}], "images": []},
        {"id": 2, "name": "National Palace Museum", "introduction": "art", "tel": "+886-2-28812021",
         "official_site": "https://www.npm.gov.tw", "category": [{"id": 2, "name": "藝文館所"}],
         "images": [{"src": "https://img.example/npm.jpg", "subject": "", "ext": ".jpg"}]}
    ]}"#;

    pub struct FixedSource(pub RawReply);

    #[async_trait]
    impl DatasetSource for FixedSource {
        async fn get_json(&self, _url: &str) -> std::result::Result<RawReply, FetchError> {
            Ok(self.0.clone())
        }
    }

    pub struct CannedSummarizer(pub Option<String>);

    #[async_trait]
    impl Summarizer for CannedSummarizer {
        async fn summarize(&self, _name: &str, _introduction: &str) -> Option<String> {
            self.0.clone()
        }
    }

    /// Answers with a fixed reply, or fails, and records what it was sent
    pub struct ScriptedAssistant {
        pub reply: Option<ChatReply>,
        pub calls: StdMutex<Vec<(String, usize, Option<GeoPosition>)>>,
        pub delay: Option<Duration>,
    }

    impl ScriptedAssistant {
        pub fn new(reply: Option<ChatReply>) -> Self {
            Self {
                reply,
                calls: StdMutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl Assistant for ScriptedAssistant {
        async fn send(
            &self,
            message: &str,
            history: &[Content],
            location: Option<GeoPosition>,
        ) -> Result<ChatReply> {
            self.calls
                .lock()
                .expect("Scripted assistant mutex should not be poisoned")
                .push((message.to_string(), history.len(), location));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.reply
                .clone()
                .ok_or_else(|| ExplorerError::Backend("backend down".to_string()))
        }
    }

    pub fn handlers_with(
        status: u16,
        body: &str,
        summary: Option<&str>,
        assistant: Arc<ScriptedAssistant>,
        location: Option<GeoPosition>,
    ) -> ToolHandlers {
        let source = FixedSource(RawReply {
            status,
            body: body.to_string(),
        });
        ToolHandlers::new(
            Arc::new(AttractionRepository::new(
                Arc::new(source),
                "https://relay.example/?x".to_string(),
            )),
            Arc::new(CannedSummarizer(summary.map(str::to_string))),
            assistant,
            ExplorerState::new(ChatSession::new(location)),
        )
    }
}
