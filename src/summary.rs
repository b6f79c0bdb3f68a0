use async_trait::async_trait;
use std::sync::Arc;

use crate::gemini::{Content, GenerateContentRequest, GenerationConfig};
use crate::models::ChatRole;
use crate::transport::GeminiTransport;

/// Shown when no summary could be produced
pub const SUMMARY_FALLBACK: &str = "無法取得 AI 摘要。";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// `None` means "summary unavailable"; never an error
    async fn summarize(&self, name: &str, introduction: &str) -> Option<String>;
}

pub struct TravelSummaryClient {
    tx: Arc<dyn GeminiTransport>,
    model: String,
    sampling: SamplingConfig,
}

impl TravelSummaryClient {
    pub fn new(tx: Arc<dyn GeminiTransport>, model: String, sampling: SamplingConfig) -> Self {
        Self { tx, model, sampling }
    }

    fn prompt(name: &str, introduction: &str) -> String {
        format!(
            "You are a local Taipei travel expert. Write an engaging travel tip and summary \
             for the attraction \"{name}\" in under 100 words. Official introduction: {introduction}. \
             Highlight what makes it unique and the one activity a visitor should not miss. \
             Answer in Traditional Chinese."
        )
    }

    fn request(&self, name: &str, introduction: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::turn(ChatRole::User, Self::prompt(name, introduction))],
            system_instruction: None,
            tools: Vec::new(),
            tool_config: None,
            generation_config: Some(GenerationConfig {
                temperature: Some(self.sampling.temperature),
                top_p: Some(self.sampling.top_p),
            }),
        }
    }
}

#[async_trait]
impl Summarizer for TravelSummaryClient {
    async fn summarize(&self, name: &str, introduction: &str) -> Option<String> {
        tracing::info!("Generating travel summary for attraction: {}", name);

        let request = self.request(name, introduction);
        match self.tx.generate(&self.model, &request).await {
            Ok(response) => {
                let text = response.text();
                if text.is_none() {
                    tracing::warn!("Gemini returned no summary text for {}", name);
                }
                text
            }
            Err(e) => {
                tracing::warn!("Gemini summary error for {}: {}", name, e);
                None
            }
        }
    }
}
