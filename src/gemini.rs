//! Wire types for the Gemini `generateContent` REST endpoint.

use serde::{Deserialize, Serialize};

use crate::models::{ChatRole, GeoPosition, GroundingUrl};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// One conversation turn in the backend's format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn turn(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role: Some(role.as_str().to_string()),
            parts: vec![Part { text: text.into() }],
        }
    }

    /// System instructions carry no role
    pub fn instruction(text: impl Into<String>) -> Self {
        Self {
            role: None,
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Tool {
    #[serde(rename = "googleSearch")]
    GoogleSearch {},
    #[serde(rename = "googleMaps")]
    GoogleMaps {},
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalConfig {
    pub lat_lng: LatLng,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolConfig {
    pub retrieval_config: RetrievalConfig,
}

impl From<GeoPosition> for ToolConfig {
    fn from(pos: GeoPosition) -> Self {
        Self {
            retrieval_config: RetrievalConfig {
                lat_lng: LatLng {
                    latitude: pos.lat,
                    longitude: pos.lng,
                },
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Tool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_config: Option<ToolConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

impl GenerateContentRequest {
    pub fn has_tool(&self, tool: &Tool) -> bool {
        self.tools.iter().any(|t| t == tool)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
    #[serde(default)]
    pub grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundingMetadata {
    #[serde(default)]
    pub grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingChunk {
    #[serde(default)]
    pub web: Option<GroundingSource>,
    #[serde(default)]
    pub maps: Option<GroundingSource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroundingSource {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl GroundingChunk {
    /// Web citations take precedence over maps citations on the same chunk
    pub fn citation(&self) -> Option<GroundingUrl> {
        let source = self.web.as_ref().or(self.maps.as_ref())?;
        let uri = source.uri.as_deref().filter(|u| !u.is_empty())?;
        let title = source
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(uri);
        Some(GroundingUrl {
            title: title.to_string(),
            uri: uri.to_string(),
        })
    }
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if it produced any
    pub fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        if text.is_empty() { None } else { Some(text) }
    }

    /// Citations from the first candidate, in response order
    pub fn grounding_urls(&self) -> Vec<GroundingUrl> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|m| m.grounding_chunks.iter().filter_map(GroundingChunk::citation).collect())
            .unwrap_or_default()
    }
}

/// Error envelope returned on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorWrapper {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_in_backend_shape() {
        let req = GenerateContentRequest {
            contents: vec![Content::turn(ChatRole::User, "hi")],
            system_instruction: Some(Content::instruction("be nice")),
            tools: vec![Tool::GoogleSearch {}, Tool::GoogleMaps {}],
            tool_config: Some(GeoPosition { lat: 25.0, lng: 121.5 }.into()),
            generation_config: None,
        };
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(
            value,
            json!({
                "contents": [{"role": "user", "parts": [{"text": "hi"}]}],
                "systemInstruction": {"parts": [{"text": "be nice"}]},
                "tools": [{"googleSearch": {}}, {"googleMaps": {}}],
                "toolConfig": {"retrievalConfig": {"latLng": {"latitude": 25.0, "longitude": 121.5}}}
            })
        );
    }

    #[test]
    fn test_response_citations_from_web_and_maps() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [{"text": "Go to "}, {"text": "Jiufen."}]},
                "groundingMetadata": {"groundingChunks": [
                    {"web": {"uri": "https://a.example", "title": "A"}},
                    {"maps": {"uri": "https://maps.example/b", "title": "B"}},
                    {"retrievedContext": {"uri": "ignored"}},
                    {"web": {"title": "no uri"}}
                ]}
            }]
        });
        let resp: GenerateContentResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(resp.text().as_deref(), Some("Go to Jiufen."));
        let urls = resp.grounding_urls();
        assert_eq!(urls.len(), 2);
        assert_eq!(urls[0].uri, "https://a.example");
        assert_eq!(urls[1].title, "B");
    }

    #[test]
    fn test_empty_response_has_no_text() {
        let resp: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(resp.text(), None);
        assert!(resp.grounding_urls().is_empty());
    }
}
