use async_trait::async_trait;
use reqwest::{Client, header};
use std::time::Duration;

use crate::error::{ExplorerError, FetchError, Result};
use crate::gemini::{ErrorWrapper, GenerateContentRequest, GenerateContentResponse};

#[cfg(test)]
use mockall::automock;

/// Raw reply from a dataset GET: status plus undecoded body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReply {
    pub status: u16,
    pub body: String,
}

impl RawReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One-shot HTTP GET used by the attraction repository
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DatasetSource: Send + Sync {
    async fn get_json(&self, url: &str) -> std::result::Result<RawReply, FetchError>;
}

/// Call seam for the generative backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeminiTransport: Send + Sync {
    async fn generate(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse>;
}

pub struct HttpDatasetSource {
    client: Client,
}

impl HttpDatasetSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl DatasetSource for HttpDatasetSource {
    async fn get_json(&self, url: &str) -> std::result::Result<RawReply, FetchError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::from_message(e.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_message(e.to_string()))?;

        Ok(RawReply { status, body })
    }
}

pub struct GeminiHttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GeminiHttpTransport {
    pub fn new(base_url: &str, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExplorerError::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }
}

/// Prefer the backend's own error message over the raw body
fn backend_error_message(status: u16, body: &str) -> String {
    let detail = serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|w| {
            let msg = w.error.message.unwrap_or_else(|| body.to_string());
            match w.error.status.filter(|s| !s.is_empty()) {
                Some(status_text) => format!("{status_text}: {msg}"),
                None => msg,
            }
        })
        .unwrap_or_else(|| body.to_string());
    format!("Gemini API error ({status}): {detail}")
}

#[async_trait]
impl GeminiTransport for GeminiHttpTransport {
    async fn generate(
        &self,
        model: &str,
        req: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header(header::CONTENT_TYPE, "application/json")
            .json(req)
            .send()
            .await
            .map_err(|e| ExplorerError::Backend(format!("Failed to send request to Gemini API: {e}")))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExplorerError::Backend(backend_error_message(status, &body)));
        }

        response
            .json()
            .await
            .map_err(|e| ExplorerError::Backend(format!("Failed to parse Gemini API response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_message_uses_error_envelope() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#;
        let msg = backend_error_message(403, body);
        assert_eq!(msg, "Gemini API error (403): PERMISSION_DENIED: API key not valid");
    }

    #[test]
    fn test_backend_error_message_falls_back_to_body() {
        let msg = backend_error_message(502, "bad gateway");
        assert_eq!(msg, "Gemini API error (502): bad gateway");
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let t = GeminiHttpTransport::new(
            "https://generativelanguage.googleapis.com/v1beta/",
            "k".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            t.endpoint("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_raw_reply_success_range() {
        assert!(RawReply { status: 204, body: String::new() }.is_success());
        assert!(!RawReply { status: 500, body: String::new() }.is_success());
    }

    use crate::gemini::Content;
    use crate::models::ChatRole;
    use axum::Router;
    use axum::http::{HeaderMap, StatusCode, Uri};

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::turn(ChatRole::User, "hi")],
            system_instruction: None,
            tools: Vec::new(),
            tool_config: None,
            generation_config: None,
        }
    }

    #[tokio::test]
    async fn test_dataset_source_asks_for_json() {
        let router = Router::new().route(
            "/attractions",
            axum::routing::get(|headers: HeaderMap| async move {
                match headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) {
                    Some("application/json") => (StatusCode::OK, "{}"),
                    _ => (StatusCode::BAD_REQUEST, "missing accept"),
                }
            }),
        );
        let base = serve(router).await;

        let source = HttpDatasetSource::new(Duration::from_secs(5)).unwrap();
        let reply = source.get_json(&format!("{base}/attractions")).await.unwrap();
        assert_eq!(reply, RawReply { status: 200, body: "{}".to_string() });
    }

    #[tokio::test]
    async fn test_dataset_source_passes_error_status_through() {
        let router = Router::new().route(
            "/attractions",
            axum::routing::get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let base = serve(router).await;

        let source = HttpDatasetSource::new(Duration::from_secs(5)).unwrap();
        let reply = source.get_json(&format!("{base}/attractions")).await.unwrap();
        assert_eq!(reply.status, 500);
        assert_eq!(reply.body, "boom");
        assert!(!reply.is_success());
    }

    #[tokio::test]
    async fn test_dataset_source_connection_refused() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = HttpDatasetSource::new(Duration::from_secs(5)).unwrap();
        let err = source.get_json(&format!("http://{addr}/attractions")).await.unwrap_err();
        assert!(!err.message().trim().is_empty());
    }

    #[tokio::test]
    async fn test_gemini_transport_sends_key_to_model_endpoint() {
        let router = Router::new().fallback(|uri: Uri, headers: HeaderMap| async move {
            let key = headers.get("x-goog-api-key").and_then(|v| v.to_str().ok());
            if uri.path() == "/v1beta/models/gemini-test:generateContent" && key == Some("secret") {
                (
                    StatusCode::OK,
                    r#"{"candidates": [{"content": {"parts": [{"text": "你好"}]}}]}"#,
                )
            } else {
                (StatusCode::NOT_FOUND, "wrong endpoint or key")
            }
        });
        let base = serve(router).await;

        let tx = GeminiHttpTransport::new(
            &format!("{base}/v1beta"),
            "secret".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        let response = tx.generate("gemini-test", &request()).await.unwrap();
        assert_eq!(response.text().as_deref(), Some("你好"));
    }

    #[tokio::test]
    async fn test_gemini_transport_surfaces_error_envelope() {
        let router = Router::new().fallback(|| async {
            (
                StatusCode::FORBIDDEN,
                r#"{"error": {"code": 403, "message": "API key not valid", "status": "PERMISSION_DENIED"}}"#,
            )
        });
        let base = serve(router).await;

        let tx = GeminiHttpTransport::new(&base, "bad".to_string(), Duration::from_secs(5)).unwrap();
        let err = tx.generate("gemini-test", &request()).await.unwrap_err();
        match err {
            ExplorerError::Backend(msg) => {
                assert_eq!(msg, "Gemini API error (403): PERMISSION_DENIED: API key not valid")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
