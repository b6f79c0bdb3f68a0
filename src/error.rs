use thiserror::Error;

/// Message used when a fetch fails with nothing more specific to report
pub const UNKNOWN_CONNECTION_ERROR: &str = "連線至 API 時發生未知錯誤";

/// Failure to acquire the attraction dataset.
///
/// Network, HTTP status and body decoding failures all collapse into this one
/// type; only the message differs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct FetchError(pub String);

impl FetchError {
    pub fn http_status(status: u16) -> Self {
        Self(format!("HTTP Error: {status}"))
    }

    pub fn unknown() -> Self {
        Self(UNKNOWN_CONNECTION_ERROR.to_string())
    }

    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            Self::unknown()
        } else {
            Self(message)
        }
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum ExplorerError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Generative backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ExplorerError>;
