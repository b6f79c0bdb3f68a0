use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::models::GeoPosition;

const PLACEHOLDER_API_KEY: &str = "PLACEHOLDER_GEMINI_API_KEY";

/// Main configuration structure for the explorer server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub open_data: OpenDataConfig,
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenDataConfig {
    /// True upstream endpoint, page 1 only
    pub api_url: String,
    /// CORS relay prefix; the encoded upstream url is appended verbatim
    pub relay_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    pub base_url: String,
    pub summary_model: String,
    pub chat_model: String,
    pub summary_temperature: f32,
    pub summary_top_p: f32,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssistantConfig {
    /// Device location handed to map-grounded search
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub path: String,
    #[serde(default)]
    pub bearer_token: Option<String>,
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        let env_paths = ["../.env", ".env"];

        let mut env_loaded = false;
        for path in &env_paths {
            if dotenvy::from_path(path).is_ok() {
                tracing::info!("Loaded .env from: {}", path);
                env_loaded = true;
                break;
            }
        }

        if !env_loaded {
            tracing::debug!("No .env file found - continuing with env vars only");
        }

        let config_path = env::var("TP_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            match fs::read_to_string(&config_path) {
                Ok(contents) => Self::from_yaml(&contents).unwrap_or_else(|e| {
                    tracing::error!(
                        "Failed to parse config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }),
                Err(e) => {
                    tracing::error!(
                        "Failed to read config file {}: {} - using defaults",
                        config_path,
                        e
                    );
                    Self::default()
                }
            }
        } else {
            tracing::info!("Config file not found at {} - using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();

        // Validate configuration - log warnings but don't fail
        if let Err(e) = config.validate() {
            tracing::warn!("Config validation warnings: {} - continuing anyway", e);
        }

        config
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        let config = serde_yaml::from_str::<Config>(contents)?;
        tracing::info!("Loaded configuration for {}", config.server.name);
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Gemini overrides; GEMINI_API_KEY wins over the bare API_KEY
        if let Some(api_key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
            self.gemini.api_key = api_key;
        }
        if let Some(base_url) = lookup("GEMINI_BASE_URL") {
            self.gemini.base_url = base_url;
        }
        if let Some(model) = lookup("GEMINI_SUMMARY_MODEL") {
            self.gemini.summary_model = model;
        }
        if let Some(model) = lookup("GEMINI_CHAT_MODEL") {
            self.gemini.chat_model = model;
        }

        // Open data overrides
        if let Some(url) = lookup("TP_OPEN_DATA_URL") {
            self.open_data.api_url = url;
        }
        if let Some(url) = lookup("TP_RELAY_URL") {
            self.open_data.relay_url = url;
        }

        if let Some(raw) = lookup("TP_LOCATION") {
            match GeoPosition::parse(&raw) {
                Some(pos) => {
                    self.assistant.latitude = Some(pos.lat);
                    self.assistant.longitude = Some(pos.lng);
                }
                None => tracing::warn!("Ignoring TP_LOCATION '{}': expected 'lat,lng'", raw),
            }
        }

        // HTTP transport overrides
        if let Some(bind) = lookup("TP_HTTP_BIND") {
            self.http.bind = bind;
        }
        if let Some(path) = lookup("TP_HTTP_PATH") {
            self.http.path = path;
        }
        if let Some(token) = lookup("TP_BEARER_TOKEN") {
            self.http.bearer_token = Some(token);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.open_data.api_url.is_empty() {
            return Err("open_data.api_url cannot be empty".into());
        }
        if self.open_data.timeout_seconds == 0 || self.gemini.timeout_seconds == 0 {
            return Err("timeouts cannot be 0".into());
        }
        if !(0.0..=2.0).contains(&self.gemini.summary_temperature) {
            return Err("gemini.summary_temperature must be between 0.0 and 2.0".into());
        }
        if !(0.0..=1.0).contains(&self.gemini.summary_top_p) {
            return Err("gemini.summary_top_p must be between 0.0 and 1.0".into());
        }
        if self.assistant.latitude.is_some() != self.assistant.longitude.is_some() {
            return Err("assistant.latitude and assistant.longitude must be set together".into());
        }

        // Not fatal: calls fail at the backend and degrade per feature
        if !self.has_api_key() {
            return Err("GEMINI_API_KEY (or API_KEY) is not set; AI features will degrade".into());
        }

        Ok(())
    }

    pub fn has_api_key(&self) -> bool {
        !self.gemini.api_key.is_empty() && self.gemini.api_key != PLACEHOLDER_API_KEY
    }

    /// Relay url with the encoded upstream endpoint appended
    pub fn dataset_url(&self) -> String {
        format!(
            "{}{}",
            self.open_data.relay_url,
            urlencoding::encode(&self.open_data.api_url)
        )
    }

    pub fn location(&self) -> Option<GeoPosition> {
        match (self.assistant.latitude, self.assistant.longitude) {
            (Some(lat), Some(lng)) => Some(GeoPosition { lat, lng }),
            _ => None,
        }
    }

    pub fn open_data_timeout(&self) -> Duration {
        Duration::from_secs(self.open_data.timeout_seconds)
    }

    pub fn gemini_timeout(&self) -> Duration {
        Duration::from_secs(self.gemini.timeout_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "taipei-explorer".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            open_data: OpenDataConfig {
                api_url: "https://www.travel.taipei/open-api/zh-tw/Attractions/All?page=1"
                    .to_string(),
                relay_url: "https://corsproxy.io/?".to_string(),
                timeout_seconds: 30,
            },
            gemini: GeminiConfig {
                api_key: PLACEHOLDER_API_KEY.to_string(),
                base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
                summary_model: "gemini-3-flash-preview".to_string(),
                chat_model: "gemini-2.5-flash-lite-latest".to_string(),
                summary_temperature: 0.7,
                summary_top_p: 0.9,
                timeout_seconds: 120,
            },
            assistant: AssistantConfig::default(),
            http: HttpConfig {
                bind: "127.0.0.1:8788".to_string(),
                path: "/mcp".to_string(),
                bearer_token: None,
            },
        }
    }
}
