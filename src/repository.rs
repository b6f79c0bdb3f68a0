use std::sync::Arc;
use tracing::{error, info};

use crate::error::FetchError;
use crate::models::{AttractionCollection, AttractionsEnvelope};
use crate::transport::DatasetSource;

/// Fetches the open attractions dataset through the CORS relay.
///
/// One GET per call; no caching and no retry. Callers retry by calling
/// [`AttractionRepository::fetch_all`] again.
pub struct AttractionRepository {
    source: Arc<dyn DatasetSource>,
    url: String,
}

impl AttractionRepository {
    pub fn new(source: Arc<dyn DatasetSource>, url: String) -> Self {
        Self { source, url }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn fetch_all(&self) -> Result<AttractionCollection, FetchError> {
        info!("Fetching attractions from {}", self.url);

        let reply = self.source.get_json(&self.url).await.inspect_err(|e| {
            error!("Attraction fetch failed: {}", e);
        })?;

        if !reply.is_success() {
            error!("Attraction fetch returned HTTP {}", reply.status);
            return Err(FetchError::http_status(reply.status));
        }

        let envelope: AttractionsEnvelope = serde_json::from_str(&reply.body).map_err(|e| {
            error!("Attraction payload could not be decoded: {}", e);
            FetchError::from_message(e.to_string())
        })?;

        let records = envelope.data.unwrap_or_default();
        info!(
            "Fetched {} attractions (upstream total: {:?})",
            records.len(),
            envelope.total
        );
        Ok(AttractionCollection::new(records))
    }
}
