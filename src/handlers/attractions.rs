use serde::{Deserialize, Serialize};

use crate::error::{ExplorerError, Result};
use crate::filter::{CATEGORIES, FilterCriteria};
use crate::models::Attraction;
use crate::state::{LoadStatus, SummaryState};
use crate::summary::SUMMARY_FALLBACK;

/// Parameters for the tp_attractions tool
#[derive(Debug, Default, Deserialize, schemars::JsonSchema)]
pub struct TpAttractionsParams {
    #[schemars(description = "Free-text search over name and introduction (case-insensitive). Omit to keep the current search; pass \"\" to clear it")]
    pub search: Option<String>,

    #[schemars(description = "Category filter: '全部' (all), '自然風景', '歷史建築', '藝文館所', '宗教信仰' or '其他'. Omit to keep the current category")]
    pub category: Option<String>,

    #[schemars(description = "Maximum number of cards to return (default: all)")]
    pub limit: Option<usize>,
}

/// Parameters for the tp_attraction tool
#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct TpAttractionParams {
    #[schemars(description = "Attraction id as returned by tp_attractions")]
    pub id: i64,
}

/// Card-sized view of one attraction
#[derive(Debug, Serialize)]
pub struct AttractionCard {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub cover_image: String,
    pub address: String,
    pub teaser: String,
}

impl From<&Attraction> for AttractionCard {
    fn from(a: &Attraction) -> Self {
        Self {
            id: a.id,
            name: a.name.clone(),
            category: a.primary_category_label().to_string(),
            cover_image: a.cover_image().to_string(),
            address: a.address.clone(),
            teaser: a.introduction_or_teaser().to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AttractionListResponse {
    #[serde(flatten)]
    pub status: LoadStatus,
    pub criteria: FilterCriteria,
    pub categories: Vec<String>,
    pub count: usize,
    pub attractions: Vec<AttractionCard>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AttractionDetail {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub categories: Vec<String>,
    pub cover_image: String,
    pub images: Vec<String>,
    pub address: String,
    pub introduction: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub official_site: Option<String>,
    pub map_url: String,
    pub summary: String,
    pub summary_available: bool,
}

impl AttractionDetail {
    fn new(a: &Attraction, summary: &SummaryState) -> Self {
        let (summary, summary_available) = match summary {
            SummaryState::Ready(text) => (text.clone(), true),
            SummaryState::Pending | SummaryState::Unavailable => {
                (SUMMARY_FALLBACK.to_string(), false)
            }
        };
        Self {
            id: a.id,
            name: a.name.clone(),
            category: a.primary_category_label().to_string(),
            categories: a.category.iter().map(|c| c.name.clone()).collect(),
            cover_image: a.cover_image().to_string(),
            images: a.images.iter().map(|i| i.src.clone()).collect(),
            address: a.address.clone(),
            introduction: a.introduction.clone(),
            open_time: a.open_time().map(str::to_string),
            tel: a.tel().map(str::to_string),
            official_site: a.official_site().map(str::to_string),
            map_url: a.map_search_url(),
            summary,
            summary_available,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CloseDetailResponse {
    /// Id of the attraction whose detail view was open, if any
    pub closed: Option<i64>,
}

/// Trait for attraction browsing operations
pub trait AttractionsHandler {
    /// Handle tp_attractions tool
    async fn tp_attractions(&self, params: TpAttractionsParams) -> Result<AttractionListResponse>;

    /// Handle tp_attraction tool
    async fn tp_attraction(&self, params: TpAttractionParams) -> Result<AttractionDetail>;

    /// Handle tp_close_attraction tool
    async fn tp_close_attraction(&self) -> Result<CloseDetailResponse>;

    /// Handle tp_refresh tool
    async fn tp_refresh(&self) -> Result<AttractionListResponse>;
}

impl super::ToolHandlers {
    async fn list_view(&self, limit: Option<usize>) -> AttractionListResponse {
        let state = self.state.lock().await;
        let visible = state.visible();
        let count = visible.len();
        let attractions = visible
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(AttractionCard::from)
            .collect();

        let hint = match state.status() {
            LoadStatus::Failed(_) => Some("Call tp_refresh to retry loading attractions.".to_string()),
            LoadStatus::Ready if count == 0 => {
                Some("No attractions match; try another keyword or category.".to_string())
            }
            _ => None,
        };

        AttractionListResponse {
            status: state.status().clone(),
            criteria: state.criteria().clone(),
            categories: CATEGORIES.iter().map(|c| c.to_string()).collect(),
            count,
            attractions,
            hint,
        }
    }
}

impl AttractionsHandler for super::ToolHandlers {
    async fn tp_attractions(&self, params: TpAttractionsParams) -> Result<AttractionListResponse> {
        {
            let mut state = self.state.lock().await;
            if let Some(search) = params.search {
                state.set_search_text(search);
            }
            if let Some(category) = params.category {
                let category = category.trim().to_string();
                if category.is_empty() {
                    return Err(ExplorerError::InvalidInput(
                        "category cannot be empty; use '全部' for all".to_string(),
                    ));
                }
                state.set_category(category);
            }
            tracing::info!(
                "Filtering attractions: search='{}', category='{}'",
                state.criteria().search_text,
                state.criteria().category
            );
        }

        Ok(self.list_view(params.limit).await)
    }

    async fn tp_attraction(&self, params: TpAttractionParams) -> Result<AttractionDetail> {
        let (record, ticket) = self
            .state
            .lock()
            .await
            .select(params.id)
            .ok_or_else(|| ExplorerError::NotFound(format!("Attraction with ID {} not found.", params.id)))?;

        let summary = self
            .summarizer
            .summarize(&record.name, &record.introduction)
            .await;

        let summary_state = match &summary {
            Some(text) => SummaryState::Ready(text.clone()),
            None => SummaryState::Unavailable,
        };
        let applied = self.state.lock().await.complete_summary(ticket, summary);
        if !applied {
            tracing::info!("Summary for {} arrived after the detail view moved on", record.id);
        }

        Ok(AttractionDetail::new(&record, &summary_state))
    }

    async fn tp_close_attraction(&self) -> Result<CloseDetailResponse> {
        let mut state = self.state.lock().await;
        let closed = state.selected().map(|a| a.id);
        state.close_detail();
        Ok(CloseDetailResponse { closed })
    }

    async fn tp_refresh(&self) -> Result<AttractionListResponse> {
        match self.load_attractions().await {
            LoadStatus::Failed(message) => {
                Err(crate::error::FetchError::from_message(message).into())
            }
            _ => Ok(self.list_view(None).await),
        }
    }
}
