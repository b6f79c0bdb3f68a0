use serde::{Deserialize, Serialize};

use crate::models::{Attraction, AttractionCollection};

/// Category value that disables category filtering
pub const ALL_SENTINEL: &str = "全部";

/// Selectable categories, sentinel first
pub const CATEGORIES: [&str; 6] = [ALL_SENTINEL, "自然風景", "歷史建築", "藝文館所", "宗教信仰", "其他"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    pub search_text: String,
    pub category: String,
}

impl Default for FilterCriteria {
    fn default() -> Self {
        Self {
            search_text: String::new(),
            category: ALL_SENTINEL.to_string(),
        }
    }
}

impl FilterCriteria {
    pub fn new(search_text: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            category: category.into(),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.search_text.is_empty() && self.category == ALL_SENTINEL
    }

    /// Case-insensitive match against name or introduction; empty text matches everything
    pub fn matches_text(&self, record: &Attraction) -> bool {
        if self.search_text.is_empty() {
            return true;
        }
        let needle = self.search_text.to_lowercase();
        record.name.to_lowercase().contains(&needle)
            || record.introduction.to_lowercase().contains(&needle)
    }

    /// Case-sensitive substring match against any category name
    pub fn matches_category(&self, record: &Attraction) -> bool {
        self.category == ALL_SENTINEL
            || record
                .category
                .iter()
                .any(|c| c.name.contains(self.category.as_str()))
    }

    pub fn matches(&self, record: &Attraction) -> bool {
        self.matches_text(record) && self.matches_category(record)
    }
}

/// Stable filter; output order follows the input
pub fn apply(collection: &AttractionCollection, criteria: &FilterCriteria) -> AttractionCollection {
    collection
        .iter()
        .filter(|record| criteria.matches(record))
        .cloned()
        .collect::<Vec<_>>()
        .into()
}
