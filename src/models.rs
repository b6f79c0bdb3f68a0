use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Cover image used when a record has no images
pub const DEFAULT_COVER_IMAGE: &str =
    "https://images.unsplash.com/photo-1518173946687-a4c8a9ba332f?auto=format&fit=crop&w=800&q=80";

/// Badge label used when a record has no categories
pub const DEFAULT_CATEGORY_LABEL: &str = "一般景點";

/// Card teaser used when a record has an empty introduction
pub const DEFAULT_TEASER: &str = "探索台北隱藏的瑰寶...";

const MAP_SEARCH_BASE: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Flexible float deserializer since coordinates arrive as either numbers or strings
fn deserialize_flexible_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleFloat {
        Float(f64),
        String(String),
        Null(()),
    }

    match FlexibleFloat::deserialize(deserializer)? {
        FlexibleFloat::Float(f) => Ok(f),
        FlexibleFloat::String(s) if s.trim().is_empty() => Ok(0.0),
        FlexibleFloat::String(s) => s.trim().parse::<f64>().map_err(serde::de::Error::custom),
        FlexibleFloat::Null(()) => Ok(0.0),
    }
}

/// Flexible id deserializer: numbers, numeric strings, or `0` for anything unusable
fn deserialize_flexible_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum FlexibleId {
        Int(i64),
        Float(f64),
        String(String),
        Null(()),
    }

    Ok(match FlexibleId::deserialize(deserializer)? {
        FlexibleId::Int(i) => i,
        FlexibleId::Float(f) => f as i64,
        FlexibleId::String(s) => s.trim().parse::<i64>().unwrap_or_default(),
        FlexibleId::Null(()) => 0,
    })
}

/// `null` decodes to the type's default instead of failing the whole record
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttractionImage {
    #[serde(default, deserialize_with = "null_as_default")]
    pub src: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subject: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ext: String,
}

/// A `{id, name}` classification entry. Used for categories, target groups,
/// services and accessibility tags alike.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttractionCategory {
    #[serde(default, deserialize_with = "deserialize_flexible_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// One point of interest from the open tourism dataset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    #[serde(default, deserialize_with = "deserialize_flexible_i64")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub name_zh: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub introduction: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub open_time: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub zipcode: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub distric: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tel: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fax: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub months: String,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub nlat: f64,
    #[serde(default, deserialize_with = "deserialize_flexible_f64")]
    pub elong: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub official_site: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub facebook: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub ticket: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub remind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub staytime: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub modified: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub category: Vec<AttractionCategory>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub target: Vec<AttractionCategory>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: Vec<AttractionCategory>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub friendly: Vec<AttractionCategory>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub images: Vec<AttractionImage>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub files: Vec<serde_json::Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub links: Vec<serde_json::Value>,
}

/// Empty strings are "absent" for display purposes
fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(value) }
}

impl Attraction {
    /// Minimal record, everything else defaulted
    pub fn new(id: i64, name: impl Into<String>, introduction: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            name_zh: None,
            open_status: 0,
            introduction: introduction.into(),
            open_time: String::new(),
            zipcode: String::new(),
            distric: String::new(),
            address: String::new(),
            tel: String::new(),
            fax: String::new(),
            email: String::new(),
            months: String::new(),
            nlat: 0.0,
            elong: 0.0,
            official_site: String::new(),
            facebook: String::new(),
            ticket: String::new(),
            remind: String::new(),
            staytime: String::new(),
            modified: String::new(),
            url: String::new(),
            category: Vec::new(),
            target: Vec::new(),
            service: Vec::new(),
            friendly: Vec::new(),
            images: Vec::new(),
            files: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_category(mut self, id: i64, name: impl Into<String>) -> Self {
        self.category.push(AttractionCategory {
            id,
            name: name.into(),
        });
        self
    }

    pub fn primary_category(&self) -> Option<&AttractionCategory> {
        self.category.first()
    }

    pub fn primary_category_label(&self) -> &str {
        self.primary_category()
            .map(|c| c.name.as_str())
            .unwrap_or(DEFAULT_CATEGORY_LABEL)
    }

    pub fn cover_image(&self) -> &str {
        self.images
            .first()
            .and_then(|img| non_empty(&img.src))
            .unwrap_or(DEFAULT_COVER_IMAGE)
    }

    pub fn introduction_or_teaser(&self) -> &str {
        non_empty(&self.introduction).unwrap_or(DEFAULT_TEASER)
    }

    pub fn open_time(&self) -> Option<&str> {
        non_empty(&self.open_time)
    }

    pub fn tel(&self) -> Option<&str> {
        non_empty(&self.tel)
    }

    pub fn official_site(&self) -> Option<&str> {
        non_empty(&self.official_site)
    }

    /// Map search deep link built from `name + " " + address`
    pub fn map_search_url(&self) -> String {
        let query = format!("{} {}", self.name, self.address);
        format!("{MAP_SEARCH_BASE}{}", urlencoding::encode(&query))
    }
}

/// Upstream response envelope. `data` may be absent or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AttractionsEnvelope {
    #[serde(default)]
    pub total: Option<i64>,
    #[serde(default)]
    pub data: Option<Vec<Attraction>>,
}

/// The full in-memory set returned by one fetch, in upstream order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttractionCollection {
    records: Vec<Attraction>,
}

impl AttractionCollection {
    pub fn new(records: Vec<Attraction>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Attraction> {
        self.records.iter()
    }

    pub fn as_slice(&self) -> &[Attraction] {
        &self.records
    }

    /// First record with the given id; duplicates are kept but only the first is addressable
    pub fn get(&self, id: i64) -> Option<&Attraction> {
        self.records.iter().find(|a| a.id == id)
    }

    pub fn ids(&self) -> Vec<i64> {
        self.records.iter().map(|a| a.id).collect()
    }
}

impl From<Vec<Attraction>> for AttractionCollection {
    fn from(records: Vec<Attraction>) -> Self {
        Self::new(records)
    }
}

impl IntoIterator for AttractionCollection {
    type Item = Attraction;
    type IntoIter = std::vec::IntoIter<Attraction>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a AttractionCollection {
    type Item = &'a Attraction;
    type IntoIter = std::slice::Iter<'a, Attraction>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPosition {
    /// Parses `"lat,lng"`
    pub fn parse(raw: &str) -> Option<Self> {
        let (lat, lng) = raw.split_once(',')?;
        let lat = lat.trim().parse::<f64>().ok()?;
        let lng = lng.trim().parse::<f64>().ok()?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return None;
        }
        Some(Self { lat, lng })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Model => "model",
        }
    }
}

/// Source link returned alongside an AI answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingUrl {
    pub title: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grounding_urls: Vec<GroundingUrl>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            grounding_urls: Vec::new(),
        }
    }

    pub fn model(content: impl Into<String>, grounding_urls: Vec<GroundingUrl>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
            timestamp: Utc::now(),
            grounding_urls,
        }
    }
}

/// Answer from one assistant turn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub text: String,
    pub urls: Vec<GroundingUrl>,
}
