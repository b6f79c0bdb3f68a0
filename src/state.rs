use serde::Serialize;

use crate::error::FetchError;
use crate::filter::{self, FilterCriteria};
use crate::models::{Attraction, AttractionCollection};
use crate::session::ChatSession;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum LoadStatus {
    Loading,
    Ready,
    Failed(String),
}

/// Identifies one summary request. A response is only applied while its
/// ticket still matches the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryTicket {
    pub attraction_id: i64,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SummaryState {
    Pending,
    Ready(String),
    Unavailable,
}

#[derive(Debug, Clone)]
struct Selection {
    ticket: SummaryTicket,
    summary: SummaryState,
}

/// All session state behind the tools. Mutated only through the methods below.
#[derive(Debug)]
pub struct ExplorerState {
    attractions: AttractionCollection,
    status: LoadStatus,
    criteria: FilterCriteria,
    selection: Option<Selection>,
    generation: u64,
    chat: ChatSession,
}

impl ExplorerState {
    pub fn new(chat: ChatSession) -> Self {
        Self {
            attractions: AttractionCollection::default(),
            status: LoadStatus::Loading,
            criteria: FilterCriteria::default(),
            selection: None,
            generation: 0,
            chat,
        }
    }

    pub fn status(&self) -> &LoadStatus {
        &self.status
    }

    pub fn attractions(&self) -> &AttractionCollection {
        &self.attractions
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn begin_load(&mut self) {
        self.status = LoadStatus::Loading;
    }

    /// A successful fetch replaces the collection wholesale. A failed one
    /// leaves an empty content state.
    pub fn finish_load(&mut self, outcome: Result<AttractionCollection, FetchError>) {
        match outcome {
            Ok(collection) => {
                self.attractions = collection;
                self.status = LoadStatus::Ready;
            }
            Err(e) => {
                self.attractions = AttractionCollection::default();
                self.status = LoadStatus::Failed(e.message().to_string());
            }
        }
        self.selection = None;
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.criteria.search_text = text.into();
    }

    pub fn set_category(&mut self, category: impl Into<String>) {
        self.criteria.category = category.into();
    }

    pub fn visible(&self) -> AttractionCollection {
        filter::apply(&self.attractions, &self.criteria)
    }

    /// Opens the detail view for `id` and issues a fresh summary ticket
    pub fn select(&mut self, id: i64) -> Option<(Attraction, SummaryTicket)> {
        let record = self.attractions.get(id)?.clone();
        self.generation += 1;
        let ticket = SummaryTicket {
            attraction_id: id,
            generation: self.generation,
        };
        self.selection = Some(Selection {
            ticket,
            summary: SummaryState::Pending,
        });
        Some((record, ticket))
    }

    pub fn selected(&self) -> Option<&Attraction> {
        let selection = self.selection.as_ref()?;
        self.attractions.get(selection.ticket.attraction_id)
    }

    pub fn summary(&self) -> Option<&SummaryState> {
        self.selection.as_ref().map(|s| &s.summary)
    }

    /// Returns false when the ticket is stale and the summary was dropped
    pub fn complete_summary(&mut self, ticket: SummaryTicket, summary: Option<String>) -> bool {
        match self.selection.as_mut() {
            Some(selection) if selection.ticket == ticket => {
                selection.summary = match summary {
                    Some(text) => SummaryState::Ready(text),
                    None => SummaryState::Unavailable,
                };
                true
            }
            _ => {
                tracing::warn!(
                    "Discarding stale summary for attraction {} (generation {})",
                    ticket.attraction_id,
                    ticket.generation
                );
                false
            }
        }
    }

    pub fn close_detail(&mut self) {
        self.selection = None;
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn chat_mut(&mut self) -> &mut ChatSession {
        &mut self.chat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ALL_SENTINEL;

    fn loaded() -> ExplorerState {
        let mut state = ExplorerState::new(ChatSession::default());
        state.finish_load(Ok(AttractionCollection::new(vec![
            Attraction::new(1, "Elephant Mountain", "hiking").with_category(1, "自然風景"),
            Attraction::new(2, "National Palace Museum", "art").with_category(2, "藝文館所"),
        ])));
        state
    }

    #[test]
    fn test_starts_loading_then_ready() {
        let state = ExplorerState::new(ChatSession::default());
        assert_eq!(state.status(), &LoadStatus::Loading);
        assert_eq!(loaded().status(), &LoadStatus::Ready);
    }

    #[test]
    fn test_failed_load_clears_content() {
        let mut state = loaded();
        state.begin_load();
        state.finish_load(Err(FetchError::http_status(502)));
        assert_eq!(state.status(), &LoadStatus::Failed("HTTP Error: 502".to_string()));
        assert!(state.visible().is_empty());
    }

    #[test]
    fn test_visible_tracks_criteria_updates() {
        let mut state = loaded();
        assert_eq!(state.visible().len(), 2);
        state.set_category("自然風景");
        assert_eq!(state.visible().ids(), vec![1]);
        state.set_category(ALL_SENTINEL);
        state.set_search_text("art");
        assert_eq!(state.visible().ids(), vec![2]);
    }

    #[test]
    fn test_unknown_id_cannot_be_selected() {
        let mut state = loaded();
        assert!(state.select(99).is_none());
        assert!(state.summary().is_none());
    }

    #[test]
    fn test_stale_summary_is_discarded() {
        let mut state = loaded();
        let (_, ticket_a) = state.select(1).unwrap();
        let (_, ticket_b) = state.select(2).unwrap();

        assert!(!state.complete_summary(ticket_a, Some("A".to_string())));
        assert_eq!(state.summary(), Some(&SummaryState::Pending));

        assert!(state.complete_summary(ticket_b, Some("B".to_string())));
        assert_eq!(state.summary(), Some(&SummaryState::Ready("B".to_string())));
        assert_eq!(state.selected().unwrap().id, 2);
    }

    #[test]
    fn test_reopening_same_record_invalidates_old_ticket() {
        let mut state = loaded();
        let (_, first) = state.select(1).unwrap();
        let (_, second) = state.select(1).unwrap();
        assert_ne!(first, second);
        assert!(!state.complete_summary(first, None));
        assert!(state.complete_summary(second, None));
        assert_eq!(state.summary(), Some(&SummaryState::Unavailable));
    }

    #[test]
    fn test_summary_after_close_is_discarded() {
        let mut state = loaded();
        let (_, ticket) = state.select(1).unwrap();
        state.close_detail();
        assert!(!state.complete_summary(ticket, Some("late".to_string())));
    }
}
