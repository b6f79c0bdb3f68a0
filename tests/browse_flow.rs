use taipei_explorer::error::FetchError;
use taipei_explorer::filter::{ALL_SENTINEL, CATEGORIES, FilterCriteria, apply};
use taipei_explorer::models::{Attraction, AttractionCollection, AttractionsEnvelope, ChatReply};
use taipei_explorer::session::{CHAT_FAILURE_APOLOGY, ChatSession};
use taipei_explorer::state::{ExplorerState, LoadStatus, SummaryState};

fn dataset() -> AttractionCollection {
    let raw = r#"{"total": 4, "data": [
        {"id": 11, "name": "Elephant Mountain", "introduction": "Short hiking trail with 101 views",
         "category": [{"id": 1, "name": "自然風景"}]},
        {"id": 12, "name": "National Palace Museum", "introduction": "Chinese art collection",
         "category": [{"id": 2, "name": "藝文館所"}]},
        {"id": 13, "name": "Longshan Temple", "introduction": "",
         "category": [{"id": 3, "name": "宗教信仰"}, {"id": 4, "name": "歷史建築"}]},
        {"id": 14, "name": "Ximending", "introduction": "Shopping and street art", "category": []}
    ]}"#;
    let envelope: AttractionsEnvelope = serde_json::from_str(raw).unwrap();
    AttractionCollection::new(envelope.data.unwrap_or_default())
}

#[test]
fn every_category_button_yields_only_matching_records() {
    let all = dataset();
    for category in CATEGORIES.iter().filter(|c| **c != ALL_SENTINEL) {
        let out = apply(&all, &FilterCriteria::new("", *category));
        assert!(out.iter().all(|a| a.category.iter().any(|c| c.name.contains(category))));
        assert!(out.iter().all(|a| !a.category.is_empty()));
    }
    assert_eq!(apply(&all, &FilterCriteria::default()), all);
}

#[test]
fn search_and_category_combine() {
    let all = dataset();
    // "art" appears in two introductions but only one is an arts venue
    assert_eq!(apply(&all, &FilterCriteria::new("ART", ALL_SENTINEL)).ids(), vec![12, 14]);
    assert_eq!(apply(&all, &FilterCriteria::new("art", "藝文館所")).ids(), vec![12]);
    assert!(apply(&all, &FilterCriteria::new("temple", "自然風景")).is_empty());
}

#[test]
fn retry_after_failure_replaces_collection() {
    let mut state = ExplorerState::new(ChatSession::default());
    state.finish_load(Err(FetchError::unknown()));
    assert!(matches!(state.status(), LoadStatus::Failed(_)));

    state.begin_load();
    state.finish_load(Ok(dataset()));
    assert_eq!(state.status(), &LoadStatus::Ready);
    assert_eq!(state.visible().len(), 4);

    state.begin_load();
    state.finish_load(Ok(AttractionCollection::new(vec![Attraction::new(99, "Beitou", "")])));
    assert_eq!(state.visible().ids(), vec![99]);
}

#[test]
fn only_the_latest_detail_receives_its_summary() {
    let mut state = ExplorerState::new(ChatSession::default());
    state.finish_load(Ok(dataset()));

    let (_, museum) = state.select(12).unwrap();
    let (temple, current) = state.select(13).unwrap();
    assert_eq!(temple.primary_category_label(), "宗教信仰");

    assert!(!state.complete_summary(museum, Some("museum tip".to_string())));
    assert!(state.complete_summary(current, Some("temple tip".to_string())));
    assert_eq!(state.summary(), Some(&SummaryState::Ready("temple tip".to_string())));
}

#[test]
fn chat_session_survives_failures() {
    let mut state = ExplorerState::new(ChatSession::default());
    let chat = state.chat_mut();

    chat.begin_turn("捷運怎麼搭?").unwrap();
    chat.finish_turn::<String>(Err("network".to_string()));
    let turn = chat.begin_turn("再試一次").unwrap();
    assert_eq!(turn.history.len(), 3);
    chat.finish_turn::<String>(Ok(ChatReply {
        text: "搭紅線".to_string(),
        urls: Vec::new(),
    }));

    let contents: Vec<_> = state.chat().messages().iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents[2], CHAT_FAILURE_APOLOGY);
    assert_eq!(contents[4], "搭紅線");
}
