//! Notifications emitted by a search session.

use serde::{Deserialize, Serialize};

use crate::search::options::Query;

/// Outcome of the current find cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// Searching, or waiting for page text
    Pending,
    /// A match is selected (or there was nothing to search for)
    Found,
    /// The whole document was scanned without a match
    NotFound,
    /// A match was selected after wrapping around the document
    Wrapped,
}

/// Rank of the selected match and total number of matches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchesCount {
    /// 1-based rank of the selected match, 0 when unknown
    pub current: usize,
    /// Matches found so far
    pub total: usize,
}

impl MatchesCount {
    /// Create a count.
    pub fn new(current: usize, total: usize) -> Self {
        Self { current, total }
    }
}

/// Payload of [`SearchEvent::StateChanged`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateUpdate {
    /// New state
    pub state: SessionState,
    /// Direction of the find that produced this state
    pub find_previous: bool,
    /// Whether whole-word matching was on
    pub entire_word: bool,
    /// Match counts at the time of the update
    pub counts: MatchesCount,
    /// Query as the user entered it
    pub raw_query: Option<Query>,
}

/// Pages a highlight notification applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PageTarget {
    /// A single page (0-based)
    Page(usize),
    /// Every page
    All,
}

/// Outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum SearchEvent {
    /// The find state or the selected match changed.
    StateChanged(StateUpdate),
    /// More matches were counted while pages are being searched.
    MatchCountProgress(MatchesCount),
    /// Highlights of these pages must be redrawn.
    ApplyHighlights(PageTarget),
    /// Highlights of these pages must be removed.
    ClearHighlights(PageTarget),
}

impl SearchEvent {
    /// Whether this is a highlight notification for `page` (or all pages).
    pub fn touches_page(&self, page: usize) -> bool {
        match self {
            SearchEvent::ApplyHighlights(target) | SearchEvent::ClearHighlights(target) => {
                matches!(target, PageTarget::All) || *target == PageTarget::Page(page)
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = SearchEvent::ApplyHighlights(PageTarget::Page(2));
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"applyHighlights","data":{"page":2}}"#);

        let event = SearchEvent::ClearHighlights(PageTarget::All);
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(json, r#"{"type":"clearHighlights","data":"all"}"#);
    }

    #[test]
    fn test_state_update_round_trip() {
        let event = SearchEvent::StateChanged(StateUpdate {
            state: SessionState::Wrapped,
            find_previous: false,
            entire_word: true,
            counts: MatchesCount::new(1, 3),
            raw_query: Some(Query::from("cat")),
        });
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""rawQuery":"cat""#));
        assert!(json.contains(r#""state":"wrapped""#));
        let back: SearchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_touches_page() {
        assert!(SearchEvent::ApplyHighlights(PageTarget::All).touches_page(4));
        assert!(SearchEvent::ClearHighlights(PageTarget::Page(4)).touches_page(4));
        assert!(!SearchEvent::ApplyHighlights(PageTarget::Page(3)).touches_page(4));
        assert!(!SearchEvent::MatchCountProgress(MatchesCount::default()).touches_page(4));
    }
}
