//! Tests for the async find driver.

use std::future::Future;
use std::time::Duration;

use find_oxide::search::{
    FindKind, MatchesCount, PageTarget, SearchEvent, SearchOptions, SessionState,
};
use find_oxide::{Error, FindConfig, FindController, PageTextSource, Result, StaticPages};
use tokio::sync::mpsc::UnboundedReceiver;

fn drain(rx: &mut UnboundedReceiver<SearchEvent>) -> Vec<SearchEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn last_state(events: &[SearchEvent]) -> Option<(SessionState, MatchesCount)> {
    events.iter().rev().find_map(|e| match e {
        SearchEvent::StateChanged(update) => Some((update.state, update.counts)),
        _ => None,
    })
}

/// A document whose pages take longer to extract the further they are.
struct LazyDocument {
    pages: Vec<String>,
    page_count: usize,
}

impl LazyDocument {
    fn new(pages: &[&str]) -> Self {
        Self {
            pages: pages.iter().map(|p| p.to_string()).collect(),
            page_count: pages.len(),
        }
    }
}

impl PageTextSource for LazyDocument {
    fn page_count(&self) -> usize {
        self.page_count
    }

    fn extract_page_text(&self, page_index: usize) -> impl Future<Output = Result<String>> + Send {
        let text = self.pages.get(page_index).cloned();
        async move {
            tokio::time::sleep(Duration::from_millis(20 * (page_index as u64 + 1))).await;
            text.ok_or(Error::Extraction {
                page: page_index,
                reason: "missing page".to_string(),
            })
        }
    }
}

mod event_stream {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_typing_then_navigation() {
        let source = StaticPages::new(["The cat sat.", "A c\u{00E1}t sits."]);
        let (controller, mut events) = FindController::spawn(source, FindConfig::default());

        controller.find(SearchOptions::new("cat")).unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(
            last_state(&drain(&mut events)),
            Some((SessionState::Found, MatchesCount::new(1, 2)))
        );

        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let stepped = drain(&mut events);
        assert_eq!(
            last_state(&stepped),
            Some((SessionState::Found, MatchesCount::new(2, 2)))
        );
        // The page losing the selection is redrawn too
        assert!(stepped.contains(&SearchEvent::ApplyHighlights(PageTarget::Page(0))));
        assert!(stepped.contains(&SearchEvent::ApplyHighlights(PageTarget::Page(1))));

        controller
            .find(
                SearchOptions::new("cat")
                    .with_kind(FindKind::HighlightAllChange)
                    .with_highlight_all(true),
            )
            .unwrap();
        controller.close().unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;
        let closing = drain(&mut events);
        assert_eq!(closing.first(), Some(&SearchEvent::ApplyHighlights(PageTarget::All)));
        assert_eq!(closing.last(), Some(&SearchEvent::ClearHighlights(PageTarget::All)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_serialize() {
        let source = StaticPages::new(["cat"]);
        let (controller, mut events) = FindController::spawn(source, FindConfig::default());
        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let found = drain(&mut events)
            .into_iter()
            .find(|e| matches!(e, SearchEvent::StateChanged(u) if u.state == SessionState::Found))
            .unwrap();
        let json = serde_json::to_value(&found).unwrap();
        assert_eq!(json["type"], "stateChanged");
        assert_eq!(json["data"]["rawQuery"], "cat");
        assert_eq!(json["data"]["counts"]["total"], 1);
    }
}

mod slow_pages {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_scan_resumes_as_pages_arrive() {
        let source = LazyDocument::new(&["intro", "no match", "the cat"]);
        let (controller, mut events) = FindController::spawn(source, FindConfig::default());
        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();

        // Pages 0 and 1 are done (20ms + 40ms), page 2 is not
        tokio::time::sleep(Duration::from_millis(70)).await;
        assert_eq!(last_state(&drain(&mut events)).map(|s| s.0), Some(SessionState::Pending));

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(
            last_state(&drain(&mut events)),
            Some((SessionState::Found, MatchesCount::new(1, 1)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_undeliverable_page_is_searched_as_empty() {
        // The source claims more pages than it can deliver
        let mut source = LazyDocument::new(&["cat"]);
        source.page_count = 3;
        let (controller, mut events) = FindController::spawn(source, FindConfig::default());
        controller
            .find(SearchOptions::new("cat").with_kind(FindKind::Again))
            .unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(
            last_state(&drain(&mut events)),
            Some((SessionState::Found, MatchesCount::new(1, 1)))
        );
        assert!(controller.highlight_spans(2, &[""]).await.unwrap().is_empty());
    }
}
