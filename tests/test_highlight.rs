//! Tests for projecting matches onto text-layer fragments.

use find_oxide::search::{
    FindKind, HighlightKind, HighlightProjector, HighlightSpan, SearchOptions, SearchSession,
    TextFragment,
};
use find_oxide::FindConfig;

/// Search a single page and project the matches onto `fragments`.
fn spans_for(text: &str, fragments: &[&str], options: SearchOptions) -> Vec<HighlightSpan> {
    let mut session = SearchSession::new(1, FindConfig::default());
    session.page_text_extracted(0, Ok(text.to_string())).unwrap();
    session.find(options.with_kind(FindKind::Again));
    session.highlight_spans(0, fragments)
}

fn shape(spans: &[HighlightSpan]) -> Vec<(usize, usize, usize, HighlightKind)> {
    spans
        .iter()
        .map(|s| (s.fragment, s.start, s.end, s.kind))
        .collect()
}

mod projection {
    use super::*;

    #[test]
    fn test_matches_split_across_fragments() {
        let spans = spans_for(
            "The cat sat on the cat mat",
            &["The c", "at sat on ", "the cat mat"],
            SearchOptions::new("cat").with_highlight_all(true),
        );
        assert_eq!(
            shape(&spans),
            vec![
                (0, 4, 5, HighlightKind::Begin),
                (1, 0, 2, HighlightKind::End),
                (2, 4, 7, HighlightKind::Plain),
            ]
        );
        assert!(spans[0].selected && spans[1].selected);
        assert!(!spans[2].selected);
    }

    #[test]
    fn test_only_selection_without_highlight_all() {
        let spans = spans_for(
            "The cat sat on the cat mat",
            &["The cat sat on the cat mat"],
            SearchOptions::new("cat"),
        );
        assert_eq!(shape(&spans), vec![(0, 4, 7, HighlightKind::Plain)]);
    }

    #[test]
    fn test_decomposed_match_maps_to_displayed_text() {
        let spans = spans_for(
            "Caf\u{00E9} au lait",
            &["Caf", "\u{00E9} au lait"],
            SearchOptions::new("cafe"),
        );
        assert_eq!(
            shape(&spans),
            vec![(0, 0, 3, HighlightKind::Begin), (1, 0, 1, HighlightKind::End)]
        );
    }

    #[test]
    fn test_line_break_is_not_in_fragments() {
        let spans = spans_for(
            "new\nyork city",
            &["new", "york city"],
            SearchOptions::new("new york"),
        );
        assert_eq!(
            shape(&spans),
            vec![(0, 0, 3, HighlightKind::Begin), (1, 0, 4, HighlightKind::End)]
        );
    }

    #[test]
    fn test_ligature_highlighted_whole() {
        let spans = spans_for("a \u{FB01}ne day", &["a ", "\u{FB01}ne day"], SearchOptions::new("fine"));
        assert_eq!(shape(&spans), vec![(1, 0, 3, HighlightKind::Plain)]);
    }

    #[test]
    fn test_no_spans_after_close() {
        let mut session = SearchSession::new(1, FindConfig::default());
        session.page_text_extracted(0, Ok("cat".to_string())).unwrap();
        session.find(SearchOptions::new("cat").with_kind(FindKind::Again));
        assert_eq!(session.highlight_spans(0, &["cat"]).len(), 1);

        session.close();
        assert!(session.highlight_spans(0, &["cat"]).is_empty());
    }
}

mod segments {
    use super::*;

    #[test]
    fn test_segments_render_the_whole_layer() {
        let fragments = vec![
            TextFragment::new("span-0", "The c"),
            TextFragment::new("span-1", "at sat."),
        ];
        let mut session = SearchSession::new(1, FindConfig::default());
        session
            .page_text_extracted(0, Ok("The cat sat.".to_string()))
            .unwrap();
        session.find(SearchOptions::new("cat").with_kind(FindKind::Again));

        let spans = session.highlight_spans(0, &fragments);
        let segments = HighlightProjector::segments(&fragments, &spans);

        let rendered: String = segments
            .iter()
            .map(|s| {
                let text = s.text(&fragments[s.fragment].text);
                match s.kind {
                    HighlightKind::None => text.to_string(),
                    _ => format!("[{}]", text),
                }
            })
            .collect();
        assert_eq!(rendered, "The [c][at] sat.");
        assert!(segments
            .iter()
            .filter(|s| s.kind != HighlightKind::None)
            .all(|s| s.selected && s.match_index == Some(0)));
    }

    #[test]
    fn test_spans_serialize_for_hosts() {
        let spans = spans_for("cat", &["cat"], SearchOptions::new("cat"));
        let json = serde_json::to_value(&spans).unwrap();
        assert_eq!(json[0]["kind"], "plain");
        assert_eq!(json[0]["selected"], true);
        assert_eq!(json[0]["end"], 3);
    }
}
