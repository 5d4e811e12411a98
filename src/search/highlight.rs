//! Projection of page matches onto text-layer fragments.
//!
//! A page's text layer is a list of fragments whose concatenation is the
//! page text in original coordinates. Matches are located with two cursors
//! that only move forward (fragment index and characters consumed), then
//! split into one span per fragment they touch:
//!
//! ```text
//! fragments:  [The ca][t sat.]
//! match:          ^^^^^           offset 4, length 3
//! spans:      Begin(0, 4..6)  End(1, 0..1)
//! ```

use serde::{Deserialize, Serialize};

use crate::search::page_index::PageMatch;

/// One chunk of a text layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFragment {
    /// Host identifier of the element rendering this chunk
    pub id: String,
    /// Displayed text
    pub text: String,
}

impl TextFragment {
    /// Create a fragment.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl AsRef<str> for TextFragment {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

/// How a span relates to the match it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HighlightKind {
    /// Not highlighted (only used by [`FragmentSegment`])
    None,
    /// The whole match lies in this fragment
    Plain,
    /// First fragment of a match crossing fragments
    Begin,
    /// Fragment fully covered by a match
    Middle,
    /// Last fragment of a match crossing fragments
    End,
}

/// A position inside the text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentOffset {
    /// Index into the fragment list
    pub fragment: usize,
    /// Character offset inside that fragment
    pub offset: usize,
}

/// Where a match begins and ends in the text layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLocation {
    /// Index into the page's match list
    pub match_index: usize,
    /// First highlighted character
    pub begin: FragmentOffset,
    /// One past the last highlighted character
    pub end: FragmentOffset,
}

/// Highlighted characters `start..end` of one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightSpan {
    /// Index into the page's match list
    pub match_index: usize,
    /// Index into the fragment list
    pub fragment: usize,
    /// First highlighted character of the fragment
    pub start: usize,
    /// One past the last highlighted character
    pub end: usize,
    /// Part of the match this span covers
    pub kind: HighlightKind,
    /// Whether the span belongs to the selected match
    pub selected: bool,
}

/// A run of characters of one fragment, highlighted or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentSegment {
    /// Index into the fragment list
    pub fragment: usize,
    /// First character of the run
    pub start: usize,
    /// One past the last character of the run
    pub end: usize,
    /// [`HighlightKind::None`] for text between highlights
    pub kind: HighlightKind,
    /// Match the run belongs to, if highlighted
    pub match_index: Option<usize>,
    /// Whether the run belongs to the selected match
    pub selected: bool,
}

impl FragmentSegment {
    /// The characters of `fragment_text` covered by this segment.
    pub fn text<'a>(&self, fragment_text: &'a str) -> &'a str {
        slice_chars(fragment_text, self.start, self.end)
    }
}

/// Maps the matches of one page onto its fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightProjector {
    selected_match: Option<usize>,
    highlight_all: bool,
}

impl HighlightProjector {
    /// `selected_match` is the selected match index if the selection is on
    /// this page.
    pub fn new(selected_match: Option<usize>, highlight_all: bool) -> Self {
        Self {
            selected_match,
            highlight_all,
        }
    }

    /// Locate sorted matches in the fragments.
    ///
    /// Matches starting past the end of the text layer are skipped; a match
    /// running past it is cut at the end of the last fragment.
    pub fn locate<T: AsRef<str>>(matches: &[PageMatch], fragments: &[T]) -> Vec<MatchLocation> {
        let lengths = fragment_lengths(fragments);
        let total: usize = lengths.iter().sum();
        let Some(last) = lengths.len().checked_sub(1) else {
            if !matches.is_empty() {
                log::warn!("{} matches but no text fragments", matches.len());
            }
            return Vec::new();
        };

        let mut locations = Vec::with_capacity(matches.len());
        let mut fragment = 0;
        let mut consumed = 0;

        for (match_index, m) in matches.iter().enumerate() {
            if m.offset >= total {
                log::warn!(
                    "Match {} at offset {} lies past the text layer ({} characters)",
                    match_index,
                    m.offset,
                    total
                );
                continue;
            }

            while fragment != last && m.offset >= consumed + lengths[fragment] {
                consumed += lengths[fragment];
                fragment += 1;
            }
            let begin = FragmentOffset {
                fragment,
                offset: m.offset - consumed,
            };

            let end_index = m.end().min(total);
            while fragment != last && end_index > consumed + lengths[fragment] {
                consumed += lengths[fragment];
                fragment += 1;
            }
            let end = FragmentOffset {
                fragment,
                offset: end_index - consumed,
            };

            locations.push(MatchLocation {
                match_index,
                begin,
                end,
            });
        }

        locations
    }

    /// Highlight spans for the matches of one page.
    pub fn project<T: AsRef<str>>(&self, matches: &[PageMatch], fragments: &[T]) -> Vec<HighlightSpan> {
        let lengths = fragment_lengths(fragments);
        let mut spans = Vec::new();
        let mut prev_begin = None;

        for location in Self::locate(matches, fragments) {
            // Alternation can yield several matches starting at one spot.
            if prev_begin == Some(location.begin) {
                continue;
            }
            prev_begin = Some(location.begin);

            let selected = self.selected_match == Some(location.match_index);
            if !self.highlight_all && !selected {
                continue;
            }

            let span = |fragment, start, end, kind| HighlightSpan {
                match_index: location.match_index,
                fragment,
                start,
                end,
                kind,
                selected,
            };
            let MatchLocation { begin, end, .. } = location;

            if begin.fragment == end.fragment {
                spans.push(span(begin.fragment, begin.offset, end.offset, HighlightKind::Plain));
                continue;
            }

            spans.push(span(
                begin.fragment,
                begin.offset,
                lengths[begin.fragment],
                HighlightKind::Begin,
            ));
            for middle in begin.fragment + 1..end.fragment {
                if lengths[middle] > 0 {
                    spans.push(span(middle, 0, lengths[middle], HighlightKind::Middle));
                }
            }
            spans.push(span(end.fragment, 0, end.offset, HighlightKind::End));
        }

        spans
    }

    /// Split every fragment into highlighted and plain runs.
    ///
    /// `spans` must come from [`HighlightProjector::project`] on the same
    /// fragments.
    pub fn segments<T: AsRef<str>>(fragments: &[T], spans: &[HighlightSpan]) -> Vec<FragmentSegment> {
        let mut segments = Vec::new();
        let mut spans = spans.iter().peekable();

        for (fragment, text) in fragments.iter().enumerate() {
            let len = text.as_ref().chars().count();
            let mut cursor = 0;

            while let Some(span) = spans.next_if(|s| s.fragment <= fragment) {
                if span.fragment < fragment {
                    continue;
                }
                let start = span.start.clamp(cursor, len);
                let end = span.end.min(len);
                if start > cursor {
                    segments.push(FragmentSegment::plain(fragment, cursor, start));
                }
                if end > start {
                    segments.push(FragmentSegment {
                        fragment,
                        start,
                        end,
                        kind: span.kind,
                        match_index: Some(span.match_index),
                        selected: span.selected,
                    });
                    cursor = end;
                }
            }

            if cursor < len {
                segments.push(FragmentSegment::plain(fragment, cursor, len));
            }
        }

        segments
    }
}

impl FragmentSegment {
    fn plain(fragment: usize, start: usize, end: usize) -> Self {
        Self {
            fragment,
            start,
            end,
            kind: HighlightKind::None,
            match_index: None,
            selected: false,
        }
    }
}

fn fragment_lengths<T: AsRef<str>>(fragments: &[T]) -> Vec<usize> {
    fragments.iter().map(|f| f.as_ref().chars().count()).collect()
}

fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    let byte_at = |index: usize| {
        text.char_indices()
            .nth(index)
            .map_or(text.len(), |(byte, _)| byte)
    };
    let start = byte_at(start);
    let end = byte_at(end).max(start);
    &text[start..end]
}
