//! Per-page normalized text and match lists.

use serde::{Deserialize, Serialize};

use crate::search::pattern::CompiledPattern;
use crate::text::{is_entire_word, normalize, NormalizedText};

/// One match in original page coordinates (characters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMatch {
    /// Offset of the first matched character
    pub offset: usize,
    /// Number of matched characters
    pub length: usize,
}

impl PageMatch {
    /// Create a match.
    pub fn new(offset: usize, length: usize) -> Self {
        Self { offset, length }
    }

    /// Offset one past the last matched character.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }
}

/// Normalized text of one page plus its matches for the current pattern.
#[derive(Debug, Clone)]
pub struct PageMatchIndex {
    page_index: usize,
    text: NormalizedText,
    matches: Option<Vec<PageMatch>>,
}

impl PageMatchIndex {
    /// Normalize the extracted text of a page.
    pub fn new(page_index: usize, raw_text: &str) -> Self {
        Self {
            page_index,
            text: normalize(raw_text),
            matches: None,
        }
    }

    /// A page without text, used when extraction failed.
    pub fn empty(page_index: usize) -> Self {
        Self {
            page_index,
            text: NormalizedText::empty(),
            matches: None,
        }
    }

    /// Index of the page.
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    /// Normalized page text.
    pub fn text(&self) -> &NormalizedText {
        &self.text
    }

    /// Whether the normalized text keeps combining marks.
    pub fn has_diacritics(&self) -> bool {
        self.text.has_diacritics
    }

    /// Matches for the current pattern, `None` until computed.
    pub fn matches(&self) -> Option<&[PageMatch]> {
        self.matches.as_deref()
    }

    /// Number of matches, `None` until computed.
    pub fn match_count(&self) -> Option<usize> {
        self.matches.as_ref().map(Vec::len)
    }

    /// Forget matches of a previous pattern. The normalized text is kept.
    pub fn clear_matches(&mut self) {
        self.matches = None;
    }

    /// Run `pattern` over the page and store the result.
    ///
    /// A missing pattern yields an empty match list.
    pub fn compute_matches(
        &mut self,
        pattern: Option<&CompiledPattern>,
        entire_word: bool,
    ) -> &[PageMatch] {
        let matches = pattern
            .map(|p| find_matches(&self.text, p, entire_word))
            .unwrap_or_default();
        log::trace!("Page {}: {} matches", self.page_index, matches.len());
        self.matches.insert(matches)
    }
}

/// Find all occurrences of `pattern` and translate them to original offsets.
pub fn find_matches(
    text: &NormalizedText,
    pattern: &CompiledPattern,
    entire_word: bool,
) -> Vec<PageMatch> {
    let content = text.normalized.as_str();
    let mut matches = Vec::new();

    // Byte offsets only move forward, so characters are counted incrementally.
    let mut byte_pos = 0;
    let mut char_pos = 0;

    for (start, end) in pattern.find_iter(content) {
        if entire_word && !is_entire_word(content, start, end - start) {
            continue;
        }

        char_pos += content[byte_pos..start].chars().count();
        byte_pos = start;
        let char_len = content[start..end].chars().count();

        match text.original_range(char_pos, char_len) {
            Some((offset, length)) => matches.push(PageMatch::new(offset, length)),
            None => log::trace!("Dropping empty match at normalized offset {}", char_pos),
        }
    }

    matches
}
