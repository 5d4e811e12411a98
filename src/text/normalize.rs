//! Position-preserving text normalization.
//!
//! Page text and queries are both normalized before matching so that
//! composed and decomposed diacritics, typographic quotes, ligatures and
//! line-wrap artifacts compare equal. Matching happens on the normalized
//! string; highlighting happens on the original one, so every normalization
//! step records where each output character came from.
//!
//! # Position map
//!
//! The mapping is stored as a sorted list of `(normalized_index, shift)`
//! entries. For a normalized index `i`, the active entry is the last one
//! whose index is `<= i`, and the original index is `i + shift`. An entry is
//! only added when the shift changes, so unchanged text costs nothing.
//!
//! For example, normalizing `"½ é"` (where `é` is precomposed) gives
//! `"1/2 e\u{301}"`:
//!
//! ```text
//! normalized: 1  /  2  ␠  e  ◌́
//! original:   0  0  0  1  2  2
//! entries:    (0,0) (1,-1) (2,-2) (5,-3) (6,-3)
//! ```
//!
//! # Coordinates
//!
//! Offsets are character (Unicode scalar value) offsets. Line-break markers
//! (`'\n'`) are layout hints rather than content: the fragments a page is
//! drawn with never contain them, so original coordinates skip them.

use phf::phf_map;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::{canonical_combining_class, is_combining_mark};
use unicode_normalization::UnicodeNormalization;

use crate::text::line_break::{self, LineBreak, SOFT_HYPHEN};

/// Line-break marker in extracted page text.
pub const LINE_BREAK: char = '\n';

/// Visually special characters replaced before matching.
static SUBSTITUTIONS: phf::Map<char, &'static str> = phf_map! {
    '\u{2010}' => "-",   // Hyphen
    '\u{2018}' => "'",   // Left single quotation mark
    '\u{2019}' => "'",   // Right single quotation mark
    '\u{201A}' => "'",   // Single low-9 quotation mark
    '\u{201B}' => "'",   // Single high-reversed-9 quotation mark
    '\u{201C}' => "\"",  // Left double quotation mark
    '\u{201D}' => "\"",  // Right double quotation mark
    '\u{201E}' => "\"",  // Double low-9 quotation mark
    '\u{201F}' => "\"",  // Double high-reversed-9 quotation mark
    '\u{00BC}' => "1/4", // Vulgar fraction one quarter
    '\u{00BD}' => "1/2", // Vulgar fraction one half
    '\u{00BE}' => "3/4", // Vulgar fraction three quarters
};

/// Sorted `(normalized_index, shift)` table mapping normalized offsets back
/// to original offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionMap {
    entries: Vec<(usize, isize)>,
}

impl PositionMap {
    /// Map for text that normalization left untouched.
    pub fn identity(len: usize) -> Self {
        Self {
            entries: vec![(0, 0), (len, 0)],
        }
    }

    /// The raw `(normalized_index, shift)` entries.
    pub fn entries(&self) -> &[(usize, isize)] {
        &self.entries
    }

    /// Shift active at a normalized index.
    pub fn shift_at(&self, index: usize) -> isize {
        let active = self.entries.partition_point(|&(start, _)| start <= index);
        active
            .checked_sub(1)
            .and_then(|i| self.entries.get(i))
            .map_or(0, |&(_, shift)| shift)
    }

    /// Original offset of the character at a normalized offset.
    pub fn original_index(&self, index: usize) -> usize {
        (index as isize + self.shift_at(index)).max(0) as usize
    }
}

/// Records shift changes while the normalized string is built.
struct PositionRecorder {
    entries: Vec<(usize, isize)>,
    shift: isize,
}

impl PositionRecorder {
    fn new() -> Self {
        Self {
            entries: vec![(0, 0)],
            shift: 0,
        }
    }

    fn record(&mut self, normalized_index: usize, original_index: usize) {
        let shift = original_index as isize - normalized_index as isize;
        if shift != self.shift {
            self.entries.push((normalized_index, shift));
            self.shift = shift;
        }
    }

    fn finish(mut self, normalized_len: usize, original_len: usize) -> PositionMap {
        self.entries
            .push((normalized_len, original_len as isize - normalized_len as isize));
        PositionMap {
            entries: self.entries,
        }
    }
}

/// Normalized text together with the information needed to map back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedText {
    /// Text matching runs against
    pub normalized: String,
    /// Normalized → original offset table
    pub positions: PositionMap,
    /// Whether the normalized text contains combining marks
    pub has_diacritics: bool,
    original_len: usize,
    /// Normalized indices of the spaces standing in for line breaks
    line_break_spaces: Vec<usize>,
}

impl NormalizedText {
    /// Normalized text of an empty page.
    pub fn empty() -> Self {
        Self {
            normalized: String::new(),
            positions: PositionMap::identity(0),
            has_diacritics: false,
            original_len: 0,
            line_break_spaces: Vec::new(),
        }
    }

    /// Length of the original text in characters, line-break markers excluded.
    pub fn original_len(&self) -> usize {
        self.original_len
    }

    /// Whether the character at a normalized index is a space inserted for
    /// a line break.
    pub fn is_line_break_space(&self, index: usize) -> bool {
        self.line_break_spaces.binary_search(&index).is_ok()
    }

    /// Translate a normalized character range into an original one.
    ///
    /// Spaces inserted for line breaks have no original character, so they
    /// are trimmed from both ends of the range first. Returns
    /// `(offset, length)` in original coordinates, or `None` when the range
    /// collapses to nothing.
    pub fn original_range(&self, start: usize, len: usize) -> Option<(usize, usize)> {
        let (mut start, mut end) = (start, start + len);
        while start < end && self.is_line_break_space(start) {
            start += 1;
        }
        while start < end && self.is_line_break_space(end - 1) {
            end -= 1;
        }
        if start == end || self.original_len == 0 {
            return None;
        }
        let first = self.positions.original_index(start);
        let last = self
            .positions
            .original_index(end - 1)
            .min(self.original_len - 1);
        if first > last {
            return None;
        }
        Some((first, last + 1 - first))
    }
}

/// One normalized character and the original character it came from.
#[derive(Debug, Clone, Copy)]
struct Unit {
    ch: char,
    original: usize,
    line_break: bool,
}

impl Unit {
    fn new(ch: char, original: usize) -> Self {
        Self {
            ch,
            original,
            line_break: false,
        }
    }
}

/// Normalize page or query text for matching.
///
/// See the module documentation for the mapping contract. The result is
/// stable: normalizing an already normalized string returns it unchanged.
pub fn normalize(text: &str) -> NormalizedText {
    let mut units: Vec<Unit> = Vec::with_capacity(text.len());
    let mut original = 0;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == LINE_BREAK {
            resolve_line_break(&mut units, chars.peek().copied(), original);
            continue;
        }
        push_decomposed(&mut units, c, original);
        original += 1;
    }

    // Soft hyphens only matter for line-break resolution.
    units.retain(|u| u.ch != SOFT_HYPHEN);
    reorder_combining_marks(&mut units);

    let mut normalized = String::with_capacity(units.len());
    let mut recorder = PositionRecorder::new();
    let mut has_diacritics = false;
    let mut line_break_spaces = Vec::new();
    let mut index = 0;
    for unit in &units {
        recorder.record(index, unit.original);
        if unit.line_break {
            line_break_spaces.push(index);
        }
        has_diacritics |= is_combining_mark(unit.ch);
        normalized.push(unit.ch);
        index += 1;
    }

    NormalizedText {
        normalized,
        positions: recorder.finish(index, original),
        has_diacritics,
        original_len: original,
        line_break_spaces,
    }
}

/// Decompose one original character into its normalized units.
fn push_decomposed(units: &mut Vec<Unit>, c: char, original: usize) {
    if let Some(replacement) = SUBSTITUTIONS.get(&c) {
        units.extend(replacement.chars().map(|ch| Unit::new(ch, original)));
        return;
    }

    // NFKD is NFD plus compatibility mappings (ligatures, fullwidth forms,
    // Hangul syllables to Jamo via the canonical part).
    for ch in std::iter::once(c).nfkd() {
        match SUBSTITUTIONS.get(&ch) {
            Some(replacement) => units.extend(replacement.chars().map(|ch| Unit::new(ch, original))),
            None => units.push(Unit::new(ch, original)),
        }
    }
}

/// Apply a line-break marker to the units emitted so far.
fn resolve_line_break(units: &mut Vec<Unit>, next: Option<char>, original: usize) {
    let prev = units.last().map(|u| u.ch);
    let before_prev = units.len().checked_sub(2).map(|i| units[i].ch);

    match line_break::resolve(prev, before_prev, next) {
        LineBreak::Elide => {},
        LineBreak::JoinHyphenated => {
            units.pop();
        },
        LineBreak::Space => units.push(Unit {
            ch: ' ',
            original,
            line_break: true,
        }),
    }
}

/// Put every run of combining marks in canonical order.
///
/// Characters are decomposed one at a time, so marks coming from adjacent
/// characters may be out of order. Original indices stay ascending.
fn reorder_combining_marks(units: &mut [Unit]) {
    let mut start = 0;
    while start < units.len() {
        if canonical_combining_class(units[start].ch) == 0 {
            start += 1;
            continue;
        }
        let end = units[start..]
            .iter()
            .position(|u| canonical_combining_class(u.ch) == 0)
            .map_or(units.len(), |offset| start + offset);
        if end - start > 1 {
            let mut marks: Vec<char> = units[start..end].iter().map(|u| u.ch).collect();
            marks.sort_by_key(|&ch| canonical_combining_class(ch));
            for (unit, ch) in units[start..end].iter_mut().zip(marks) {
                unit.ch = ch;
            }
        }
        start = end;
    }
}
