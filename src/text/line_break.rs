//! Line-wrap artifacts in extracted page text.
//!
//! Extracted text marks the end of each visual line with `'\n'`. Most of
//! these markers separate words and become a space, but some are artifacts
//! of line wrapping:
//! - "Govern-" + "ment" → the hyphen only exists because the word was split
//! - "COVID-" + "19" or "e-" + "Mail" → a real compound hyphen, kept
//! - a line ending in an ideograph or kana never implies a space
//!
//! Soft hyphens (U+00AD) always mark an optional break and are joined.

use unicode_normalization::char::is_combining_mark;

use crate::text::char_class::{classify, CharClass};

/// Soft hyphen (U+00AD).
pub const SOFT_HYPHEN: char = '\u{00AD}';

/// Katakana-Hiragana voiced and semi-voiced sound marks.
const KANA_VOICING_MARKS: [char; 2] = ['\u{3099}', '\u{309A}'];

/// What a line-break marker turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineBreak {
    /// The marker disappears without a trace.
    Elide,
    /// The marker and the hyphen before it disappear; the word is rejoined.
    JoinHyphenated,
    /// The marker becomes a single space.
    Space,
}

/// Decide what a line-break marker becomes.
///
/// # Arguments
///
/// * `prev` - Last character emitted before the marker
/// * `before_prev` - Character emitted before `prev`
/// * `next` - First character after the marker
pub fn resolve(prev: Option<char>, before_prev: Option<char>, next: Option<char>) -> LineBreak {
    let Some(prev) = prev else {
        return LineBreak::Space;
    };

    if KANA_VOICING_MARKS.contains(&prev) {
        return LineBreak::Elide;
    }

    if prev == '-' || prev == SOFT_HYPHEN {
        if let Some(before) = before_prev.filter(|c| !c.is_whitespace()) {
            return if is_wrap_hyphen(prev, before, next) {
                LineBreak::JoinHyphenated
            } else {
                // A hyphen after a non-letter is part of the text.
                LineBreak::Elide
            };
        }
    }

    if is_ideographic_line_end(prev) {
        return LineBreak::Elide;
    }

    LineBreak::Space
}

/// Whether `before` + `hyphen` + line break + `next` is a word split by wrapping.
fn is_wrap_hyphen(hyphen: char, before: char, next: Option<char>) -> bool {
    if is_combining_mark(before) {
        return true;
    }
    if hyphen == SOFT_HYPHEN {
        return before.is_alphabetic();
    }
    match next {
        Some(next) if before.is_lowercase() => next.is_lowercase(),
        Some(next) if before.is_uppercase() => next.is_alphabetic(),
        _ => false,
    }
}

/// CJK characters at the end of a line do not imply a space.
fn is_ideographic_line_end(c: char) -> bool {
    matches!(
        classify(c),
        CharClass::Han | CharClass::Hiragana | CharClass::Katakana
    ) || matches!(c, '\u{3006}' | '\u{3007}' | '\u{3021}'..='\u{3029}')
}
