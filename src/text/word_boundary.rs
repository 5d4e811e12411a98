//! Whole-word match detection.
//!
//! A match is a whole word when neither neighbour continues the word it
//! starts or ends. Neighbours are looked up on the normalized text, skipping
//! combining marks in both directions, and compared by [`CharClass`] so that
//! CJK runs break against Latin text without any spaces in between.

use unicode_normalization::char::is_combining_mark;

use crate::text::char_class::classify;

/// Check whether `content[start..start + len]` is a whole word.
///
/// `start` and `len` are byte offsets on `content` and must fall on
/// character boundaries. The beginning and end of `content` always count as
/// boundaries.
pub fn is_entire_word(content: &str, start: usize, len: usize) -> bool {
    let end = start + len;
    let (Some(before), Some(matched), Some(after)) =
        (content.get(..start), content.get(start..end), content.get(end..))
    else {
        return false;
    };

    if let Some(limit) = before.chars().rev().find(|c| !is_combining_mark(*c)) {
        if let Some(first) = matched.chars().next() {
            if classify(first).joins(classify(limit)) {
                return false;
            }
        }
    }

    if let Some(limit) = after.chars().find(|c| !is_combining_mark(*c)) {
        let last = matched
            .chars()
            .rev()
            .find(|c| !is_combining_mark(*c))
            .or_else(|| matched.chars().next_back());
        if let Some(last) = last {
            if classify(last).joins(classify(limit)) {
                return false;
            }
        }
    }

    true
}
