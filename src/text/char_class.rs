//! Character classes used for whole-word decisions.
//!
//! A match is a whole word when the characters just outside it belong to a
//! different class than the characters at its edges. The classes follow the
//! script blocks that matter for word breaking: Latin-like letters and digits
//! form words, while CJK ideographs, the two kana syllabaries and Thai are
//! each their own class.

use serde::{Deserialize, Serialize};

/// Word-breaking class of a character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharClass {
    /// Whitespace (ASCII blanks, NBSP, Unicode spaces)
    Space,
    /// ASCII letter, digit or underscore
    AsciiAlnum,
    /// Punctuation and symbols
    Punctuation,
    /// Han ideograph
    Han,
    /// Fullwidth Katakana
    Katakana,
    /// Hiragana
    Hiragana,
    /// Halfwidth Katakana
    HalfwidthKatakana,
    /// Thai
    Thai,
    /// Any other letter
    Letter,
}

impl CharClass {
    /// Whether two adjacent characters of these classes continue one word.
    ///
    /// ASCII alphanumerics and other letters join each other, so "straße"
    /// or "naïve" is a single word.
    pub fn joins(self, other: CharClass) -> bool {
        match (self, other) {
            (CharClass::AsciiAlnum | CharClass::Letter, CharClass::AsciiAlnum | CharClass::Letter) => {
                true
            },
            (a, b) => a == b,
        }
    }
}

/// Classify a character.
pub fn classify(c: char) -> CharClass {
    let code = c as u32;

    if code < 0x80 {
        return match c {
            ' ' | '\t' | '\r' | '\n' => CharClass::Space,
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' => CharClass::AsciiAlnum,
            _ => CharClass::Punctuation,
        };
    }

    // Alphabetic scripts live below the CJK radicals block.
    if code < 0x2E80 {
        return match code {
            0x00A0 | 0x2000..=0x200B | 0x202F | 0x205F => CharClass::Space,
            0x00A1..=0x00BF | 0x00D7 | 0x00F7 => CharClass::Punctuation,
            0x2010..=0x2027 | 0x2030..=0x205E => CharClass::Punctuation,
            0x0E00..=0x0E7F => CharClass::Thai,
            _ => CharClass::Letter,
        };
    }

    match code {
        0x3000 => CharClass::Space,
        0x3001..=0x3003 | 0x3008..=0x3011 | 0x3014..=0x301F => CharClass::Punctuation,
        0x3400..=0x9FFF | 0xF900..=0xFAFF | 0x20000..=0x2FA1F => CharClass::Han,
        0x30A0..=0x30FF => CharClass::Katakana,
        0x3040..=0x309F => CharClass::Hiragana,
        0xFF60..=0xFF9F => CharClass::HalfwidthKatakana,
        _ => CharClass::Letter,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_classes() {
        assert_eq!(classify(' '), CharClass::Space);
        assert_eq!(classify('\t'), CharClass::Space);
        assert_eq!(classify('a'), CharClass::AsciiAlnum);
        assert_eq!(classify('Z'), CharClass::AsciiAlnum);
        assert_eq!(classify('7'), CharClass::AsciiAlnum);
        assert_eq!(classify('_'), CharClass::AsciiAlnum);
        assert_eq!(classify('.'), CharClass::Punctuation);
        assert_eq!(classify('-'), CharClass::Punctuation);
    }

    #[test]
    fn test_extended_latin_and_spaces() {
        assert_eq!(classify('é'), CharClass::Letter);
        assert_eq!(classify('ß'), CharClass::Letter);
        assert_eq!(classify('\u{00A0}'), CharClass::Space);
        assert_eq!(classify('\u{2014}'), CharClass::Punctuation);
        assert_eq!(classify('¿'), CharClass::Punctuation);
    }

    #[test]
    fn test_asian_scripts() {
        assert_eq!(classify('中'), CharClass::Han);
        assert_eq!(classify('カ'), CharClass::Katakana);
        assert_eq!(classify('か'), CharClass::Hiragana);
        assert_eq!(classify('ｶ'), CharClass::HalfwidthKatakana);
        assert_eq!(classify('ก'), CharClass::Thai);
        assert_eq!(classify('\u{3000}'), CharClass::Space);
        assert_eq!(classify('。'), CharClass::Punctuation);
        assert_eq!(classify('한'), CharClass::Letter);
    }

    #[test]
    fn test_joins() {
        assert!(CharClass::AsciiAlnum.joins(CharClass::Letter));
        assert!(CharClass::Letter.joins(CharClass::AsciiAlnum));
        assert!(CharClass::Han.joins(CharClass::Han));
        assert!(!CharClass::Han.joins(CharClass::Hiragana));
        assert!(!CharClass::AsciiAlnum.joins(CharClass::Punctuation));
        assert!(CharClass::Space.joins(CharClass::Space));
    }
}
