//! Query to pattern compilation.
//!
//! Queries are normalized like page text and then turned into a regular
//! expression that tolerates the differences normalization cannot remove:
//! - spacing around punctuation ("foo . bar" matches "foo.bar")
//! - any run of spaces where the query has whitespace
//! - diacritics present in the page but not in the query (unless exact
//!   diacritic matching is requested)
//!
//! A query made of several terms becomes an alternation. Terms are tried in
//! descending order so that "foobar" wins over its prefix "foo".

use lazy_static::lazy_static;
use phf::phf_set;
use regex::{Regex, RegexBuilder};
use unicode_normalization::char::is_combining_mark;

use crate::error::Result;
use crate::search::options::{Query, SearchOptions};
use crate::text::normalize;

lazy_static! {
    /// Query characters that need special treatment: regex metacharacters,
    /// punctuation, whitespace runs, combining marks and letters.
    static ref SPECIAL_CHARS: Regex =
        Regex::new(r"([.*+?^${}()|\[\]\\])|(\p{P})|(\s+)|(\p{M})|(\p{L})").unwrap();
}

/// Combining marks that change the meaning of a word and are never optional.
static DIACRITICS_EXCEPTION: phf::Set<char> = phf_set! {
    // Katakana-Hiragana voicing marks
    '\u{3099}', '\u{309A}',
    // Viramas and similar vowel killers
    '\u{094D}', '\u{09CD}', '\u{0A4D}', '\u{0ACD}', '\u{0B4D}', '\u{0BCD}', '\u{0C4D}',
    '\u{0CCD}', '\u{0D3B}', '\u{0D3C}', '\u{0D4D}', '\u{0DCA}', '\u{0E3A}', '\u{0EBA}',
    '\u{0F84}', '\u{1039}', '\u{103A}', '\u{1714}', '\u{1734}', '\u{17D2}', '\u{1A60}',
    '\u{1B44}', '\u{1BAA}', '\u{1BAB}', '\u{1BF2}', '\u{1BF3}', '\u{2D7F}', '\u{A806}',
    '\u{A82C}', '\u{A8C4}', '\u{A953}', '\u{A9C0}', '\u{AAC6}', '\u{AAF6}', '\u{ABED}',
    '\u{0C56}',
    // Tibetan vowel signs
    '\u{0F71}', '\u{0F72}', '\u{0F7A}', '\u{0F7B}', '\u{0F7C}', '\u{0F7D}', '\u{0F80}',
    '\u{0F74}',
};

const OPTIONAL_SPACES: &str = "[ ]*";

/// Whether a combining mark is always significant.
pub fn is_diacritic_exception(c: char) -> bool {
    DIACRITICS_EXCEPTION.contains(&c)
}

/// Convert one normalized query term into a pattern string.
///
/// Returns whether the pattern relies on Unicode-aware classes, and the
/// pattern itself. The pattern may be empty when the term only consisted of
/// ignorable diacritics.
pub fn convert_term(term: &str, match_diacritics: bool, has_diacritics: bool) -> (bool, String) {
    let mut is_unicode = false;
    let mut pattern = String::with_capacity(term.len() * 2);
    let mut last = 0;

    for caps in SPECIAL_CHARS.captures_iter(term) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        pattern.push_str(&regex::escape(&term[last..whole.start()]));
        last = whole.end();

        if let Some(meta) = caps.get(1) {
            pattern.push_str(OPTIONAL_SPACES);
            pattern.push('\\');
            pattern.push_str(meta.as_str());
            pattern.push_str(OPTIONAL_SPACES);
        } else if let Some(punct) = caps.get(2) {
            pattern.push_str(OPTIONAL_SPACES);
            pattern.push_str(&regex::escape(punct.as_str()));
            pattern.push_str(OPTIONAL_SPACES);
        } else if caps.get(3).is_some() {
            pattern.push_str("[ ]+");
        } else if let Some(mark) = caps.get(4) {
            let keep = match_diacritics || mark.as_str().chars().all(is_diacritic_exception);
            if keep {
                pattern.push_str(mark.as_str());
            }
        } else if let Some(letter) = caps.get(5) {
            pattern.push_str(letter.as_str());
            // The page keeps its diacritics, so any may follow a letter.
            if has_diacritics && !match_diacritics {
                is_unicode = true;
                pattern.push_str(r"\p{M}*");
            }
        }
    }
    pattern.push_str(&regex::escape(&term[last..]));

    // Spaces after trailing punctuation are never part of the match.
    if pattern.ends_with(OPTIONAL_SPACES) {
        pattern.truncate(pattern.len() - OPTIONAL_SPACES.len());
    }

    if match_diacritics && has_diacritics {
        is_unicode = true;
    }

    (is_unicode, pattern)
}

/// Normalized query terms.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Terms {
    Single(String),
    Multiple(Vec<String>),
}

/// A compiled query, ready to run over normalized page text.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    regex: Regex,
    is_unicode: bool,
    reject_trailing_marks: bool,
    /// One regex per term, in the order they are tried, when the trailing
    /// mark guard must fall back from a rejected term to the next one.
    alternatives: Vec<Regex>,
}

impl CompiledPattern {
    /// Whether the pattern needed Unicode-aware matching.
    pub fn is_unicode(&self) -> bool {
        self.is_unicode
    }

    /// The generated regular expression.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Iterate non-overlapping occurrences as `(start, end)` byte offsets.
    pub fn find_iter<'p, 't>(&'p self, text: &'t str) -> Occurrences<'p, 't> {
        Occurrences {
            pattern: self,
            text,
            at: 0,
        }
    }

    /// With exact diacritics, "aX" must not match inside "aXY".
    fn rejects_at(&self, text: &str, end: usize) -> bool {
        self.reject_trailing_marks
            && text[end..]
                .chars()
                .next()
                .is_some_and(|c| is_combining_mark(c) && !is_diacritic_exception(c))
    }

    /// End of the first term matching exactly at `start` that passes the
    /// trailing mark guard.
    fn alternative_end(&self, text: &str, start: usize) -> Option<usize> {
        self.alternatives.iter().find_map(|term| {
            term.find_at(text, start)
                .filter(|m| m.start() == start && !self.rejects_at(text, m.end()))
                .map(|m| m.end())
        })
    }
}

/// Iterator over the occurrences of a [`CompiledPattern`].
pub struct Occurrences<'p, 't> {
    pattern: &'p CompiledPattern,
    text: &'t str,
    at: usize,
}

impl Iterator for Occurrences<'_, '_> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        while self.at <= self.text.len() {
            let found = self.pattern.regex.find_at(self.text, self.at)?;
            let start = found.start();

            let end = if self.pattern.rejects_at(self.text, found.end()) {
                match self.pattern.alternative_end(self.text, start) {
                    Some(end) => end,
                    None => {
                        self.at = next_char_boundary(self.text, start);
                        continue;
                    },
                }
            } else {
                found.end()
            };

            // Always move forward, even past an empty match.
            self.at = if end > start {
                end
            } else {
                next_char_boundary(self.text, end)
            };
            return Some((start, end));
        }
        None
    }
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| index + c.len_utf8())
}

/// Compiles the current query once per diacritics flavour of page text.
#[derive(Debug, Clone)]
pub struct PatternCompiler {
    terms: Terms,
    case_sensitive: bool,
    match_diacritics: bool,
    /// Indexed by the page's `has_diacritics` flag.
    cache: [Option<Option<CompiledPattern>>; 2],
}

impl PatternCompiler {
    /// Normalize the query of `options` and prepare to compile it.
    pub fn new(options: &SearchOptions) -> Self {
        let terms = match &options.query {
            Query::Text(text) => Terms::Single(normalize(text).normalized),
            Query::Terms(terms) => {
                let mut normalized: Vec<String> = terms
                    .iter()
                    .filter(|t| !t.is_empty())
                    .map(|t| normalize(t).normalized)
                    .collect();
                normalized.sort_unstable();
                normalized.dedup();
                normalized.reverse();
                Terms::Multiple(normalized)
            },
        };

        Self {
            terms,
            case_sensitive: options.case_sensitive,
            match_diacritics: options.match_diacritics,
            cache: [None, None],
        }
    }

    /// Whether there is nothing to search for.
    pub fn is_empty(&self) -> bool {
        match &self.terms {
            Terms::Single(term) => term.is_empty(),
            Terms::Multiple(terms) => terms.is_empty(),
        }
    }

    /// Normalized terms in the order they are tried.
    pub fn terms(&self) -> Vec<&str> {
        match &self.terms {
            Terms::Single(term) => vec![term.as_str()],
            Terms::Multiple(terms) => terms.iter().map(String::as_str).collect(),
        }
    }

    /// Pattern for pages with or without diacritics.
    ///
    /// Returns `Ok(None)` when the query cannot match anything.
    pub fn pattern(&mut self, has_diacritics: bool) -> Result<Option<&CompiledPattern>> {
        let slot = &mut self.cache[usize::from(has_diacritics)];
        if slot.is_none() {
            let compiled = compile_terms(
                &self.terms,
                self.case_sensitive,
                self.match_diacritics,
                has_diacritics,
            )?;
            *slot = Some(compiled);
        }
        Ok(slot.as_ref().and_then(Option::as_ref))
    }
}

fn compile_terms(
    terms: &Terms,
    case_sensitive: bool,
    match_diacritics: bool,
    has_diacritics: bool,
) -> Result<Option<CompiledPattern>> {
    let reject_trailing_marks = match_diacritics && has_diacritics;
    let build = |source: &str| {
        RegexBuilder::new(source)
            .case_insensitive(!case_sensitive)
            .build()
    };

    let mut alternatives: Vec<Regex> = Vec::new();
    let (is_unicode, source) = match terms {
        Terms::Single(term) => convert_term(term, match_diacritics, has_diacritics),
        Terms::Multiple(terms) => {
            let mut is_unicode = false;
            let parts: Vec<String> = terms
                .iter()
                .filter_map(|term| {
                    let (unicode, part) = convert_term(term, match_diacritics, has_diacritics);
                    is_unicode |= unicode;
                    (!part.is_empty()).then(|| format!("({})", part))
                })
                .collect();
            if reject_trailing_marks && parts.len() > 1 {
                alternatives = parts
                    .iter()
                    .map(|part| build(part.as_str()))
                    .collect::<std::result::Result<_, regex::Error>>()?;
            }
            (is_unicode, parts.join("|"))
        },
    };

    if source.is_empty() {
        return Ok(None);
    }

    let regex = build(source.as_str())?;
    log::trace!("Compiled search pattern {:?} (unicode: {})", source, is_unicode);

    Ok(Some(CompiledPattern {
        regex,
        is_unicode,
        reject_trailing_marks,
        alternatives,
    }))
}
