//! Find options sent with every `find` call.

use serde::{Deserialize, Serialize};

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Query {
    /// A single phrase
    Text(String),
    /// Any of several terms
    Terms(Vec<String>),
}

impl Default for Query {
    fn default() -> Self {
        Query::Text(String::new())
    }
}

impl From<&str> for Query {
    fn from(text: &str) -> Self {
        Query::Text(text.to_string())
    }
}

impl From<String> for Query {
    fn from(text: String) -> Self {
        Query::Text(text)
    }
}

impl From<Vec<String>> for Query {
    fn from(terms: Vec<String>) -> Self {
        Query::Terms(terms)
    }
}

impl From<&[&str]> for Query {
    fn from(terms: &[&str]) -> Self {
        Query::Terms(terms.iter().map(|t| t.to_string()).collect())
    }
}

/// Why `find` was called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FindKind {
    /// Live typing in the find field; the search is debounced.
    #[default]
    Typing,
    /// Explicit next/previous request.
    Again,
    /// The "highlight all" toggle changed.
    HighlightAllChange,
    /// Case, whole-word or diacritic matching changed.
    OptionChange,
}

/// Options for one find cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchOptions {
    /// Query text or terms
    pub query: Query,
    /// Match case exactly
    pub case_sensitive: bool,
    /// Require diacritics to match exactly
    pub match_diacritics: bool,
    /// Match whole words only
    pub entire_word: bool,
    /// Highlight every match, not only the selected one
    pub highlight_all: bool,
    /// Navigate backwards
    pub find_previous: bool,
    /// Why this call was made
    pub kind: FindKind,
}

impl SearchOptions {
    /// Create options for a query with every flag off.
    pub fn new(query: impl Into<Query>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Set case sensitivity.
    pub fn with_case_sensitive(mut self, value: bool) -> Self {
        self.case_sensitive = value;
        self
    }

    /// Set exact diacritic matching.
    pub fn with_match_diacritics(mut self, value: bool) -> Self {
        self.match_diacritics = value;
        self
    }

    /// Match whole words only.
    pub fn with_entire_word(mut self, value: bool) -> Self {
        self.entire_word = value;
        self
    }

    /// Highlight all matches.
    pub fn with_highlight_all(mut self, value: bool) -> Self {
        self.highlight_all = value;
        self
    }

    /// Search backwards.
    pub fn with_find_previous(mut self, value: bool) -> Self {
        self.find_previous = value;
        self
    }

    /// Set the call kind.
    pub fn with_kind(mut self, kind: FindKind) -> Self {
        self.kind = kind;
        self
    }
}
