// Allow unused for tests
#![cfg_attr(test, allow(dead_code))]
#![cfg_attr(test, allow(unused_variables))]

//! # Find Oxide
//!
//! Find-in-document engine for paginated documents whose page text arrives
//! asynchronously (PDF viewers and the like).
//!
//! ## Core Features
//!
//! - **Position-preserving normalization**: NFKD decomposition, typographic
//!   substitutions and line-wrap repair, with a table mapping every
//!   normalized offset back to the displayed text
//! - **Query compilation**: diacritic-insensitive, case-insensitive and
//!   whole-word matching, multi-term alternation
//! - **Incremental search**: pages are searched as their text arrives, the
//!   scan pauses on missing pages and wraps around the document once
//! - **Highlight projection**: matches mapped onto the fragments of a
//!   page's text layer
//! - **Async driver**: a tokio task with typing debounce and sequential page
//!   extraction
//!
//! ## Quick Start
//!
//! ```
//! use find_oxide::{FindConfig, FindKind, SearchOptions, SearchSession, SessionState};
//!
//! let mut session = SearchSession::new(1, FindConfig::default());
//! session.page_text_extracted(0, Ok("Caf\u{00E9} society".to_string())).unwrap();
//!
//! session.find(SearchOptions::new("cafe").with_kind(FindKind::Again));
//! assert_eq!(session.state(), SessionState::Found);
//!
//! let spans = session.highlight_spans(0, &["Café ", "society"]);
//! assert_eq!((spans[0].start, spans[0].end), (0, 4));
//! ```
//!
//! With a tokio runtime, [`FindController`] drives the session from a
//! [`PageTextSource`] and streams [`SearchEvent`]s.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Configuration
pub mod config;

// Text normalization and word boundaries
pub mod text;

// Query compilation, matching and the find session
pub mod search;

// Page text providers
pub mod source;

// Async driver
pub mod controller;

// Re-exports
pub use config::FindConfig;
pub use controller::FindController;
pub use error::{Error, Result};
pub use search::{
    FindAction, FindKind, HighlightKind, HighlightSpan, MatchesCount, PageMatch, PageTarget,
    Query, SearchEvent, SearchOptions, SearchSession, SessionState, TextFragment,
};
pub use source::{PageTextSource, StaticPages};

// Version info
/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
