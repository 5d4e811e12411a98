//! Find-in-document search.
//!
//! This module turns a query into per-page matches and drives an
//! incremental find cycle over a paginated document:
//! - Query compilation with diacritic, case and whole-word modes
//! - Multi-term queries (longest alternative first)
//! - Per-page match lists in original text coordinates
//! - Resumable scanning with wrap-around and match counts
//! - Highlight projection onto text-layer fragments
//!
//! ## Example
//!
//! ```
//! use find_oxide::config::FindConfig;
//! use find_oxide::search::{FindKind, SearchOptions, SearchSession, SessionState};
//!
//! let mut session = SearchSession::new(2, FindConfig::default());
//! session.page_text_extracted(0, Ok("The cat sat.".to_string())).unwrap();
//! session.page_text_extracted(1, Ok("A cát sits.".to_string())).unwrap();
//!
//! session.find(SearchOptions::new("cat").with_kind(FindKind::Again));
//! assert_eq!(session.state(), SessionState::Found);
//! assert_eq!(session.matches_count().total, 2);
//! ```

pub mod events;
pub mod highlight;
pub mod options;
pub mod page_index;
pub mod pattern;
pub mod session;

pub use events::{MatchesCount, PageTarget, SearchEvent, SessionState, StateUpdate};
pub use highlight::{
    FragmentOffset, FragmentSegment, HighlightKind, HighlightProjector, HighlightSpan,
    MatchLocation, TextFragment,
};
pub use options::{FindKind, Query, SearchOptions};
pub use page_index::{PageMatch, PageMatchIndex};
pub use pattern::{CompiledPattern, PatternCompiler};
pub use session::{FindAction, ScanCursor, SearchSession, SelectionPointer};
