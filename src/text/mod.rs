//! Text primitives shared by the matcher and the session.
//!
//! - [`char_class`]: word-breaking character classes
//! - [`normalize`]: position-preserving normalization
//! - [`line_break`]: line-wrap artifacts handled during normalization
//! - [`word_boundary`]: whole-word match checks

pub mod char_class;
pub mod line_break;
pub mod normalize;
pub mod word_boundary;

pub use char_class::{classify, CharClass};
pub use normalize::{normalize, NormalizedText, PositionMap};
pub use word_boundary::is_entire_word;
