//! Markup handling for individual text leaves.
//!
//! - [`lexer`]: lenient tokenizer for the tag/attribute/text micro-grammar
//! - [`splitter`]: prose extraction into placeholders and the reverse

pub mod lexer;
pub mod splitter;

pub use lexer::{tokenize, Attribute, Tag, Token};
pub use splitter::{extract, reinsert, Extraction, MARKER_TAG};
