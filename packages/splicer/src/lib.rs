//! Annotext Splicer - structure-preserving prose extraction for nested documents.
//!
//! Locates the eligible text leaves of a JSON document, swaps the prose
//! inside their markup for placeholder tokens, and later splices annotated
//! prose back into exactly those positions. Nothing else in the document
//! changes.
//!
//! # Example
//!
//! ```
//! use annotext_splicer::{extract_document, reinsert_document, Session};
//! use serde_json::json;
//!
//! let doc = json!({"id": 1, "text": "<p>Apple Inc announced</p>"});
//!
//! let mut session = Session::new();
//! let skeleton = extract_document(doc, &mut session).unwrap();
//! assert_eq!(session.fragments(), ["Apple Inc announced"]);
//!
//! let annotated = session
//!     .annotate(vec!["<ner type='ORG'>Apple Inc</ner> announced".into()])
//!     .unwrap();
//! let result = reinsert_document(skeleton, &annotated).unwrap();
//! assert_eq!(
//!     result["text"],
//!     "<p><ner type='ORG'>Apple Inc</ner> announced</p>"
//! );
//! ```
//!
//! # Architecture
//!
//! - [`placeholder`]: collision-free placeholder tokens, one key per document
//! - [`markup`]: tokenizer and prose splitter for a single text leaf
//! - [`session`]: per-document sequences tying both passes together
//! - [`walker`]: the eligibility rule and the two tree passes
//! - [`error`]: error types and Result alias

pub mod error;
pub mod markup;
pub mod placeholder;
pub mod session;
pub mod walker;

pub use error::{Result, SplicerError};
pub use markup::MARKER_TAG;
pub use placeholder::PlaceholderAllocator;
pub use session::{AnnotatedSession, LeafVisitor, Resolver, Session};
pub use walker::{extract_document, reinsert_document, walk, EXCLUDED_KEY};
