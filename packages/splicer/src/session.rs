//! Per-document extraction state shared by the extract and reinsert passes.

use std::ops::Range;

use crate::error::{Result, SplicerError};
use crate::markup::{extract, reinsert};
use crate::placeholder::PlaceholderAllocator;

/// Something applied to every eligible text leaf during a tree walk.
///
/// The walker calls this once per eligible string leaf in traversal order
/// and stores the returned string in place of the leaf.
pub trait LeafVisitor {
    fn visit_leaf(&mut self, text: &str) -> Result<String>;
}

/// State of the extract pass for one document.
///
/// Holds the placeholder allocator and the document-wide placeholder and
/// fragment sequences. Each eligible leaf owns a contiguous range of those
/// sequences, recorded in traversal order.
#[derive(Debug)]
pub struct Session {
    allocator: PlaceholderAllocator,
    placeholders: Vec<String>,
    fragments: Vec<String>,
    leaves: Vec<Range<usize>>,
}

impl Session {
    /// Start a session with a fresh random key.
    #[must_use]
    pub fn new() -> Self {
        Self::with_allocator(PlaceholderAllocator::new_session())
    }

    /// Start a session with the given allocator.
    #[must_use]
    pub fn with_allocator(allocator: PlaceholderAllocator) -> Self {
        Self {
            allocator,
            placeholders: Vec::new(),
            fragments: Vec::new(),
            leaves: Vec::new(),
        }
    }

    /// Extracted prose fragments, in first-encountered order.
    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    /// Placeholders, index-aligned with [`Session::fragments`].
    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    /// Number of eligible leaves visited.
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    #[must_use]
    pub fn session_key(&self) -> &str {
        self.allocator.session_key()
    }

    /// Pair the extracted fragments with their annotated versions.
    ///
    /// `annotated` must have exactly one entry per fragment, same order.
    pub fn annotate(self, annotated: Vec<String>) -> Result<AnnotatedSession> {
        if annotated.len() != self.fragments.len() {
            return Err(SplicerError::AnnotationCountMismatch {
                expected: self.fragments.len(),
                actual: annotated.len(),
            });
        }
        Ok(AnnotatedSession {
            placeholders: self.placeholders,
            fragments: self.fragments,
            annotated,
            leaves: self.leaves,
        })
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl LeafVisitor for Session {
    fn visit_leaf(&mut self, text: &str) -> Result<String> {
        let extraction = extract(text, &mut self.allocator)?;
        let start = self.fragments.len();
        self.placeholders.extend(extraction.placeholders);
        self.fragments.extend(extraction.fragments);
        self.leaves.push(start..self.fragments.len());
        Ok(extraction.skeleton)
    }
}

/// A session whose fragments have been annotated, ready for reinsertion.
#[derive(Debug, Clone)]
pub struct AnnotatedSession {
    placeholders: Vec<String>,
    fragments: Vec<String>,
    annotated: Vec<String>,
    leaves: Vec<Range<usize>>,
}

impl AnnotatedSession {
    #[must_use]
    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    #[must_use]
    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Start resolving skeleton leaves in traversal order.
    #[must_use]
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver {
            session: self,
            next_leaf: 0,
        }
    }
}

/// Cursor over the leaves of an [`AnnotatedSession`].
///
/// Each call to [`LeafVisitor::visit_leaf`] resolves the next leaf's own
/// placeholders, so placeholders are never looked up across leaves.
#[derive(Debug)]
pub struct Resolver<'a> {
    session: &'a AnnotatedSession,
    next_leaf: usize,
}

impl Resolver<'_> {
    /// Check that every extracted leaf was resolved.
    pub fn finish(self) -> Result<()> {
        let extracted = self.session.leaves.len();
        if self.next_leaf == extracted {
            Ok(())
        } else {
            Err(SplicerError::UnusedFragments {
                resolved: self.next_leaf,
                extracted,
            })
        }
    }
}

impl LeafVisitor for Resolver<'_> {
    fn visit_leaf(&mut self, text: &str) -> Result<String> {
        let range = self
            .session
            .leaves
            .get(self.next_leaf)
            .cloned()
            .ok_or(SplicerError::SessionExhausted {
                extracted: self.session.leaves.len(),
            })?;
        self.next_leaf += 1;

        reinsert(
            text,
            &self.session.placeholders[range.clone()],
            &self.session.annotated[range],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn session() -> Session {
        Session::with_allocator(PlaceholderAllocator::with_key("t"))
    }

    #[test]
    fn test_session_accumulates_across_leaves() {
        let mut s = session();
        assert_eq!(s.visit_leaf("<p>one</p>").unwrap(), "<p>[t-0]</p>");
        assert_eq!(s.visit_leaf("   ").unwrap(), "   ");
        assert_eq!(s.visit_leaf("two<br/>three").unwrap(), "[t-1]<br/>[t-2]");

        assert_eq!(s.fragments(), ["one", "two", "three"]);
        assert_eq!(s.placeholders(), ["[t-0]", "[t-1]", "[t-2]"]);
        assert_eq!(s.leaf_count(), 3);
    }

    #[test]
    fn test_annotate_rejects_length_mismatch() {
        let mut s = session();
        s.visit_leaf("a").unwrap();
        assert!(matches!(
            s.annotate(vec![]),
            Err(SplicerError::AnnotationCountMismatch {
                expected: 1,
                actual: 0
            })
        ));
    }

    #[test]
    fn test_resolver_walks_leaves_in_order() {
        let mut s = session();
        let first = s.visit_leaf("<i>x</i>").unwrap();
        let second = s.visit_leaf("y").unwrap();
        let annotated = s.annotate(vec!["X".into(), "Y".into()]).unwrap();
        assert_eq!(annotated.placeholders(), ["[t-0]", "[t-1]"]);
        assert_eq!(annotated.fragments(), ["x", "y"]);

        let mut resolver = annotated.resolver();
        assert_eq!(resolver.visit_leaf(&first).unwrap(), "<i>X</i>");
        assert_eq!(resolver.visit_leaf(&second).unwrap(), "Y");
        assert!(resolver.finish().is_ok());
    }

    #[test]
    fn test_resolver_detects_extra_leaf() {
        let s = session();
        let annotated = s.annotate(vec![]).unwrap();
        let mut resolver = annotated.resolver();
        assert!(matches!(
            resolver.visit_leaf("text"),
            Err(SplicerError::SessionExhausted { extracted: 0 })
        ));
    }

    #[test]
    fn test_resolver_detects_unresolved_leaves() {
        let mut s = session();
        s.visit_leaf("a").unwrap();
        let annotated = s.annotate(vec!["A".into()]).unwrap();
        assert!(matches!(
            annotated.resolver().finish(),
            Err(SplicerError::UnusedFragments {
                resolved: 0,
                extracted: 1
            })
        ));
    }
}
