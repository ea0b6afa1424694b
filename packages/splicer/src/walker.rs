//! Two-pass traversal of a document tree.
//!
//! A string leaf is eligible when every step from the root down to it
//! lands on the last entry of its container, and none of those steps goes
//! through [`EXCLUDED_KEY`]. Both passes use the same traversal, so a
//! leaf is eligible on reinsertion exactly when it was eligible on
//! extraction.

use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::session::{AnnotatedSession, LeafVisitor, Session};

/// Object key whose subtree is never eligible, wherever it appears.
pub const EXCLUDED_KEY: &str = "mmmsss";

/// Apply `visitor` to every eligible string leaf of `tree`, in place.
///
/// A bare scalar root is not a field of any container and is left alone.
pub fn walk<V: LeafVisitor>(tree: &mut Value, visitor: &mut V) -> Result<()> {
    match tree {
        Value::Object(_) | Value::Array(_) => visit(tree, true, visitor),
        _ => Ok(()),
    }
}

fn visit<V: LeafVisitor>(node: &mut Value, eligible: bool, visitor: &mut V) -> Result<()> {
    match node {
        Value::Object(map) => {
            let last = map.len().saturating_sub(1);
            for (index, (key, child)) in map.iter_mut().enumerate() {
                let child_eligible = eligible && index == last && key != EXCLUDED_KEY;
                visit(child, child_eligible, visitor)?;
            }
        }
        Value::Array(items) => {
            let last = items.len().saturating_sub(1);
            for (index, child) in items.iter_mut().enumerate() {
                visit(child, eligible && index == last, visitor)?;
            }
        }
        Value::String(text) if eligible => {
            *text = visitor.visit_leaf(text)?;
        }
        Value::String(_) | Value::Number(_) | Value::Bool(_) | Value::Null => {}
    }
    Ok(())
}

/// Extract pass: replace prose in eligible leaves with placeholders.
///
/// Returns the skeleton tree; fragments accumulate in `session`.
pub fn extract_document(mut tree: Value, session: &mut Session) -> Result<Value> {
    walk(&mut tree, session)?;
    debug!(
        leaves = session.leaf_count(),
        fragments = session.fragments().len(),
        "extract pass complete"
    );
    Ok(tree)
}

/// Reinsert pass: resolve every placeholder of a skeleton tree.
pub fn reinsert_document(mut skeleton: Value, session: &AnnotatedSession) -> Result<Value> {
    let mut resolver = session.resolver();
    walk(&mut skeleton, &mut resolver)?;
    resolver.finish()?;
    debug!(leaves = session.leaf_count(), "reinsert pass complete");
    Ok(skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placeholder::PlaceholderAllocator;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Records every leaf it is offered.
    #[derive(Default)]
    struct Collect(Vec<String>);

    impl LeafVisitor for Collect {
        fn visit_leaf(&mut self, text: &str) -> Result<String> {
            self.0.push(text.to_string());
            Ok(text.to_string())
        }
    }

    fn eligible_leaves(mut tree: Value) -> Vec<String> {
        let mut collect = Collect::default();
        walk(&mut tree, &mut collect).unwrap();
        collect.0
    }

    #[test]
    fn test_only_last_key_is_eligible() {
        let tree = json!({"a": "one", "b": "two", "c": "three"});
        assert_eq!(eligible_leaves(tree), vec!["three"]);
    }

    #[test]
    fn test_only_last_index_is_eligible() {
        let tree = json!(["one", "two", "three"]);
        assert_eq!(eligible_leaves(tree), vec!["three"]);
    }

    #[test]
    fn test_excluded_key_blocks_its_subtree() {
        let tree = json!({"a": "one", "mmmsss": {"x": "hidden"}, "c": "three"});
        assert_eq!(eligible_leaves(tree), vec!["three"]);

        let tree = json!({"a": "one", "mmmsss": {"x": "hidden", "y": ["deep"]}});
        assert!(eligible_leaves(tree).is_empty());
    }

    #[test]
    fn test_excluded_key_in_last_position() {
        let tree = json!({"a": "one", "mmmsss": "hidden"});
        assert!(eligible_leaves(tree).is_empty());
    }

    #[test]
    fn test_chain_of_last_positions() {
        let tree = json!({
            "meta": {"title": "not me", "body": "not me either"},
            "sections": [
                {"heading": "skip", "text": "skip"},
                {"heading": "skip", "text": "<p>pick me</p>"}
            ]
        });
        assert_eq!(eligible_leaves(tree), vec!["<p>pick me</p>"]);
    }

    #[test]
    fn test_non_string_leaves_are_untouched() {
        let tree = json!({"a": "x", "b": [1, true, null, 2.5]});
        assert!(eligible_leaves(tree).is_empty());
    }

    #[test]
    fn test_scalar_root_is_not_eligible() {
        assert!(eligible_leaves(json!("just a string")).is_empty());
    }

    #[test]
    fn test_empty_containers() {
        assert!(eligible_leaves(json!({})).is_empty());
        assert!(eligible_leaves(json!([])).is_empty());
    }

    #[test]
    fn test_extract_then_reinsert() {
        let tree = json!({
            "id": 7,
            "body": ["ignored", {"k": "v", "html": "<p>Hello <b>world</b></p>"}]
        });
        let mut session = Session::with_allocator(PlaceholderAllocator::with_key("w"));
        let skeleton = extract_document(tree, &mut session).unwrap();

        assert_eq!(
            skeleton,
            json!({
                "id": 7,
                "body": ["ignored", {"k": "v", "html": "<p>[w-0]<b>[w-1]</b></p>"}]
            })
        );
        assert_eq!(session.fragments(), ["Hello ", "world"]);

        let annotated = session
            .annotate(vec!["HELLO ".into(), "WORLD".into()])
            .unwrap();
        let result = reinsert_document(skeleton, &annotated).unwrap();
        assert_eq!(
            result,
            json!({
                "id": 7,
                "body": ["ignored", {"k": "v", "html": "<p>HELLO <b>WORLD</b></p>"}]
            })
        );
    }
}
