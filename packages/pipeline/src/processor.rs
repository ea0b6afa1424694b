//! Per-document annotation: extract, annotate, reinsert, write.

use annotext_splicer::{extract_document, reinsert_document, Session};
use serde_json::Value;
use tracing::debug;

use crate::annotation::Annotator;
use crate::error::Result;
use crate::store::{DocumentStore, StoredDocument};

/// Counts from annotating one tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessReport {
    /// Prose fragments sent to the annotator.
    pub fragments: usize,
    /// Eligible string leaves visited.
    pub leaves: usize,
}

/// Run both passes over `tree` with a fresh session.
///
/// The annotator is not called when the tree has no prose to annotate.
pub async fn annotate_tree<A: Annotator + ?Sized>(
    tree: Value,
    annotator: &A,
) -> Result<(Value, ProcessReport)> {
    let mut session = Session::new();
    let skeleton = extract_document(tree, &mut session)?;

    let report = ProcessReport {
        fragments: session.fragments().len(),
        leaves: session.leaf_count(),
    };

    let annotated = if report.fragments == 0 {
        Vec::new()
    } else {
        annotator.annotate(session.fragments()).await?
    };

    let annotated = session.annotate(annotated)?;
    let tree = reinsert_document(skeleton, &annotated)?;
    Ok((tree, report))
}

/// Annotates the configured field of stored documents and writes the
/// result to a store.
pub struct DocumentProcessor<A, S> {
    annotator: A,
    store: S,
    field: String,
}

impl<A: Annotator, S: DocumentStore> DocumentProcessor<A, S> {
    pub fn new(annotator: A, store: S, field: impl Into<String>) -> Self {
        Self {
            annotator,
            store,
            field: field.into(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Annotate one document and write it back under the same id.
    ///
    /// A document without the field is written through unchanged.
    /// Nothing is written if either pass fails.
    pub async fn process(&self, document: &StoredDocument) -> Result<ProcessReport> {
        let mut source = document.source.clone();
        let tree = source
            .get_mut(&self.field)
            .map(Value::take)
            .unwrap_or(Value::Null);

        let (tree, report) = annotate_tree(tree, &self.annotator).await?;

        if let Value::Object(map) = &mut source {
            if !tree.is_null() || map.contains_key(&self.field) {
                map.insert(self.field.clone(), tree);
            }
        }

        self.store.write(&document.id, &source).await?;
        debug!(
            id = %document.id,
            fragments = report.fragments,
            leaves = report.leaves,
            "document written"
        );
        Ok(report)
    }
}
