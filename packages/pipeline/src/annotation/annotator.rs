use async_trait::async_trait;
use tracing::debug;

use super::client::NerClient;
use super::render::render_entities;
use crate::config::NerConfig;
use crate::error::{PipelineError, Result};

/// Batch transform from prose fragments to annotated fragments.
///
/// Implementations return exactly one output per input, in input order.
#[async_trait]
pub trait Annotator: Send + Sync {
    async fn annotate(&self, fragments: &[String]) -> Result<Vec<String>>;
}

/// Annotator that wraps entities of one label found by a [`NerClient`].
pub struct EntityAnnotator<C: NerClient> {
    client: C,
    label: String,
    batch_size: usize,
}

impl<C: NerClient> EntityAnnotator<C> {
    pub fn new(client: C, config: &NerConfig) -> Self {
        Self::with_label(client, config.entity_label.clone(), config.batch_size)
    }

    pub fn with_label(client: C, label: impl Into<String>, batch_size: usize) -> Self {
        Self {
            client,
            label: label.into(),
            batch_size: batch_size.max(1),
        }
    }
}

#[async_trait]
impl<C: NerClient> Annotator for EntityAnnotator<C> {
    async fn annotate(&self, fragments: &[String]) -> Result<Vec<String>> {
        let mut annotated = Vec::with_capacity(fragments.len());

        for (batch, chunk) in fragments.chunks(self.batch_size).enumerate() {
            debug!(batch, size = chunk.len(), "recognising entities");
            let docs = self.client.recognize(chunk).await?;
            if docs.len() != chunk.len() {
                return Err(PipelineError::AnnotationLengthMismatch {
                    expected: chunk.len(),
                    actual: docs.len(),
                });
            }
            annotated.extend(docs.iter().map(|doc| render_entities(doc, &self.label)));
        }

        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::client::test_support::MockNerClient;
    use crate::annotation::client::NerDoc;
    use pretty_assertions::assert_eq;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_annotates_in_order_across_batches() {
        let annotator =
            EntityAnnotator::with_label(MockNerClient::new("ORG", &["Apple", "IBM"]), "ORG", 2);
        let out = annotator
            .annotate(&strings(&["Apple rose", "nothing here", "IBM fell"]))
            .await
            .unwrap();

        assert_eq!(
            out,
            strings(&[
                "<ner type='ORG'>Apple</ner> rose",
                "nothing here",
                "<ner type='ORG'>IBM</ner> fell",
            ])
        );
        assert_eq!(annotator.client.calls(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_client() {
        let annotator = EntityAnnotator::with_label(MockNerClient::new("ORG", &[]), "ORG", 8);
        let out = annotator.annotate(&[]).await.unwrap();
        assert!(out.is_empty());
        assert!(annotator.client.calls().is_empty());
    }

    struct ShortClient;

    #[async_trait]
    impl NerClient for ShortClient {
        async fn recognize(&self, _texts: &[String]) -> Result<Vec<NerDoc>> {
            Ok(vec![NerDoc::default()])
        }
    }

    #[tokio::test]
    async fn test_length_mismatch_is_an_error() {
        let annotator = EntityAnnotator::with_label(ShortClient, "ORG", 8);
        let err = annotator
            .annotate(&strings(&["a", "b"]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::AnnotationLengthMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }
}
