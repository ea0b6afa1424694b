use strum::{Display, EnumString};
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;

use crate::annotation::{Annotator, EntityAnnotator, HttpNerClient};
use crate::config::WorkerConfig;
use crate::error::{PipelineError, Result};
use crate::processor::DocumentProcessor;
use crate::store::{DocumentStore, ElasticStore, Pager};

/// What to do when a single document fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ErrorPolicy {
    /// Log the failure and move on to the next document.
    #[default]
    Continue,
    /// Stop the run and return the error.
    Abort,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub failed: usize,
    /// Offset to pass as `START_OFFSET` to resume after this run.
    pub next_offset: usize,
}

/// Process every document reachable through `pager`.
///
/// Shutdown is checked between documents; an in-flight document always
/// runs to completion.
pub async fn run_batch<A: Annotator, S: DocumentStore>(
    processor: &DocumentProcessor<A, S>,
    mut pager: Pager,
    policy: ErrorPolicy,
    shutdown: &CancellationToken,
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        next_offset: pager.offset(),
        ..RunSummary::default()
    };

    'pages: while let Some(page) = pager.next_page(processor.store()).await? {
        for entry in page {
            if shutdown.is_cancelled() {
                tracing::info!(next_offset = summary.next_offset, "shutdown requested, stopping run");
                break 'pages;
            }

            // A document that could not be loaded counts as a failed document.
            let (id, outcome) = match entry {
                Ok(document) => {
                    tracing::info!(id = %document.id, offset = summary.next_offset, "document start");
                    let outcome = processor.process(&document).await;
                    (document.id, outcome)
                }
                Err(e) => (String::from("-"), Err(e)),
            };

            match outcome {
                Ok(report) => {
                    summary.processed += 1;
                    tracing::info!(
                        id = %id,
                        count = summary.processed,
                        fragments = report.fragments,
                        "document end"
                    );
                }
                Err(e) => {
                    summary.failed += 1;
                    tracing::error!(id = %id, offset = summary.next_offset, error = %e, "document failed");
                    if policy == ErrorPolicy::Abort {
                        return Err(e);
                    }
                    tracing::warn!(offset = summary.next_offset, "skipping document");
                }
            }
            summary.next_offset += 1;
        }
    }

    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        next_offset = summary.next_offset,
        "run finished"
    );
    Ok(summary)
}

/// Cancel `token` on SIGINT (ctrl+c) or SIGTERM.
pub fn spawn_signal_listener(token: CancellationToken) -> Result<()> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| PipelineError::Worker(format!("failed to register SIGTERM handler: {e}")))?;

    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("received SIGINT, finishing current document");
            }
            _ = sigterm.recv() => {
                tracing::info!("received SIGTERM, finishing current document");
            }
        }
        token.cancel();
    });
    Ok(())
}

/// Annotate the configured source index into the destination index.
pub async fn run_enrich_worker(config: WorkerConfig) -> Result<RunSummary> {
    tracing::info!(
        source = %config.store.source_index,
        dest = %config.store.dest_index,
        field = %config.store.document_field,
        label = %config.ner.entity_label,
        start_offset = config.start_offset,
        policy = %config.error_policy,
        "starting enrich worker"
    );

    let client = HttpNerClient::new(&config.ner)?;
    let annotator = EntityAnnotator::new(client, &config.ner);
    let store = ElasticStore::new(&config.store)?;
    let processor = DocumentProcessor::new(annotator, store, config.store.document_field.clone());

    let shutdown = CancellationToken::new();
    spawn_signal_listener(shutdown.clone())?;

    let pager = Pager::new(config.start_offset, config.store.page_size);
    run_batch(&processor, pager, config.error_policy, &shutdown).await
}
