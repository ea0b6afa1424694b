//! Annotext pipeline.
//!
//! Reads documents from a store, annotates the prose of one field with
//! named-entity markers via [`annotext_splicer`], and writes the result
//! to a destination store.

pub mod annotation;
pub mod cli;
pub mod config;
pub mod error;
pub mod processor;
pub mod store;
pub mod worker;

pub use annotation::{Annotator, EntityAnnotator, HttpNerClient, NerClient};
pub use config::{NerConfig, StoreConfig, WorkerConfig};
pub use error::{PipelineError, Result};
pub use processor::{annotate_tree, DocumentProcessor, ProcessReport};
pub use store::{DirectoryStore, DocumentStore, ElasticStore, Pager, StoredDocument};
pub use worker::{run_batch, run_enrich_worker, ErrorPolicy, RunSummary};
