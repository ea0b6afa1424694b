//! Document source/sink boundary.
//!
//! The processor only needs three things from a store: the next page of
//! documents in a stable order, and a way to write one document back.

mod directory;
mod elastic;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub use directory::DirectoryStore;
pub use elastic::ElasticStore;

/// A document as read from a store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub source: Value,
}

/// One slot of a page: the document, or why that document alone could
/// not be loaded.
pub type PageEntry = Result<StoredDocument>;

/// Paged source and whole-document sink.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch up to `size` documents starting at `offset`.
    ///
    /// Ordering must be stable between calls; an empty page means the
    /// collection is exhausted. The outer error fails the whole page, an
    /// entry error only its own document.
    async fn fetch_page(&self, offset: usize, size: usize) -> Result<Vec<PageEntry>>;

    /// Create or replace the output document `id`.
    async fn write(&self, id: &str, source: &Value) -> Result<()>;
}

/// Walks a store page by page.
#[derive(Debug, Clone)]
pub struct Pager {
    offset: usize,
    page_size: usize,
    exhausted: bool,
}

impl Pager {
    pub fn new(start_offset: usize, page_size: usize) -> Self {
        Self {
            offset: start_offset,
            page_size: page_size.max(1),
            exhausted: false,
        }
    }

    /// Offset of the next page to be fetched.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Fetch the next page, or `None` once an empty page was returned.
    pub async fn next_page<S: DocumentStore + ?Sized>(
        &mut self,
        store: &S,
    ) -> Result<Option<Vec<PageEntry>>> {
        if self.exhausted {
            return Ok(None);
        }

        let page = store.fetch_page(self.offset, self.page_size).await?;
        if page.is_empty() {
            self.exhausted = true;
            return Ok(None);
        }

        self.offset += self.page_size;
        Ok(Some(page))
    }
}

/// Test utilities for stores.
#[cfg(any(test, feature = "test-utils"))]
pub mod test_support {
    use super::*;
    use crate::error::PipelineError;
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    /// In-memory store. Reads from a fixed list, records writes.
    #[derive(Default)]
    pub struct MemoryStore {
        documents: Vec<StoredDocument>,
        written: Mutex<BTreeMap<String, Value>>,
        fail_writes_for: Option<String>,
    }

    impl MemoryStore {
        pub fn new(documents: Vec<StoredDocument>) -> Self {
            Self {
                documents,
                ..Default::default()
            }
        }

        /// Make every write of document `id` fail.
        pub fn failing_writes_for(mut self, id: impl Into<String>) -> Self {
            self.fail_writes_for = Some(id.into());
            self
        }

        pub fn written(&self) -> BTreeMap<String, Value> {
            self.written.lock().map(|w| w.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl DocumentStore for MemoryStore {
        async fn fetch_page(&self, offset: usize, size: usize) -> Result<Vec<PageEntry>> {
            Ok(self
                .documents
                .iter()
                .skip(offset)
                .take(size)
                .cloned()
                .map(Ok)
                .collect())
        }

        async fn write(&self, id: &str, source: &Value) -> Result<()> {
            if self.fail_writes_for.as_deref() == Some(id) {
                return Err(PipelineError::Store {
                    operation: "write".into(),
                    message: format!("refusing to write {id}"),
                });
            }
            let mut written = self.written.lock().map_err(|e| PipelineError::Store {
                operation: "write".into(),
                message: format!("lock poisoned: {e}"),
            })?;
            written.insert(id.to_string(), source.clone());
            Ok(())
        }
    }
}
