use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::{DocumentStore, PageEntry, StoredDocument};
use crate::error::{PipelineError, Result};

/// Store backed by two directories of JSON files.
///
/// Every `*.json` file in the input directory is one document, its file
/// stem the id. Files are read in file-name order. Writes go to
/// `<output>/<id>.json`.
pub struct DirectoryStore {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    async fn list_documents(&self) -> Result<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.input_dir).await?;
        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") && path.is_file() {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }
}

fn document_id(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(String::from)
        .ok_or_else(|| PipelineError::MissingDocumentId(path.display().to_string()))
}

/// Read and parse one file. Failures name the document and leave the
/// rest of the page intact.
async fn load_document(path: &Path) -> PageEntry {
    let id = document_id(path)?;
    let invalid = |message: String| PipelineError::InvalidDocument {
        id: id.clone(),
        message,
    };

    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| invalid(e.to_string()))?;
    let source: Value = serde_json::from_str(&raw).map_err(|e| invalid(e.to_string()))?;

    Ok(StoredDocument { id, source })
}

#[async_trait]
impl DocumentStore for DirectoryStore {
    async fn fetch_page(&self, offset: usize, size: usize) -> Result<Vec<PageEntry>> {
        let paths = self.list_documents().await?;
        let mut page = Vec::new();

        for path in paths.iter().skip(offset).take(size) {
            page.push(load_document(path).await);
        }

        debug!(dir = %self.input_dir.display(), offset, count = page.len(), "read page");
        Ok(page)
    }

    async fn write(&self, id: &str, source: &Value) -> Result<()> {
        if id.is_empty() || id.contains(['/', '\\']) || id == "." || id == ".." {
            return Err(PipelineError::MissingDocumentId(id.to_string()));
        }

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let path = self.output_dir.join(format!("{id}.json"));
        let rendered = serde_json::to_string_pretty(source)?;
        tokio::fs::write(&path, rendered).await?;
        debug!(path = %path.display(), "wrote document");
        Ok(())
    }
}
