use std::path::PathBuf;

use crate::error::{PipelineError, Result};
use crate::worker::ErrorPolicy;

/// Configuration for the external NER service.
#[derive(Debug, Clone)]
pub struct NerConfig {
    pub api_url: String,
    /// Entity label that gets wrapped in markers; all others are ignored.
    pub entity_label: String,
    pub batch_size: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl NerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let api_url = std::env::var("NER_API_URL")
            .map_err(|_| PipelineError::Config("NER_API_URL not set".into()))?;

        let entity_label = std::env::var("NER_ENTITY_LABEL").unwrap_or_else(|_| "ORG".into());

        let batch_size = std::env::var("NER_BATCH_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(64);

        let timeout_secs = std::env::var("NER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);

        let max_retries = std::env::var("NER_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        Ok(Self {
            api_url,
            entity_label,
            batch_size,
            timeout_secs,
            max_retries,
        })
    }

    /// Create a config builder for testing.
    pub fn builder(api_url: impl Into<String>) -> NerConfigBuilder {
        NerConfigBuilder {
            api_url: api_url.into(),
            entity_label: "ORG".into(),
            batch_size: 64,
            timeout_secs: 120,
            max_retries: 3,
        }
    }
}

/// Builder for constructing `NerConfig` in tests.
pub struct NerConfigBuilder {
    api_url: String,
    entity_label: String,
    batch_size: usize,
    timeout_secs: u64,
    max_retries: u32,
}

impl NerConfigBuilder {
    pub fn entity_label(mut self, entity_label: impl Into<String>) -> Self {
        self.entity_label = entity_label.into();
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn build(self) -> NerConfig {
        NerConfig {
            api_url: self.api_url,
            entity_label: self.entity_label,
            batch_size: self.batch_size,
            timeout_secs: self.timeout_secs,
            max_retries: self.max_retries,
        }
    }
}

/// Elasticsearch credentials.
///
/// NOTE: Do NOT derive `Debug`, the password would be exposed.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Configuration for the Elasticsearch document store.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub url: String,
    pub credentials: Option<Credentials>,
    pub source_index: String,
    pub dest_index: String,
    /// Top-level field of each stored document that holds the tree to annotate.
    pub document_field: String,
    pub page_size: usize,
    pub timeout_secs: u64,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("ELASTICSEARCH_URL")
            .map_err(|_| PipelineError::Config("ELASTICSEARCH_URL not set".into()))?;

        let credentials = match (
            std::env::var("ELASTICSEARCH_USERNAME"),
            std::env::var("ELASTICSEARCH_PASSWORD"),
        ) {
            (Ok(username), Ok(password)) => Some(Credentials { username, password }),
            (Ok(_), Err(_)) => {
                return Err(PipelineError::Config(
                    "ELASTICSEARCH_USERNAME set without ELASTICSEARCH_PASSWORD".into(),
                ))
            }
            _ => None,
        };

        let source_index = std::env::var("SOURCE_INDEX")
            .map_err(|_| PipelineError::Config("SOURCE_INDEX not set".into()))?;

        let dest_index = std::env::var("DEST_INDEX").unwrap_or_else(|_| "filing_enr".into());

        let document_field =
            std::env::var("DOCUMENT_FIELD").unwrap_or_else(|_| "sma_data_json".into());

        let page_size = std::env::var("PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(250);

        let timeout_secs = std::env::var("ELASTICSEARCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Ok(Self {
            url,
            credentials,
            source_index,
            dest_index,
            document_field,
            page_size,
            timeout_secs,
        })
    }

    pub fn new(
        url: impl Into<String>,
        source_index: impl Into<String>,
        dest_index: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            credentials: None,
            source_index: source_index.into(),
            dest_index: dest_index.into(),
            document_field: "sma_data_json".into(),
            page_size: 250,
            timeout_secs: 30,
        }
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some(Credentials {
            username: username.into(),
            password: password.into(),
        });
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_document_field(mut self, document_field: impl Into<String>) -> Self {
        self.document_field = document_field.into();
        self
    }
}

/// Configuration for the batch worker binary.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub ner: NerConfig,
    pub store: StoreConfig,
    /// Offset of the first document to process, for resuming a stopped run.
    pub start_offset: usize,
    pub error_policy: ErrorPolicy,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self> {
        let ner = NerConfig::from_env()?;
        let store = StoreConfig::from_env()?;

        let start_offset = std::env::var("START_OFFSET")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let error_policy = match std::env::var("CONTINUE_ON_ERROR") {
            Ok(v) if v == "false" || v == "0" => ErrorPolicy::Abort,
            _ => ErrorPolicy::Continue,
        };

        Ok(Self {
            ner,
            store,
            start_offset,
            error_policy,
        })
    }
}

/// Paths for processing a directory of JSON documents instead of a live store.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub document_field: String,
}

impl DirectoryConfig {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            document_field: "sma_data_json".into(),
        }
    }
}
